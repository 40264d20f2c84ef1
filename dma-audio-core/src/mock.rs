//! In-memory audio backend for tests and headless runs.
//!
//! `MockBackend` stands in for a host audio API. The paired `MockHandle`
//! stays with the caller after the backend moves into a session and lets it
//! play the host's part: pull bytes through the registered callback, feed
//! capture data, inject failures and inspect what the session asked for.
//!
//! # Example
//!
//! ```
//! use dma_audio_core::mock::MockBackend;
//! use dma_audio_core::{DmaConfiguration, DmaSession};
//!
//! let backend = MockBackend::new();
//! let host = backend.handle();
//! let mut session = DmaSession::new(backend, DmaConfiguration::default());
//! session.init().unwrap();
//!
//! // The host asks for 1024 bytes; a freshly allocated ring is silent.
//! let bytes = host.pull(1024).unwrap();
//! assert_eq!(bytes, vec![0; 1024]);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::DmaError;
use crate::models::format::{AudioSpec, ObtainedSpec};
use crate::traits::audio_backend::{AudioBackend, CaptureStream, PlaybackCallback, PlaybackStream};
use crate::traits::pcm_sink::PcmSink;

/// Callback size reported when the request left it to the host.
pub const MOCK_SAMPLE_FRAMES: u32 = 512;

struct PlaybackSlot {
    // Own lock, so the host lock is never held across an invocation
    callback: Arc<Mutex<PlaybackCallback>>,
    paused: bool,
    gain: f32,
}

struct CaptureSlot {
    data: VecDeque<u8>,
    paused: bool,
}

#[derive(Default)]
struct MockHost {
    running: bool,
    inits: usize,
    quits: usize,

    fail_init: bool,
    fail_playback_open: bool,
    fail_format_query: bool,
    fail_resume: bool,
    no_capture_device: bool,
    obtained: Option<ObtainedSpec>,

    last_playback_request: Option<AudioSpec>,
    last_capture_request: Option<AudioSpec>,
    capture_opens: usize,

    playback: Option<PlaybackSlot>,
    capture: Option<CaptureSlot>,
}

/// Caller-side view of a `MockBackend`. Cheap to clone.
#[derive(Clone, Default)]
pub struct MockHandle {
    host: Arc<Mutex<MockHost>>,
}

impl MockHandle {
    /// Invoke the playback callback for `requested` bytes, as the host
    /// audio thread would. `None` when no stream is open or it is paused.
    ///
    /// Invocations are serialized with each other but not with the other
    /// handle and stream calls.
    pub fn pull(&self, requested: usize) -> Option<Vec<u8>> {
        let callback = {
            let host = self.host.lock();
            let slot = host.playback.as_ref().filter(|slot| !slot.paused)?;
            Arc::clone(&slot.callback)
        };
        let mut guard = callback.lock();
        let callback: &mut PlaybackCallback = &mut guard;
        let mut out = Vec::with_capacity(requested);
        let sink: &mut dyn PcmSink = &mut out;
        callback(requested, sink);
        Some(out)
    }

    /// Record `bytes` on the capture device. Dropped unless the device is
    /// open and unpaused.
    pub fn push_capture(&self, bytes: &[u8]) {
        if let Some(slot) = self.host.lock().capture.as_mut() {
            if !slot.paused {
                slot.data.extend(bytes);
            }
        }
    }

    /// Grant `spec` on the next playback open instead of echoing the request.
    pub fn set_obtained(&self, spec: Option<ObtainedSpec>) {
        self.host.lock().obtained = spec;
    }

    pub fn set_fail_init(&self, fail: bool) {
        self.host.lock().fail_init = fail;
    }

    pub fn set_fail_playback_open(&self, fail: bool) {
        self.host.lock().fail_playback_open = fail;
    }

    pub fn set_fail_format_query(&self, fail: bool) {
        self.host.lock().fail_format_query = fail;
    }

    pub fn set_fail_resume(&self, fail: bool) {
        self.host.lock().fail_resume = fail;
    }

    pub fn set_capture_device(&self, present: bool) {
        self.host.lock().no_capture_device = !present;
    }

    pub fn subsystem_running(&self) -> bool {
        self.host.lock().running
    }

    pub fn subsystem_inits(&self) -> usize {
        self.host.lock().inits
    }

    pub fn subsystem_quits(&self) -> usize {
        self.host.lock().quits
    }

    pub fn playback_open(&self) -> bool {
        self.host.lock().playback.is_some()
    }

    pub fn playback_paused(&self) -> Option<bool> {
        self.host.lock().playback.as_ref().map(|slot| slot.paused)
    }

    /// Gain currently applied to the open playback stream.
    pub fn playback_gain(&self) -> Option<f32> {
        self.host.lock().playback.as_ref().map(|slot| slot.gain)
    }

    pub fn capture_open(&self) -> bool {
        self.host.lock().capture.is_some()
    }

    pub fn capture_paused(&self) -> Option<bool> {
        self.host.lock().capture.as_ref().map(|slot| slot.paused)
    }

    pub fn capture_opens(&self) -> usize {
        self.host.lock().capture_opens
    }

    pub fn last_playback_request(&self) -> Option<AudioSpec> {
        self.host.lock().last_playback_request
    }

    pub fn last_capture_request(&self) -> Option<AudioSpec> {
        self.host.lock().last_capture_request
    }
}

/// A host audio API that lives entirely in memory.
#[derive(Default)]
pub struct MockBackend {
    handle: MockHandle,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }
}

impl AudioBackend for MockBackend {
    type Playback = MockPlayback;
    type Capture = MockCapture;

    fn init_subsystem(&mut self) -> Result<(), DmaError> {
        let mut host = self.handle.host.lock();
        if host.fail_init {
            return Err(DmaError::SubsystemInit("mock init failure".into()));
        }
        host.running = true;
        host.inits += 1;
        Ok(())
    }

    fn quit_subsystem(&mut self) {
        let mut host = self.handle.host.lock();
        host.running = false;
        host.quits += 1;
    }

    fn driver_name(&self) -> String {
        "mock".into()
    }

    fn open_playback(
        &mut self,
        desired: &AudioSpec,
        callback: PlaybackCallback,
    ) -> Result<MockPlayback, DmaError> {
        let mut host = self.handle.host.lock();
        host.last_playback_request = Some(*desired);
        if !host.running {
            return Err(DmaError::StreamOpen("subsystem not running".into()));
        }
        if host.fail_playback_open {
            return Err(DmaError::StreamOpen("mock playback open failure".into()));
        }

        let obtained = host.obtained.unwrap_or(ObtainedSpec {
            encoding: desired.encoding,
            freq: desired.freq,
            channels: desired.channels,
            sample_frames: if desired.sample_frames > 0 {
                desired.sample_frames
            } else {
                MOCK_SAMPLE_FRAMES
            },
        });
        host.playback = Some(PlaybackSlot {
            callback: Arc::new(Mutex::new(callback)),
            paused: true,
            gain: 1.0,
        });

        Ok(MockPlayback {
            host: Arc::clone(&self.handle.host),
            obtained,
        })
    }

    fn open_capture(&mut self, desired: &AudioSpec) -> Result<MockCapture, DmaError> {
        let mut host = self.handle.host.lock();
        host.last_capture_request = Some(*desired);
        host.capture_opens += 1;
        if !host.running || host.no_capture_device {
            return Err(DmaError::CaptureUnavailable);
        }

        host.capture = Some(CaptureSlot {
            data: VecDeque::new(),
            paused: true,
        });
        Ok(MockCapture {
            host: Arc::clone(&self.handle.host),
        })
    }
}

/// Playback stream returned by `MockBackend`. Dropping it closes the slot.
pub struct MockPlayback {
    host: Arc<Mutex<MockHost>>,
    obtained: ObtainedSpec,
}

impl PlaybackStream for MockPlayback {
    fn obtained_spec(&self) -> Result<ObtainedSpec, DmaError> {
        if self.host.lock().fail_format_query {
            return Err(DmaError::FormatQuery("mock format query failure".into()));
        }
        Ok(self.obtained)
    }

    fn resume(&mut self) -> Result<(), DmaError> {
        let mut host = self.host.lock();
        if host.fail_resume {
            return Err(DmaError::StreamControl("mock resume failure".into()));
        }
        if let Some(slot) = host.playback.as_mut() {
            slot.paused = false;
        }
        Ok(())
    }

    fn set_gain(&mut self, gain: f32) {
        if let Some(slot) = self.host.lock().playback.as_mut() {
            slot.gain = gain;
        }
    }
}

impl Drop for MockPlayback {
    fn drop(&mut self) {
        let slot = self.host.lock().playback.take();
        // wait out an in-flight pull
        if let Some(slot) = slot {
            drop(slot.callback.lock());
        }
    }
}

/// Capture stream returned by `MockBackend`. Dropping it closes the slot.
pub struct MockCapture {
    host: Arc<Mutex<MockHost>>,
}

impl CaptureStream for MockCapture {
    fn clear(&mut self) {
        if let Some(slot) = self.host.lock().capture.as_mut() {
            slot.data.clear();
        }
    }

    fn resume(&mut self) -> Result<(), DmaError> {
        if let Some(slot) = self.host.lock().capture.as_mut() {
            slot.paused = false;
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), DmaError> {
        if let Some(slot) = self.host.lock().capture.as_mut() {
            slot.paused = true;
        }
        Ok(())
    }

    fn available_bytes(&self) -> usize {
        self.host.lock().capture.as_ref().map_or(0, |slot| slot.data.len())
    }

    fn read(&mut self, data: &mut [u8]) -> usize {
        let mut host = self.host.lock();
        let Some(slot) = host.capture.as_mut() else {
            return 0;
        };
        let n = data.len().min(slot.data.len());
        for (dst, src) in data.iter_mut().zip(slot.data.drain(..n)) {
            *dst = src;
        }
        n
    }
}

impl Drop for MockCapture {
    fn drop(&mut self) {
        self.host.lock().capture = None;
    }
}

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::DmaConfiguration;
use crate::models::error::DmaError;
use crate::models::format::DmaDescriptor;
use crate::models::state::{CaptureState, SubsystemState};
use crate::processing::callback_bridge;
use crate::processing::gain::MasterGain;
use crate::processing::mixer::{PaintGuard, SharedDma};
use crate::processing::ring_buffer::DmaBuffer;
use crate::session::capture::CaptureChannel;
use crate::session::negotiate;
use crate::traits::audio_backend::{AudioBackend, PlaybackCallback, PlaybackStream};

/// The DMA emulation backend: one instance owns everything the audio
/// subsystem needs between `init` and `shutdown`.
///
/// Generic over the host audio API via the `AudioBackend` trait. Data flow:
/// ```text
/// [external mixer] ─begin_painting/submit─→ [SharedDma ring] ─callback─→ [host playback]
/// [host capture] ─────────────────────────→ [CaptureChannel] ─capture()─→ [voice]
/// ```
///
/// `init`/`shutdown` are driven from one control thread; the host calls the
/// playback callback from its own thread at any time.
pub struct DmaSession<B: AudioBackend> {
    backend: B,
    config: DmaConfiguration,
    state: SubsystemState,

    // Ring buffer + cursor, shared with the playback callback
    shared: Arc<Mutex<SharedDma>>,
    descriptor: Option<DmaDescriptor>,

    playback: Option<B::Playback>,
    capture: CaptureChannel<B::Capture>,

    // Outlives every stream; reapplied on each init
    gain: MasterGain,
}

impl<B: AudioBackend> DmaSession<B> {
    pub fn new(backend: B, config: DmaConfiguration) -> Self {
        Self {
            backend,
            config,
            state: SubsystemState::Uninitialized,
            shared: Arc::new(Mutex::new(SharedDma::default())),
            descriptor: None,
            playback: None,
            capture: CaptureChannel::unavailable(),
            gain: MasterGain::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn configuration(&self) -> &DmaConfiguration {
        &self.config
    }

    /// Replace the options. Read on the next `init`.
    pub fn set_configuration(&mut self, config: DmaConfiguration) {
        self.config = config;
    }

    pub fn state(&self) -> SubsystemState {
        self.state
    }

    /// Shape of the shared buffer, `None` while uninitialized.
    pub fn descriptor(&self) -> Option<DmaDescriptor> {
        self.descriptor
    }

    /// Negotiate a playback stream and allocate the shared buffer.
    ///
    /// A no-op success while already initialized. Any failure after the
    /// subsystem started releases everything acquired so far, including a
    /// playback stream that opened but refused to resume.
    pub fn init(&mut self) -> Result<(), DmaError> {
        if self.state.is_initialized() {
            return Ok(());
        }

        log::debug!("starting audio subsystem...");
        if let Err(e) = self.backend.init_subsystem() {
            log::error!("audio subsystem failed to start: {}", e);
            return Err(e);
        }
        log::info!("audio driver is \"{}\"", self.backend.driver_name());

        let desired = self.config.desired_spec();
        log::debug!(
            "requesting {} at {} Hz, {} channels, {} frames",
            desired.encoding.name(),
            desired.freq,
            desired.channels,
            desired.sample_frames
        );

        let playback = match self.backend.open_playback(&desired, self.playback_callback()) {
            Ok(playback) => playback,
            Err(e) => {
                log::error!("failed to open playback stream: {}", e);
                self.backend.quit_subsystem();
                return Err(e);
            }
        };
        self.playback = Some(playback);

        if let Err(e) = self.allocate_buffer() {
            log::error!("{}", e);
            self.release();
            return Err(e);
        }

        self.capture = CaptureChannel::open(&mut self.backend, &self.config);

        if let Some(playback) = self.playback.as_mut() {
            self.gain.apply(playback);

            log::info!("starting audio callback...");
            if let Err(e) = playback.resume() {
                log::error!("failed to start playback stream: {}", e);
                self.release();
                return Err(e);
            }
        }

        self.shared.lock().initialized = true;
        self.state = SubsystemState::Initialized;
        log::info!("audio initialized");
        Ok(())
    }

    /// Close both streams, then free the buffer. Safe to call at any time,
    /// any number of times.
    pub fn shutdown(&mut self) {
        self.release();
        log::info!("audio shut down");
    }

    /// Open the producer write window. The playback callback is excluded
    /// until the guard is submitted or dropped.
    pub fn begin_painting(&self) -> PaintGuard<'_> {
        PaintGuard::new(self.shared.lock())
    }

    /// Close the producer write window.
    pub fn submit(&self, guard: PaintGuard<'_>) {
        drop(guard);
    }

    /// Read cursor, in samples.
    pub fn position(&self) -> usize {
        self.shared.lock().position()
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    pub fn start_capture(&mut self) {
        self.capture.start();
    }

    pub fn stop_capture(&mut self) {
        self.capture.stop();
    }

    pub fn available_capture_samples(&self) -> usize {
        self.capture.available_samples()
    }

    /// Copy up to `samples` mono 16-bit samples into `data`; see
    /// `CaptureChannel::capture`.
    pub fn capture(&mut self, samples: usize, data: &mut [u8]) {
        self.capture.capture(samples, data);
    }

    pub fn gain(&self) -> f32 {
        self.gain.get()
    }

    /// Store the output gain and apply it to the open stream, if any.
    pub fn set_gain(&mut self, value: f32) {
        self.gain.set(value, self.playback.as_mut());
    }

    // --- Internal helpers ---

    /// The host-facing pull source. Holds the shared lock for the whole
    /// invocation.
    fn playback_callback(&self) -> PlaybackCallback {
        let shared = Arc::clone(&self.shared);
        Box::new(move |requested, sink| {
            let mut shared = shared.lock();
            callback_bridge::fill(&mut shared, requested, sink);
        })
    }

    /// Size the ring from the obtained spec and publish it to the callback.
    fn allocate_buffer(&mut self) -> Result<(), DmaError> {
        let Some(playback) = self.playback.as_ref() else {
            return Err(DmaError::StreamOpen("no playback stream".into()));
        };

        let obtained = playback.obtained_spec()?;
        negotiate::validate_obtained(&obtained)?;
        log::info!("obtained audio spec:\n{}", obtained);

        let samples = negotiate::mix_buffer_samples(self.config.mix_samples, &obtained);
        let descriptor = negotiate::descriptor(&obtained, samples);
        log::debug!(
            "DMA buffer: {} samples, {} bytes",
            descriptor.samples,
            descriptor.buffer_bytes()
        );

        let buffer = DmaBuffer::allocate(samples, descriptor.format.bytes_per_sample())?;
        {
            let mut shared = self.shared.lock();
            shared.buffer = Some(buffer);
            shared.initialized = false;
        }
        self.descriptor = Some(descriptor);
        Ok(())
    }

    /// Stop the streams before the buffer goes away, so the host can no
    /// longer reach it.
    fn release(&mut self) {
        if let Some(playback) = self.playback.take() {
            log::info!("closing playback device...");
            drop(playback);
            log::info!("playback device closed");
        }
        self.capture.close();
        self.backend.quit_subsystem();

        {
            let mut shared = self.shared.lock();
            shared.buffer = None;
            shared.initialized = false;
        }
        self.descriptor = None;
        self.state = SubsystemState::Uninitialized;
    }
}

impl<B: AudioBackend> Drop for DmaSession<B> {
    fn drop(&mut self) {
        if self.state.is_initialized() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockHandle};
    use crate::models::format::{ObtainedSpec, SampleEncoding};
    use approx::assert_relative_eq;

    fn session(config: DmaConfiguration) -> (DmaSession<MockBackend>, MockHandle) {
        let backend = MockBackend::new();
        let handle = backend.handle();
        (DmaSession::new(backend, config), handle)
    }

    fn granted(channels: u16, sample_frames: u32) -> ObtainedSpec {
        ObtainedSpec {
            encoding: SampleEncoding::S16Le,
            freq: 44_100,
            channels,
            sample_frames,
        }
    }

    #[test]
    fn sizes_from_obtained_not_requested() {
        let (mut session, host) = session(DmaConfiguration::default());
        host.set_obtained(Some(granted(2, 1024)));
        session.init().unwrap();

        let request = host.last_playback_request().unwrap();
        assert_eq!(request.freq, 22_050);
        assert_eq!(request.encoding, SampleEncoding::s16_native());

        let dma = session.descriptor().unwrap();
        assert_eq!(dma.samples, 20_480);
        assert_eq!(dma.buffer_bytes(), 40_960);
        assert_eq!(dma.speed, 44_100);
        assert_eq!(dma.format.channels, 2);
    }

    #[test]
    fn mix_override_rounds_to_channels() {
        let config = DmaConfiguration { mix_samples: 100, ..Default::default() };
        let (mut session, host) = session(config);
        host.set_obtained(Some(granted(2, 1024)));
        session.init().unwrap();
        assert_eq!(session.descriptor().unwrap().samples, 100);

        session.shutdown();
        session.set_configuration(DmaConfiguration { mix_samples: 99, ..Default::default() });
        session.init().unwrap();
        assert_eq!(session.descriptor().unwrap().samples, 98);
    }

    #[test]
    fn init_is_idempotent() {
        let (mut session, host) = session(DmaConfiguration::default());
        session.init().unwrap();
        session.init().unwrap();

        assert_eq!(host.subsystem_inits(), 1);
        assert!(session.state().is_initialized());
    }

    #[test]
    fn init_resumes_playback_but_not_capture() {
        let (mut session, host) = session(DmaConfiguration::default());
        session.init().unwrap();

        assert_eq!(host.playback_paused(), Some(false));
        assert_eq!(host.capture_paused(), Some(true));
        assert_eq!(session.capture_state(), CaptureState::Idle);
    }

    #[test]
    fn subsystem_failure_has_no_side_effects() {
        let (mut session, host) = session(DmaConfiguration::default());
        host.set_fail_init(true);

        let err = session.init().unwrap_err();
        assert!(matches!(err, DmaError::SubsystemInit(_)));
        assert_eq!(host.last_playback_request(), None);
        assert_eq!(host.subsystem_quits(), 0);
        assert!(session.descriptor().is_none());
    }

    #[test]
    fn open_failure_quits_subsystem() {
        let (mut session, host) = session(DmaConfiguration::default());
        host.set_fail_playback_open(true);

        let err = session.init().unwrap_err();
        assert!(matches!(err, DmaError::StreamOpen(_)));
        assert!(!host.subsystem_running());
        assert_eq!(session.state(), SubsystemState::Uninitialized);
    }

    #[test]
    fn format_failure_rolls_back() {
        let (mut session, host) = session(DmaConfiguration::default());
        host.set_fail_format_query(true);

        let err = session.init().unwrap_err();
        assert!(matches!(err, DmaError::FormatQuery(_)));
        assert!(!host.playback_open());
        assert!(!host.capture_open());
        assert!(!host.subsystem_running());
        assert!(session.begin_painting().buffer().is_none());
    }

    #[test]
    fn zero_channel_grant_is_rejected() {
        let (mut session, host) = session(DmaConfiguration::default());
        host.set_obtained(Some(granted(0, 1024)));

        assert!(matches!(session.init(), Err(DmaError::FormatQuery(_))));
        assert!(!host.playback_open());
    }

    #[test]
    fn allocation_failure_rolls_back() {
        let config = DmaConfiguration { mix_samples: u32::MAX, ..Default::default() };
        let (mut session, host) = session(config);
        host.set_obtained(Some(ObtainedSpec {
            encoding: SampleEncoding::F32Le,
            freq: 48_000,
            channels: 2,
            sample_frames: 512,
        }));

        let err = session.init().unwrap_err();
        assert!(matches!(err, DmaError::BufferAllocation { .. }));
        assert!(!host.playback_open());
        assert!(!host.capture_open());
        assert!(!host.subsystem_running());
        assert!(session.descriptor().is_none());
        assert_eq!(session.state(), SubsystemState::Uninitialized);
        assert!(session.begin_painting().buffer().is_none());
    }

    #[test]
    fn resume_failure_rolls_back_capture_too() {
        let (mut session, host) = session(DmaConfiguration::default());
        host.set_fail_resume(true);

        assert!(session.init().is_err());
        assert!(!host.playback_open());
        assert!(!host.capture_open());
        assert!(session.descriptor().is_none());
        assert_eq!(session.position(), 0);
    }

    #[test]
    fn capture_failure_does_not_abort_playback() {
        let (mut session, host) = session(DmaConfiguration::default());
        host.set_capture_device(false);

        session.init().unwrap();
        assert!(session.state().is_initialized());
        assert_eq!(session.capture_state(), CaptureState::Unavailable);
        assert_eq!(session.available_capture_samples(), 0);
    }

    #[test]
    fn painted_samples_reach_the_host() {
        let config = DmaConfiguration { mix_samples: 8, channels: 2, ..Default::default() };
        let (mut session, host) = session(config);
        host.set_obtained(Some(granted(2, 0)));
        session.init().unwrap();

        let mut paint = session.begin_painting();
        assert_eq!(paint.samples(), 8);
        paint
            .buffer_mut()
            .unwrap()
            .copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]);
        session.submit(paint);

        assert_eq!(host.pull(6).unwrap(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(session.position(), 3);
        assert_eq!(
            host.pull(12).unwrap(),
            vec![7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 1, 2]
        );
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn painting_does_not_move_the_cursor() {
        let (mut session, host) = session(DmaConfiguration::default());
        session.init().unwrap();
        host.pull(64).unwrap();
        let before = session.position();

        let mut paint = session.begin_painting();
        paint.buffer_mut().unwrap().fill(0x40);
        assert_eq!(paint.position(), before);
        session.submit(paint);

        assert_eq!(session.position(), before);
    }

    #[test]
    fn painting_excludes_the_callback() {
        let (mut session, host) = session(DmaConfiguration::default());
        session.init().unwrap();

        let paint = session.begin_painting();
        let puller = std::thread::spawn(move || host.pull(128).map(|bytes| bytes.len()));
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(!puller.is_finished());

        session.submit(paint);
        assert_eq!(puller.join().unwrap(), Some(128));
    }

    #[test]
    fn host_queries_during_a_blocked_pull() {
        let (mut session, host) = session(DmaConfiguration::default());
        session.init().unwrap();
        session.start_capture();

        let paint = session.begin_painting();
        let puller = {
            let host = host.clone();
            std::thread::spawn(move || host.pull(64).map(|bytes| bytes.len()))
        };
        std::thread::sleep(std::time::Duration::from_millis(20));

        // The pull waits on the paint window, not on the host.
        assert_eq!(session.available_capture_samples(), 0);
        assert!(host.subsystem_running());
        assert_relative_eq!(host.playback_gain().unwrap(), 1.0);
        assert!(!puller.is_finished());

        session.submit(paint);
        assert_eq!(puller.join().unwrap(), Some(64));
    }

    #[test]
    fn shutdown_releases_everything() {
        let (mut session, host) = session(DmaConfiguration::default());
        session.init().unwrap();
        host.pull(100).unwrap();
        session.shutdown();

        assert!(!host.playback_open());
        assert!(!host.capture_open());
        assert!(!host.subsystem_running());
        assert_eq!(session.position(), 0);
        assert!(session.descriptor().is_none());
        assert!(session.begin_painting().buffer().is_none());
        assert_eq!(session.state(), SubsystemState::Uninitialized);
    }

    #[test]
    fn shutdown_twice_or_before_init_is_harmless() {
        let (mut session, _host) = session(DmaConfiguration::default());
        session.shutdown();
        session.shutdown();
        assert_eq!(session.position(), 0);

        session.init().unwrap();
        session.shutdown();
        session.shutdown();
        assert_eq!(session.position(), 0);
        assert!(session.descriptor().is_none());
    }

    #[test]
    fn reinit_after_shutdown() {
        let (mut session, host) = session(DmaConfiguration::default());
        session.init().unwrap();
        session.shutdown();
        session.init().unwrap();

        assert_eq!(host.subsystem_inits(), 2);
        assert_eq!(host.pull(16).unwrap().len(), 16);
    }

    #[test]
    fn gain_persists_across_sessions() {
        let (mut session, host) = session(DmaConfiguration::default());
        session.set_gain(0.3);
        assert_relative_eq!(session.gain(), 0.3);

        session.init().unwrap();
        assert_relative_eq!(host.playback_gain().unwrap(), 0.3);

        session.set_gain(0.6);
        assert_relative_eq!(host.playback_gain().unwrap(), 0.6);

        session.shutdown();
        assert_relative_eq!(session.gain(), 0.6);
        session.init().unwrap();
        assert_relative_eq!(host.playback_gain().unwrap(), 0.6);
    }

    #[test]
    fn capture_round_trip_through_session() {
        let (mut session, host) = session(DmaConfiguration::default());
        session.init().unwrap();
        session.start_capture();
        host.push_capture(&[1, 0, 2, 0, 3, 0]);

        assert_eq!(session.available_capture_samples(), 3);
        let mut data = [0xeeu8; 8];
        session.capture(4, &mut data);
        assert_eq!(data, [1, 0, 2, 0, 3, 0, 0, 0]);

        session.stop_capture();
        assert_eq!(session.capture_state(), CaptureState::Idle);
    }

    #[test]
    fn drop_shuts_down() {
        let (mut session, host) = session(DmaConfiguration::default());
        session.init().unwrap();
        drop(session);

        assert!(!host.playback_open());
        assert!(!host.subsystem_running());
    }
}

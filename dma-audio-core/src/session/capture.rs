use crate::models::config::DmaConfiguration;
use crate::models::format::AudioSpec;
use crate::models::state::CaptureState;
use crate::processing::silence::zero_fill_tail;
use crate::traits::audio_backend::{AudioBackend, CaptureStream};

/// Bytes per capture sample (mono signed 16-bit).
pub const CAPTURE_BYTES_PER_SAMPLE: usize = 2;

/// Voice capture path with its own Idle/Capturing lifecycle.
///
/// A missing device is a normal state: every call keeps working and reports
/// nothing buffered, and `capture` hands back silence.
pub struct CaptureChannel<C: CaptureStream> {
    stream: Option<C>,
    state: CaptureState,
}

impl<C: CaptureStream> CaptureChannel<C> {
    pub fn unavailable() -> Self {
        Self {
            stream: None,
            state: CaptureState::Unavailable,
        }
    }

    /// Open the default capture device if `config` allows it. Never fails:
    /// a gated or failed open yields an unavailable channel.
    pub fn open<B>(backend: &mut B, config: &DmaConfiguration) -> Self
    where
        B: AudioBackend<Capture = C>,
    {
        if !config.capture_enabled {
            log::info!("audio capture support disabled by user");
            return Self::unavailable();
        }
        if config.exclusive_voice {
            log::info!("audio capture support disabled for exclusive voice client");
            return Self::unavailable();
        }

        match backend.open_capture(&AudioSpec::CAPTURE) {
            Ok(stream) => {
                log::info!("capture device opened");
                Self {
                    stream: Some(stream),
                    state: CaptureState::Idle,
                }
            }
            Err(e) => {
                log::warn!("capture device failed to open: {}", e);
                Self::unavailable()
            }
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.stream.is_some()
    }

    /// Drop anything buffered and unpause. Safe to repeat.
    pub fn start(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        stream.clear();
        match stream.resume() {
            Ok(()) => self.state = CaptureState::Capturing,
            Err(e) => log::warn!("failed to resume capture device: {}", e),
        }
    }

    /// Pause without closing. Safe to repeat or call before `start`.
    pub fn stop(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        if let Err(e) = stream.pause() {
            log::warn!("failed to pause capture device: {}", e);
        }
        self.state = CaptureState::Idle;
    }

    /// Whole samples currently buffered by the host.
    pub fn available_samples(&self) -> usize {
        self.stream
            .as_ref()
            .map_or(0, |s| s.available_bytes() / CAPTURE_BYTES_PER_SAMPLE)
    }

    /// Copy up to `samples` samples into `data`, zero-padding whatever the
    /// host could not supply. Never waits for audio.
    ///
    /// Writes `2 * samples` bytes, truncated to `data.len()`.
    pub fn capture(&mut self, samples: usize, data: &mut [u8]) {
        let bytes = samples
            .saturating_mul(CAPTURE_BYTES_PER_SAMPLE)
            .min(data.len());
        let out = &mut data[..bytes];

        let got = match self.stream.as_mut() {
            Some(stream) => stream.read(out).min(bytes),
            None => 0,
        };
        zero_fill_tail(out, got);
    }

    /// Destroy the capture stream, if any.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            log::info!("closing capture device...");
            drop(stream);
            log::info!("capture device closed");
        }
        self.state = CaptureState::Unavailable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockCapture};

    fn opened(backend: &mut MockBackend) -> CaptureChannel<MockCapture> {
        backend.init_subsystem().unwrap();
        CaptureChannel::open(backend, &DmaConfiguration::default())
    }

    #[test]
    fn unavailable_capture_is_silent() {
        let mut channel = CaptureChannel::<MockCapture>::unavailable();
        let mut data = [0xaau8; 16];
        channel.capture(8, &mut data);

        assert_eq!(data, [0u8; 16]);
        assert_eq!(channel.available_samples(), 0);
        channel.start();
        channel.stop();
        assert_eq!(channel.state(), CaptureState::Unavailable);
    }

    #[test]
    fn gated_by_configuration() {
        let mut backend = MockBackend::new();
        backend.init_subsystem().unwrap();

        let config = DmaConfiguration { capture_enabled: false, ..Default::default() };
        assert!(!CaptureChannel::open(&mut backend, &config).is_available());

        let config = DmaConfiguration { exclusive_voice: true, ..Default::default() };
        assert!(!CaptureChannel::open(&mut backend, &config).is_available());

        assert_eq!(backend.handle().capture_opens(), 0);
    }

    #[test]
    fn open_failure_degrades() {
        let mut backend = MockBackend::new();
        backend.handle().set_capture_device(false);
        let channel = opened(&mut backend);

        assert!(!channel.is_available());
        assert_eq!(channel.state(), CaptureState::Unavailable);
    }

    #[test]
    fn requests_the_wire_format() {
        let mut backend = MockBackend::new();
        let _channel = opened(&mut backend);
        assert_eq!(backend.handle().last_capture_request(), Some(AudioSpec::CAPTURE));
    }

    #[test]
    fn starts_paused_and_records_after_start() {
        let mut backend = MockBackend::new();
        let handle = backend.handle();
        let mut channel = opened(&mut backend);
        assert_eq!(channel.state(), CaptureState::Idle);

        // paused devices record nothing
        handle.push_capture(&[1, 2, 3, 4]);
        assert_eq!(channel.available_samples(), 0);

        channel.start();
        assert!(channel.state().is_capturing());
        handle.push_capture(&[1, 0, 2, 0, 3]);
        assert_eq!(channel.available_samples(), 2);
    }

    #[test]
    fn start_discards_stale_data() {
        let mut backend = MockBackend::new();
        let handle = backend.handle();
        let mut channel = opened(&mut backend);

        channel.start();
        handle.push_capture(&[9; 10]);
        channel.stop();
        channel.start();

        assert_eq!(channel.available_samples(), 0);
    }

    #[test]
    fn short_reads_are_zero_padded() {
        let mut backend = MockBackend::new();
        let handle = backend.handle();
        let mut channel = opened(&mut backend);
        channel.start();
        handle.push_capture(&[5, 6, 7, 8]);

        let mut data = [0xffu8; 8];
        channel.capture(4, &mut data);
        assert_eq!(data, [5, 6, 7, 8, 0, 0, 0, 0]);
        assert_eq!(channel.available_samples(), 0);
    }

    #[test]
    fn capture_leaves_the_rest_buffered() {
        let mut backend = MockBackend::new();
        let handle = backend.handle();
        let mut channel = opened(&mut backend);
        channel.start();
        handle.push_capture(&[1, 2, 3, 4, 5, 6]);

        let mut data = [0u8; 2];
        channel.capture(1, &mut data);
        assert_eq!(data, [1, 2]);
        assert_eq!(channel.available_samples(), 2);
    }

    #[test]
    fn stop_and_start_repeat_safely() {
        let mut backend = MockBackend::new();
        let mut channel = opened(&mut backend);

        channel.stop();
        channel.stop();
        channel.start();
        channel.start();
        assert!(channel.state().is_capturing());
        channel.stop();
        assert_eq!(channel.state(), CaptureState::Idle);
    }

    #[test]
    fn close_releases_the_stream() {
        let mut backend = MockBackend::new();
        let handle = backend.handle();
        let mut channel = opened(&mut backend);
        assert!(handle.capture_open());

        channel.close();
        channel.close();
        assert!(!handle.capture_open());
        assert!(!channel.is_available());
    }
}

use crate::models::error::DmaError;
use crate::models::format::{AudioSpec, ObtainedSpec};
use crate::traits::pcm_sink::PcmSink;

/// Pull source registered with a playback stream.
///
/// Parameters:
/// - `requested`: bytes the host wants for this invocation.
/// - `sink`: where those bytes go. Exactly `requested` bytes must be `put`.
///
/// Runs on the host's audio thread, serialized by the host.
pub type PlaybackCallback = Box<dyn FnMut(usize, &mut dyn PcmSink) + Send + 'static>;

/// An open host playback stream. Dropping it closes the stream, after
/// which the host never invokes its callback again.
pub trait PlaybackStream {
    /// The format the host actually granted.
    fn obtained_spec(&self) -> Result<ObtainedSpec, DmaError>;

    /// Unpause; the host starts invoking the callback.
    fn resume(&mut self) -> Result<(), DmaError>;

    /// Linear output gain applied at the stream level.
    fn set_gain(&mut self, gain: f32);
}

/// An open host capture stream. Buffered data is owned by the host side.
///
/// None of these calls may block waiting for audio.
pub trait CaptureStream {
    /// Discard everything buffered so far.
    fn clear(&mut self);

    fn resume(&mut self) -> Result<(), DmaError>;

    fn pause(&mut self) -> Result<(), DmaError>;

    /// Bytes ready to be read right now.
    fn available_bytes(&self) -> usize;

    /// Copy up to `data.len()` buffered bytes, returning the count.
    fn read(&mut self, data: &mut [u8]) -> usize;
}

/// Host audio API seam.
///
/// Implemented by:
/// - `CpalBackend` (dma-audio-cpal)
/// - `MockBackend` (in-memory, for tests and headless runs)
pub trait AudioBackend {
    type Playback: PlaybackStream;
    type Capture: CaptureStream;

    /// Bring up the host audio subsystem.
    fn init_subsystem(&mut self) -> Result<(), DmaError>;

    /// Tear the host audio subsystem down. Must tolerate being called
    /// when `init_subsystem` never ran or failed.
    fn quit_subsystem(&mut self);

    /// Human-readable host driver name, for diagnostics.
    fn driver_name(&self) -> String;

    /// Open the default playback device. The stream starts paused.
    fn open_playback(
        &mut self,
        desired: &AudioSpec,
        callback: PlaybackCallback,
    ) -> Result<Self::Playback, DmaError>;

    /// Open the default capture device. The stream starts paused.
    fn open_capture(&mut self, desired: &AudioSpec) -> Result<Self::Capture, DmaError>;
}

use thiserror::Error;

/// Errors raised while negotiating, driving or persisting the DMA backend.
///
/// Only the first four variants are fatal to `DmaSession::init`; the rest
/// are reported by stream-control and settings helpers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DmaError {
    #[error("audio subsystem failed to start: {0}")]
    SubsystemInit(String),

    #[error("failed to open audio stream: {0}")]
    StreamOpen(String),

    #[error("failed to query obtained audio format: {0}")]
    FormatQuery(String),

    #[error("failed to allocate {bytes} byte DMA buffer")]
    BufferAllocation { bytes: usize },

    #[error("capture device not available")]
    CaptureUnavailable,

    #[error("stream control failed: {0}")]
    StreamControl(String),

    #[error("settings error: {0}")]
    Settings(String),
}

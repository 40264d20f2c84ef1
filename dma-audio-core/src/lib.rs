//! # dma-audio-core
//!
//! Host-agnostic DMA emulation core for a software mixer.
//!
//! The mixer paints PCM into one large shared ring; the host audio runtime
//! drains it in small, irregular chunks from its own callback thread, and
//! silence fills in whenever the mixer falls behind. An optional capture
//! channel records mono 16-bit voice audio with its own lifecycle.
//! Host backends (cpal, or the in-memory mock) implement `AudioBackend` and
//! plug into the generic `DmaSession`.
//!
//! ## Architecture
//!
//! ```text
//! dma-audio-core (this crate)
//! ├── traits/       ← AudioBackend, PlaybackStream, CaptureStream, PcmSink
//! ├── models/       ← DmaError, DmaConfiguration, AudioSpec, ObtainedSpec, DmaDescriptor, states
//! ├── processing/   ← DmaBuffer, callback bridge, paint guard, silence, gain
//! ├── session/      ← DmaSession (orchestrator), CaptureChannel, buffer negotiation
//! ├── storage/      ← JSON settings persistence
//! └── mock          ← MockBackend
//! ```

pub mod mock;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::DmaConfiguration;
pub use models::error::DmaError;
pub use models::format::{AudioFormat, AudioSpec, DmaDescriptor, ObtainedSpec, SampleEncoding};
pub use models::state::{CaptureState, SubsystemState};
pub use processing::mixer::PaintGuard;
pub use processing::ring_buffer::DmaBuffer;
pub use processing::silence::SliceSink;
pub use session::capture::CaptureChannel;
pub use session::dma::DmaSession;
pub use traits::audio_backend::{AudioBackend, CaptureStream, PlaybackCallback, PlaybackStream};
pub use traits::pcm_sink::PcmSink;

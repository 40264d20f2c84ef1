//! # dma-audio-cpal
//!
//! cpal host backend for dma-audio.
//!
//! Provides:
//! - `CpalBackend`: the platform's default cpal host as an `AudioBackend`
//! - `CpalPlayback`: output stream pulling from the DMA ring
//! - `CpalCapture`: mono 16-bit 48 kHz input stream for voice
//! - `sample`: cpal sample-format mapping and stream gain
//!
//! ## Usage
//! ```ignore
//! use dma_audio_core::{DmaConfiguration, DmaSession};
//! use dma_audio_cpal::CpalBackend;
//!
//! let mut session = DmaSession::new(CpalBackend::new(), DmaConfiguration::default());
//! session.init()?;
//! let mut paint = session.begin_painting();
//! // mix into paint.buffer_mut() ahead of paint.position()
//! session.submit(paint);
//! ```

pub mod backend;
pub mod capture;
pub mod playback;
pub mod sample;

pub use backend::CpalBackend;
pub use capture::CpalCapture;
pub use playback::CpalPlayback;

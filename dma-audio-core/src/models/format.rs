use std::fmt;

use serde::{Deserialize, Serialize};

/// PCM sample encodings a host stream may hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleEncoding {
    U8,
    S8,
    S16Le,
    S16Be,
    S32Le,
    S32Be,
    F32Le,
    F32Be,
    /// Reported by the host but not representable here. Never fed.
    Unknown,
}

impl SampleEncoding {
    /// Signed 16-bit in the byte order of the running target.
    pub const fn s16_native() -> Self {
        if cfg!(target_endian = "big") {
            Self::S16Be
        } else {
            Self::S16Le
        }
    }

    pub const fn s32_native() -> Self {
        if cfg!(target_endian = "big") {
            Self::S32Be
        } else {
            Self::S32Le
        }
    }

    pub const fn f32_native() -> Self {
        if cfg!(target_endian = "big") {
            Self::F32Be
        } else {
            Self::F32Le
        }
    }

    /// Bits per single sample, 0 for `Unknown`.
    pub const fn bits(self) -> u16 {
        match self {
            Self::U8 | Self::S8 => 8,
            Self::S16Le | Self::S16Be => 16,
            Self::S32Le | Self::S32Be | Self::F32Le | Self::F32Be => 32,
            Self::Unknown => 0,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32Le | Self::F32Be)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "U8",
            Self::S8 => "S8",
            Self::S16Le => "S16LE",
            Self::S16Be => "S16BE",
            Self::S32Le => "S32LE",
            Self::S32Be => "S32BE",
            Self::F32Le => "F32LE",
            Self::F32Be => "F32BE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A stream format request handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    pub encoding: SampleEncoding,
    pub freq: u32,
    pub channels: u16,
    /// Per-callback sample frames, 0 lets the host pick.
    pub sample_frames: u32,
}

impl AudioSpec {
    /// Wire format of the capture path: mono, signed 16-bit, 48 kHz.
    pub const CAPTURE: AudioSpec = AudioSpec {
        encoding: SampleEncoding::s16_native(),
        freq: 48_000,
        channels: 1,
        sample_frames: 0,
    };
}

/// What the host actually granted for an open stream.
///
/// May differ from the request in rate, channel count or encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObtainedSpec {
    pub encoding: SampleEncoding,
    pub freq: u32,
    pub channels: u16,
    /// Host-preferred sample frames per callback, 0 when unknown.
    pub sample_frames: u32,
}

impl ObtainedSpec {
    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            bits: self.encoding.bits(),
            is_float: self.encoding.is_float(),
            channels: self.channels,
            sample_rate: self.freq,
        }
    }
}

impl fmt::Display for ObtainedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Format:   {}", self.encoding.name())?;
        writeln!(f, "  Freq:     {}", self.freq)?;
        write!(f, "  Channels: {}", self.channels)?;
        if self.sample_frames > 0 {
            write!(f, "\n  Frames:   {}", self.sample_frames)?;
        }
        Ok(())
    }
}

/// Negotiated playback format. Read-only once a session is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub bits: u16,
    pub is_float: bool,
    pub channels: u16,
    pub sample_rate: u32,
}

impl AudioFormat {
    /// Frame size in bytes: one sample, independent of channel count.
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits / 8)
    }
}

/// Everything the external mixer needs to paint into the shared buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaDescriptor {
    pub format: AudioFormat,
    /// Total samples in the ring, always a multiple of `format.channels`.
    pub samples: usize,
    /// `samples / channels`.
    pub full_samples: usize,
    pub submission_chunk: usize,
    pub speed: u32,
}

impl DmaDescriptor {
    pub fn buffer_bytes(&self) -> usize {
        self.samples * self.format.bytes_per_sample()
    }
}

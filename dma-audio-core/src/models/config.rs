use serde::{Deserialize, Serialize};

use super::format::{AudioSpec, SampleEncoding};

/// Rate used when the configured sample rate is 0.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// User-settable options read by `DmaSession::init`.
///
/// Latched: edits take effect on the next shutdown/init cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmaConfiguration {
    /// Requested bit depth. Only 8 and 16 are honored (default: 16).
    pub bits: u16,

    /// Requested rate in Hz, 0 selects `DEFAULT_SAMPLE_RATE`.
    pub sample_rate: u32,

    /// Requested channel count (default: 2).
    pub channels: u16,

    /// Per-callback sample frames to ask the host for, 0 = host default.
    pub device_samples: u32,

    /// Total ring buffer samples, 0 = derive from the obtained format.
    pub mix_samples: u32,

    /// Open the capture channel at init (default: true).
    pub capture_enabled: bool,

    /// An external voice client owns the microphone; capture stays closed.
    pub exclusive_voice: bool,
}

impl DmaConfiguration {
    pub fn effective_bits(&self) -> u16 {
        match self.bits {
            8 | 16 => self.bits,
            _ => 16,
        }
    }

    pub fn effective_sample_rate(&self) -> u32 {
        if self.sample_rate == 0 {
            DEFAULT_SAMPLE_RATE
        } else {
            self.sample_rate
        }
    }

    pub fn capture_allowed(&self) -> bool {
        self.capture_enabled && !self.exclusive_voice
    }

    /// The playback request derived from these options.
    pub fn desired_spec(&self) -> AudioSpec {
        let encoding = if self.effective_bits() == 16 {
            SampleEncoding::s16_native()
        } else {
            SampleEncoding::U8
        };
        AudioSpec {
            encoding,
            freq: self.effective_sample_rate(),
            channels: self.channels,
            sample_frames: self.device_samples,
        }
    }
}

impl Default for DmaConfiguration {
    fn default() -> Self {
        Self {
            bits: 16,
            sample_rate: 0,
            channels: 2,
            device_samples: 0,
            mix_samples: 0,
            capture_enabled: true,
            exclusive_voice: false,
        }
    }
}

//! Buffer sizing derived from what the host granted.
//!
//! Everything here works on the obtained spec, never on the request.

use crate::models::error::DmaError;
use crate::models::format::{DmaDescriptor, ObtainedSpec, SampleEncoding};

/// Ring size, in host callbacks' worth of samples, when no override is set.
///
/// Empirical: large enough to absorb mixer/callback jitter. Changing it is
/// a tuning decision.
pub const CALLBACKS_PER_RING: usize = 10;

/// Per-channel sample count used when the host reports no callback size.
pub const FALLBACK_SAMPLES_PER_CHANNEL: usize = 2048;

/// Reject obtained formats the ring cannot be sized or fed from.
pub fn validate_obtained(obtained: &ObtainedSpec) -> Result<(), DmaError> {
    if obtained.channels == 0 {
        return Err(DmaError::FormatQuery("host reported zero channels".into()));
    }
    if obtained.encoding == SampleEncoding::Unknown {
        return Err(DmaError::FormatQuery("host reported an unknown sample encoding".into()));
    }
    Ok(())
}

/// Total ring samples: the override when positive, otherwise
/// `frames * channels * CALLBACKS_PER_RING`, otherwise
/// `channels * FALLBACK_SAMPLES_PER_CHANNEL`; rounded down to a multiple
/// of the channel count.
///
/// An override smaller than the channel count would round to an empty
/// ring, so it takes the fallback instead.
pub fn mix_buffer_samples(mix_override: u32, obtained: &ObtainedSpec) -> usize {
    let channels = usize::from(obtained.channels);
    if channels == 0 {
        return 0;
    }
    let fallback = channels * FALLBACK_SAMPLES_PER_CHANNEL;

    let mut samples = if mix_override > 0 {
        mix_override as usize
    } else {
        (obtained.sample_frames as usize)
            .saturating_mul(channels)
            .saturating_mul(CALLBACKS_PER_RING)
    };
    if samples == 0 {
        samples = fallback;
    }

    samples -= samples % channels;
    if samples == 0 {
        fallback
    } else {
        samples
    }
}

pub fn descriptor(obtained: &ObtainedSpec, samples: usize) -> DmaDescriptor {
    let format = obtained.format();
    DmaDescriptor {
        format,
        samples,
        full_samples: samples / usize::from(format.channels.max(1)),
        submission_chunk: 1,
        speed: format.sample_rate,
    }
}

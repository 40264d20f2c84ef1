//! Sample-format plumbing between cpal and the DMA core.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use cpal::SampleFormat;
use dma_audio_core::SampleEncoding;

/// The core encoding a cpal sample format is delivered in.
pub fn encoding_for(format: SampleFormat) -> SampleEncoding {
    match format {
        SampleFormat::U8 => SampleEncoding::U8,
        SampleFormat::I8 => SampleEncoding::S8,
        SampleFormat::I16 => SampleEncoding::s16_native(),
        SampleFormat::I32 => SampleEncoding::s32_native(),
        SampleFormat::F32 => SampleEncoding::f32_native(),
        _ => SampleEncoding::Unknown,
    }
}

/// The cpal format carrying `encoding`, if cpal can carry it byte-for-byte.
pub fn sample_format_for(encoding: SampleEncoding) -> Option<SampleFormat> {
    match encoding {
        SampleEncoding::U8 => Some(SampleFormat::U8),
        SampleEncoding::S8 => Some(SampleFormat::I8),
        e if e == SampleEncoding::s16_native() => Some(SampleFormat::I16),
        e if e == SampleEncoding::s32_native() => Some(SampleFormat::I32),
        e if e == SampleEncoding::f32_native() => Some(SampleFormat::F32),
        _ => None,
    }
}

/// Linear scaling of one sample, saturating at the type's range.
pub trait GainSample: Copy {
    fn scale(self, gain: f32) -> Self;
}

impl GainSample for u8 {
    fn scale(self, gain: f32) -> Self {
        // unsigned 8-bit is centered on 128
        let centered = f32::from(self) - 128.0;
        (centered * gain + 128.0).round().clamp(0.0, 255.0) as u8
    }
}

impl GainSample for i8 {
    fn scale(self, gain: f32) -> Self {
        (f32::from(self) * gain).round().clamp(-128.0, 127.0) as i8
    }
}

impl GainSample for i16 {
    fn scale(self, gain: f32) -> Self {
        (f32::from(self) * gain).round().clamp(-32768.0, 32767.0) as i16
    }
}

impl GainSample for i32 {
    fn scale(self, gain: f32) -> Self {
        (f64::from(self) * f64::from(gain))
            .round()
            .clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    }
}

impl GainSample for f32 {
    fn scale(self, gain: f32) -> Self {
        self * gain
    }
}

/// Scale `data` in place; unity gain leaves it untouched.
pub fn apply_gain<T: GainSample>(data: &mut [T], gain: f32) {
    if gain == 1.0 {
        return;
    }
    for sample in data.iter_mut() {
        *sample = sample.scale(gain);
    }
}

/// Gain shared between the control thread and the output callback.
#[derive(Debug, Clone)]
pub struct SharedGain(Arc<AtomicU32>);

impl SharedGain {
    pub fn new(gain: f32) -> Self {
        Self(Arc::new(AtomicU32::new(gain.to_bits())))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, gain: f32) {
        self.0.store(gain.to_bits(), Ordering::Relaxed);
    }
}

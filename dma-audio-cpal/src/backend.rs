//! cpal host backend.
//!
//! Wraps the platform's default cpal host (WASAPI, CoreAudio, ALSA, ...)
//! and opens streams on its default input and output devices.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, StreamConfig, SupportedBufferSize};

use dma_audio_core::models::error::DmaError;
use dma_audio_core::models::format::AudioSpec;
use dma_audio_core::traits::audio_backend::{AudioBackend, PlaybackCallback};

use crate::capture::CpalCapture;
use crate::playback::CpalPlayback;
use crate::sample::sample_format_for;

/// Device period requested when the configuration leaves it to the host.
pub const PREFERRED_SAMPLE_FRAMES: u32 = 1024;

/// Backend over `cpal::default_host()`.
///
/// The host is only held between `init_subsystem` and `quit_subsystem`.
#[derive(Default)]
pub struct CpalBackend {
    host: Option<cpal::Host>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn host(&self) -> Result<&cpal::Host, DmaError> {
        self.host
            .as_ref()
            .ok_or_else(|| DmaError::StreamOpen("audio subsystem is not running".into()))
    }
}

impl AudioBackend for CpalBackend {
    type Playback = CpalPlayback;
    type Capture = CpalCapture;

    fn init_subsystem(&mut self) -> Result<(), DmaError> {
        if self.host.is_none() {
            self.host = Some(cpal::default_host());
        }
        Ok(())
    }

    fn quit_subsystem(&mut self) {
        self.host = None;
    }

    fn driver_name(&self) -> String {
        match &self.host {
            Some(host) => host.id().name().to_string(),
            None => "none".into(),
        }
    }

    fn open_playback(
        &mut self,
        desired: &AudioSpec,
        callback: PlaybackCallback,
    ) -> Result<CpalPlayback, DmaError> {
        let device = self
            .host()?
            .default_output_device()
            .ok_or_else(|| DmaError::StreamOpen("no audio output device available".into()))?;
        log::info!("audio output device: {}", device_name(&device));

        let (config, format, sample_frames) = select_output_config(&device, desired)?;
        CpalPlayback::open(&device, &config, format, sample_frames, callback)
    }

    fn open_capture(&mut self, desired: &AudioSpec) -> Result<CpalCapture, DmaError> {
        let device = self
            .host()?
            .default_input_device()
            .ok_or_else(|| DmaError::StreamOpen("no audio input device available".into()))?;
        log::info!("audio input device: {}", device_name(&device));

        let config = select_input_config(&device, desired)?;
        CpalCapture::open(&device, &config)
    }
}

fn device_name(device: &cpal::Device) -> String {
    device.name().unwrap_or_else(|_| "Unknown".into())
}

/// Pick a fixed device period when the host advertises a usable range.
///
/// Returns the buffer size to request and the per-callback frame count to
/// report, which is 0 when the host keeps its own default.
pub fn buffer_size_for(requested_frames: u32, supported: &SupportedBufferSize) -> (BufferSize, u32) {
    let frames = if requested_frames > 0 {
        requested_frames
    } else {
        PREFERRED_SAMPLE_FRAMES
    };
    match supported {
        SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&frames) => {
            (BufferSize::Fixed(frames), frames)
        }
        _ => {
            if requested_frames > 0 {
                log::debug!("device period of {} frames not supported, using host default", frames);
            }
            (BufferSize::Default, 0)
        }
    }
}

/// Output config matching `desired` exactly, else the device default.
fn select_output_config(
    device: &cpal::Device,
    desired: &AudioSpec,
) -> Result<(StreamConfig, SampleFormat, u32), DmaError> {
    let rate = SampleRate(desired.freq);
    let wanted = sample_format_for(desired.encoding);

    let exact = device.supported_output_configs().ok().and_then(|mut configs| {
        configs.find(|range| {
            Some(range.sample_format()) == wanted
                && range.channels() == desired.channels
                && range.min_sample_rate() <= rate
                && rate <= range.max_sample_rate()
        })
    });

    let supported = match exact {
        Some(range) => range.with_sample_rate(rate),
        None => {
            log::debug!("no exact output config for the requested format, using device default");
            device
                .default_output_config()
                .map_err(|e| DmaError::StreamOpen(format!("no default output config: {}", e)))?
        }
    };

    let (buffer_size, sample_frames) = buffer_size_for(desired.sample_frames, supported.buffer_size());
    let mut config = supported.config();
    config.buffer_size = buffer_size;
    Ok((config, supported.sample_format(), sample_frames))
}

/// Input config carrying `desired` natively. Capture never converts.
fn select_input_config(device: &cpal::Device, desired: &AudioSpec) -> Result<StreamConfig, DmaError> {
    let rate = SampleRate(desired.freq);
    if sample_format_for(desired.encoding) != Some(SampleFormat::I16) {
        return Err(DmaError::StreamOpen(format!(
            "capture encoding {} not supported",
            desired.encoding.name()
        )));
    }

    let mut configs = device
        .supported_input_configs()
        .map_err(|e| DmaError::StreamOpen(format!("failed to query input configs: {}", e)))?;
    let range = configs
        .find(|range| {
            range.sample_format() == SampleFormat::I16
                && range.channels() == desired.channels
                && range.min_sample_rate() <= rate
                && rate <= range.max_sample_rate()
        })
        .ok_or_else(|| {
            DmaError::StreamOpen(format!(
                "input device has no {} Hz, {} channel, 16-bit mode",
                desired.freq, desired.channels
            ))
        })?;

    Ok(range.with_sample_rate(rate).config())
}

//! cpal output stream driving the DMA playback callback.
//!
//! The stream's device buffer is viewed as raw bytes and handed to the
//! registered callback; whatever the callback leaves unwritten is zeroed
//! before the stream gain is applied in the stream's native sample type.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, SizedSample, StreamConfig};

use dma_audio_core::models::error::DmaError;
use dma_audio_core::models::format::ObtainedSpec;
use dma_audio_core::processing::silence::SliceSink;
use dma_audio_core::traits::audio_backend::{PlaybackCallback, PlaybackStream};

use crate::sample::{apply_gain, encoding_for, GainSample, SharedGain};

/// An open output stream on the default device.
pub struct CpalPlayback {
    stream: cpal::Stream,
    obtained: ObtainedSpec,
    gain: SharedGain,
}

impl CpalPlayback {
    pub(crate) fn open(
        device: &cpal::Device,
        config: &StreamConfig,
        format: SampleFormat,
        sample_frames: u32,
        callback: PlaybackCallback,
    ) -> Result<Self, DmaError> {
        let gain = SharedGain::new(1.0);
        let stream = match format {
            SampleFormat::U8 => build_output::<u8>(device, config, callback, gain.clone()),
            SampleFormat::I8 => build_output::<i8>(device, config, callback, gain.clone()),
            SampleFormat::I16 => build_output::<i16>(device, config, callback, gain.clone()),
            SampleFormat::I32 => build_output::<i32>(device, config, callback, gain.clone()),
            SampleFormat::F32 => build_output::<f32>(device, config, callback, gain.clone()),
            other => Err(DmaError::StreamOpen(format!(
                "unsupported output sample format: {:?}",
                other
            ))),
        }?;

        // Some hosts start streams on build.
        if let Err(e) = stream.pause() {
            log::warn!("failed to pause new output stream: {}", e);
        }

        let obtained = ObtainedSpec {
            encoding: encoding_for(format),
            freq: config.sample_rate.0,
            channels: config.channels,
            sample_frames,
        };
        Ok(Self { stream, obtained, gain })
    }
}

impl PlaybackStream for CpalPlayback {
    fn obtained_spec(&self) -> Result<ObtainedSpec, DmaError> {
        Ok(self.obtained)
    }

    fn resume(&mut self) -> Result<(), DmaError> {
        self.stream
            .play()
            .map_err(|e| DmaError::StreamControl(format!("failed to start output stream: {}", e)))
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain.set(gain);
    }
}

fn build_output<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut callback: PlaybackCallback,
    gain: SharedGain,
) -> Result<cpal::Stream, DmaError>
where
    T: SizedSample + bytemuck::Pod + GainSample,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                {
                    let bytes: &mut [u8] = bytemuck::cast_slice_mut(data);
                    let requested = bytes.len();
                    let mut sink = SliceSink::new(bytes);
                    callback(requested, &mut sink);
                    sink.finish();
                }
                apply_gain(data, gain.get());
            },
            |e| log::error!("Output stream error: {}", e),
            None,
        )
        .map_err(|e| DmaError::StreamOpen(format!("failed to build output stream: {}", e)))
}

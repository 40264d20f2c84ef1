//! cpal input stream for voice capture.
//!
//! Opens the default input device in its native mono, signed 16-bit mode
//! and buffers the raw little-endian bytes in a lock-free ring that the
//! game thread drains without blocking.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};

use dma_audio_core::models::error::DmaError;
use dma_audio_core::traits::audio_backend::CaptureStream;

/// Seconds of audio held before the oldest input is dropped.
pub const CAPTURE_BUFFER_SECONDS: usize = 2;

/// Bytes needed to hold `seconds` of 16-bit audio in `config`.
pub fn capture_buffer_bytes(config: &StreamConfig, seconds: usize) -> usize {
    config.sample_rate.0 as usize * usize::from(config.channels) * 2 * seconds
}

/// An open input stream on the default device.
pub struct CpalCapture {
    stream: cpal::Stream,
    buffered: HeapCons<u8>,
}

impl CpalCapture {
    pub(crate) fn open(device: &cpal::Device, config: &StreamConfig) -> Result<Self, DmaError> {
        let capacity = capture_buffer_bytes(config, CAPTURE_BUFFER_SECONDS);
        let (mut producer, buffered) = HeapRb::<u8>::new(capacity).split();

        let stream = device
            .build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let bytes: &[u8] = bytemuck::cast_slice(data);
                    // whole samples only
                    let room = producer.vacant_len() & !1;
                    producer.push_slice(&bytes[..bytes.len().min(room)]);
                },
                |e| log::error!("Input stream error: {}", e),
                None,
            )
            .map_err(|e| DmaError::StreamOpen(format!("failed to build input stream: {}", e)))?;

        if let Err(e) = stream.pause() {
            log::warn!("failed to pause new input stream: {}", e);
        }

        Ok(Self { stream, buffered })
    }
}

impl CaptureStream for CpalCapture {
    fn clear(&mut self) {
        self.buffered.clear();
    }

    fn resume(&mut self) -> Result<(), DmaError> {
        self.stream
            .play()
            .map_err(|e| DmaError::StreamControl(format!("failed to start input stream: {}", e)))
    }

    fn pause(&mut self) -> Result<(), DmaError> {
        self.stream
            .pause()
            .map_err(|e| DmaError::StreamControl(format!("failed to pause input stream: {}", e)))
    }

    fn available_bytes(&self) -> usize {
        self.buffered.occupied_len()
    }

    fn read(&mut self, data: &mut [u8]) -> usize {
        self.buffered.pop_slice(data)
    }
}

//! Consumer side of the DMA buffer, driven by the host audio thread.

use crate::processing::mixer::SharedDma;
use crate::processing::silence::queue_silence;
use crate::traits::pcm_sink::PcmSink;

/// Deliver exactly `requested` bytes to `sink`, draining the ring from the
/// cursor and wrapping at the end of the buffer.
///
/// Emits silence when the subsystem is uninitialized or the buffer is
/// absent or degenerate. The caller holds the `SharedDma` lock.
pub fn fill(shared: &mut SharedDma, requested: usize, sink: &mut dyn PcmSink) {
    if requested == 0 {
        return;
    }

    let initialized = shared.initialized;
    let buffer = match shared.buffer.as_mut() {
        Some(buffer) if initialized && buffer.byte_len() > 0 && buffer.bytes_per_sample() > 0 => {
            buffer
        }
        _ => {
            queue_silence(sink, requested);
            return;
        }
    };

    let bytes_per_sample = buffer.bytes_per_sample();
    let size = buffer.byte_len();
    let mut remaining = requested;

    while remaining > 0 {
        let mut pos = buffer.position() * bytes_per_sample;
        if pos >= size {
            buffer.set_position(0);
            pos = 0;
        }

        let chunk = remaining.min(size - pos);
        if chunk == 0 {
            break;
        }

        sink.put(&buffer.as_bytes()[pos..pos + chunk]);
        buffer.set_position(buffer.position() + chunk / bytes_per_sample);
        remaining -= chunk;
    }

    if remaining > 0 {
        queue_silence(sink, remaining);
    }

    if buffer.position() * bytes_per_sample >= size {
        buffer.set_position(0);
    }
}

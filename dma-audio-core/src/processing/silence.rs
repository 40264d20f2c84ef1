//! Zero-fill policy shared by the playback and capture bridges.

use crate::traits::pcm_sink::PcmSink;

/// Largest silence block pushed to a sink in one `put`.
pub const SILENCE_CHUNK: usize = 4096;

static SILENCE: [u8; SILENCE_CHUNK] = [0; SILENCE_CHUNK];

/// Push `len` bytes of silence, in blocks of at most `SILENCE_CHUNK`.
pub fn queue_silence(sink: &mut dyn PcmSink, len: usize) {
    let mut remaining = len;
    while remaining > 0 {
        let chunk = remaining.min(SILENCE_CHUNK);
        sink.put(&SILENCE[..chunk]);
        remaining -= chunk;
    }
}

/// Zero every byte of `data` past the first `filled`.
pub fn zero_fill_tail(data: &mut [u8], filled: usize) {
    if filled < data.len() {
        data[filled..].fill(0);
    }
}

/// `PcmSink` over a host-provided output slice.
///
/// Bytes past the end of the slice are dropped.
pub struct SliceSink<'a> {
    out: &'a mut [u8],
    written: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(out: &'a mut [u8]) -> Self {
        Self { out, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Zero whatever the callback left unwritten.
    pub fn finish(self) {
        zero_fill_tail(self.out, self.written);
    }
}

impl PcmSink for SliceSink<'_> {
    fn put(&mut self, bytes: &[u8]) {
        let room = self.out.len() - self.written;
        let n = bytes.len().min(room);
        self.out[self.written..self.written + n].copy_from_slice(&bytes[..n]);
        self.written += n;
    }
}

use parking_lot::MutexGuard;

use crate::processing::ring_buffer::DmaBuffer;

/// State shared between the producer and the host callback.
///
/// Lives behind one `parking_lot::Mutex`. That mutex plays the role of the
/// host stream lock: the playback callback holds it for a whole
/// invocation, and the producer holds it for a whole paint window.
#[derive(Debug, Default)]
pub struct SharedDma {
    pub(crate) initialized: bool,
    pub(crate) buffer: Option<DmaBuffer>,
}

impl SharedDma {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn buffer(&self) -> Option<&DmaBuffer> {
        self.buffer.as_ref()
    }

    /// Read cursor in samples, 0 when no buffer exists.
    pub fn position(&self) -> usize {
        self.buffer.as_ref().map_or(0, DmaBuffer::position)
    }
}

/// Producer write window, opened by `DmaSession::begin_painting` and closed
/// by `DmaSession::submit` (or by dropping it).
///
/// While a guard is alive the callback cannot run, so the producer sees a
/// stable cursor. It must write at cursor-relative offsets and wrap its own
/// write position; the guard never moves the cursor.
pub struct PaintGuard<'a> {
    shared: MutexGuard<'a, SharedDma>,
}

impl<'a> PaintGuard<'a> {
    pub(crate) fn new(shared: MutexGuard<'a, SharedDma>) -> Self {
        Self { shared }
    }

    /// The shared buffer, `None` while uninitialized.
    pub fn buffer_mut(&mut self) -> Option<&mut [u8]> {
        self.shared.buffer.as_mut().map(DmaBuffer::as_bytes_mut)
    }

    pub fn buffer(&self) -> Option<&[u8]> {
        self.shared.buffer.as_ref().map(DmaBuffer::as_bytes)
    }

    pub fn position(&self) -> usize {
        self.shared.position()
    }

    /// Total samples in the ring, 0 while uninitialized.
    pub fn samples(&self) -> usize {
        self.shared.buffer.as_ref().map_or(0, DmaBuffer::samples)
    }
}

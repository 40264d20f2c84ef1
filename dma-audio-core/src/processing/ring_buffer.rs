use crate::models::error::DmaError;

/// Largest ring the session will allocate, 256 MiB. Far above any
/// negotiated size; only a runaway mix-buffer override reaches it.
pub const MAX_BUFFER_BYTES: usize = 1 << 28;

/// The emulated DMA buffer: one contiguous, zero-filled byte block plus a
/// read cursor measured in samples.
///
/// The external mixer paints into the bytes; only the callback bridge
/// moves the cursor, which always names the next unread sample. Wrap in
/// `SharedDma` behind a `parking_lot::Mutex` for cross-thread access.
#[derive(Debug)]
pub struct DmaBuffer {
    data: Vec<u8>,
    bytes_per_sample: usize,
    samples: usize,
    position: usize,
}

impl DmaBuffer {
    /// Allocate `samples * bytes_per_sample` zeroed bytes.
    ///
    /// Allocation failure, size overflow and sizes above `MAX_BUFFER_BYTES`
    /// are reported, never aborted on.
    pub fn allocate(samples: usize, bytes_per_sample: usize) -> Result<Self, DmaError> {
        let bytes = samples
            .checked_mul(bytes_per_sample)
            .ok_or(DmaError::BufferAllocation { bytes: usize::MAX })?;
        if bytes > MAX_BUFFER_BYTES {
            return Err(DmaError::BufferAllocation { bytes });
        }

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| DmaError::BufferAllocation { bytes })?;
        data.resize(bytes, 0);

        Ok(Self {
            data,
            bytes_per_sample,
            samples,
            position: 0,
        })
    }

    /// Total size in bytes (`samples * bytes_per_sample`).
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bytes_per_sample
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Next unread sample, in `[0, samples)`.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

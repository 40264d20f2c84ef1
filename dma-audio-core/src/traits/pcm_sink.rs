/// Destination for bytes the callback bridge delivers to the host.
///
/// Push-model hosts queue whatever is `put`; pull-model hosts wrap their
/// output slice in a `SliceSink`.
pub trait PcmSink {
    fn put(&mut self, bytes: &[u8]);
}

impl PcmSink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

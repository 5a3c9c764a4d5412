/// Pull-source of compressed bytes. The decoder only ever reads forward and
/// rewinds to the start, so the backing store can be a memory buffer here or
/// memory-mapped flash on the playback device.
pub trait Stream {
    /// Copy up to `buf.len()` bytes into `buf`, returning how many were
    /// available. Zero means the stream is exhausted.
    fn fetch(&mut self, buf: &mut [u8]) -> usize;

    /// Move the read cursor back to the first byte.
    fn rewind(&mut self);
}

/// A `Stream` over a byte slice, typically one payload of a memory image.
pub struct MemStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MemStream<'a> {
    pub fn new(data: &'a [u8]) -> MemStream<'a> {
        MemStream { data, pos: 0 }
    }
}

impl Stream for MemStream<'_> {
    fn fetch(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    fn rewind(&mut self) {
        self.pos = 0;
    }
}

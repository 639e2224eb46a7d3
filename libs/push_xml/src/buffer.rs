use alloc::vec::Vec;

/// Input bytes that have been fed but not yet consumed by a token.
///
/// Bytes before the cursor are never looked at again. A [`feed`](Buffer::feed)
/// drops the consumed prefix once it makes up half of the held bytes, or
/// when the new bytes would not fit the allocation otherwise. Tokens only
/// borrow the buffer between feeds, so none outlives its bytes.
#[derive(Debug)]
pub(crate) struct Buffer {
    data: Vec<u8>,
    pos: usize,
}

impl Buffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Buffer {
            data: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    pub(crate) fn feed(&mut self, bytes: &[u8]) {
        let mostly_consumed = self.pos * 2 >= self.data.len();
        let must_grow = self.data.len() + bytes.len() > self.data.capacity();
        if mostly_consumed || must_grow {
            self.compact();
        }
        self.data.extend_from_slice(bytes);
    }

    pub(crate) fn unconsumed(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn consume(&mut self, n: usize) {
        assert!(n <= self.len());
        self.pos += n;
        if self.pos == self.data.len() {
            self.data.clear();
            self.pos = 0;
        }
    }

    pub(crate) fn clear(&mut self) {
        self.data.clear();
        self.pos = 0;
    }

    /// Moves the unconsumed bytes to the beginning of the allocation.
    fn compact(&mut self) {
        if self.pos == 0 {
            return;
        }
        trace!("Compacting {} bytes, dropping {}", self.len(), self.pos);
        self.data.copy_within(self.pos.., 0);
        self.data.truncate(self.data.len() - self.pos);
        self.pos = 0;
    }
}

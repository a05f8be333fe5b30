//! Buffer slices passed to `update` / `finish`.
//!
//! Both types wrap a contiguous byte range plus a `used` cursor. On an
//! [`InputBuffer`] the cursor counts bytes already consumed; on an
//! [`OutputBuffer`] it counts bytes already written. Every streaming call
//! advances the cursors to report progress, and callers are expected to
//! re-present the unconsumed remainder (plus fresh data or space) on the next
//! call.

// ─────────────────────────────────────────────────────────────────────────────
// InputBuffer
// ─────────────────────────────────────────────────────────────────────────────

/// A borrowed input byte range with a consumption cursor.
#[derive(Debug)]
pub struct InputBuffer<'a> {
    data: &'a [u8],
    used: usize,
}

impl<'a> InputBuffer<'a> {
    pub fn new(data: &'a [u8]) -> InputBuffer<'a> {
        InputBuffer { data, used: 0 }
    }

    /// Total size of the underlying range in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Bytes consumed so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// The full underlying range, including consumed bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The unconsumed remainder.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.used..]
    }

    /// True when every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.used >= self.data.len()
    }

    /// Advance the consumption cursor by `n` bytes.
    ///
    /// # Panics
    /// Panics if `n` exceeds the unconsumed remainder.
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.data.len() - self.used, "consume past end of input");
        self.used += n;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OutputBuffer
// ─────────────────────────────────────────────────────────────────────────────

/// A borrowed output byte range with a write cursor.
#[derive(Debug)]
pub struct OutputBuffer<'a> {
    data: &'a mut [u8],
    used: usize,
}

impl<'a> OutputBuffer<'a> {
    pub fn new(data: &'a mut [u8]) -> OutputBuffer<'a> {
        OutputBuffer { data, used: 0 }
    }

    /// Total capacity of the underlying range in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes written so far.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Unwritten capacity in bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.used
    }

    /// True when no space is left.
    pub fn is_full(&self) -> bool {
        self.used >= self.data.len()
    }

    /// The bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.data[..self.used]
    }

    /// Copy as much of `src` as fits, returning the number of bytes copied.
    pub fn push(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.remaining());
        self.data[self.used..self.used + n].copy_from_slice(&src[..n]);
        self.used += n;
        n
    }

    /// Append a single byte. Returns `false` when the buffer is full.
    pub fn push_byte(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.data[self.used] = byte;
        self.used += 1;
        true
    }
}

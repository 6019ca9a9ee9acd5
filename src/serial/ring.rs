//! Fixed-capacity byte ring buffer
//!
//! One generic type serves both host-link directions. The producer owns the
//! insert index and the consumer owns the remove index; one slot is kept
//! empty so that `insert == remove` always means "empty".
//!
//! ```text
//!   remove            insert
//!     ▼                 ▼
//! ┌───┬───┬───┬───┬───┬───┬───┬───┐
//! │   │ a │ b │ c │ d │   │   │   │   len = 4, free = N - 4 - 1
//! └───┴───┴───┴───┴───┴───┴───┴───┘
//! ```
//!
//! The buffer itself is not shared; the transport that owns it is reached
//! from both execution contexts through a `critical_section::Mutex`, so
//! every method here runs with the other context masked.

/// Circular byte buffer holding at most `N - 1` bytes
#[derive(Clone)]
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    insert: usize,
    remove: usize,
}

impl<const N: usize> RingBuffer<N> {
    const VALID: () = assert!(N >= 2, "ring buffer needs at least two slots");

    /// Usable capacity in bytes
    pub const CAPACITY: usize = N - 1;

    /// Create an empty buffer
    #[must_use]
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID;
        Self {
            buf: [0; N],
            insert: 0,
            remove: 0,
        }
    }

    const fn advance(index: usize, by: usize) -> usize {
        let next = index + by;
        if next >= N {
            next - N
        } else {
            next
        }
    }

    /// Bytes waiting to be removed
    #[must_use]
    pub const fn len(&self) -> usize {
        if self.insert >= self.remove {
            self.insert - self.remove
        } else {
            N - self.remove + self.insert
        }
    }

    /// Bytes that can still be inserted
    #[must_use]
    pub const fn free(&self) -> usize {
        N - 1 - self.len()
    }

    /// True when nothing is queued
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.insert == self.remove
    }

    /// True when no further byte can be inserted
    #[must_use]
    pub const fn is_full(&self) -> bool {
        Self::advance(self.insert, 1) == self.remove
    }

    /// Insert one byte; returns false without touching the buffer if full
    pub fn try_push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buf[self.insert] = byte;
        self.insert = Self::advance(self.insert, 1);
        true
    }

    /// Insert the longest prefix of `bytes` that fits; returns its length
    ///
    /// The caller owns the shortfall and must treat it as dropped data.
    pub fn try_push_block(&mut self, bytes: &[u8]) -> usize {
        let count = bytes.len().min(self.free());
        let tail = count.min(N - self.insert);
        self.buf[self.insert..self.insert + tail].copy_from_slice(&bytes[..tail]);
        self.buf[..count - tail].copy_from_slice(&bytes[tail..count]);
        self.insert = Self::advance(self.insert, count);
        count
    }

    /// Remove the oldest byte
    pub fn try_pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buf[self.remove];
        self.remove = Self::advance(self.remove, 1);
        Some(byte)
    }

    /// Fill `out` completely or consume nothing
    pub fn try_pop_block(&mut self, out: &mut [u8]) -> bool {
        let count = out.len();
        if count > self.len() {
            return false;
        }
        let tail = count.min(N - self.remove);
        out[..tail].copy_from_slice(&self.buf[self.remove..self.remove + tail]);
        out[tail..].copy_from_slice(&self.buf[..count - tail]);
        self.remove = Self::advance(self.remove, count);
        true
    }

    /// Look at a queued byte without removing it; offset 0 is the oldest
    #[must_use]
    pub fn peek(&self, offset: usize) -> Option<u8> {
        if offset >= self.len() {
            return None;
        }
        Some(self.buf[Self::advance(self.remove, offset)])
    }

    /// True if the queued bytes are exactly `expected`
    #[must_use]
    pub fn holds_exactly(&self, expected: &[u8]) -> bool {
        self.len() == expected.len()
            && expected
                .iter()
                .enumerate()
                .all(|(i, &b)| self.peek(i) == Some(b))
    }

    /// Discard everything queued
    pub fn clear(&mut self) {
        self.remove = self.insert;
    }

    /// Reset both indices, as after power-on
    pub fn reset(&mut self) {
        self.insert = 0;
        self.remove = 0;
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for RingBuffer<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &Self::CAPACITY)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_block_across_end() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        assert_eq!(ring.try_push_block(b"abcde"), 5);
        let mut out = [0u8; 4];
        assert!(ring.try_pop_block(&mut out));
        assert_eq!(&out, b"abcd");

        // insert is at 5, so this write splits 3 + 3
        assert_eq!(ring.try_push_block(b"fghijk"), 6);
        assert_eq!(ring.len(), 7);
        assert!(ring.is_full());

        let mut rest = [0u8; 7];
        assert!(ring.try_pop_block(&mut rest));
        assert_eq!(&rest, b"efghijk");
        assert!(ring.is_empty());
    }

    #[test]
    fn peek_follows_wrap() {
        let mut ring: RingBuffer<4> = RingBuffer::new();
        ring.try_push_block(b"xyz");
        ring.try_pop();
        ring.try_pop();
        ring.try_push_block(b"12");
        assert_eq!(ring.peek(0), Some(b'z'));
        assert_eq!(ring.peek(1), Some(b'1'));
        assert_eq!(ring.peek(2), Some(b'2'));
        assert_eq!(ring.peek(3), None);
    }
}

//! Fixed-capacity byte FIFO
//!
//! Each physical line owns one ring buffer for its inbound data. The
//! buffer never grows: when it is full, incoming bytes are silently
//! discarded. That is the defined backpressure policy for a terminal
//! line, not an error condition, so `push` reports the drop through its
//! return value instead of panicking or reallocating.

use std::collections::VecDeque;

/// A bounded byte FIFO with drop-on-overflow semantics.
///
/// Not internally synchronized; callers must serialize access.
#[derive(Debug)]
pub struct RingBuffer {
    buf: VecDeque<u8>,
    capacity: usize,
}

impl RingBuffer {
    /// Create a buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one byte. Returns `false` if the buffer is full and the
    /// byte was dropped.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.buf.len() >= self.capacity {
            return false;
        }
        self.buf.push_back(byte);
        true
    }

    /// Remove and return the oldest byte, if any.
    pub fn pop(&mut self) -> Option<u8> {
        self.buf.pop_front()
    }

    /// Append as many bytes from `data` as fit, preserving order.
    /// Returns the number accepted; the remainder is dropped.
    pub fn push_slice(&mut self, data: &[u8]) -> usize {
        let room = self.capacity - self.buf.len();
        let take = data.len().min(room);
        self.buf.extend(&data[..take]);
        take
    }

    /// Remove up to `max` bytes in FIFO order.
    pub fn pop_chunk(&mut self, max: usize) -> Vec<u8> {
        let take = max.min(self.buf.len());
        self.buf.drain(..take).collect()
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// `true` if a further `push` would drop.
    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.capacity
    }

    /// Configured maximum byte count.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn push_pop_preserves_order() {
        let mut rb = RingBuffer::new(4);
        assert!(rb.push(1));
        assert!(rb.push(2));
        assert!(rb.push(3));
        assert_eq!(rb.pop(), Some(1));
        assert_eq!(rb.pop(), Some(2));
        assert_eq!(rb.pop(), Some(3));
        assert_eq!(rb.pop(), None);
    }

    #[test]
    fn push_beyond_capacity_drops() {
        let mut rb = RingBuffer::new(2);
        assert!(rb.push(b'a'));
        assert!(rb.push(b'b'));
        assert!(!rb.push(b'c'));
        assert!(rb.is_full());
        assert_eq!(rb.pop_chunk(8), b"ab");
    }

    #[test]
    fn push_slice_accepts_what_fits() {
        let mut rb = RingBuffer::new(3);
        assert_eq!(rb.push_slice(b"hello"), 3);
        assert_eq!(rb.len(), 3);
        assert_eq!(rb.pop_chunk(8), b"hel");
        assert!(rb.is_empty());
    }

    #[test]
    fn pop_chunk_respects_max() {
        let mut rb = RingBuffer::new(8);
        rb.push_slice(b"abcdef");
        assert_eq!(rb.pop_chunk(2), b"ab");
        assert_eq!(rb.pop_chunk(100), b"cdef");
        assert_eq!(rb.pop_chunk(1), b"");
    }

    #[test]
    fn zero_capacity_drops_everything() {
        let mut rb = RingBuffer::new(0);
        assert!(!rb.push(1));
        assert_eq!(rb.push_slice(b"xy"), 0);
        assert!(rb.is_empty());
        assert!(rb.is_full());
    }

    #[test]
    fn interleaved_refill_keeps_order() {
        let mut rb = RingBuffer::new(4);
        rb.push_slice(b"abcd");
        assert_eq!(rb.pop_chunk(2), b"ab");
        assert_eq!(rb.push_slice(b"ef"), 2);
        assert_eq!(rb.pop_chunk(8), b"cdef");
    }

    proptest! {
        #[test]
        fn fifo_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
            let mut rb = RingBuffer::new(256);
            prop_assert_eq!(rb.push_slice(&data), data.len());
            prop_assert_eq!(rb.pop_chunk(data.len()), data);
        }

        #[test]
        fn overflow_never_corrupts_buffered_bytes(
            data in prop::collection::vec(any::<u8>(), 0..128),
            capacity in 0usize..64,
        ) {
            let mut rb = RingBuffer::new(capacity);
            let accepted = rb.push_slice(&data);
            prop_assert_eq!(accepted, data.len().min(capacity));
            prop_assert_eq!(rb.pop_chunk(capacity), &data[..accepted]);
        }

        #[test]
        fn len_tracks_pushes_and_pops(
            ops in prop::collection::vec(prop::option::of(any::<u8>()), 0..64)
        ) {
            let mut rb = RingBuffer::new(16);
            let mut expected = 0usize;
            for op in ops {
                match op {
                    Some(b) => {
                        if rb.push(b) {
                            expected += 1;
                        }
                    }
                    None => {
                        if rb.pop().is_some() {
                            expected -= 1;
                        }
                    }
                }
                prop_assert_eq!(rb.len(), expected);
                prop_assert!(rb.len() <= rb.capacity());
            }
        }
    }
}

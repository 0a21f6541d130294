//! Fixed-capacity ring buffer holding the most recent microphone samples.
//!
//! The microphone callback pushes every chunk into a [`RingBuffer`]; the
//! waveform display reads a chronological [`snapshot`](RingBuffer::snapshot)
//! of it once per frame.  Old samples are overwritten, so the buffer always
//! describes the last `capacity` samples of the live stream and never grows.
//!
//! This buffer is lossy and is never used to build a recording;
//! the capture session keeps every chunk separately.
//!
//! # Example
//!
//! ```rust
//! use shadow_practice::audio::RingBuffer;
//!
//! let mut buf = RingBuffer::new(4);
//! buf.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);
//! assert_eq!(buf.snapshot(), vec![2.0, 3.0, 4.0, 5.0]);
//! ```

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// A fixed-capacity circular buffer.
pub struct RingBuffer<T> {
    buf: Vec<T>,
    /// Index of the *next* write position.
    head: usize,
    /// Number of valid samples currently stored (≤ capacity).
    len: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a new ring buffer with the given `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            buf: vec![T::default(); capacity],
            head: 0,
            len: 0,
        }
    }

    /// Append `data`, overwriting the oldest samples once full.
    pub fn push_slice(&mut self, data: &[T]) {
        let capacity = self.buf.len();
        // Only the tail of an oversized slice can survive.
        let data = if data.len() > capacity {
            &data[data.len() - capacity..]
        } else {
            data
        };
        for &item in data {
            self.buf[self.head] = item;
            self.head = (self.head + 1) % capacity;
        }
        self.len = (self.len + data.len()).min(capacity);
    }

    /// Copy of the stored samples in chronological order.  The buffer is left
    /// untouched.
    pub fn snapshot(&self) -> Vec<T> {
        let capacity = self.buf.len();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len)
            .map(|i| self.buf[(start + i) % capacity])
            .collect()
    }

    /// Discard all samples.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_within_capacity() {
        let mut buf = RingBuffer::new(8);
        buf.push_slice(&[1.0_f32, 2.0, 3.0]);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.snapshot(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn snapshot_does_not_consume() {
        let mut buf = RingBuffer::new(4);
        buf.push_slice(&[1.0_f32, 2.0]);
        let _ = buf.snapshot();
        assert_eq!(buf.snapshot(), vec![1.0, 2.0]);
    }

    #[test]
    fn overflow_keeps_newest_in_order() {
        let mut buf = RingBuffer::new(3);
        buf.push_slice(&[1.0_f32, 2.0, 3.0]);
        buf.push_slice(&[4.0, 5.0]);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.snapshot(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn oversized_slice_keeps_tail() {
        let mut buf = RingBuffer::new(4);
        buf.push_slice(&[9.0_f32]);
        buf.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(buf.snapshot(), vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn clear_resets_state() {
        let mut buf = RingBuffer::new(4);
        buf.push_slice(&[1.0_f32, 2.0, 3.0, 4.0, 5.0]);
        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.snapshot().is_empty());

        buf.push_slice(&[9.0_f32]);
        assert_eq!(buf.snapshot(), vec![9.0]);
    }

    #[test]
    fn capacity_reported_correctly() {
        let buf: RingBuffer<f32> = RingBuffer::new(1024);
        assert_eq!(buf.capacity(), 1024);
    }

    #[test]
    #[should_panic(expected = "RingBuffer capacity must be > 0")]
    fn zero_capacity_panics() {
        let _buf: RingBuffer<f32> = RingBuffer::new(0);
    }
}

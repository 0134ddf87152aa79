//! Reusable byte buffer for the fast send path.
//!
//! The fast path copies each payload into a buffer it keeps between calls
//! instead of allocating a new one per send.  The buffer only ever grows:
//!
//! ```text
//! capacity 256  ── stage 40 bytes  ──► capacity 256  (no allocation)
//! capacity 256  ── stage 900 bytes ──► capacity 900  (one new buffer)
//! capacity 900  ── stage 40 bytes  ──► capacity 900  (no allocation)
//! ```
//!
//! When a payload does not fit, a brand-new buffer replaces the old one
//! rather than resizing it in place, so the old contents are never observed
//! half-copied.
//!
//! # Ownership
//!
//! A `SendBuffer` is owned by exactly one endpoint and staged through
//! `&mut self`; the borrow checker guarantees a single writer.

use tracing::trace;

/// Smallest capacity a send buffer is created with.
pub const MIN_SEND_BUFFER_CAPACITY: usize = 256;

/// A grow-only staging buffer.
#[derive(Debug)]
pub struct SendBuffer {
    buf: Vec<u8>,
    allocations: u64,
}

impl SendBuffer {
    /// Creates a buffer with [`MIN_SEND_BUFFER_CAPACITY`] bytes.
    pub fn new() -> Self {
        Self::with_capacity(MIN_SEND_BUFFER_CAPACITY)
    }

    /// Creates a buffer with at least `capacity` bytes (never below the
    /// minimum).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(MIN_SEND_BUFFER_CAPACITY)],
            allocations: 1,
        }
    }

    /// Current capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of buffers allocated over this value's lifetime, including the
    /// initial one.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Copies `payload` into the buffer and returns the staged slice.
    ///
    /// Allocates a replacement buffer only when `payload` is larger than the
    /// current capacity.
    pub fn stage(&mut self, payload: &[u8]) -> &[u8] {
        if payload.len() > self.buf.len() {
            trace!(
                old = self.buf.len(),
                new = payload.len(),
                "replacing fast-path send buffer"
            );
            self.buf = vec![0u8; payload.len()];
            self.allocations += 1;
        }
        let staged = &mut self.buf[..payload.len()];
        staged.copy_from_slice(payload);
        staged
    }
}

impl Default for SendBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_has_minimum_capacity() {
        // Arrange / Act
        let buf = SendBuffer::new();

        // Assert
        assert_eq!(buf.capacity(), MIN_SEND_BUFFER_CAPACITY);
        assert_eq!(buf.allocations(), 1);
    }

    #[test]
    fn test_with_capacity_never_goes_below_minimum() {
        assert_eq!(SendBuffer::with_capacity(8).capacity(), MIN_SEND_BUFFER_CAPACITY);
        assert_eq!(SendBuffer::with_capacity(4096).capacity(), 4096);
    }

    #[test]
    fn test_stage_within_capacity_does_not_allocate() {
        // Arrange
        let mut buf = SendBuffer::new();

        // Act
        for len in [0usize, 1, 7, 128, MIN_SEND_BUFFER_CAPACITY] {
            let payload = vec![0xAB; len];
            let staged = buf.stage(&payload);
            assert_eq!(staged, payload.as_slice());
        }

        // Assert
        assert_eq!(buf.allocations(), 1, "no payload exceeded capacity");
        assert_eq!(buf.capacity(), MIN_SEND_BUFFER_CAPACITY);
    }

    #[test]
    fn test_stage_larger_payload_allocates_exactly_once() {
        // Arrange
        let mut buf = SendBuffer::new();
        let big = vec![0x55; 1_000];

        // Act
        buf.stage(&big);
        buf.stage(&big);
        buf.stage(&big[..500]);

        // Assert
        assert_eq!(buf.allocations(), 2);
        assert_eq!(buf.capacity(), 1_000);
    }

    #[test]
    fn test_capacity_never_shrinks() {
        // Arrange
        let mut buf = SendBuffer::new();
        let mut last = buf.capacity();

        // Act / Assert
        for len in [10usize, 300, 20, 2_000, 1, 1_999, 5_000, 3] {
            buf.stage(&vec![1u8; len]);
            assert!(buf.capacity() >= last, "capacity shrank at len {len}");
            last = buf.capacity();
        }
        assert_eq!(last, 5_000);
    }

    #[test]
    fn test_stage_returns_exact_payload_after_growth() {
        let mut buf = SendBuffer::new();
        buf.stage(&vec![9u8; 600]);
        let staged = buf.stage(b"TRIGGER");
        assert_eq!(staged, b"TRIGGER");
    }
}

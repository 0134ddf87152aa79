//! Lock-free rotation cursor for round-robin dispatch.
//!
//! # What does the cursor do? (for beginners)
//!
//! Round-robin dispatch sends each trigger to exactly one target, moving on
//! to the next target on the following trigger:
//!
//! ```text
//! targets: [A, B, C]
//! call:     1  2  3  4  5 …
//! hits:     A  B  C  A  B …
//! ```
//!
//! The cursor remembers "which target is next".  It is an `AtomicUsize`, so
//! the dispatcher can advance it through `&self` without a lock, and the
//! outer layer never has to own or mutate it.
//!
//! # Changing list lengths
//!
//! The enabled-target list can change between calls (a user toggles a
//! target off).  The cursor always reduces its stored position modulo the
//! current length, so it never indexes out of bounds; after a shrink the
//! rotation simply continues from the wrapped position.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Rotating index into a list of targets.
#[derive(Debug, Default)]
pub struct RotationCursor {
    next: AtomicUsize,
}

impl RotationCursor {
    /// Creates a cursor pointing at index 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index to use for a list of `len` items and advances the
    /// cursor, wrapping at `len`.
    ///
    /// Returns `None` when `len` is 0; the cursor is left untouched.
    pub fn advance(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        // `fetch_update` retries on contention, so concurrent callers each
        // get a distinct index.  The closure never returns `None`, so the
        // `Err` arm is unreachable; both arms carry the previous value.
        let prev = match self.next.fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
            Some((cur % len + 1) % len)
        }) {
            Ok(prev) | Err(prev) => prev,
        };
        Some(prev % len)
    }

    /// Returns the position the next call to [`advance`](Self::advance)
    /// will start from, without advancing.
    pub fn peek(&self) -> usize {
        self.next.load(Ordering::Acquire)
    }

    /// Moves the cursor back to index 0.
    pub fn reset(&self) {
        self.next.store(0, Ordering::Release);
    }
}

//! Monotonic nanosecond clock.
//!
//! Fast-path sends report *when* the datagram left the socket as a plain
//! integer so callers can compare it against their own trigger timestamp
//! without touching `Instant`.  The values come from a process-wide
//! monotonic anchor, so they never go backwards and are unaffected by
//! wall-clock adjustments (NTP, manual changes).
//!
//! The absolute value has no meaning outside the current process; only
//! differences between two readings are meaningful.

use std::sync::OnceLock;
use std::time::Instant;

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Returns the number of nanoseconds elapsed since the process-wide anchor.
///
/// The anchor is captured on first use.  Readings are monotonically
/// non-decreasing across all threads.
pub fn monotonic_nanos() -> u64 {
    let anchor = ANCHOR.get_or_init(Instant::now);
    // u64 nanoseconds covers ~584 years of uptime.
    anchor.elapsed().as_nanos() as u64
}

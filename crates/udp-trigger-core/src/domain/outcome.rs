//! Send stamps and per-target dispatch outcomes.
//!
//! The fast send path reports its result as a single integer: the
//! monotonic-nanosecond time at which the datagram left the socket, or `-1`
//! when it did not.  [`SendStamp`] wraps that integer so the sentinel cannot
//! be mistaken for a timestamp, while staying a plain `Copy` value that
//! costs nothing to return.

use std::collections::HashMap;
use std::fmt;

use crate::domain::target::TargetId;

/// Completion timestamp of a fast-path send, or the failure sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SendStamp(i64);

impl SendStamp {
    /// The failure sentinel.
    pub const FAILED: SendStamp = SendStamp(-1);

    /// A successful send completed at `nanos` on the monotonic clock.
    pub fn at(nanos: u64) -> Self {
        // Saturate rather than wrap into the sentinel range.
        Self(i64::try_from(nanos).unwrap_or(i64::MAX))
    }

    /// The raw value: nanoseconds, or `-1`.
    pub fn as_raw(self) -> i64 {
        self.0
    }

    pub fn is_failure(self) -> bool {
        self.0 < 0
    }

    /// The completion time, or `None` for the sentinel.
    pub fn nanos(self) -> Option<u64> {
        u64::try_from(self.0).ok()
    }
}

impl fmt::Display for SendStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.nanos() {
            Some(ns) => write!(f, "{ns}ns"),
            None => f.write_str("failed"),
        }
    }
}

/// Outcome of one target within a dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub target_id: TargetId,
    /// `host:port` of the target.
    pub key: String,
    pub stamp: SendStamp,
}

/// All outcomes of one dispatch call, in the order the targets were listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcomes {
    entries: Vec<TargetOutcome>,
}

impl DispatchOutcomes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: TargetOutcome) {
        self.entries.push(outcome);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.entries.iter()
    }

    /// Looks up the stamp recorded for `key` (`host:port`).
    pub fn get(&self, key: &str) -> Option<SendStamp> {
        self.entries.iter().find(|o| o.key == key).map(|o| o.stamp)
    }

    /// Number of targets that failed.
    pub fn failure_count(&self) -> usize {
        self.entries.iter().filter(|o| o.stamp.is_failure()).count()
    }

    /// Collapses the outcomes into a `host:port → stamp` map.
    ///
    /// Two targets with the same key collapse into one entry (the later
    /// one wins).
    pub fn into_map(self) -> HashMap<String, SendStamp> {
        self.entries.into_iter().map(|o| (o.key, o.stamp)).collect()
    }
}

impl IntoIterator for DispatchOutcomes {
    type Item = TargetOutcome;
    type IntoIter = std::vec::IntoIter<TargetOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_failed_stamp_is_minus_one() {
        assert_eq!(SendStamp::FAILED.as_raw(), -1);
        assert!(SendStamp::FAILED.is_failure());
        assert_eq!(SendStamp::FAILED.nanos(), None);
    }

    #[test]
    fn test_success_stamp_round_trips_nanos() {
        let s = SendStamp::at(123_456);
        assert!(!s.is_failure());
        assert_eq!(s.nanos(), Some(123_456));
        assert_eq!(s.to_string(), "123456ns");
    }

    #[test]
    fn test_huge_nanos_saturate_instead_of_becoming_sentinel() {
        let s = SendStamp::at(u64::MAX);
        assert!(!s.is_failure());
        assert_eq!(s.as_raw(), i64::MAX);
    }

    #[test]
    fn test_outcomes_lookup_and_failure_count() {
        // Arrange
        let mut outcomes = DispatchOutcomes::new();
        outcomes.push(TargetOutcome {
            target_id: Uuid::new_v4(),
            key: "10.0.0.1:5000".to_string(),
            stamp: SendStamp::at(10),
        });
        outcomes.push(TargetOutcome {
            target_id: Uuid::new_v4(),
            key: "10.0.0.2:5000".to_string(),
            stamp: SendStamp::FAILED,
        });

        // Act / Assert
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes.failure_count(), 1);
        assert_eq!(outcomes.get("10.0.0.2:5000"), Some(SendStamp::FAILED));
        assert_eq!(outcomes.get("10.0.0.3:5000"), None);

        let map = outcomes.into_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["10.0.0.1:5000"], SendStamp::at(10));
    }

    #[test]
    fn test_empty_outcomes() {
        let outcomes = DispatchOutcomes::default();
        assert!(outcomes.is_empty());
        assert!(outcomes.into_map().is_empty());
    }
}

//! DispatchTargetsUseCase: fans one payload out to many targets.
//!
//! This use case sits between the caller's target list and whatever
//! actually puts bytes on the wire.  It picks the enabled targets, drives
//! the chosen [`DispatchMode`], and writes the result of every attempt back
//! onto the [`Target`] it belongs to.
//!
//! # Architecture
//!
//! The use case depends only on the [`DatagramTransmitter`] trait.  The
//! infrastructure implementation is `TransportClient`; tests inject
//! recording doubles that fail on demand.
//!
//! # Mode summary
//!
//! | Mode         | Send path | Targets per call | Delay         |
//! |--------------|-----------|------------------|---------------|
//! | Sequential   | safe      | all enabled      | between sends |
//! | Parallel     | safe      | all enabled      | none          |
//! | RoundRobin   | fast      | exactly one      | none          |
//!
//! An empty enabled set is not an error: every mode returns an empty
//! [`DispatchOutcomes`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use futures_util::future::join_all;
use udp_trigger_core::{
    clock::monotonic_nanos, AttemptOutcome, DispatchMode, DispatchOutcomes, RotationCursor,
    SendStamp, Target, TargetOutcome, TransportError,
};

/// Something that can put a payload on the wire to an arbitrary destination.
///
/// `send_to_host` is the safe path: it may resolve names, lock, and
/// allocate, and it may be called from several tasks at once.
/// `send_fast_to` is the fast path: it takes `&mut self`, never suspends,
/// and only accepts an already-resolved address.
#[async_trait]
pub trait DatagramTransmitter: Send + Sync {
    /// Sends `payload` to `host:port` through the safe path.
    async fn send_to_host(&self, payload: &[u8], host: &str, port: u16)
        -> Result<(), TransportError>;

    /// Sends `payload` to `addr` through the fast path.
    fn send_fast_to(&mut self, payload: &[u8], addr: SocketAddr) -> SendStamp;
}

/// Multi-target dispatcher.
///
/// Owns the round-robin rotation state so the outer layer only ever reads
/// outcomes; it never has to track "whose turn is next".
#[derive(Debug, Default)]
pub struct DispatchTargetsUseCase {
    cursor: RotationCursor,
    delay: Duration,
}

impl DispatchTargetsUseCase {
    /// Creates a dispatcher with the inter-send delay used by sequential mode.
    pub fn new(delay: Duration) -> Self {
        Self {
            cursor: RotationCursor::new(),
            delay,
        }
    }

    /// The delay sequential mode waits between two sends.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restarts round-robin rotation at the first enabled target.
    pub fn reset_rotation(&self) {
        self.cursor.reset();
    }

    /// Sends `payload` to the enabled subset of `targets` using `mode`.
    ///
    /// Every attempted target gets its `last_outcome` / `last_attempt_at`
    /// updated.  Disabled targets are left untouched.
    pub async fn dispatch<T>(
        &self,
        transmitter: &mut T,
        payload: &[u8],
        targets: &mut [Target],
        mode: DispatchMode,
    ) -> DispatchOutcomes
    where
        T: DatagramTransmitter + ?Sized,
    {
        match mode {
            DispatchMode::Sequential => {
                self.dispatch_sequential(&*transmitter, payload, targets)
                    .await
            }
            DispatchMode::Parallel => self.dispatch_parallel(&*transmitter, payload, targets).await,
            DispatchMode::RoundRobin => self.dispatch_round_robin(transmitter, payload, targets),
        }
    }

    /// Sequential mode: enabled targets in list order, waiting the configured
    /// delay between consecutive sends.  A failure never stops the loop.
    pub async fn dispatch_sequential<T>(
        &self,
        transmitter: &T,
        payload: &[u8],
        targets: &mut [Target],
    ) -> DispatchOutcomes
    where
        T: DatagramTransmitter + ?Sized,
    {
        let mut outcomes = DispatchOutcomes::new();
        let mut first = true;

        for target in targets.iter_mut().filter(|t| t.enabled) {
            if !first && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            first = false;

            let attempt = attempt_safe(transmitter, payload, &target.host, target.port).await;
            outcomes.push(record_safe_result(target, attempt));
        }

        outcomes
    }

    /// Parallel mode: every enabled target at once; results are collected
    /// after all sends finish, each stamped with its own completion time.
    /// One target failing has no effect on the others.
    pub async fn dispatch_parallel<T>(
        &self,
        transmitter: &T,
        payload: &[u8],
        targets: &mut [Target],
    ) -> DispatchOutcomes
    where
        T: DatagramTransmitter + ?Sized,
    {
        // Snapshot the addresses so the futures do not borrow `targets`,
        // which is written to once they complete.
        let enabled: Vec<(usize, String, u16)> = targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.enabled)
            .map(|(i, t)| (i, t.host.clone(), t.port))
            .collect();

        let sends = enabled
            .iter()
            .map(|(_, host, port)| attempt_safe(transmitter, payload, host, *port));
        let attempts = join_all(sends).await;

        let mut outcomes = DispatchOutcomes::new();
        for ((index, _, _), attempt) in enabled.into_iter().zip(attempts) {
            outcomes.push(record_safe_result(&mut targets[index], attempt));
        }
        outcomes
    }

    /// Round-robin mode: exactly one enabled target per call, through the
    /// fast path, advancing the rotation afterwards.
    ///
    /// Targets must carry an IP literal; a host name cannot be resolved
    /// without suspending and is recorded as a failure.
    pub fn dispatch_round_robin<T>(
        &self,
        transmitter: &mut T,
        payload: &[u8],
        targets: &mut [Target],
    ) -> DispatchOutcomes
    where
        T: DatagramTransmitter + ?Sized,
    {
        let enabled: Vec<usize> = targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.enabled)
            .map(|(i, _)| i)
            .collect();

        let mut outcomes = DispatchOutcomes::new();
        let Some(slot) = self.cursor.advance(enabled.len()) else {
            return outcomes;
        };

        let target = &mut targets[enabled[slot]];
        outcomes.push(send_fast_and_record(transmitter, payload, target));
        outcomes
    }

    /// Sends `payload` to each of `targets` in order through the safe path,
    /// sleeping `delay` between sends, and returns one result per target.
    ///
    /// Unlike [`dispatch`](Self::dispatch) this ignores the enabled flag and
    /// does not touch target status: the caller passed exactly the list it
    /// wants.
    pub async fn send_to_multiple<T>(
        &self,
        transmitter: &T,
        payload: &[u8],
        targets: &[Target],
        delay: Duration,
    ) -> Vec<Result<(), TransportError>>
    where
        T: DatagramTransmitter + ?Sized,
    {
        let mut results = Vec::with_capacity(targets.len());
        for (i, target) in targets.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            results.push(
                transmitter
                    .send_to_host(payload, &target.host, target.port)
                    .await,
            );
        }
        results
    }

    /// Sends `payload` to every one of `targets` through the fast path and
    /// returns `host:port → stamp`.
    pub fn send_fast_multiple<T>(
        &self,
        transmitter: &mut T,
        payload: &[u8],
        targets: &[Target],
    ) -> HashMap<String, SendStamp>
    where
        T: DatagramTransmitter + ?Sized,
    {
        targets
            .iter()
            .map(|t| {
                let stamp = match t.socket_addr() {
                    Some(addr) => transmitter.send_fast_to(payload, addr),
                    None => SendStamp::FAILED,
                };
                (t.key(), stamp)
            })
            .collect()
    }
}

/// A finished safe-path send and the moment it finished.
struct SafeAttempt {
    result: Result<(), TransportError>,
    finished_nanos: u64,
    finished_at: SystemTime,
}

async fn attempt_safe<T>(transmitter: &T, payload: &[u8], host: &str, port: u16) -> SafeAttempt
where
    T: DatagramTransmitter + ?Sized,
{
    let result = transmitter.send_to_host(payload, host, port).await;
    SafeAttempt {
        result,
        finished_nanos: monotonic_nanos(),
        finished_at: SystemTime::now(),
    }
}

/// Converts a safe-path attempt into a stamp and writes it onto the target.
fn record_safe_result(target: &mut Target, attempt: SafeAttempt) -> TargetOutcome {
    let stamp = match attempt.result {
        Ok(()) => {
            target.record_attempt_at(AttemptOutcome::Sent, attempt.finished_at);
            SendStamp::at(attempt.finished_nanos)
        }
        Err(e) => {
            target.record_attempt_at(
                AttemptOutcome::Failed {
                    reason: e.to_string(),
                },
                attempt.finished_at,
            );
            SendStamp::FAILED
        }
    };
    TargetOutcome {
        target_id: target.id,
        key: target.key(),
        stamp,
    }
}

fn send_fast_and_record<T>(transmitter: &mut T, payload: &[u8], target: &mut Target) -> TargetOutcome
where
    T: DatagramTransmitter + ?Sized,
{
    let stamp = match target.socket_addr() {
        Some(addr) => transmitter.send_fast_to(payload, addr),
        None => SendStamp::FAILED,
    };
    let outcome = if stamp.is_failure() {
        let reason = match target.socket_addr() {
            Some(addr) => format!("fast send to {addr} failed"),
            None => format!("{} is not an IP address", target.host),
        };
        AttemptOutcome::Failed { reason }
    } else {
        AttemptOutcome::Sent
    };
    target.record_attempt(outcome);
    TargetOutcome {
        target_id: target.id,
        key: target.key(),
        stamp,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Instant;

    // ── Test doubles ──────────────────────────────────────────────────────────

    /// Records every send and fails for hosts listed in `failing_hosts`.
    #[derive(Default)]
    struct RecordingTransmitter {
        safe_sends: Mutex<Vec<(String, u16, Vec<u8>)>>,
        fast_sends: Vec<(SocketAddr, Vec<u8>)>,
        failing_hosts: HashSet<String>,
        safe_delay: Option<Duration>,
        host_delays: HashMap<String, Duration>,
        next_stamp: u64,
    }

    impl RecordingTransmitter {
        fn failing(hosts: &[&str]) -> Self {
            Self {
                failing_hosts: hosts.iter().map(|h| h.to_string()).collect(),
                ..Default::default()
            }
        }

        fn safe_hosts(&self) -> Vec<String> {
            self.safe_sends
                .lock()
                .unwrap()
                .iter()
                .map(|(h, _, _)| h.clone())
                .collect()
        }
    }

    #[async_trait]
    impl DatagramTransmitter for RecordingTransmitter {
        async fn send_to_host(
            &self,
            payload: &[u8],
            host: &str,
            port: u16,
        ) -> Result<(), TransportError> {
            if let Some(d) = self.safe_delay.or_else(|| self.host_delays.get(host).copied()) {
                tokio::time::sleep(d).await;
            }
            if self.failing_hosts.contains(host) {
                return Err(TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "injected failure",
                )));
            }
            self.safe_sends
                .lock()
                .unwrap()
                .push((host.to_string(), port, payload.to_vec()));
            Ok(())
        }

        fn send_fast_to(&mut self, payload: &[u8], addr: SocketAddr) -> SendStamp {
            if self.failing_hosts.contains(&addr.ip().to_string()) {
                return SendStamp::FAILED;
            }
            self.fast_sends.push((addr, payload.to_vec()));
            self.next_stamp += 1;
            SendStamp::at(self.next_stamp)
        }
    }

    fn targets(hosts: &[&str]) -> Vec<Target> {
        hosts.iter().map(|h| Target::new(*h, 5000)).collect()
    }

    // ── Empty target sets ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_empty_target_list_returns_empty_outcomes_in_every_mode() {
        // Arrange
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::default();

        for mode in [
            DispatchMode::Sequential,
            DispatchMode::Parallel,
            DispatchMode::RoundRobin,
        ] {
            // Act
            let outcomes = uc.dispatch(&mut tx, b"X", &mut [], mode).await;

            // Assert
            assert!(outcomes.is_empty(), "{mode} must return no outcomes");
        }
        assert!(tx.safe_sends.lock().unwrap().is_empty());
        assert!(tx.fast_sends.is_empty());
    }

    #[tokio::test]
    async fn test_all_disabled_targets_behave_like_empty_list() {
        // Arrange
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::default();
        let mut list: Vec<Target> = targets(&["10.0.0.1", "10.0.0.2"])
            .into_iter()
            .map(|t| t.enabled(false))
            .collect();

        // Act
        let seq = uc
            .dispatch(&mut tx, b"X", &mut list, DispatchMode::Sequential)
            .await;
        let rr = uc
            .dispatch(&mut tx, b"X", &mut list, DispatchMode::RoundRobin)
            .await;

        // Assert
        assert!(seq.is_empty());
        assert!(rr.is_empty());
        assert!(list.iter().all(|t| t.last_outcome.is_none()));
    }

    // ── Sequential ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_sequential_sends_enabled_targets_in_list_order() {
        // Arrange
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::default();
        let mut list = targets(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        list[1].enabled = false;

        // Act
        let outcomes = uc
            .dispatch(&mut tx, b"TRIGGER", &mut list, DispatchMode::Sequential)
            .await;

        // Assert
        assert_eq!(tx.safe_hosts(), vec!["10.0.0.1", "10.0.0.3"]);
        assert_eq!(outcomes.len(), 2);
        assert!(list[1].last_outcome.is_none(), "disabled target untouched");
        assert_eq!(list[0].last_outcome, Some(AttemptOutcome::Sent));
    }

    #[tokio::test]
    async fn test_sequential_continues_past_failures() {
        // Arrange
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::failing(&["10.0.0.2"]);
        let mut list = targets(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

        // Act
        let outcomes = uc
            .dispatch(&mut tx, b"X", &mut list, DispatchMode::Sequential)
            .await;

        // Assert
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.failure_count(), 1);
        assert_eq!(outcomes.get("10.0.0.2:5000"), Some(SendStamp::FAILED));
        assert_eq!(tx.safe_hosts(), vec!["10.0.0.1", "10.0.0.3"]);
        assert!(matches!(
            list[1].last_outcome,
            Some(AttemptOutcome::Failed { .. })
        ));
        assert!(list[1].last_attempt_at.is_some());
    }

    #[tokio::test]
    async fn test_sequential_with_delay_takes_at_least_k_minus_one_delays() {
        // Arrange
        let delay = Duration::from_millis(20);
        let uc = DispatchTargetsUseCase::new(delay);
        let mut tx = RecordingTransmitter::default();
        let mut list = targets(&["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"]);

        // Act
        let started = Instant::now();
        uc.dispatch(&mut tx, b"X", &mut list, DispatchMode::Sequential)
            .await;
        let elapsed = started.elapsed();

        // Assert
        assert!(
            elapsed >= delay * 3,
            "4 targets with 20ms delay must take >= 60ms, took {elapsed:?}"
        );
    }

    // ── Parallel ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_parallel_failure_does_not_suppress_other_success() {
        // Arrange
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::failing(&["10.0.0.1"]);
        let mut list = targets(&["10.0.0.1", "10.0.0.2"]);

        // Act
        let outcomes = uc
            .dispatch(&mut tx, b"X", &mut list, DispatchMode::Parallel)
            .await;

        // Assert
        let a = outcomes.get("10.0.0.1:5000").expect("A present");
        let b = outcomes.get("10.0.0.2:5000").expect("B present");
        assert!(a.is_failure());
        assert!(!b.is_failure());
        assert!(list[0].last_outcome.as_ref().is_some_and(|o| !o.is_success()));
        assert_eq!(list[1].last_outcome, Some(AttemptOutcome::Sent));
    }

    #[tokio::test]
    async fn test_parallel_sends_run_concurrently() {
        // Arrange: each send sleeps 50ms; four targets in sequence would take 200ms
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter {
            safe_delay: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let mut list = targets(&["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"]);

        // Act
        let started = Instant::now();
        let outcomes = uc
            .dispatch(&mut tx, b"X", &mut list, DispatchMode::Parallel)
            .await;
        let elapsed = started.elapsed();

        // Assert
        assert_eq!(outcomes.len(), 4);
        assert!(
            elapsed < Duration::from_millis(180),
            "parallel sends must overlap, took {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_parallel_stamps_each_target_when_its_own_send_finishes() {
        // Arrange: A is slow, B answers at once
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter {
            host_delays: HashMap::from([("10.0.0.1".to_string(), Duration::from_millis(300))]),
            ..Default::default()
        };
        let mut list = targets(&["10.0.0.1", "10.0.0.2"]);

        // Act
        let started = monotonic_nanos();
        let outcomes = uc
            .dispatch(&mut tx, b"X", &mut list, DispatchMode::Parallel)
            .await;

        // Assert
        let a = outcomes.get("10.0.0.1:5000").unwrap().nanos().unwrap();
        let b = outcomes.get("10.0.0.2:5000").unwrap().nanos().unwrap();
        assert!(
            b - started < Duration::from_millis(150).as_nanos() as u64,
            "B's stamp must not wait for A"
        );
        assert!(a - started >= Duration::from_millis(300).as_nanos() as u64);
        let a_at = list[0].last_attempt_at.unwrap();
        let b_at = list[1].last_attempt_at.unwrap();
        assert!(b_at < a_at, "B's wall-clock time precedes A's");
    }

    #[tokio::test]
    async fn test_parallel_outcomes_follow_list_order() {
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::default();
        let mut list = targets(&["10.0.0.3", "10.0.0.1", "10.0.0.2"]);

        let outcomes = uc
            .dispatch(&mut tx, b"X", &mut list, DispatchMode::Parallel)
            .await;

        let keys: Vec<&str> = outcomes.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["10.0.0.3:5000", "10.0.0.1:5000", "10.0.0.2:5000"]);
    }

    // ── Round-robin ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_round_robin_cycles_through_targets_in_order() {
        // Arrange
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::default();
        let mut list = targets(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

        // Act: M = 7 consecutive calls over N = 3 targets
        for _ in 0..7 {
            let outcomes = uc
                .dispatch(&mut tx, b"X", &mut list, DispatchMode::RoundRobin)
                .await;
            assert_eq!(outcomes.len(), 1, "round-robin sends to exactly one target");
        }

        // Assert
        let hit: Vec<String> = tx.fast_sends.iter().map(|(a, _)| a.ip().to_string()).collect();
        assert_eq!(
            hit,
            vec![
                "10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.1", "10.0.0.2", "10.0.0.3",
                "10.0.0.1"
            ]
        );
        assert!(tx.safe_sends.lock().unwrap().is_empty(), "round-robin uses the fast path");
    }

    #[tokio::test]
    async fn test_round_robin_skips_disabled_targets() {
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::default();
        let mut list = targets(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        list[1].enabled = false;

        for _ in 0..4 {
            uc.dispatch(&mut tx, b"X", &mut list, DispatchMode::RoundRobin)
                .await;
        }

        let hit: Vec<String> = tx.fast_sends.iter().map(|(a, _)| a.ip().to_string()).collect();
        assert_eq!(hit, vec!["10.0.0.1", "10.0.0.3", "10.0.0.1", "10.0.0.3"]);
    }

    #[test]
    fn test_round_robin_host_name_is_recorded_as_failure() {
        // Arrange
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::default();
        let mut list = vec![Target::new("lamp.local", 5000)];

        // Act
        let outcomes = uc.dispatch_round_robin(&mut tx, b"X", &mut list);

        // Assert
        assert_eq!(outcomes.get("lamp.local:5000"), Some(SendStamp::FAILED));
        assert!(tx.fast_sends.is_empty());
        match &list[0].last_outcome {
            Some(AttemptOutcome::Failed { reason }) => {
                assert!(reason.contains("not an IP address"), "got: {reason}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_round_robin_writes_fast_stamp_into_outcome() {
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::default();
        let mut list = targets(&["10.0.0.1"]);

        let outcomes = uc.dispatch_round_robin(&mut tx, b"X", &mut list);

        assert_eq!(outcomes.get("10.0.0.1:5000"), Some(SendStamp::at(1)));
        assert_eq!(list[0].last_outcome, Some(AttemptOutcome::Sent));
    }

    #[test]
    fn test_reset_rotation_restarts_at_first_target() {
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::default();
        let mut list = targets(&["10.0.0.1", "10.0.0.2"]);

        uc.dispatch_round_robin(&mut tx, b"X", &mut list);
        uc.reset_rotation();
        uc.dispatch_round_robin(&mut tx, b"X", &mut list);

        assert_eq!(tx.fast_sends[1].0.ip().to_string(), "10.0.0.1");
    }

    // ── send_to_multiple / send_fast_multiple ─────────────────────────────────

    #[test]
    fn test_send_to_multiple_returns_one_result_per_target() {
        // Arrange
        let uc = DispatchTargetsUseCase::default();
        let tx = RecordingTransmitter::failing(&["10.0.0.2"]);
        let list = targets(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]);

        // Act
        let results = tokio_test::block_on(uc.send_to_multiple(
            &tx,
            b"X",
            &list,
            Duration::ZERO,
        ));

        // Assert
        assert_eq!(results.len(), 3);
        tokio_test::assert_ok!(&results[0]);
        tokio_test::assert_err!(&results[1]);
        tokio_test::assert_ok!(&results[2]);
        assert!(list.iter().all(|t| t.last_outcome.is_none()));
    }

    #[test]
    fn test_send_fast_multiple_maps_keys_to_stamps() {
        // Arrange
        let uc = DispatchTargetsUseCase::default();
        let mut tx = RecordingTransmitter::failing(&["10.0.0.2"]);
        let list = targets(&["10.0.0.1", "10.0.0.2", "lamp.local"]);

        // Act
        let map = uc.send_fast_multiple(&mut tx, b"X", &list);

        // Assert
        assert_eq!(map.len(), 3);
        assert!(!map["10.0.0.1:5000"].is_failure());
        assert_eq!(map["10.0.0.2:5000"], SendStamp::FAILED);
        assert_eq!(map["lamp.local:5000"], SendStamp::FAILED);
    }
}

//! Multi-send targets and dispatch modes.
//!
//! A [`Target`] is one `(host, port)` pair that a multi-target send fans out
//! to.  The list of targets belongs to the outer layer (it is persisted with
//! the rest of the user's settings); the dispatcher only reads the enabled
//! subset and writes the result of each attempt back onto the target.
//!
//! # Dispatch modes (for beginners)
//!
//! ```text
//! Sequential   t0 ─ delay ─ t1 ─ delay ─ t2        safe path, in order
//! Parallel     t0 ┬ t1 ┬ t2                         safe path, concurrent
//! RoundRobin   call 1 → t0, call 2 → t1, call 3 → t2, call 4 → t0 …
//!                                                   fast path, one per call
//! ```

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a target.
pub type TargetId = Uuid;

/// How a payload fans out to several targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchMode {
    #[default]
    Sequential,
    Parallel,
    RoundRobin,
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchMode::Sequential => "sequential",
            DispatchMode::Parallel => "parallel",
            DispatchMode::RoundRobin => "round-robin",
        };
        f.write_str(name)
    }
}

/// Result of the most recent send attempt to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The datagram left the socket.
    Sent,
    /// The attempt failed; `reason` is the rendered error.
    Failed { reason: String },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Sent)
    }
}

/// One destination of a multi-target send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    #[serde(default)]
    pub name: String,
    pub host: String,
    pub port: u16,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Outcome of the last attempt; `None` until the target is first tried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_outcome: Option<AttemptOutcome>,
    /// Wall-clock time of the last attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<SystemTime>,
}

fn default_enabled() -> bool {
    true
}

impl Target {
    /// Creates an enabled target with a fresh id and no history.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            host: host.into(),
            port,
            enabled: true,
            last_outcome: None,
            last_attempt_at: None,
        }
    }

    /// Sets a display name (builder style).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the enabled flag (builder style).
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The key outcomes are reported under: `host:port`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses the host as an IP literal.
    ///
    /// The fast path never resolves names, so round-robin targets must be
    /// given as addresses.  Returns `None` for host names.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.host
            .trim()
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }

    /// Stores the outcome of an attempt together with the current time.
    pub fn record_attempt(&mut self, outcome: AttemptOutcome) {
        self.record_attempt_at(outcome, SystemTime::now());
    }

    /// Stores the outcome of an attempt that finished at `at`.
    ///
    /// Used when the attempt completed earlier than the moment it is
    /// written back, e.g. one send among several running concurrently.
    pub fn record_attempt_at(&mut self, outcome: AttemptOutcome, at: SystemTime) {
        self.last_outcome = Some(outcome);
        self.last_attempt_at = Some(at);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

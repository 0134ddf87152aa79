//! Inbound datagrams and receive-loop errors.
//!
//! The receive pipeline wraps every datagram it reads into a
//! [`ReceivedPacket`] and hands it to the consumer, which owns it from then
//! on.  Receive failures that do not stop the loop are delivered on the same
//! queue as [`ReceiveError`] items, so the consumer sees packets and errors
//! in arrival order.

use std::net::{IpAddr, SocketAddr};
use std::time::SystemTime;

use thiserror::Error;

use crate::clock::monotonic_nanos;

/// One inbound datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedPacket {
    /// Payload bytes exactly as they arrived.
    pub data: Vec<u8>,
    /// Sender address and port.
    pub source: SocketAddr,
    /// Wall-clock arrival time, for display and history.
    pub received_at: SystemTime,
    /// Monotonic arrival time from [`crate::clock::monotonic_nanos`].
    pub received_at_nanos: u64,
}

impl ReceivedPacket {
    /// Wraps a freshly received datagram, stamping it with the current time.
    pub fn new(data: Vec<u8>, source: SocketAddr) -> Self {
        Self {
            data,
            source,
            received_at: SystemTime::now(),
            received_at_nanos: monotonic_nanos(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn source_address(&self) -> IpAddr {
        self.source.ip()
    }

    pub fn source_port(&self) -> u16 {
        self.source.port()
    }
}

/// A non-fatal receive failure, delivered in place of a packet.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("receive error: {message}")]
pub struct ReceiveError {
    pub message: String,
    pub at: SystemTime,
}

impl ReceiveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            at: SystemTime::now(),
        }
    }
}

impl From<std::io::Error> for ReceiveError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

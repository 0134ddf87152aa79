//! # udp-trigger-core
//!
//! Shared library for udp-trigger containing the domain entities, endpoint
//! configuration rules, and the error taxonomy of the transport core.
//!
//! This crate is used by the transport crate (`udp-trigger`) and by any
//! outer layer (UI, automation, widgets) that needs to build configurations
//! or read dispatch results.  It has zero dependencies on OS APIs, async
//! runtimes, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! udp-trigger fires raw UDP datagrams (or TCP writes) at one or many hosts
//! with as little delay as possible between "the user pressed a button" and
//! "the bytes left the network card".  It can also listen for inbound
//! datagrams and hand them to a consumer.
//!
//! This crate (`udp-trigger-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Plain data with validation rules: how an endpoint is
//!   configured (`EndpointConfig`), what a multi-send target looks like
//!   (`Target`), what an inbound datagram looks like (`ReceivedPacket`), and
//!   how a fast-path send reports its result (`SendStamp`).
//!
//! - **`send_buffer`** – The reusable byte buffer behind the fast send path.
//!
//! - **`rotation`** – A lock-free cursor used by round-robin dispatch.
//!
//! - **`clock`** – Monotonic nanosecond timestamps shared by every component.
//!
//! - **`error`** – The error taxonomy every public operation reports through.

pub mod clock;
pub mod domain;
pub mod error;
pub mod rotation;
pub mod send_buffer;

// Re-export the most-used types at the crate root so callers can write
// `udp_trigger_core::Target` instead of `udp_trigger_core::domain::target::Target`.
pub use domain::endpoint::{ConfigError, EndpointConfig, Protocol, SendMode};
pub use domain::outcome::{DispatchOutcomes, SendStamp, TargetOutcome};
pub use domain::packet::{ReceiveError, ReceivedPacket};
pub use domain::target::{AttemptOutcome, DispatchMode, Target, TargetId};
pub use error::TransportError;
pub use rotation::RotationCursor;
pub use send_buffer::SendBuffer;

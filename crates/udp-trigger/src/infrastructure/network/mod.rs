//! Network infrastructure: sockets, the transport client, and the receive
//! pipeline.
//!
//! # Sub-modules
//!
//! - **`endpoint`** – Owns exactly one socket (UDP or TCP) plus its
//!   destination and the fast-path send buffer.  Provides the locked safe
//!   send path and the unlocked fast send path.
//!
//! - **`client`** – `TransportClient`, the per-connection façade callers
//!   use: mode-specific `initialize_*` helpers, `send`, `send_fast`,
//!   `send_to`, listening, and close.  Implements the application layer's
//!   `DatagramTransmitter` trait.
//!
//! - **`receiver`** – `ReceivePipeline`, the background task that reads
//!   inbound datagrams and exposes them as a `PacketStream`.

pub mod client;
pub mod endpoint;
pub mod receiver;

pub use client::TransportClient;
pub use endpoint::{Endpoint, Lifecycle};
pub use receiver::{PacketStream, ReceivePipeline};

//! udp-trigger library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does udp-trigger do? (for beginners)
//!
//! A caller (a UI button, a hardware key handler, an automation rule)
//! wants some bytes on the wire *now*.  This crate provides:
//!
//! 1. [`TransportClient`](infrastructure::network::TransportClient) – opens
//!    one UDP or TCP endpoint in unicast, broadcast, multicast, or listen
//!    mode, and sends through either the **safe path** (locked, allocating,
//!    fine to call from many tasks) or the **fast path** (no lock, reusable
//!    buffer, single caller only).
//! 2. [`DispatchTargetsUseCase`](application::dispatch_targets::DispatchTargetsUseCase)
//!    – fans one payload out to many targets sequentially, in parallel, or
//!    round-robin.
//! 3. [`ReceivePipeline`](infrastructure::network::ReceivePipeline) – a
//!    background task that turns inbound datagrams into a stream the
//!    consumer pulls from.

/// Application layer: use cases that depend only on traits.
pub mod application;

/// Infrastructure layer: sockets and configuration storage.
pub mod infrastructure;

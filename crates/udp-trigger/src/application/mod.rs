//! Application layer use cases.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure data and rules, in `udp-trigger-core`) and the infrastructure
//! (sockets, files).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a caller goal (e.g., "send
//!   this trigger to every enabled target").
//! - **Depend on abstractions** (the [`DatagramTransmitter`] trait) rather
//!   than on `TransportClient` directly, so tests can inject failures.
//! - **Contain no socket calls and no file system access**.
//!
//! # Sub-modules
//!
//! - **`dispatch_targets`** – Multi-target fan-out in sequential, parallel,
//!   and round-robin modes, with per-target status written back.

pub mod dispatch_targets;

pub use dispatch_targets::{DatagramTransmitter, DispatchTargetsUseCase};

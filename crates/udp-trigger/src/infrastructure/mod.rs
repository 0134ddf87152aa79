//! Infrastructure layer.
//!
//! Contains the OS-facing adapters: UDP/TCP sockets and the receive loop
//! (`network`), and TOML configuration persistence (`storage`).
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `udp_trigger_core`, but MUST NOT be imported by the `application` layer.

pub mod network;
pub mod storage;

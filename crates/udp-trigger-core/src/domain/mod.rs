//! Domain layer: pure data types and validation rules.
//!
//! Nothing in this module touches a socket.  The infrastructure layer of
//! the `udp-trigger` crate turns these values into live OS resources.
//!
//! - **`endpoint`** – `EndpointConfig` and its validation.
//! - **`target`**   – multi-send targets and dispatch modes.
//! - **`packet`**   – inbound datagrams and receive-loop errors.
//! - **`outcome`**  – fast-path send stamps and per-target dispatch results.

pub mod endpoint;
pub mod outcome;
pub mod packet;
pub mod target;

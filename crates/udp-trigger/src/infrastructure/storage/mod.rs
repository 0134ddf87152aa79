//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads and writes the TOML file that holds the
//! default destination, the listen port, the dispatch settings, and the
//! multi-target list used by the command-line front end.  The transport
//! core itself never reads this file; callers convert the loaded sections
//! into `EndpointConfig` / `Target` values and pass those in.

pub mod config;

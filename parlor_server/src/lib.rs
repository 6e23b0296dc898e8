//! Server crate: HTTP API, configuration, logging, and metrics around the
//! `parlor` round engine. The binary in `main.rs` wires these together;
//! integration tests build the router directly.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

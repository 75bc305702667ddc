//! `advisor` gateway (library surface).
//!
//! The binary in `main.rs` is the usual entrypoint; the router and config live here so tests
//! and embedders can mount the gateway in-process.

pub mod config;
pub mod server;
pub mod telemetry;

pub use config::GatewayConfig;
pub use server::{router, serve, Gateway};

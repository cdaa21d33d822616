//! Wiredoor Core Library
//!
//! Shared functionality for the `wiredoor` node client:
//! - Local settings file (server URL, node token, keepalive, daemon flag)
//! - Control-plane REST client and its wire types
//! - WireGuard tunnel configuration rendering
//! - Common error types and tracing setup

pub mod api;
pub mod config;
pub mod error;
pub mod tracing_init;
pub mod wg_config;

pub use config::{ConfigStore, Credentials, LocalConfig};
pub use error::{Error, Result};

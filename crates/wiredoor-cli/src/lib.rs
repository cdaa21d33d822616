//! Wiredoor CLI Library
//!
//! Connects this machine to a Wiredoor server as a node and manages the
//! local services it exposes:
//! - Tunnel lifecycle (connect, disconnect, key rotation) and the
//!   self-healing watch loop
//! - HTTP/TCP service exposure and enable/disable
//! - Host adapters: wg-quick, systemd/OpenRC, network interfaces

pub mod cmd;
pub mod commands;
pub mod expose;
pub mod net;
pub mod os;
pub mod prompt;
pub mod reconcile;
pub mod render;
pub mod system;

#[cfg(test)]
mod testing;

//! OS-facing capabilities used by the reconciler.
//!
//! Each trait has one real implementation talking to the host and is faked
//! in tests.

mod service;
mod wg_quick;

use std::net::Ipv4Addr;

use anyhow::Result;

pub use service::InitServiceManager;
pub use wg_quick::WgQuick;

/// The tunnel: its config file, its interface and the up/down commands.
pub trait TunnelController {
    /// Whether the tunnel config file exists.
    fn config_exists(&self) -> bool;

    /// Write the tunnel config file (owner-only permissions).
    fn write_config(&self, contents: &str) -> Result<()>;

    /// Delete the tunnel config file.
    fn remove_config(&self) -> Result<()>;

    /// Whether the tunnel interface exists.
    fn interface_up(&self) -> bool;

    /// IPv4 address assigned to the tunnel interface.
    fn interface_address(&self) -> Option<Ipv4Addr>;

    fn up(&self) -> Result<()>;

    fn down(&self) -> Result<()>;
}

/// The background service supervising the tunnel in daemon mode.
pub trait ServiceManager {
    fn start(&self) -> Result<()>;
    fn stop(&self) -> Result<()>;
    fn restart(&self) -> Result<()>;
    fn enable(&self) -> Result<()>;
    fn disable(&self) -> Result<()>;
}

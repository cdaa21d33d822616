use anyhow::Result;

use super::Host;
use crate::net::TUNNEL_INTERFACE;
use crate::reconcile::ConnectRequest;
use crate::render::{now_millis, print_lines, status_lines};
use crate::system::TunnelController;

/// Arguments for `wiredoor connect`.
#[derive(Debug, clap::Args)]
pub struct ConnectArgs {
    /// Wiredoor server URL (overrides the config file, needs --token)
    #[arg(long)]
    pub url: Option<String>,

    /// Node connection token (overrides the config file, needs --url)
    #[arg(long)]
    pub token: Option<String>,

    /// Keep the tunnel supervised by the background service
    #[arg(long, conflicts_with = "no_daemon")]
    pub daemon: bool,

    /// Do not use the background service
    #[arg(long)]
    pub no_daemon: bool,
}

impl ConnectArgs {
    pub fn request(&self) -> ConnectRequest {
        let daemon = if self.daemon {
            Some(true)
        } else if self.no_daemon {
            Some(false)
        } else {
            None
        };
        ConnectRequest {
            url: self.url.clone().filter(|u| !u.is_empty()),
            token: self.token.clone().filter(|t| !t.is_empty()),
            daemon,
        }
    }
}

/// Connect, then show the status of the fresh tunnel.
pub fn connect_and_report(host: &Host, request: &ConnectRequest) -> Result<()> {
    let reconciler = host.reconciler();
    let node = reconciler.connect(request)?;
    let kind = if node.is_gateway { "gateway" } else { "node" };
    print_lines([format!("Connected {kind} {}.", node.name)])?;

    let report = reconciler.status()?;
    print_lines(status_lines(&report, now_millis()))?;
    Ok(())
}

pub fn run(host: &Host, args: &ConnectArgs) -> Result<()> {
    if host.tunnel.interface_up() {
        print_lines([
            format!("WireGuard interface '{TUNNEL_INTERFACE}' is already up."),
            "Run 'wiredoor disconnect' first to reconnect.".to_string(),
        ])?;
        return Ok(());
    }

    print_lines(["Connecting to the Wiredoor server..."])?;
    connect_and_report(host, &args.request())
}

pub fn run_disconnect(host: &Host) -> Result<()> {
    if host.reconciler().disconnect()? {
        print_lines(["Tunnel disconnected."])?;
    } else {
        print_lines(["No tunnel configured, nothing to disconnect."])?;
    }
    Ok(())
}

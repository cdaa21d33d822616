use anyhow::Result;
use wiredoor_core::api::{ControlPlaneClient, GatewayNetwork};

use crate::expose;
use crate::net::default_interface_name;
use crate::render::print_lines;

/// Arguments for `wiredoor gateway`.
#[derive(Debug, clap::Args)]
pub struct GatewayArgs {
    /// Internal subnet in CIDR format (e.g. 10.42.0.0/16)
    #[arg(long)]
    pub subnet: Option<String>,

    /// Output interface for the gateway (defaults to the egress interface)
    #[arg(long)]
    pub interface: Option<String>,
}

/// Update the gateway subnet. `subnet` comes from [`GatewayArgs::subnet`].
pub fn run<C: ControlPlaneClient>(client: &C, subnet: &str, interface: Option<&str>) -> Result<()> {
    update(client, subnet, interface, default_interface_name)
}

fn update<C: ControlPlaneClient>(
    client: &C,
    subnet: &str,
    interface: Option<&str>,
    egress_interface: impl FnOnce() -> String,
) -> Result<()> {
    // A bad CIDR fails before the egress lookup runs `ip route`.
    expose::validate_subnet(subnet)?;

    let interface = interface
        .filter(|i| !i.is_empty())
        .map_or_else(egress_interface, str::to_string);
    let network = GatewayNetwork {
        interface,
        subnet: subnet.to_string(),
    };

    print_lines([format!(
        "Updating gateway subnet to '{}' using interface '{}'...",
        network.subnet, network.interface
    )])?;
    let node = expose::update_gateway(client, &network)?;
    print_lines([format!(
        "✅ Gateway {} now routes {}",
        node.name,
        node.subnets().join(", ")
    )])?;
    Ok(())
}

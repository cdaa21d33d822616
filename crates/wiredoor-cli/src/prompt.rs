use anyhow::Result;
use dialoguer::{Confirm, Input, Password};
use ipnet::IpNet;
use wiredoor_core::api::{AdminCredentials, GatewayNetwork, NodeParams};

/// Defaults offered while registering a node.
#[derive(Debug, Clone, Default)]
pub struct NodeDefaults {
    pub name: String,
    pub interface: String,
    pub subnet: String,
}

/// Yes/no question.
pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Admin email and password for the control plane.
pub fn prompt_admin_credentials() -> Result<AdminCredentials> {
    let username: String = Input::new()
        .with_prompt("EMail")
        .validate_with(|s: &String| -> Result<(), &str> {
            if s.trim().is_empty() {
                Err("email is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;
    Ok(AdminCredentials {
        username: username.trim().to_string(),
        password,
    })
}

/// Name, gateway role and routing choice for the node being registered.
pub fn prompt_node_params(defaults: &NodeDefaults) -> Result<NodeParams> {
    let name: String = Input::new()
        .with_prompt("Node Name")
        .default(defaults.name.clone())
        .interact_text()?;

    let is_gateway = confirm("Is this node a Gateway?", false)?;
    let mut gateway_networks = Vec::new();
    if is_gateway {
        let interface: String = Input::new()
            .with_prompt("Gateway Interface")
            .default(defaults.interface.clone())
            .interact_text()?;
        let subnet: String = Input::new()
            .with_prompt("Gateway CIDR Subnet")
            .default(defaults.subnet.clone())
            .validate_with(|s: &String| -> Result<(), &str> {
                s.parse::<IpNet>()
                    .map(|_| ())
                    .map_err(|_| "enter a subnet in CIDR format, e.g. 10.42.0.0/16")
            })
            .interact_text()?;
        gateway_networks.push(GatewayNetwork { interface, subnet });
    }

    let allow_internet = confirm("Send all internet traffic through the VPN?", false)?;

    Ok(NodeParams {
        name,
        is_gateway,
        gateway_networks,
        allow_internet,
    })
}

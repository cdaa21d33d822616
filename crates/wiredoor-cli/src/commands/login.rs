use anyhow::{Result, bail};

use super::Host;
use super::connect::connect_and_report;
use crate::net::{default_interface_name, default_subnet};
use crate::os::{hostname, is_root};
use crate::prompt::{self, NodeDefaults};
use crate::reconcile::{ConnectRequest, ReconcileError};
use crate::render::print_lines;

/// Arguments for `wiredoor login`.
#[derive(Debug, clap::Args)]
pub struct LoginArgs {
    /// URL or IP of the Wiredoor server
    #[arg(long)]
    pub url: Option<String>,
}

/// Register this machine as a node and connect it.
pub fn run(host: &Host, args: &LoginArgs) -> Result<()> {
    if !is_root() {
        return Err(ReconcileError::NotPrivileged("login").into());
    }

    let config = host.store().load()?;
    let url = match args.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => url.to_string(),
        None if !config.server.url.is_empty() => config.server.url.clone(),
        None => bail!("You must define the Wiredoor server URL. Use --url and try again."),
    };

    if config.is_server_configured()
        && !prompt::confirm(
            "Another node is set, do you want to overwrite current config and set a new one?",
            false,
        )?
    {
        return Ok(());
    }

    let credentials = prompt::prompt_admin_credentials()?;
    let admin_token = host.client.admin_login(&url, &credentials)?;

    let defaults = NodeDefaults {
        name: hostname(),
        interface: default_interface_name(),
        subnet: default_subnet().map(|n| n.to_string()).unwrap_or_default(),
    };
    let params = prompt::prompt_node_params(&defaults)?;
    let node = host.client.register_node(&url, &admin_token, &params)?;
    if node.token.is_empty() {
        bail!("The server registered node {} without issuing a token", node.name);
    }

    host.store().save_server(&url, &node.token)?;
    print_lines([format!("Node {} registered successfully!", node.name)])?;

    connect_and_report(host, &ConnectRequest::default())
}

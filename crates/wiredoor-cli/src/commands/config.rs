use anyhow::Result;
use wiredoor_core::ConfigStore;

use crate::render::print_lines;

/// Arguments for `wiredoor config`.
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Wiredoor server URL
    #[arg(long)]
    pub url: String,

    /// Node authentication token
    #[arg(long)]
    pub token: String,
}

/// Save server URL and node token without connecting.
pub fn run(store: &ConfigStore, args: &ConfigArgs) -> Result<()> {
    print_lines([format!("Saving Wiredoor config to {}", args.url)])?;
    store.save_server(&args.url, &args.token)?;
    print_lines([format!(
        "✅ Configuration saved to {}",
        store.path().display()
    )])?;
    Ok(())
}

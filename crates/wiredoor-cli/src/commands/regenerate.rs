use anyhow::Result;

use super::Host;
use crate::prompt;
use crate::render::{now_millis, print_lines, status_lines};

/// Arguments for `wiredoor regenerate`.
#[derive(Debug, clap::Args)]
pub struct RegenerateArgs {
    /// Regenerate without confirmation
    #[arg(short, long)]
    pub force: bool,
}

/// Rotate the node keys and token, then reconnect.
pub fn run(host: &Host, args: &RegenerateArgs) -> Result<()> {
    if !args.force
        && !prompt::confirm(
            "This command may cause a temporary downtime in all exposed services. Continue?",
            false,
        )?
    {
        return Ok(());
    }

    let reconciler = host.reconciler();
    let node = reconciler.regenerate()?;
    print_lines([format!("New keys issued for {}.", node.name)])?;

    let report = reconciler.status()?;
    print_lines(status_lines(&report, now_millis()))?;
    Ok(())
}

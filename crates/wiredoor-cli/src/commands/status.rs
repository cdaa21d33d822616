use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::Result;

use super::Host;
use crate::os::is_root;
use crate::reconcile::ReconcileError;
use crate::render::{now_millis, print_lines, status_lines};

/// Interval used when `--interval` is zero or negative.
const FALLBACK_WATCH_INTERVAL: Duration = Duration::from_secs(15);

/// Arguments for `wiredoor status`.
#[derive(Debug, clap::Args)]
pub struct StatusArgs {
    /// Quick health check: exit status only, no output
    #[arg(long, conflicts_with = "watch")]
    pub health: bool,

    /// Keep monitoring the tunnel and heal it when it breaks
    #[arg(long)]
    pub watch: bool,

    /// Polling interval in seconds (used with --watch)
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub interval: i64,
}

pub fn watch_interval(secs: i64) -> Duration {
    u64::try_from(secs)
        .ok()
        .filter(|s| *s > 0)
        .map_or(FALLBACK_WATCH_INTERVAL, Duration::from_secs)
}

pub fn run(host: &Host, args: &StatusArgs) -> Result<ExitCode> {
    if args.health {
        return Ok(health(host));
    }
    if args.watch {
        return watch(host, watch_interval(args.interval));
    }

    let report = host.reconciler().status()?;
    print_lines(status_lines(&report, now_millis()))?;
    Ok(ExitCode::SUCCESS)
}

fn health(host: &Host) -> ExitCode {
    if host.reconciler().health() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Heal the tunnel every `interval`, forever.
fn watch(host: &Host, interval: Duration) -> Result<ExitCode> {
    if !is_root() {
        return Err(ReconcileError::NotPrivileged("status --watch").into());
    }

    // Outside systemd there is no notify socket and this is a no-op.
    #[cfg(unix)]
    if let Err(e) = sd_notify::notify(true, &[sd_notify::NotifyState::Ready]) {
        tracing::debug!(error = %e, "sd_notify failed");
    }

    tracing::info!(interval_secs = interval.as_secs(), "watching tunnel health");
    let reconciler = host.reconciler();
    loop {
        match reconciler.watch_tick() {
            Ok(outcome) => tracing::debug!(?outcome, "watch tick done"),
            Err(e) => tracing::warn!(error = %e, "watch tick failed"),
        }
        thread::sleep(interval);
    }
}

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};

/// Upper bound for any subprocess (wg-quick, systemctl, rc-service, ip).
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Finished {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

/// Execute a command with logging. Logs the full command line at debug level
/// and a human-friendly description at info level. The child is killed when
/// it outlives [`COMMAND_TIMEOUT`].
pub fn run_cmd(description: &str, program: &str, args: &[&str]) -> Result<()> {
    tracing::info!("{description}");
    let done = run_with_timeout(description, program, args, false, COMMAND_TIMEOUT)?;

    if !done.status.success() {
        let stderr = done.stderr.trim();
        tracing::error!(
            "command failed: {program} {}\nstderr: {stderr}",
            args.join(" ")
        );
        bail!("{description} failed ({}): {stderr}", done.status);
    }
    Ok(())
}

/// Execute a command and return its trimmed stdout.
pub fn run_cmd_output(program: &str, args: &[&str]) -> Result<String> {
    let cmd_line = format!("{program} {}", args.join(" "));
    let done = run_with_timeout(&cmd_line, program, args, true, COMMAND_TIMEOUT)?;

    if !done.status.success() {
        bail!("{cmd_line} exited with {}", done.status);
    }
    Ok(done.stdout.trim().to_string())
}

fn run_with_timeout(
    description: &str,
    program: &str,
    args: &[&str],
    capture_stdout: bool,
    timeout: Duration,
) -> Result<Finished> {
    let cmd_line = format!("{program} {}", args.join(" "));
    tracing::debug!("exec: {cmd_line}");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(if capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to execute: {cmd_line}"))?;

    // Pipes are drained while waiting, a child blocked on a full pipe never exits.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = wait_until(&mut child, Instant::now() + timeout)
        .with_context(|| format!("failed to wait for: {cmd_line}"))?;
    let Some(status) = status else {
        tracing::error!("command timed out: {cmd_line}");
        bail!("{description} timed out after {}s", timeout.as_secs_f32());
    };

    Ok(Finished {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

/// Poll `child` until it exits or `deadline` passes. `None` means it was
/// killed.
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

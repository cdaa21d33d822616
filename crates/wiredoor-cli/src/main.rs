//! Wiredoor CLI
//!
//! Connects this machine to a Wiredoor server and exposes local services
//! through it.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use wiredoor_core::ConfigStore;
use wiredoor_core::api::ApiError;
use wiredoor_core::config::DEFAULT_CONFIG_PATH;
use wiredoor_core::tracing_init::init_tracing;

use wiredoor_cli::commands::config::ConfigArgs;
use wiredoor_cli::commands::connect::ConnectArgs;
use wiredoor_cli::commands::gateway::GatewayArgs;
use wiredoor_cli::commands::login::LoginArgs;
use wiredoor_cli::commands::regenerate::RegenerateArgs;
use wiredoor_cli::commands::service::{DisableArgs, EnableArgs, HttpArgs, TcpArgs};
use wiredoor_cli::commands::status::StatusArgs;
use wiredoor_cli::commands::{self, Host};
use wiredoor_cli::expose::ExposeError;
use wiredoor_cli::reconcile::ReconcileError;
use wiredoor_cli::render::error_lines;

/// Wiredoor node client.
#[derive(Debug, Parser)]
#[command(name = "wiredoor", version, about = "Connect this node to a Wiredoor server and expose local services")]
struct Cli {
    /// Path to the settings file
    #[arg(long, global = true, env = "WIREDOOR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "WIREDOOR_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Save the server URL and node token without connecting
    Config(ConfigArgs),
    /// Bring the tunnel up for this node
    Connect(ConnectArgs),
    /// Bring the tunnel down and remove its config
    Disconnect,
    /// Re-enable a disabled service
    Enable(EnableArgs),
    /// Disable a service without deleting it
    Disable(DisableArgs),
    /// Update the internal subnet routed by this gateway node
    Gateway(GatewayArgs),
    /// Expose a local HTTP service
    Http(HttpArgs),
    /// Log in with admin credentials and register this node
    Login(LoginArgs),
    /// Rotate the node keys and token, then reconnect
    Regenerate(RegenerateArgs),
    /// Show tunnel status, run a health check or watch the tunnel
    Status(StatusArgs),
    /// Expose a local TCP or UDP service
    Tcp(TcpArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = match &cli.command {
        Commands::Status(args) if args.watch => "wiredoor_cli=info,wiredoor_core=info",
        _ => "wiredoor_cli=warn,wiredoor_core=warn",
    };
    init_tracing(default_filter, cli.log_json);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting wiredoor");

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let store = ConfigStore::new(cli.config);

    let host = match cli.command {
        Commands::Config(ref args) => {
            commands::config::run(&store, args)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Gateway(GatewayArgs { subnet: None, .. }) => {
            print_subcommand_help("gateway")?;
            return Ok(ExitCode::SUCCESS);
        }
        _ => Host::new(store)?,
    };

    match cli.command {
        Commands::Connect(args) => commands::connect::run(&host, &args)?,
        Commands::Disconnect => commands::connect::run_disconnect(&host)?,
        Commands::Enable(args) => commands::service::run_enable(&host.client, &args)?,
        Commands::Disable(args) => commands::service::run_disable(&host.client, &args)?,
        Commands::Gateway(args) => commands::gateway::run(
            &host.client,
            args.subnet.as_deref().unwrap_or_default(),
            args.interface.as_deref(),
        )?,
        Commands::Http(args) => commands::service::run_http(&host.client, &args)?,
        Commands::Login(args) => commands::login::run(&host, &args)?,
        Commands::Regenerate(args) => commands::regenerate::run(&host, &args)?,
        Commands::Status(args) => return commands::status::run(&host, &args),
        Commands::Tcp(args) => commands::service::run_tcp(&host.client, &args)?,
        Commands::Config(_) => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn print_subcommand_help(name: &str) -> io::Result<()> {
    let mut cmd = Cli::command();
    cmd.build();
    if let Some(sub) = cmd.find_subcommand_mut(name) {
        sub.print_help()?;
    }
    Ok(())
}

/// The control-plane error behind `err`, if any.
fn api_error(err: &anyhow::Error) -> Option<&ApiError> {
    if let Some(api) = err.downcast_ref::<ApiError>() {
        return Some(api);
    }
    if let Some(ReconcileError::Api(api)) = err.downcast_ref::<ReconcileError>() {
        return Some(api);
    }
    if let Some(ExposeError::Api(api)) = err.downcast_ref::<ExposeError>() {
        return Some(api);
    }
    None
}

fn report(err: &anyhow::Error) {
    let lines = api_error(err).map_or_else(|| vec![format!("Error: {err:#}")], error_lines);
    let mut stderr = io::stderr().lock();
    for line in lines {
        let _ = writeln!(stderr, "{line}");
    }
}

//! `http`, `tcp`, `enable` and `disable`.

use anyhow::Result;
use wiredoor_core::api::{ControlPlaneClient, HttpServiceParams, ServiceKind, TcpServiceParams};

use crate::expose;
use crate::render::{http_service_line, print_lines, service_record_line, tcp_service_line};

/// Arguments for `wiredoor http`.
#[derive(Debug, clap::Args)]
pub struct HttpArgs {
    /// Unique name for the exposed service
    pub name: String,

    /// Public domain to expose the service under
    #[arg(long)]
    pub domain: String,

    /// Local port where the HTTP service is running
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// URL path to expose
    #[arg(long, default_value = "/")]
    pub path: String,

    /// Protocol of the local service
    #[arg(long, default_value = "http", value_parser = ["http", "https"])]
    pub proto: String,

    /// Target internal IP or hostname (required on gateway nodes)
    #[arg(long = "backendHost")]
    pub backend_host: Option<String>,

    /// Allowed IPs or CIDRs, comma separated
    #[arg(long, value_delimiter = ',')]
    pub allow: Vec<String>,

    /// Blocked IPs or CIDRs, comma separated
    #[arg(long, value_delimiter = ',')]
    pub block: Vec<String>,

    /// Disable the service automatically after this long (30m, 1h, 2d)
    #[arg(long)]
    pub ttl: Option<String>,
}

impl HttpArgs {
    pub fn params(&self) -> HttpServiceParams {
        HttpServiceParams {
            name: self.name.clone(),
            domain: self.domain.clone(),
            path_location: self.path.clone(),
            backend_host: self.backend_host.clone(),
            backend_proto: self.proto.clone(),
            backend_port: self.port,
            allowed_ips: self.allow.clone(),
            blocked_ips: self.block.clone(),
            ttl: self.ttl.clone(),
        }
    }
}

/// Arguments for `wiredoor tcp`.
#[derive(Debug, clap::Args)]
pub struct TcpArgs {
    /// Unique name for the exposed service
    pub name: String,

    /// Local backend port of the service
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Optional domain label
    #[arg(long)]
    pub domain: Option<String>,

    /// Wrap the connection in TLS
    #[arg(long)]
    pub ssl: bool,

    /// Protocol of the local service
    #[arg(long, default_value = "tcp", value_parser = ["tcp", "udp"])]
    pub proto: String,

    /// Target internal IP or hostname (required on gateway nodes)
    #[arg(long = "backendHost")]
    pub backend_host: Option<String>,

    /// Allowed IPs or CIDRs, comma separated
    #[arg(long = "allowedIps", value_delimiter = ',')]
    pub allowed_ips: Vec<String>,

    /// Blocked IPs or CIDRs, comma separated
    #[arg(long = "blockedIps", value_delimiter = ',')]
    pub blocked_ips: Vec<String>,
}

impl TcpArgs {
    pub fn params(&self) -> TcpServiceParams {
        TcpServiceParams {
            name: self.name.clone(),
            domain: self.domain.clone().filter(|d| !d.is_empty()),
            proto: self.proto.clone(),
            backend_host: self.backend_host.clone(),
            backend_port: self.port,
            ssl: self.ssl,
            port: None,
            allowed_ips: self.allowed_ips.clone(),
            blocked_ips: self.blocked_ips.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceType {
    Http,
    Tcp,
}

impl From<ServiceType> for ServiceKind {
    fn from(t: ServiceType) -> Self {
        match t {
            ServiceType::Http => Self::Http,
            ServiceType::Tcp => Self::Tcp,
        }
    }
}

/// Arguments for `wiredoor enable`.
#[derive(Debug, clap::Args)]
pub struct EnableArgs {
    /// Service type
    #[arg(value_enum)]
    pub kind: ServiceType,

    /// Service id, as listed by `wiredoor status`
    pub id: u64,

    /// Disable the service again after this long (30m, 1h, 2d)
    #[arg(long)]
    pub ttl: Option<String>,
}

/// Arguments for `wiredoor disable`.
#[derive(Debug, clap::Args)]
pub struct DisableArgs {
    /// Service type
    #[arg(value_enum)]
    pub kind: ServiceType,

    /// Service id, as listed by `wiredoor status`
    pub id: u64,
}

pub fn run_http<C: ControlPlaneClient>(client: &C, args: &HttpArgs) -> Result<()> {
    let (service, _) = expose::expose_http(client, &args.params())?;
    print_lines(["New Service Available".to_string(), http_service_line(&service)])?;
    Ok(())
}

pub fn run_tcp<C: ControlPlaneClient>(client: &C, args: &TcpArgs) -> Result<()> {
    let (service, _) = expose::expose_tcp(client, &args.params())?;
    print_lines(["New Service Available".to_string(), tcp_service_line(&service)])?;
    Ok(())
}

pub fn run_enable<C: ControlPlaneClient>(client: &C, args: &EnableArgs) -> Result<()> {
    let kind = ServiceKind::from(args.kind);
    print_lines([format!("Enabling {kind} service '{}'...", args.id)])?;
    let record = expose::set_enabled(client, kind, args.id, true, args.ttl.as_deref())?;
    print_lines([
        "Service Enabled Successfully!".to_string(),
        service_record_line(&record),
    ])?;
    Ok(())
}

pub fn run_disable<C: ControlPlaneClient>(client: &C, args: &DisableArgs) -> Result<()> {
    let kind = ServiceKind::from(args.kind);
    print_lines([format!("Disabling {kind} service '{}'...", args.id)])?;
    let record = expose::set_enabled(client, kind, args.id, false, None)?;
    print_lines([
        "Service Disabled Successfully!".to_string(),
        service_record_line(&record),
    ])?;
    Ok(())
}

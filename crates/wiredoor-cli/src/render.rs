//! User-facing text: status report, service lines and API error messages.
//!
//! Everything here returns lines; commands decide where they are written.

use std::io::{self, Write};

use time::OffsetDateTime;
use time::macros::format_description;
use wiredoor_core::api::{ApiError, HttpService, Node, ServiceRecord, TcpService};

use crate::net::TUNNEL_INTERFACE;
use crate::reconcile::StatusReport;

const ENABLED: &str = "✅";
const DISABLED: &str = "❌";

/// Write `lines` to stdout, one per line.
pub fn print_lines<I, S>(lines: I) -> io::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = io::stdout().lock();
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    Ok(())
}

/// Current time in milliseconds since the epoch.
pub fn now_millis() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp() * 1000
}

/// Size in IEC units: `512 B`, `1.5 KiB`, `3.0 GiB`.
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    let bytes = bytes.max(0);
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = ["K", "M", "G", "T", "P", "E"][exp];
    format!("{:.1} {prefix}iB", bytes as f64 / div as f64)
}

/// How long ago `timestamp_ms` was, relative to `now_ms`.
#[allow(clippy::cast_precision_loss)]
pub fn format_relative_time(now_ms: i64, timestamp_ms: i64) -> String {
    if timestamp_ms <= 0 {
        return "never".into();
    }
    let secs = ((now_ms - timestamp_ms) / 1000).max(0);
    match secs {
        0..60 => format!("{secs} seconds ago"),
        60..120 => "1 minute ago".into(),
        120..3600 => format!("{} minutes ago", secs / 60),
        3600..86_400 => format!("{:.1} hours ago", secs as f64 / 3600.0),
        _ => OffsetDateTime::from_unix_timestamp(timestamp_ms / 1000)
            .ok()
            .and_then(|t| {
                t.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
                    .ok()
            })
            .unwrap_or_else(|| "unknown".into()),
    }
}

fn target(proto: &str, backend_host: Option<&str>, port: u16) -> String {
    let host = backend_host
        .filter(|h| !h.is_empty())
        .unwrap_or("localhost");
    format!("{proto}://{host}:{port}")
}

const fn enabled_mark(enabled: bool) -> &'static str {
    if enabled { ENABLED } else { DISABLED }
}

pub fn http_service_line(svc: &HttpService) -> String {
    format!(
        "- {} {} {} [HTTP] → {} → {}",
        svc.id,
        enabled_mark(svc.enabled),
        svc.name,
        svc.public_access,
        target(&svc.backend_proto, svc.backend_host.as_deref(), svc.backend_port)
    )
}

pub fn tcp_service_line(svc: &TcpService) -> String {
    let mut tag = svc.proto.to_uppercase();
    if svc.ssl {
        tag.push_str("/SSL");
    }
    format!(
        "- {} {} {} [{tag}] → {}://{} → {}",
        svc.id,
        enabled_mark(svc.enabled),
        svc.name,
        svc.proto,
        svc.public_access,
        target(&svc.proto, svc.backend_host.as_deref(), svc.backend_port)
    )
}

pub fn service_record_line(record: &ServiceRecord) -> String {
    match record {
        ServiceRecord::Http(svc) => http_service_line(svc),
        ServiceRecord::Tcp(svc) => tcp_service_line(svc),
    }
}

/// Node header, tunnel statistics and exposed services.
pub fn node_details(node: &Node, now_ms: i64) -> Vec<String> {
    let mut lines = vec![String::new()];
    if node.is_gateway {
        lines.push(format!(
            "🛡️  Gateway: {} ({}) → 🌐 Subnet: {}",
            node.name,
            node.address,
            node.subnets().join(", ")
        ));
    } else {
        lines.push(format!("🖥️  Node: {} ({})", node.name, node.address));
    }
    lines.push(String::new());
    lines.push(format!(
        "🔐 Handshake: {} | TX: {} | RX: {}",
        format_relative_time(now_ms, node.latest_handshake_timestamp),
        format_bytes(node.transfer_tx),
        format_bytes(node.transfer_rx)
    ));
    lines.push(String::new());

    if node.http_services.is_empty() && node.tcp_services.is_empty() {
        lines.push("🌐 No services exposed yet.".into());
        lines.push("👉 Use 'wiredoor http' or 'wiredoor tcp' to expose a service.".into());
    } else {
        lines.push("🌐 Services:".into());
        lines.extend(node.http_services.iter().map(http_service_line));
        lines.extend(node.tcp_services.iter().map(tcp_service_line));
    }
    lines
}

pub fn status_lines(report: &StatusReport, now_ms: i64) -> Vec<String> {
    match report {
        StatusReport::NotConnected => vec![
            format!("❌ WireGuard interface '{TUNNEL_INTERFACE}' is not active."),
            "Run 'wiredoor connect' to establish the tunnel.".into(),
        ],
        StatusReport::ServerUnreachable => vec![
            "❌ Tunnel seems active, but Wiredoor server unreachable.".into(),
            "Try running 'wiredoor connect' again or check server availability.".into(),
        ],
        StatusReport::Connected { vpn_host, node } => {
            let mut lines = vec![format!(" ✔ Connection successful to: {vpn_host}")];
            lines.extend(node_details(node, now_ms));
            lines
        }
    }
}

/// Lines reported for a control-plane error. Validation failures produce
/// exactly one line per field error.
pub fn error_lines(err: &ApiError) -> Vec<String> {
    match err {
        ApiError::Validation(fields) if !fields.is_empty() => fields
            .iter()
            .map(|f| format!("Error - {}: {}", f.field, f.message))
            .collect(),
        ApiError::BadRequest(message) => vec![format!("Bad Request: {message}")],
        ApiError::Unauthorized => vec!["Error: Invalid authentication token".into()],
        ApiError::Server(_) => vec!["Error: Unknown Wiredoor server error".into()],
        other => vec![format!("Error: {other}")],
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use wiredoor_core::api::{FieldError, GatewayNetwork};

    use super::*;

    const NOW: i64 = 1_760_000_000_000;

    #[test]
    fn bytes_use_iec_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
        assert_eq!(format_bytes(-4), "0 B");
    }

    #[test]
    fn relative_time_buckets() {
        assert_eq!(format_relative_time(NOW, 0), "never");
        assert_eq!(format_relative_time(NOW, NOW - 12_000), "12 seconds ago");
        assert_eq!(format_relative_time(NOW, NOW - 90_000), "1 minute ago");
        assert_eq!(format_relative_time(NOW, NOW - 5 * 60_000), "5 minutes ago");
        assert_eq!(
            format_relative_time(NOW, NOW - 90 * 60_000),
            "1.5 hours ago"
        );
        assert_eq!(format_relative_time(NOW, NOW + 5_000), "0 seconds ago");
    }

    #[test]
    fn old_handshake_shows_utc_date() {
        // 2025-01-01 12:30 UTC
        let ts = 1_735_734_600_000;
        assert_eq!(format_relative_time(NOW, ts), "2025-01-01 12:30");
    }

    fn http() -> HttpService {
        HttpService {
            id: 4,
            name: "website".into(),
            backend_proto: "http".into(),
            backend_port: 3000,
            public_access: "https://website.com/ui".into(),
            enabled: true,
            ..HttpService::default()
        }
    }

    fn tcp() -> TcpService {
        TcpService {
            id: 5,
            name: "db".into(),
            proto: "tcp".into(),
            ssl: true,
            backend_host: Some("10.0.0.100".into()),
            backend_port: 5432,
            public_access: "gw.example.com:32001".into(),
            enabled: false,
            ..TcpService::default()
        }
    }

    #[test]
    fn http_line_targets_localhost_without_backend_host() {
        assert_eq!(
            http_service_line(&http()),
            "- 4 ✅ website [HTTP] → https://website.com/ui → http://localhost:3000"
        );
    }

    #[test]
    fn tcp_line_shows_proto_tag_and_backend() {
        assert_eq!(
            tcp_service_line(&tcp()),
            "- 5 ❌ db [TCP/SSL] → tcp://gw.example.com:32001 → tcp://10.0.0.100:5432"
        );
        assert_eq!(
            service_record_line(&ServiceRecord::Tcp(tcp())),
            tcp_service_line(&tcp())
        );
    }

    #[test]
    fn node_without_services_gets_hint() {
        let node = Node {
            name: "edge-1".into(),
            address: "10.12.1.7".into(),
            ..Node::default()
        };
        let lines = node_details(&node, NOW);
        assert_eq!(lines[1], "🖥️  Node: edge-1 (10.12.1.7)");
        assert_eq!(lines[3], "🔐 Handshake: never | TX: 0 B | RX: 0 B");
        assert_eq!(lines[5], "🌐 No services exposed yet.");
    }

    #[test]
    fn gateway_header_lists_subnets_and_services() {
        let node = Node {
            name: "gw-1".into(),
            address: "10.12.1.2".into(),
            is_gateway: true,
            gateway_networks: vec![GatewayNetwork {
                interface: "eth0".into(),
                subnet: "10.42.0.0/16".into(),
            }],
            http_services: vec![http()],
            tcp_services: vec![tcp()],
            ..Node::default()
        };
        let lines = node_details(&node, NOW);
        assert_eq!(
            lines[1],
            "🛡️  Gateway: gw-1 (10.12.1.2) → 🌐 Subnet: 10.42.0.0/16"
        );
        assert_eq!(lines[5], "🌐 Services:");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn status_messages() {
        let lines = status_lines(&StatusReport::NotConnected, NOW);
        assert_eq!(lines[0], "❌ WireGuard interface 'wg0' is not active.");

        let lines = status_lines(
            &StatusReport::Connected {
                vpn_host: "vpn.example.com".into(),
                node: Box::default(),
            },
            NOW,
        );
        assert_eq!(lines[0], " ✔ Connection successful to: vpn.example.com");
    }

    #[test]
    fn validation_error_prints_one_line_per_field() {
        let err = ApiError::Validation(vec![
            FieldError {
                field: "domain".into(),
                message: "must be a valid domain".into(),
            },
            FieldError {
                field: "backendPort".into(),
                message: "must be a valid port".into(),
            },
        ]);
        assert_eq!(
            error_lines(&err),
            [
                "Error - domain: must be a valid domain",
                "Error - backendPort: must be a valid port"
            ]
        );
    }

    #[test]
    fn status_errors_use_fixed_messages() {
        assert_eq!(
            error_lines(&ApiError::Unauthorized),
            ["Error: Invalid authentication token"]
        );
        assert_eq!(
            error_lines(&ApiError::Server(502)),
            ["Error: Unknown Wiredoor server error"]
        );
        assert_eq!(
            error_lines(&ApiError::BadRequest("name already in use".into())),
            ["Bad Request: name already in use"]
        );
    }
}

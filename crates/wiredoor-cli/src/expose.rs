//! Service exposure, enable/disable and gateway subnet updates.
//!
//! Inputs are validated locally before any request; everything else is
//! decided by the control plane.

use std::net::IpAddr;
use std::sync::LazyLock;

use ipnet::IpNet;
use regex::Regex;
use thiserror::Error;
use wiredoor_core::api::{
    ApiError, ControlPlaneClient, GatewayNetwork, HttpService, HttpServiceParams, Node,
    ServiceKind, ServiceRecord, TcpService, TcpServiceParams,
};

#[allow(clippy::expect_used)]
static TTL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[1-9]\d*[smhd]$").expect("valid TTL pattern"));

#[derive(Debug, Error)]
pub enum ExposeError {
    #[error("You must define --backendHost when your node is a gateway")]
    BackendHostRequired,

    #[error("Invalid IP address or CIDR: {0}")]
    InvalidAddress(String),

    #[error("Invalid subnet format: {0}")]
    InvalidSubnet(String),

    #[error("Invalid TTL '{0}', expected a number followed by s, m, h or d (e.g. 30m, 1h, 2d)")]
    InvalidTtl(String),

    #[error("This node is not a gateway, gateway subnets can only be set on gateway nodes")]
    NotGateway,

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub type Result<T> = std::result::Result<T, ExposeError>;

/// Accept `30s`, `10m`, `1h`, `2d`.
pub fn validate_ttl(ttl: &str) -> Result<()> {
    if TTL_RE.is_match(ttl) {
        Ok(())
    } else {
        Err(ExposeError::InvalidTtl(ttl.to_string()))
    }
}

/// Every entry must be an IP address or a CIDR network.
pub fn validate_addresses(entries: &[String]) -> Result<()> {
    for entry in entries {
        let entry = entry.trim();
        if entry.parse::<IpAddr>().is_err() && entry.parse::<IpNet>().is_err() {
            return Err(ExposeError::InvalidAddress(entry.to_string()));
        }
    }
    Ok(())
}

fn has_backend_host(host: Option<&String>) -> bool {
    host.is_some_and(|h| !h.trim().is_empty())
}

/// Fetch the node and refuse gateway nodes that did not name a backend.
fn check_backend<C: ControlPlaneClient>(client: &C, backend_host: Option<&String>) -> Result<Node> {
    let node = client.fetch_node()?;
    if node.is_gateway && !has_backend_host(backend_host) {
        return Err(ExposeError::BackendHostRequired);
    }
    Ok(node)
}

/// Publish a local HTTP service. Returns the created service and the node
/// it belongs to.
pub fn expose_http<C: ControlPlaneClient>(
    client: &C,
    params: &HttpServiceParams,
) -> Result<(HttpService, Node)> {
    validate_addresses(&params.allowed_ips)?;
    validate_addresses(&params.blocked_ips)?;
    if let Some(ttl) = &params.ttl {
        validate_ttl(ttl)?;
    }

    let node = check_backend(client, params.backend_host.as_ref())?;
    tracing::debug!(name = %params.name, domain = %params.domain, "exposing http service");
    let service = client.expose_http(params)?;
    Ok((service, node))
}

/// Publish a local TCP or UDP service.
pub fn expose_tcp<C: ControlPlaneClient>(
    client: &C,
    params: &TcpServiceParams,
) -> Result<(TcpService, Node)> {
    validate_addresses(&params.allowed_ips)?;
    validate_addresses(&params.blocked_ips)?;

    let node = check_backend(client, params.backend_host.as_ref())?;
    tracing::debug!(name = %params.name, proto = %params.proto, "exposing tcp service");
    let service = client.expose_tcp(params)?;
    Ok((service, node))
}

/// Enable (optionally for `ttl`) or disable a service by id.
pub fn set_enabled<C: ControlPlaneClient>(
    client: &C,
    kind: ServiceKind,
    id: u64,
    enabled: bool,
    ttl: Option<&str>,
) -> Result<ServiceRecord> {
    if let Some(ttl) = ttl {
        validate_ttl(ttl)?;
    }
    Ok(client.set_service_enabled(kind, id, enabled, ttl)?)
}

/// Reject anything that is not a CIDR network.
pub fn validate_subnet(subnet: &str) -> Result<()> {
    subnet
        .parse::<IpNet>()
        .map(drop)
        .map_err(|_| ExposeError::InvalidSubnet(subnet.to_string()))
}

/// Point the gateway at a new internal subnet.
pub fn update_gateway<C: ControlPlaneClient>(client: &C, network: &GatewayNetwork) -> Result<Node> {
    validate_subnet(&network.subnet)?;

    let node = client.fetch_node()?;
    if !node.is_gateway {
        return Err(ExposeError::NotGateway);
    }
    Ok(client.update_gateway_network(network)?)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeControlPlane, journal, registered_node};

    fn gateway_node() -> Node {
        Node {
            is_gateway: true,
            ..registered_node("gw-1")
        }
    }

    fn http_params() -> HttpServiceParams {
        HttpServiceParams {
            name: "website".into(),
            domain: "website.com".into(),
            path_location: "/".into(),
            backend_proto: "http".into(),
            backend_port: 3000,
            ..HttpServiceParams::default()
        }
    }

    fn tcp_params() -> TcpServiceParams {
        TcpServiceParams {
            name: "ssh".into(),
            proto: "tcp".into(),
            backend_port: 22,
            ..TcpServiceParams::default()
        }
    }

    #[test]
    fn ttl_format() {
        for ok in ["30s", "10m", "1h", "2d", "120m"] {
            validate_ttl(ok).unwrap();
        }
        for bad in ["", "1", "h", "0m", "1w", "1.5h", "-1h", "1h "] {
            assert!(matches!(validate_ttl(bad), Err(ExposeError::InvalidTtl(_))), "{bad}");
        }
    }

    #[test]
    fn address_lists_accept_ips_and_cidrs() {
        validate_addresses(&[
            "192.168.1.0/24".into(),
            "203.0.113.42".into(),
            "2001:db8::/32".into(),
        ])
        .unwrap();

        let err = validate_addresses(&["10.0.0.0/33".into()]).unwrap_err();
        assert!(matches!(err, ExposeError::InvalidAddress(e) if e == "10.0.0.0/33"));
        assert!(validate_addresses(&["example.com".into()]).is_err());
    }

    #[test]
    fn http_on_regular_node_is_sent() {
        let j = journal();
        let client = FakeControlPlane::new(&j, Some(registered_node("edge-1")));

        let (service, node) = expose_http(&client, &http_params()).unwrap();

        assert_eq!(service.name, "website");
        assert_eq!(node.name, "edge-1");
        assert_eq!(client.http_params.borrow().len(), 1);
    }

    #[test]
    fn gateway_without_backend_host_is_rejected_before_expose() {
        let j = journal();
        let client = FakeControlPlane::new(&j, Some(gateway_node()));

        let err = expose_http(&client, &http_params()).unwrap_err();
        assert!(matches!(err, ExposeError::BackendHostRequired));

        let err = expose_tcp(
            &client,
            &TcpServiceParams {
                backend_host: Some("  ".into()),
                ..tcp_params()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ExposeError::BackendHostRequired));

        assert_eq!(*j.borrow(), ["api:node", "api:node"]);
    }

    #[test]
    fn gateway_with_backend_host_is_sent() {
        let j = journal();
        let client = FakeControlPlane::new(&j, Some(gateway_node()));

        let (service, _) = expose_tcp(
            &client,
            &TcpServiceParams {
                backend_host: Some("10.0.0.100".into()),
                ..tcp_params()
            },
        )
        .unwrap();

        assert_eq!(service.backend_host.as_deref(), Some("10.0.0.100"));
        assert_eq!(
            client.tcp_params.borrow()[0].backend_host.as_deref(),
            Some("10.0.0.100")
        );
    }

    #[test]
    fn invalid_input_makes_no_request() {
        let j = journal();
        let client = FakeControlPlane::new(&j, Some(registered_node("edge-1")));

        let params = HttpServiceParams {
            allowed_ips: vec!["not-an-ip".into()],
            ..http_params()
        };
        assert!(expose_http(&client, &params).is_err());

        let params = HttpServiceParams {
            ttl: Some("forever".into()),
            ..http_params()
        };
        assert!(expose_http(&client, &params).is_err());

        assert!(set_enabled(&client, ServiceKind::Http, 4, true, Some("1y")).is_err());
        assert!(j.borrow().is_empty());
    }

    #[test]
    fn enable_and_disable_pass_kind_id_and_ttl() {
        let j = journal();
        let client = FakeControlPlane::new(&j, Some(registered_node("edge-1")));

        let record = set_enabled(&client, ServiceKind::Tcp, 5, true, Some("1h")).unwrap();
        assert!(matches!(record, ServiceRecord::Tcp(ref s) if s.id == 5 && s.enabled));

        set_enabled(&client, ServiceKind::Http, 4, false, None).unwrap();

        assert_eq!(
            *j.borrow(),
            ["api:tcp 5 enabled=true ttl=1h", "api:http 4 enabled=false ttl=-"]
        );
    }

    #[test]
    fn gateway_update_requires_cidr_and_gateway_node() {
        let j = journal();
        let client = FakeControlPlane::new(&j, Some(registered_node("edge-1")));

        let bad = GatewayNetwork {
            interface: "eth0".into(),
            subnet: "10.42.0.0".into(),
        };
        assert!(matches!(
            update_gateway(&client, &bad),
            Err(ExposeError::InvalidSubnet(_))
        ));
        assert!(j.borrow().is_empty());

        let good = GatewayNetwork {
            interface: "eth0".into(),
            subnet: "10.42.0.0/16".into(),
        };
        assert!(matches!(
            update_gateway(&client, &good),
            Err(ExposeError::NotGateway)
        ));

        *client.node.borrow_mut() = Some(gateway_node());
        let node = update_gateway(&client, &good).unwrap();
        assert_eq!(node.subnets(), ["10.42.0.0/16"]);
    }
}

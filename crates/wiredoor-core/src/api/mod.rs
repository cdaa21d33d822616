//! Control-plane API integration.
//!
//! Provides a reqwest-based client for the Wiredoor REST API and the
//! [`ControlPlaneClient`] capability the reconciler and the exposure
//! commands are written against.

mod client;
pub mod types;


use std::net::Ipv4Addr;

pub use client::{ApiClient, ApiError, DEFAULT_TIMEOUT, PROBE_TIMEOUT};
pub use types::{
    AdminCredentials, ApiConfig, FieldError, GatewayNetwork, HttpService, HttpServiceParams, Node,
    NodeParams, PeerConfig, PeerEndpoint, ServiceKind, ServiceRecord, TcpService,
    TcpServiceParams, WgConfig,
};

/// Requests made against the control plane on behalf of the local node.
pub trait ControlPlaneClient {
    /// Current node detail, including services and tunnel statistics.
    fn fetch_node(&self) -> Result<Node, ApiError>;

    /// Private key and peer data for the tunnel config file.
    fn fetch_tunnel_config(&self) -> Result<WgConfig, ApiError>;

    /// Lightweight config fetch through the tunnel gateway address.
    fn probe(&self, gateway: Ipv4Addr) -> Result<ApiConfig, ApiError>;

    /// Rotate the node's keys and token.
    fn regenerate_keys(&self) -> Result<Node, ApiError>;

    fn expose_http(&self, params: &HttpServiceParams) -> Result<HttpService, ApiError>;

    fn expose_tcp(&self, params: &TcpServiceParams) -> Result<TcpService, ApiError>;

    /// Enable (optionally for `ttl`) or disable a service.
    fn set_service_enabled(
        &self,
        kind: ServiceKind,
        id: u64,
        enabled: bool,
        ttl: Option<&str>,
    ) -> Result<ServiceRecord, ApiError>;

    fn update_gateway_network(&self, network: &GatewayNetwork) -> Result<Node, ApiError>;
}

/// The advertised VPN host when a probe succeeded with a usable answer.
pub fn reachable_host(probe: Result<ApiConfig, ApiError>) -> Option<String> {
    match probe {
        Ok(config) if !config.vpn_host.is_empty() => Some(config.vpn_host),
        Ok(_) => {
            tracing::debug!("probe answered without VPN_HOST");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "probe failed");
            None
        }
    }
}

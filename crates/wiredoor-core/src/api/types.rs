//! Control-plane wire types.
//!
//! The server owns every one of these records; fields it omits or sends as
//! `null` default to empty values so a partial response still decodes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Servers send `null` for unset fields; decode it like a missing one.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Admin credentials for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdminLoginResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub token: String,
    #[serde(deserialize_with = "null_as_default")]
    pub expires_in: String,
}

/// A LAN routed behind a gateway node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayNetwork {
    #[serde(deserialize_with = "null_as_default")]
    pub interface: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subnet: String,
}

/// Registration parameters for `POST /nodes`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeParams {
    pub name: String,
    pub is_gateway: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gateway_networks: Vec<GatewayNetwork>,
    pub allow_internet: bool,
}

/// This machine's identity as known by the control plane.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Node {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_gateway: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub gateway_networks: Vec<GatewayNetwork>,
    /// Older servers report a single subnet string.
    pub gateway_network: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub allow_internet: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub wg_interface: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub http_services: Vec<HttpService>,
    #[serde(deserialize_with = "null_as_default")]
    pub tcp_services: Vec<TcpService>,
    #[serde(deserialize_with = "null_as_default")]
    pub token: String,
    #[serde(deserialize_with = "null_as_default")]
    pub client_ip: String,
    /// Milliseconds since the epoch, `0` when no handshake happened yet.
    #[serde(deserialize_with = "null_as_default")]
    pub latest_handshake_timestamp: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub transfer_rx: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub transfer_tx: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
}

impl Node {
    /// A node is only usable when the server assigned it an id.
    pub const fn is_registered(&self) -> bool {
        self.id > 0
    }

    /// Gateway subnets, whichever field the server filled in.
    pub fn subnets(&self) -> Vec<String> {
        let mut subnets: Vec<String> = self
            .gateway_networks
            .iter()
            .filter(|n| !n.subnet.is_empty())
            .map(|n| n.subnet.clone())
            .collect();
        if subnets.is_empty()
            && let Some(subnet) = self.gateway_network.as_ref().filter(|s| !s.is_empty())
        {
            subnets.push(subnet.clone());
        }
        subnets
    }
}

/// Service kind, also the URL segment in `/cli/services/<kind>/...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Http,
    Tcp,
}

impl ServiceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Tcp => "tcp",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creation parameters for `POST /cli/expose/http`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpServiceParams {
    pub name: String,
    pub domain: String,
    pub path_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_host: Option<String>,
    pub backend_proto: String,
    pub backend_port: u16,
    pub allowed_ips: Vec<String>,
    pub blocked_ips: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

/// Creation parameters for `POST /cli/expose/tcp`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpServiceParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub proto: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_host: Option<String>,
    pub backend_port: u16,
    pub ssl: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub allowed_ips: Vec<String>,
    pub blocked_ips: Vec<String>,
}

/// An exposed HTTP service as returned by the server.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpService {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub domain: String,
    #[serde(deserialize_with = "null_as_default")]
    pub path_location: String,
    pub backend_host: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub backend_proto: String,
    #[serde(deserialize_with = "null_as_default")]
    pub backend_port: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_ips: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub blocked_ips: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub node_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub public_access: String,
}

/// An exposed TCP/UDP service as returned by the server.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TcpService {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub domain: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub proto: String,
    pub backend_host: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub backend_port: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub ssl: bool,
    pub port: Option<u16>,
    #[serde(deserialize_with = "null_as_default")]
    pub allowed_ips: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub blocked_ips: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub node_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub public_access: String,
}

/// Either kind of service, as returned by enable/disable.
#[derive(Debug, Clone)]
pub enum ServiceRecord {
    Http(HttpService),
    Tcp(TcpService),
}

/// Body of `PATCH /cli/services/<kind>/<id>/enable`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnableRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PeerEndpoint {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub host: String,
    #[serde(deserialize_with = "null_as_default")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PeerConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub public_key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub preshared_key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub endpoint: PeerEndpoint,
    #[serde(rename = "persistentKeepalive", deserialize_with = "null_as_default")]
    pub persistent_keepalive: u16,
    #[serde(rename = "allowedIPs", deserialize_with = "null_as_default")]
    pub allowed_ips: Vec<String>,
}

/// Tunnel parameters from `GET /cli/wgconfig`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WgConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub private_key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub post_up: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub post_down: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub peer: PeerConfig,
}

/// Public server settings from the lightweight `GET /config` probe.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    #[serde(rename = "VPN_HOST")]
    #[serde(deserialize_with = "null_as_default")]
    pub vpn_host: String,
    #[serde(rename = "TCP_SERVICES_PORT_RANGE")]
    #[serde(deserialize_with = "null_as_default")]
    pub tcp_services_port_range: String,
}

/// A single field-level validation message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FieldError {
    #[serde(deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ValidationErrors {
    #[serde(deserialize_with = "null_as_default")]
    pub params: Vec<FieldError>,
    #[serde(deserialize_with = "null_as_default")]
    pub body: Vec<FieldError>,
}

/// 422 response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct UnprocessableRequest {
    #[allow(dead_code)]
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: ValidationErrors,
}

/// 400 response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BadRequest {
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
}

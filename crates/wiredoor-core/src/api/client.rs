//! Wiredoor control-plane REST client.
//!
//! Uses blocking reqwest: every command issues one request at a time and
//! waits for it. The settings file is re-read for every request so a token
//! saved earlier in the same command is picked up.

use std::net::Ipv4Addr;
use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::ControlPlaneClient;
use super::types::{
    AdminCredentials, AdminLoginResponse, ApiConfig, BadRequest, EnableRequest, FieldError,
    GatewayNetwork, HttpService, HttpServiceParams, Node, NodeParams, ServiceKind, ServiceRecord,
    TcpService, TcpServiceParams, UnprocessableRequest, WgConfig,
};
use crate::config::ConfigStore;

/// Timeout for regular API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Timeout for the reachability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Control-plane client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Invalid authentication token")]
    Unauthorized,

    #[error("Validation failed ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Unknown Wiredoor server error ({0})")]
    Server(u16),

    #[error("Unexpected response ({status}): {reason}")]
    UnexpectedStatus { status: u16, reason: String },

    #[error("Unable to decode server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No Wiredoor server configured. Run `wiredoor config` or `wiredoor login --url <url>`")]
    NotConfigured,

    #[error("Unable to load local config: {0}")]
    Config(#[from] crate::error::Error),
}

/// Map a response status to an error, decoding the error body where the
/// server provides one.
pub(crate) fn check_status(status: u16, body: &[u8]) -> Result<(), ApiError> {
    match status {
        200..=299 => Ok(()),
        400 => {
            let parsed: BadRequest = serde_json::from_slice(body).unwrap_or_default();
            Err(ApiError::BadRequest(parsed.message))
        }
        401 | 403 => Err(ApiError::Unauthorized),
        422 => {
            let parsed: UnprocessableRequest = serde_json::from_slice(body).unwrap_or_default();
            let mut fields = parsed.errors.params;
            fields.extend(parsed.errors.body);
            Err(ApiError::Validation(fields))
        }
        500.. => Err(ApiError::Server(status)),
        _ => Err(ApiError::UnexpectedStatus {
            status,
            reason: reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown")
                .into(),
        }),
    }
}

/// Build `<base><prefix>/api<path>`.
pub(crate) fn api_url(base: &str, prefix: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{base}/api{path}")
    } else {
        format!("{base}/{prefix}/api{path}")
    }
}

/// Where a request goes and with which token.
struct Target {
    base: String,
    prefix: String,
    token: String,
    verify_tls: bool,
}

/// Wiredoor REST client.
#[derive(Debug)]
pub struct ApiClient {
    store: ConfigStore,
    http: Client,
    insecure: Client,
    user_agent: String,
}

impl ApiClient {
    /// Create a client reading server settings from `store`.
    pub fn new(store: ConfigStore) -> Result<Self, ApiError> {
        // reqwest is built with rustls-no-provider. `Err` means a provider is
        // already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = Client::builder().build()?;
        let insecure = Client::builder().danger_accept_invalid_certs(true).build()?;

        Ok(Self {
            store,
            http,
            insecure,
            user_agent: format!("wiredoor-cli/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub const fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Exchange admin credentials for an admin token.
    pub fn admin_login(
        &self,
        server: &str,
        credentials: &AdminCredentials,
    ) -> Result<String, ApiError> {
        let prefix = self.store.load()?.server.path;
        let url = api_url(server, &prefix, "/auth/login");
        let body = serde_json::to_vec(credentials)?;
        let bytes = self.execute(
            &self.insecure,
            Method::POST,
            &url,
            "",
            Some(body),
            DEFAULT_TIMEOUT,
        )?;
        let resp: AdminLoginResponse = serde_json::from_slice(&bytes)?;
        if resp.token.is_empty() {
            return Err(ApiError::Unauthorized);
        }
        Ok(resp.token)
    }

    /// Register this machine as a node. The returned node carries its token.
    pub fn register_node(
        &self,
        server: &str,
        admin_token: &str,
        params: &NodeParams,
    ) -> Result<Node, ApiError> {
        let prefix = self.store.load()?.server.path;
        let url = api_url(server, &prefix, "/nodes");
        let body = serde_json::to_vec(params)?;
        let bytes = self.execute(
            &self.insecure,
            Method::POST,
            &url,
            admin_token,
            Some(body),
            DEFAULT_TIMEOUT,
        )?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn target(&self) -> Result<Target, ApiError> {
        let config = self.store.load()?;
        let credentials = config.credentials().ok_or(ApiError::NotConfigured)?;
        Ok(Target {
            base: credentials.url,
            prefix: config.server.path,
            token: credentials.token,
            verify_tls: config.server.verify_tls,
        })
    }

    /// Send a request to the configured server and decode the response.
    fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<T, ApiError> {
        let target = self.target()?;
        let url = api_url(&target.base, &target.prefix, path);
        let body = body.map(serde_json::to_vec).transpose()?;
        let client = if target.verify_tls {
            &self.http
        } else {
            &self.insecure
        };
        let bytes = self.execute(client, method, &url, &target.token, body, DEFAULT_TIMEOUT)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn execute(
        &self,
        client: &Client,
        method: Method,
        url: &str,
        token: &str,
        body: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(%method, url, "api request");

        let mut req = client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .timeout(timeout);
        if !token.is_empty() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.body(body);
        }

        let resp = req.send()?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes()?;
        tracing::debug!(status, len = bytes.len(), "api response");

        check_status(status, &bytes)?;
        Ok(bytes.to_vec())
    }
}

impl ControlPlaneClient for ApiClient {
    fn fetch_node(&self) -> Result<Node, ApiError> {
        self.call(Method::GET, "/cli/node", None::<&()>)
    }

    fn fetch_tunnel_config(&self) -> Result<WgConfig, ApiError> {
        self.call(Method::GET, "/cli/wgconfig", None::<&()>)
    }

    fn probe(&self, gateway: Ipv4Addr) -> Result<ApiConfig, ApiError> {
        let config = self.store.load()?;
        let url = api_url(&format!("https://{gateway}"), &config.server.path, "/config");
        let bytes = self.execute(
            &self.insecure,
            Method::GET,
            &url,
            &config.server.token,
            None,
            PROBE_TIMEOUT,
        )?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn regenerate_keys(&self) -> Result<Node, ApiError> {
        self.call(Method::PATCH, "/cli/regenerate", None::<&()>)
    }

    fn expose_http(&self, params: &HttpServiceParams) -> Result<HttpService, ApiError> {
        self.call(Method::POST, "/cli/expose/http", Some(params))
    }

    fn expose_tcp(&self, params: &TcpServiceParams) -> Result<TcpService, ApiError> {
        self.call(Method::POST, "/cli/expose/tcp", Some(params))
    }

    fn set_service_enabled(
        &self,
        kind: ServiceKind,
        id: u64,
        enabled: bool,
        ttl: Option<&str>,
    ) -> Result<ServiceRecord, ApiError> {
        let action = if enabled { "enable" } else { "disable" };
        let path = format!("/cli/services/{kind}/{id}/{action}");
        let body = enabled.then(|| EnableRequest {
            ttl: ttl.map(str::to_string),
        });

        Ok(match kind {
            ServiceKind::Http => {
                ServiceRecord::Http(self.call(Method::PATCH, &path, body.as_ref())?)
            }
            ServiceKind::Tcp => ServiceRecord::Tcp(self.call(Method::PATCH, &path, body.as_ref())?),
        })
    }

    fn update_gateway_network(&self, network: &GatewayNetwork) -> Result<Node, ApiError> {
        self.call(Method::PATCH, "/cli/node/gateway", Some(network))
    }
}

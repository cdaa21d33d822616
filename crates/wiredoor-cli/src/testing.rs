//! In-memory fakes for the control plane, tunnel and service capabilities.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::{Cell, RefCell};
use std::net::Ipv4Addr;
use std::rc::Rc;

use anyhow::bail;
use wiredoor_core::ConfigStore;
use wiredoor_core::api::{
    ApiConfig, ApiError, ControlPlaneClient, GatewayNetwork, HttpService, HttpServiceParams, Node,
    PeerConfig, PeerEndpoint, ServiceKind, ServiceRecord, TcpService, TcpServiceParams, WgConfig,
};

use crate::system::{ServiceManager, TunnelController};

/// Ordered record of side effects across fakes.
pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

fn note(journal: &Journal, entry: impl Into<String>) {
    journal.borrow_mut().push(entry.into());
}

pub fn registered_node(name: &str) -> Node {
    Node {
        id: 7,
        name: name.into(),
        address: "10.12.1.7".into(),
        enabled: true,
        token: "node-token".into(),
        ..Node::default()
    }
}

pub fn tunnel_config() -> WgConfig {
    WgConfig {
        private_key: "cHJpdmF0ZQ==".into(),
        address: "10.12.1.7/32".into(),
        post_up: Vec::new(),
        post_down: Vec::new(),
        peer: PeerConfig {
            public_key: "cHVibGlj".into(),
            preshared_key: String::new(),
            endpoint: PeerEndpoint {
                url: "vpn.example.com".into(),
                host: String::new(),
                port: 51820,
            },
            persistent_keepalive: 0,
            allowed_ips: vec!["10.12.1.0/24".into()],
        },
    }
}

/// Settings file in a temp dir with server credentials already saved.
pub fn configured_store() -> (tempfile::TempDir, ConfigStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("config.toml"));
    store
        .save_server("https://wiredoor.example.com", "node-token")
        .unwrap();
    (dir, store)
}

/// Control plane answering from canned values. `None` makes a call fail
/// with a server error.
pub struct FakeControlPlane {
    pub journal: Journal,
    pub node: RefCell<Option<Node>>,
    pub wg: Option<WgConfig>,
    pub vpn_host: Option<String>,
    pub regenerated: Option<Node>,
    pub fetch_calls: Cell<usize>,
    pub http_params: RefCell<Vec<HttpServiceParams>>,
    pub tcp_params: RefCell<Vec<TcpServiceParams>>,
}

impl FakeControlPlane {
    pub fn new(journal: &Journal, node: Option<Node>) -> Self {
        Self {
            journal: Rc::clone(journal),
            node: RefCell::new(node),
            wg: Some(tunnel_config()),
            vpn_host: Some("vpn.example.com".into()),
            regenerated: None,
            fetch_calls: Cell::new(0),
            http_params: RefCell::new(Vec::new()),
            tcp_params: RefCell::new(Vec::new()),
        }
    }
}

impl ControlPlaneClient for FakeControlPlane {
    fn fetch_node(&self) -> Result<Node, ApiError> {
        self.fetch_calls.set(self.fetch_calls.get() + 1);
        note(&self.journal, "api:node");
        self.node.borrow().clone().ok_or(ApiError::Server(503))
    }

    fn fetch_tunnel_config(&self) -> Result<WgConfig, ApiError> {
        note(&self.journal, "api:wgconfig");
        self.wg.clone().ok_or(ApiError::Server(503))
    }

    fn probe(&self, gateway: Ipv4Addr) -> Result<ApiConfig, ApiError> {
        note(&self.journal, format!("api:probe {gateway}"));
        self.vpn_host
            .clone()
            .map(|vpn_host| ApiConfig {
                vpn_host,
                tcp_services_port_range: String::new(),
            })
            .ok_or(ApiError::Server(504))
    }

    fn regenerate_keys(&self) -> Result<Node, ApiError> {
        note(&self.journal, "api:regenerate");
        self.regenerated.clone().ok_or(ApiError::Server(503))
    }

    fn expose_http(&self, params: &HttpServiceParams) -> Result<HttpService, ApiError> {
        note(&self.journal, "api:expose http");
        self.http_params.borrow_mut().push(params.clone());
        Ok(HttpService {
            id: 1,
            name: params.name.clone(),
            domain: params.domain.clone(),
            path_location: params.path_location.clone(),
            backend_host: params.backend_host.clone(),
            backend_proto: params.backend_proto.clone(),
            backend_port: params.backend_port,
            enabled: true,
            ..HttpService::default()
        })
    }

    fn expose_tcp(&self, params: &TcpServiceParams) -> Result<TcpService, ApiError> {
        note(&self.journal, "api:expose tcp");
        self.tcp_params.borrow_mut().push(params.clone());
        Ok(TcpService {
            id: 2,
            name: params.name.clone(),
            domain: params.domain.clone(),
            proto: params.proto.clone(),
            backend_host: params.backend_host.clone(),
            backend_port: params.backend_port,
            port: Some(params.port.unwrap_or(32_000)),
            enabled: true,
            ..TcpService::default()
        })
    }

    fn set_service_enabled(
        &self,
        kind: ServiceKind,
        id: u64,
        enabled: bool,
        ttl: Option<&str>,
    ) -> Result<ServiceRecord, ApiError> {
        note(
            &self.journal,
            format!("api:{kind} {id} enabled={enabled} ttl={}", ttl.unwrap_or("-")),
        );
        let id = i64::try_from(id).unwrap();
        Ok(match kind {
            ServiceKind::Http => ServiceRecord::Http(HttpService {
                id,
                enabled,
                ..HttpService::default()
            }),
            ServiceKind::Tcp => ServiceRecord::Tcp(TcpService {
                id,
                enabled,
                ..TcpService::default()
            }),
        })
    }

    fn update_gateway_network(&self, network: &GatewayNetwork) -> Result<Node, ApiError> {
        note(
            &self.journal,
            format!("api:gateway {} {}", network.interface, network.subnet),
        );
        let mut node = self.node.borrow().clone().ok_or(ApiError::Server(503))?;
        node.gateway_networks = vec![network.clone()];
        Ok(node)
    }
}

/// Tunnel whose config file and interface live in memory.
pub struct FakeTunnel {
    pub journal: Journal,
    pub config: RefCell<Option<String>>,
    pub interface: Cell<bool>,
    pub address: Option<Ipv4Addr>,
    pub fail_up: bool,
}

impl FakeTunnel {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            config: RefCell::new(None),
            interface: Cell::new(false),
            address: Some(Ipv4Addr::new(10, 12, 1, 7)),
            fail_up: false,
        }
    }

    /// Config written and interface up, as after a successful connect.
    pub fn connected(journal: &Journal) -> Self {
        let tunnel = Self::new(journal);
        *tunnel.config.borrow_mut() = Some("[Interface]\n".into());
        tunnel.interface.set(true);
        tunnel
    }
}

impl TunnelController for FakeTunnel {
    fn config_exists(&self) -> bool {
        self.config.borrow().is_some()
    }

    fn write_config(&self, contents: &str) -> anyhow::Result<()> {
        note(&self.journal, "tunnel:write");
        *self.config.borrow_mut() = Some(contents.into());
        Ok(())
    }

    fn remove_config(&self) -> anyhow::Result<()> {
        note(&self.journal, "tunnel:remove");
        *self.config.borrow_mut() = None;
        Ok(())
    }

    fn interface_up(&self) -> bool {
        self.interface.get()
    }

    fn interface_address(&self) -> Option<Ipv4Addr> {
        self.address.filter(|_| self.interface.get())
    }

    fn up(&self) -> anyhow::Result<()> {
        note(&self.journal, "tunnel:up");
        if self.fail_up {
            bail!("wg-quick up failed");
        }
        self.interface.set(true);
        Ok(())
    }

    fn down(&self) -> anyhow::Result<()> {
        note(&self.journal, "tunnel:down");
        self.interface.set(false);
        Ok(())
    }
}

pub struct FakeServices {
    pub journal: Journal,
    pub fail_stop: bool,
}

impl FakeServices {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            fail_stop: false,
        }
    }
}

impl ServiceManager for FakeServices {
    fn start(&self) -> anyhow::Result<()> {
        note(&self.journal, "service:start");
        Ok(())
    }

    fn stop(&self) -> anyhow::Result<()> {
        note(&self.journal, "service:stop");
        if self.fail_stop {
            bail!("Unit wiredoor.service not loaded");
        }
        Ok(())
    }

    fn restart(&self) -> anyhow::Result<()> {
        note(&self.journal, "service:restart");
        Ok(())
    }

    fn enable(&self) -> anyhow::Result<()> {
        note(&self.journal, "service:enable");
        Ok(())
    }

    fn disable(&self) -> anyhow::Result<()> {
        note(&self.journal, "service:disable");
        Ok(())
    }
}

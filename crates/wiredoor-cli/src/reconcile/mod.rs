//! Tunnel lifecycle: connect, disconnect, key rotation, status and the
//! self-healing watch tick.
//!
//! The [`Reconciler`] is written against the control-plane, tunnel and
//! service capabilities so every flow can be exercised with fakes.

mod state;


use thiserror::Error;
use wiredoor_core::ConfigStore;
use wiredoor_core::api::{ApiError, ControlPlaneClient, Node, reachable_host};
use wiredoor_core::wg_config;

pub use state::{Action, Intent, Observations, TunnelState, classify, reconcile};

use crate::net::gateway_address;
use crate::system::{ServiceManager, TunnelController};

/// Errors raised while driving the tunnel.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("`wiredoor {0}` requires root privileges, try again with sudo")]
    NotPrivileged(&'static str),

    #[error("Unable to connect: can't communicate with the Wiredoor server")]
    ServerUnreachable,

    #[error("The server did not return a new token, the tunnel stays down")]
    MissingToken,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] wiredoor_core::Error),

    #[error("{0:#}")]
    Tunnel(anyhow::Error),

    #[error("{0:#}")]
    Service(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// One-shot overrides given on the `connect` command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectRequest {
    pub url: Option<String>,
    pub token: Option<String>,
    /// `Some` when `--daemon` or `--no-daemon` was passed.
    pub daemon: Option<bool>,
}

/// What `status` found.
#[derive(Debug, Clone)]
pub enum StatusReport {
    NotConnected,
    ServerUnreachable,
    Connected { vpn_host: String, node: Box<Node> },
}

/// What one watch tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Idle,
    Reconnected,
    /// The node is disabled server-side or could not be fetched.
    ReconnectSkipped,
    Restarted,
}

/// Drives the tunnel towards the state the control plane describes.
pub struct Reconciler<'a, C, T, S> {
    client: &'a C,
    tunnel: &'a T,
    services: &'a S,
    store: &'a ConfigStore,
    elevated: bool,
}

impl<'a, C, T, S> Reconciler<'a, C, T, S>
where
    C: ControlPlaneClient,
    T: TunnelController,
    S: ServiceManager,
{
    pub const fn new(
        client: &'a C,
        tunnel: &'a T,
        services: &'a S,
        store: &'a ConfigStore,
        elevated: bool,
    ) -> Self {
        Self {
            client,
            tunnel,
            services,
            store,
            elevated,
        }
    }

    const fn require_privileges(&self, command: &'static str) -> Result<()> {
        if self.elevated {
            Ok(())
        } else {
            Err(ReconcileError::NotPrivileged(command))
        }
    }

    /// Bring the tunnel up for the configured node.
    ///
    /// Overrides are persisted before anything else. Nothing on the host
    /// changes unless the server answers with a registered node.
    pub fn connect(&self, request: &ConnectRequest) -> Result<Node> {
        self.require_privileges("connect")?;

        match (&request.url, &request.token) {
            (Some(url), Some(token)) => self.store.save_server(url, token)?,
            (None, None) => {}
            _ => tracing::warn!("--url and --token must be given together, ignoring override"),
        }
        if let Some(enabled) = request.daemon {
            self.store.save_daemon(enabled)?;
        }

        let node = self.client.fetch_node()?;
        if !node.is_registered() {
            return Err(ReconcileError::ServerUnreachable);
        }

        let config = self.store.load()?;
        let wg = self.client.fetch_tunnel_config()?;
        let contents = wg_config::render(&wg, config.client.keepalive).map_err(|e| {
            tracing::warn!(error = %e, "server returned an unusable tunnel config");
            ReconcileError::ServerUnreachable
        })?;

        self.tunnel
            .write_config(&contents)
            .map_err(ReconcileError::Tunnel)?;
        self.tunnel.up().map_err(ReconcileError::Tunnel)?;
        tracing::info!(node = %node.name, "tunnel up");

        if config.daemon.enabled {
            self.services.restart().map_err(ReconcileError::Service)?;
            self.services.enable().map_err(ReconcileError::Service)?;
        }

        Ok(node)
    }

    /// Tear the tunnel down. Returns `false` when there was nothing to do.
    pub fn disconnect(&self) -> Result<bool> {
        self.require_privileges("disconnect")?;

        if !self.tunnel.config_exists() {
            tracing::debug!("no tunnel config, nothing to disconnect");
            return Ok(false);
        }

        let config = self.store.load()?;
        self.tunnel.down().map_err(ReconcileError::Tunnel)?;

        // The watch loop would bring the tunnel back if it kept running.
        let service = if config.daemon.enabled {
            self.services.stop().and_then(|()| self.services.disable())
        } else {
            Ok(())
        };

        // Without a config file the watch loop has nothing to heal, so the
        // file goes even when the service could not be stopped.
        self.tunnel
            .remove_config()
            .map_err(ReconcileError::Tunnel)?;
        tracing::info!("tunnel down");
        service.map_err(ReconcileError::Service)?;
        Ok(true)
    }

    /// Down then up with the existing config file.
    pub fn restart_tunnel(&self) -> Result<()> {
        self.tunnel.down().map_err(ReconcileError::Tunnel)?;
        self.tunnel.up().map_err(ReconcileError::Tunnel)
    }

    /// Rotate the node's keys and reconnect with the new token.
    pub fn regenerate(&self) -> Result<Node> {
        self.disconnect()?;

        let node = self.client.regenerate_keys()?;
        if node.token.is_empty() {
            return Err(ReconcileError::MissingToken);
        }
        self.store.save_token(&node.token)?;

        self.connect(&ConnectRequest::default())
    }

    /// Gather what the reconciler needs to classify the tunnel.
    pub fn observe(&self, intent: Intent) -> (Observations, Option<String>) {
        let config_present = self.tunnel.config_exists();
        let interface_up = self.tunnel.interface_up();

        let vpn_host = if Observations::needs_probe(interface_up, config_present, intent) {
            Some(self.probe())
        } else {
            None
        };

        let obs = Observations {
            config_present,
            interface_up,
            server_reachable: vpn_host.as_ref().map(Option::is_some),
        };
        (obs, vpn_host.flatten())
    }

    fn probe(&self) -> Option<String> {
        let Some(addr) = self.tunnel.interface_address() else {
            tracing::debug!("tunnel interface has no IPv4 address");
            return None;
        };
        reachable_host(self.client.probe(gateway_address(addr)))
    }

    /// One pass of the watch loop.
    pub fn watch_tick(&self) -> Result<WatchOutcome> {
        let (obs, _) = self.observe(Intent::Watch);
        let state = classify(&obs);
        tracing::debug!(?state, "watch tick");

        match reconcile(state, Intent::Watch) {
            Action::ReconnectIfEnabled => match self.client.fetch_node() {
                Ok(node) if node.enabled => {
                    tracing::info!("tunnel interface missing, reconnecting");
                    self.connect(&ConnectRequest::default())?;
                    Ok(WatchOutcome::Reconnected)
                }
                Ok(_) => {
                    tracing::debug!("node disabled, not reconnecting");
                    Ok(WatchOutcome::ReconnectSkipped)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "unable to fetch node, not reconnecting");
                    Ok(WatchOutcome::ReconnectSkipped)
                }
            },
            Action::RestartTunnel => {
                tracing::info!("server unreachable through the tunnel, restarting it");
                self.restart_tunnel()?;
                Ok(WatchOutcome::Restarted)
            }
            _ => Ok(WatchOutcome::Idle),
        }
    }

    /// Tunnel state plus, when connected, the node detail.
    pub fn status(&self) -> Result<StatusReport> {
        let (obs, vpn_host) = self.observe(Intent::Report);
        match reconcile(classify(&obs), Intent::Report) {
            Action::ReportConnected => {
                let node = self.client.fetch_node()?;
                Ok(StatusReport::Connected {
                    vpn_host: vpn_host.unwrap_or_default(),
                    node: Box::new(node),
                })
            }
            Action::ReportUnreachable => Ok(StatusReport::ServerUnreachable),
            _ => Ok(StatusReport::NotConnected),
        }
    }

    /// `true` when the server answers through the tunnel.
    pub fn health(&self) -> bool {
        let (obs, _) = self.observe(Intent::Report);
        reconcile(classify(&obs), Intent::Report) == Action::ReportConnected
    }
}

//! Tunnel state classification and the action each state calls for.
//!
//! Both functions are pure: observations are gathered by the reconciler and
//! the resulting action is executed there.

/// What was observed on the host at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observations {
    /// The tunnel config file exists.
    pub config_present: bool,
    /// The tunnel interface exists.
    pub interface_up: bool,
    /// Result of the reachability probe, `None` when no probe was made.
    pub server_reachable: Option<bool>,
}

/// Observed tunnel health. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelState {
    /// The interface is absent.
    NoInterface { config_present: bool },
    /// The interface exists but its config file is gone.
    InterfaceUpNoConfig { server_reachable: Option<bool> },
    /// Interface and config present, control plane not answering.
    InterfaceUpServerUnreachable,
    /// Interface and config present, control plane answering.
    InterfaceUpServerReachable,
}

/// Why the state is being looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// One tick of the watch loop: heal the tunnel if needed.
    Watch,
    /// Report the tunnel state to the user or a monitor.
    Report,
}

/// What to do about a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do.
    Idle,
    /// Re-fetch the node and run a full connect if it is enabled server-side.
    ReconnectIfEnabled,
    /// Tunnel down then up, keeping the current credentials.
    RestartTunnel,
    ReportNotConnected,
    ReportUnreachable,
    ReportConnected,
}

impl Observations {
    /// Whether a reachability probe is worth making for `intent`.
    ///
    /// Without an interface there is nothing to probe through; the watch
    /// loop also leaves hosts without a tunnel config alone.
    pub const fn needs_probe(interface_up: bool, config_present: bool, intent: Intent) -> bool {
        match intent {
            Intent::Watch => interface_up && config_present,
            Intent::Report => interface_up,
        }
    }
}

pub const fn classify(obs: &Observations) -> TunnelState {
    match (obs.interface_up, obs.config_present, obs.server_reachable) {
        (false, config_present, _) => TunnelState::NoInterface { config_present },
        (true, false, server_reachable) => TunnelState::InterfaceUpNoConfig { server_reachable },
        (true, true, Some(true)) => TunnelState::InterfaceUpServerReachable,
        (true, true, _) => TunnelState::InterfaceUpServerUnreachable,
    }
}

pub const fn reconcile(state: TunnelState, intent: Intent) -> Action {
    match intent {
        Intent::Watch => match state {
            // A missing interface means the handshake must be redone; the
            // node's enabled flag acts as a server-side kill switch.
            TunnelState::NoInterface {
                config_present: true,
            } => Action::ReconnectIfEnabled,
            // A stale tunnel only needs a restart, not new credentials.
            TunnelState::InterfaceUpServerUnreachable => Action::RestartTunnel,
            TunnelState::NoInterface {
                config_present: false,
            }
            | TunnelState::InterfaceUpNoConfig { .. }
            | TunnelState::InterfaceUpServerReachable => Action::Idle,
        },
        Intent::Report => match state {
            TunnelState::NoInterface { .. } => Action::ReportNotConnected,
            TunnelState::InterfaceUpServerReachable
            | TunnelState::InterfaceUpNoConfig {
                server_reachable: Some(true),
            } => Action::ReportConnected,
            TunnelState::InterfaceUpServerUnreachable
            | TunnelState::InterfaceUpNoConfig { .. } => Action::ReportUnreachable,
        },
    }
}

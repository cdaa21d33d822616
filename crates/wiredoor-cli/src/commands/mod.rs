//! Subcommand handlers.
//!
//! Each module owns the clap arguments of its subcommands and a `run`
//! function. Handlers print user-facing output to stdout and return errors
//! to `main`, which reports them.

pub mod config;
pub mod connect;
pub mod gateway;
pub mod login;
pub mod regenerate;
pub mod service;
pub mod status;

use anyhow::Result;
use wiredoor_core::ConfigStore;
use wiredoor_core::api::ApiClient;

use crate::os::is_root;
use crate::reconcile::Reconciler;
use crate::system::{InitServiceManager, WgQuick};

/// Reconciler wired to the real control plane, wg-quick and init system.
pub type HostReconciler<'a> = Reconciler<'a, ApiClient, WgQuick, InitServiceManager>;

/// The real capabilities of this machine.
#[derive(Debug)]
pub struct Host {
    pub client: ApiClient,
    pub tunnel: WgQuick,
    pub services: InitServiceManager,
}

impl Host {
    pub fn new(store: ConfigStore) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(store)?,
            tunnel: WgQuick::default(),
            services: InitServiceManager::detect(),
        })
    }

    pub const fn store(&self) -> &ConfigStore {
        self.client.store()
    }

    pub fn reconciler(&self) -> HostReconciler<'_> {
        Reconciler::new(
            &self.client,
            &self.tunnel,
            &self.services,
            self.client.store(),
            is_root(),
        )
    }
}

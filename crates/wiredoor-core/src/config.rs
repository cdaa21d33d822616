//! Local settings management.
//!
//! Persists the control-plane URL, the node token, the client keepalive and
//! the daemon flag to `/etc/wiredoor/config.toml`. The file is read in full at
//! the start of every operation and rewritten in full on every change; there
//! is no locking between concurrent invocations.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default location of the settings file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/wiredoor/config.toml";

/// Keepalive used when the server does not provide one.
pub const DEFAULT_KEEPALIVE: u16 = 25;

/// Persistent node settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub server: ServerSection,
    pub client: ClientSection,
    pub daemon: DaemonSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Control-plane base URL (e.g. "<https://wiredoor.example.com>").
    pub url: String,
    /// Node access token issued by the control plane.
    pub token: String,
    /// Optional path prefix in front of `/api`.
    pub path: String,
    /// Verify the control plane's TLS certificate.
    pub verify_tls: bool,
}

/// `[client]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSection {
    /// Persistent keepalive (seconds) for the tunnel peer.
    pub keepalive: u16,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            keepalive: DEFAULT_KEEPALIVE,
        }
    }
}

/// `[daemon]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSection {
    /// Whether the background service should be managed alongside the tunnel.
    pub enabled: bool,
}

/// A server URL paired with a token. Neither authorizes requests alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub token: String,
}

impl LocalConfig {
    /// The server URL and token, only when both are set.
    pub fn credentials(&self) -> Option<Credentials> {
        if self.server.url.is_empty() || self.server.token.is_empty() {
            return None;
        }
        Some(Credentials {
            url: self.server.url.clone(),
            token: self.server.token.clone(),
        })
    }

    /// Whether a server URL and token are both configured.
    pub fn is_server_configured(&self) -> bool {
        self.credentials().is_some()
    }
}

/// Reads and writes [`LocalConfig`] at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings, writing a default file first if none exists.
    pub fn load(&self) -> Result<LocalConfig> {
        if !self.path.exists() {
            tracing::info!("creating default config at {}", self.path.display());
            let config = LocalConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|source| Error::TomlDe {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the settings file with `config`.
    pub fn save(&self, config: &LocalConfig) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }

        // The token grants node access: owner-only.
        let content = toml::to_string_pretty(config)?;
        write_private(&self.path, &content)?;

        tracing::debug!("saved config to {}", self.path.display());
        Ok(())
    }

    /// Persist a new server URL and token, keeping every other setting.
    pub fn save_server(&self, url: &str, token: &str) -> Result<()> {
        if url.is_empty() {
            return Err(Error::Config("server URL must not be empty".into()));
        }
        let mut config = self.load()?;
        config.server.url = url.trim_end_matches('/').to_string();
        config.server.token = token.to_string();
        self.save(&config)
    }

    /// Replace only the token, keeping the configured server URL.
    pub fn save_token(&self, token: &str) -> Result<()> {
        let mut config = self.load()?;
        if config.server.url.is_empty() {
            return Err(Error::Config("no server URL configured".into()));
        }
        config.server.token = token.to_string();
        self.save(&config)
    }

    /// Persist the daemon flag.
    pub fn save_daemon(&self, enabled: bool) -> Result<()> {
        let mut config = self.load()?;
        config.daemon.enabled = enabled;
        self.save(&config)
    }
}

/// Write `contents` to `path`, readable by the owner only.
///
/// A new file is created with mode 0600. An existing file is tightened before
/// anything is written to it.
pub fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}

use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use wiredoor_core::config::write_private;

use super::TunnelController;
use crate::cmd::run_cmd;
use crate::net::{TUNNEL_INTERFACE, find_interface};

/// Directory wg-quick reads interface configs from.
pub const WIREGUARD_DIR: &str = "/etc/wireguard";

const PERMISSION_HINT: &str = "please review your user permissions or, inside a container, \
                               make sure the NET_ADMIN capability is granted";

/// Tunnel managed by `wg-quick` for a single interface.
#[derive(Debug, Clone)]
pub struct WgQuick {
    interface: String,
    config_path: PathBuf,
}

impl Default for WgQuick {
    fn default() -> Self {
        Self::new(TUNNEL_INTERFACE, Path::new(WIREGUARD_DIR))
    }
}

impl WgQuick {
    pub fn new(interface: &str, dir: &Path) -> Self {
        Self {
            interface: interface.to_string(),
            config_path: dir.join(format!("{interface}.conf")),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

impl TunnelController for WgQuick {
    fn config_exists(&self) -> bool {
        self.config_path.exists()
    }

    fn write_config(&self, contents: &str) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }

        tracing::info!("writing tunnel config: {}", self.config_path.display());
        write_private(&self.config_path, contents)
            .with_context(|| format!("failed to write {}", self.config_path.display()))
    }

    fn remove_config(&self) -> Result<()> {
        match fs::remove_file(&self.config_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("failed to remove {}", self.config_path.display())),
        }
    }

    fn interface_up(&self) -> bool {
        find_interface(&self.interface).is_some()
    }

    fn interface_address(&self) -> Option<Ipv4Addr> {
        find_interface(&self.interface).and_then(|i| i.ipv4)
    }

    fn up(&self) -> Result<()> {
        run_cmd(
            &format!("bringing up tunnel {}", self.interface),
            "wg-quick",
            &["up", &self.interface],
        )
        .with_context(|| format!("unable to connect the tunnel, {PERMISSION_HINT}"))
    }

    fn down(&self) -> Result<()> {
        run_cmd(
            &format!("bringing down tunnel {}", self.interface),
            "wg-quick",
            &["down", &self.interface],
        )
        .with_context(|| format!("unable to disconnect the tunnel, {PERMISSION_HINT}"))
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn config_path_follows_interface_name() {
        let wg = WgQuick::default();
        assert_eq!(wg.config_path(), Path::new("/etc/wireguard/wg0.conf"));
    }

    #[test]
    fn write_and_remove_config() {
        let dir = tempfile::tempdir().unwrap();
        let wg = WgQuick::new("wg0", &dir.path().join("wireguard"));
        assert!(!wg.config_exists());

        wg.write_config("[Interface]\n").unwrap();
        assert!(wg.config_exists());
        assert_eq!(
            fs::read_to_string(wg.config_path()).unwrap(),
            "[Interface]\n"
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(wg.config_path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        wg.remove_config().unwrap();
        assert!(!wg.config_exists());
    }

    #[cfg(unix)]
    #[test]
    fn rewriting_config_keeps_it_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let wg = WgQuick::new("wg0", dir.path());
        fs::write(wg.config_path(), "stale").unwrap();
        fs::set_permissions(wg.config_path(), fs::Permissions::from_mode(0o644)).unwrap();

        wg.write_config("[Interface]\nPrivateKey = k\n").unwrap();

        let mode = fs::metadata(wg.config_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn removing_missing_config_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let wg = WgQuick::new("wg9", dir.path());
        wg.remove_config().unwrap();
    }

    #[test]
    fn unknown_interface_is_down() {
        let dir = tempfile::tempdir().unwrap();
        let wg = WgQuick::new("wdtest-none0", dir.path());
        assert!(!wg.interface_up());
        assert!(wg.interface_address().is_none());
    }
}

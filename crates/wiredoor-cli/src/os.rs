use std::collections::HashMap;
use std::fmt;
use std::fs;

use anyhow::{Context, Result};
use nix::unistd::{gethostname, geteuid};

const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Parse `/etc/os-release` content into key-value pairs.
fn parse_os_release(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim_matches('"');
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}

/// The distribution `ID` from `/etc/os-release`.
pub fn distro_id() -> Result<String> {
    let content =
        fs::read_to_string(OS_RELEASE_PATH).context("failed to read /etc/os-release")?;
    Ok(parse_os_release(&content)
        .remove("ID")
        .unwrap_or_else(|| "unknown".into()))
}

/// Check if the current process is running as root.
pub fn is_root() -> bool {
    geteuid().is_root()
}

/// Host name offered as the default node name.
pub fn hostname() -> String {
    gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "wiredoor-node".to_string())
}

/// Init system managing the background service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitSystem {
    Systemd,
    OpenRc,
}

impl InitSystem {
    /// Pick the init system for a distribution id.
    pub fn for_distro(id: &str) -> Self {
        match id {
            "alpine" => Self::OpenRc,
            _ => Self::Systemd,
        }
    }

    /// Detect the init system of the running host. Defaults to systemd when
    /// the distribution cannot be identified.
    pub fn detect() -> Self {
        match distro_id() {
            Ok(id) => {
                let init = Self::for_distro(&id);
                tracing::debug!("detected distribution '{id}', init system {init}");
                init
            }
            Err(e) => {
                tracing::debug!("{e:#}; assuming systemd");
                Self::Systemd
            }
        }
    }
}

impl fmt::Display for InitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Systemd => write!(f, "systemd"),
            Self::OpenRc => write!(f, "openrc"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_and_plain_values() {
        let content = r#"
NAME="Alpine Linux"
ID=alpine
# comment
VERSION_ID=3.20.0
PRETTY_NAME="Alpine Linux v3.20"
"#;
        let map = parse_os_release(content);
        assert_eq!(map.get("ID").map(String::as_str), Some("alpine"));
        assert_eq!(map.get("NAME").map(String::as_str), Some("Alpine Linux"));
        assert_eq!(map.get("VERSION_ID").map(String::as_str), Some("3.20.0"));
        assert!(!map.contains_key("# comment"));
    }

    #[test]
    fn alpine_uses_openrc() {
        assert_eq!(InitSystem::for_distro("alpine"), InitSystem::OpenRc);
    }

    #[test]
    fn everything_else_uses_systemd() {
        for id in ["ubuntu", "debian", "fedora", "unknown", ""] {
            assert_eq!(InitSystem::for_distro(id), InitSystem::Systemd, "{id}");
        }
    }
}

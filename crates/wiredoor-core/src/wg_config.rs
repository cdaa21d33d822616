//! Rendering of the wg-quick configuration file from server peer data.

use std::fmt::Write;

use crate::api::WgConfig;
use crate::error::{Error, Result};

/// Render `config` in wg-quick INI format.
///
/// `fallback_keepalive` is used when the server leaves the peer keepalive at
/// zero. A config missing the private key, address or peer key is rejected
/// so no half-configured tunnel is ever written.
pub fn render(config: &WgConfig, fallback_keepalive: u16) -> Result<String> {
    if config.private_key.is_empty() {
        return Err(Error::Config("tunnel config has no private key".into()));
    }
    if config.address.is_empty() {
        return Err(Error::Config("tunnel config has no address".into()));
    }
    let peer = &config.peer;
    if peer.public_key.is_empty() {
        return Err(Error::Config("tunnel config has no peer public key".into()));
    }

    let host = if peer.endpoint.host.is_empty() {
        peer.endpoint.url.as_str()
    } else {
        peer.endpoint.host.as_str()
    };
    if host.is_empty() || peer.endpoint.port == 0 {
        return Err(Error::Config("tunnel config has no peer endpoint".into()));
    }

    let keepalive = if peer.persistent_keepalive > 0 {
        peer.persistent_keepalive
    } else {
        fallback_keepalive
    };

    let mut out = String::new();
    let _ = writeln!(out, "[Interface]");
    let _ = writeln!(out, "PrivateKey = {}", config.private_key);
    let _ = writeln!(out, "Address = {}", config.address);
    for cmd in &config.post_up {
        let _ = writeln!(out, "PostUp = {cmd}");
    }
    for cmd in &config.post_down {
        let _ = writeln!(out, "PostDown = {cmd}");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[Peer]");
    let _ = writeln!(out, "PublicKey = {}", peer.public_key);
    if !peer.preshared_key.is_empty() {
        let _ = writeln!(out, "PresharedKey = {}", peer.preshared_key);
    }
    let _ = writeln!(out, "Endpoint = {host}:{}", peer.endpoint.port);
    if keepalive > 0 {
        let _ = writeln!(out, "PersistentKeepalive = {keepalive}");
    }
    if !peer.allowed_ips.is_empty() {
        let _ = writeln!(out, "AllowedIPs = {}", peer.allowed_ips.join(", "));
    }

    Ok(out)
}

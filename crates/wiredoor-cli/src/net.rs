//! Local network inspection: the tunnel interface, the LAN subnet and the
//! default egress interface offered as gateway defaults.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use ipnet::Ipv4Net;
use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;
use regex::Regex;

use crate::cmd::run_cmd_output;

/// Name of the WireGuard interface brought up by wg-quick.
pub const TUNNEL_INTERFACE: &str = "wg0";

/// Fallback egress interface when `ip route` gives no answer.
const DEFAULT_EGRESS_INTERFACE: &str = "eth0";

#[allow(clippy::expect_used)]
static ROUTE_DEV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"dev\s+(\S+)").expect("static regex is valid"));

/// Presence and first IPv4 address of a network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub ipv4: Option<Ipv4Addr>,
}

/// Look up an interface by name. `None` when it does not exist.
pub fn find_interface(name: &str) -> Option<InterfaceInfo> {
    let addrs = match getifaddrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            tracing::warn!(error = %e, "getifaddrs failed");
            return None;
        }
    };

    let mut found: Option<InterfaceInfo> = None;
    for ifa in addrs.filter(|ifa| ifa.interface_name == name) {
        let entry = found.get_or_insert_with(|| InterfaceInfo {
            name: ifa.interface_name.clone(),
            ipv4: None,
        });
        if entry.ipv4.is_none()
            && let Some(sin) = ifa.address.as_ref().and_then(|a| a.as_sockaddr_in())
        {
            entry.ipv4 = Some(Ipv4Addr::from(sin.ip()));
        }
    }
    found
}

/// The control plane answers on `.1` of the tunnel's /24.
pub fn gateway_address(tunnel_ip: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = tunnel_ip.octets();
    Ipv4Addr::new(a, b, c, 1)
}

/// Network (address truncated to the mask) of an interface address.
fn to_network(addr: Ipv4Addr, mask: Ipv4Addr) -> Option<Ipv4Net> {
    let prefix = u8::try_from(u32::from(mask).count_ones()).ok()?;
    Ipv4Net::new(addr, prefix).ok().map(|net| net.trunc())
}

/// Subnet of the first up, non-loopback IPv4 interface.
pub fn default_subnet() -> Option<Ipv4Net> {
    let addrs = getifaddrs().ok()?;
    for ifa in addrs {
        if !ifa.flags.contains(InterfaceFlags::IFF_UP)
            || ifa.flags.contains(InterfaceFlags::IFF_LOOPBACK)
        {
            continue;
        }
        let Some(addr) = ifa.address.as_ref().and_then(|a| a.as_sockaddr_in()) else {
            continue;
        };
        let Some(mask) = ifa.netmask.as_ref().and_then(|m| m.as_sockaddr_in()) else {
            continue;
        };
        if let Some(net) = to_network(Ipv4Addr::from(addr.ip()), Ipv4Addr::from(mask.ip())) {
            return Some(net);
        }
    }
    None
}

/// Extract the `dev <name>` field of `ip route get` output.
fn parse_route_dev(output: &str) -> Option<String> {
    ROUTE_DEV_RE
        .captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Interface carrying the default route, `eth0` when undetermined.
pub fn default_interface_name() -> String {
    run_cmd_output("ip", &["route", "get", "8.8.8.8"])
        .ok()
        .and_then(|out| parse_route_dev(&out))
        .unwrap_or_else(|| DEFAULT_EGRESS_INTERFACE.to_string())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn gateway_is_dot_one() {
        assert_eq!(
            gateway_address(Ipv4Addr::new(10, 12, 1, 37)),
            Ipv4Addr::new(10, 12, 1, 1)
        );
    }

    #[test]
    fn network_is_truncated() {
        let net = to_network(
            Ipv4Addr::new(192, 168, 1, 42),
            Ipv4Addr::new(255, 255, 255, 0),
        )
        .unwrap();
        assert_eq!(net.to_string(), "192.168.1.0/24");

        let net = to_network(Ipv4Addr::new(10, 42, 7, 9), Ipv4Addr::new(255, 255, 0, 0)).unwrap();
        assert_eq!(net.to_string(), "10.42.0.0/16");
    }

    #[test]
    fn route_dev_is_parsed() {
        let out = "8.8.8.8 via 192.168.1.1 dev enp3s0 src 192.168.1.42 uid 1000 \n    cache";
        assert_eq!(parse_route_dev(out).as_deref(), Some("enp3s0"));
    }

    #[test]
    fn route_without_dev_is_none() {
        assert_eq!(parse_route_dev("unreachable"), None);
    }

    #[test]
    fn loopback_is_found_and_unknown_is_not() {
        assert!(find_interface("definitely-not-an-interface0").is_none());
        if let Some(lo) = find_interface("lo") {
            assert_eq!(lo.ipv4, Some(Ipv4Addr::LOCALHOST));
        }
    }
}

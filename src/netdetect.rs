use anyhow::{anyhow, Result};
use if_addrs::{get_if_addrs, IfAddr};
use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

/// Detect the local /24 to scan from the first non-loopback IPv4 interface.
///
/// Interfaces are ordered by address so the choice is stable across runs.
pub fn detect_local_network() -> Result<Ipv4Net> {
    let mut v4: Vec<Ipv4Addr> = get_if_addrs()?
        .into_iter()
        .filter_map(|iface| match iface.addr {
            IfAddr::V4(v4) if !v4.ip.is_loopback() && !v4.ip.is_link_local() => Some(v4.ip),
            _ => None,
        })
        .collect();
    v4.sort();
    v4.first()
        .map(|ip| ipv4_to_default_cidr(*ip))
        .ok_or_else(|| anyhow!("no non-loopback IPv4 interface found"))
}

/// Detect the local subnet prefix (`a.b.c`) used to build scan addresses.
pub fn detect_local_prefix() -> Result<String> {
    Ok(network_prefix(detect_local_network()?))
}

/// Helper: convert an IPv4 address into its default /24 network.
pub fn ipv4_to_default_cidr(ip: Ipv4Addr) -> Ipv4Net {
    let o = ip.octets();
    let net = Ipv4Addr::new(o[0], o[1], o[2], 0);
    Ipv4Net::new(net, 24).expect("/24 is always valid")
}

/// First three octets of a network, e.g. `192.168.1.0/24` -> `192.168.1`.
pub fn network_prefix(net: Ipv4Net) -> String {
    let o = net.network().octets();
    format!("{}.{}.{}", o[0], o[1], o[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cidr_from_ipv4() {
        let cidr = ipv4_to_default_cidr(Ipv4Addr::new(10, 1, 2, 3));
        assert_eq!(cidr.to_string(), "10.1.2.0/24");
    }

    #[test]
    fn prefix_drops_host_octet() {
        let cidr = ipv4_to_default_cidr(Ipv4Addr::new(192, 168, 7, 200));
        assert_eq!(network_prefix(cidr), "192.168.7");
    }
}

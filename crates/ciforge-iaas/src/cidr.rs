//! IPv4 CIDR containment.

use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;

/// Whether `ip` falls inside `cidr` (`a.b.c.d/n`; a bare address means `/32`).
///
/// Unparseable input never matches.
pub fn contains(cidr: &str, ip: &str) -> bool {
    let Ok(ip) = ip.trim().parse::<Ipv4Addr>() else {
        return false;
    };
    let cidr = cidr.trim();
    let network = if cidr.contains('/') {
        Ipv4Net::from_str(cidr).ok()
    } else {
        cidr.parse::<Ipv4Addr>()
            .ok()
            .and_then(|addr| Ipv4Net::new(addr, 32).ok())
    };
    network.is_some_and(|net| net.contains(&ip))
}

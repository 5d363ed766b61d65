//! Default gateway detection, used to pick a state file per network.

use pnmap_core::MacAddr;
use std::net::Ipv4Addr;

#[cfg(target_os = "linux")]
pub(crate) mod linux;

/// The router the host sends off-link traffic to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gateway {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
}

/// The single default gateway, if there is exactly one and its hardware
/// address is known.
pub fn default_gateway() -> Option<Gateway> {
    #[cfg(target_os = "linux")]
    {
        linux::default_gateway()
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Gateway addresses of the default routes in a `/proc/net/route` table.
///
/// Addresses are stored as host-order hex of the little-endian word, so
/// `0101A8C0` is 192.168.1.1.
pub fn parse_route_table(text: &str) -> Vec<Ipv4Addr> {
    let mut gateways = Vec::new();
    for line in text.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 || fields[1] != "00000000" {
            continue;
        }
        let Ok(raw) = u32::from_str_radix(fields[2], 16) else {
            continue;
        };
        let ip = Ipv4Addr::from(raw.to_le_bytes());
        if !ip.is_unspecified() && !gateways.contains(&ip) {
            gateways.push(ip);
        }
    }
    gateways
}

/// Hardware address of `ip` in a `/proc/net/arp` table
pub fn parse_arp_table(text: &str, ip: Ipv4Addr) -> Option<MacAddr> {
    let wanted = ip.to_string();
    text.lines()
        .skip(1)
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|fields| fields.len() >= 4 && fields[0] == wanted)
        .filter_map(|fields| fields[3].parse::<MacAddr>().ok())
        .find(|mac| !mac.is_zero())
}

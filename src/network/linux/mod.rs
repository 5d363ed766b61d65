use std::fs;

use super::{parse_arp_table, parse_route_table, Gateway};

const ROUTE_TABLE: &str = "/proc/net/route";
const ARP_TABLE: &str = "/proc/net/arp";

pub(crate) fn default_gateway() -> Option<Gateway> {
    let routes = match fs::read_to_string(ROUTE_TABLE) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Cannot read {}: {}", ROUTE_TABLE, e);
            return None;
        }
    };

    let gateways = parse_route_table(&routes);
    let [ip] = gateways.as_slice() else {
        log::debug!("{} default gateways, not using a per-network state file", gateways.len());
        return None;
    };

    let arp = fs::read_to_string(ARP_TABLE).ok()?;
    let mac = parse_arp_table(&arp, *ip)?;
    log::debug!("Default gateway {} at {}", ip, mac);
    Some(Gateway { ip: *ip, mac })
}

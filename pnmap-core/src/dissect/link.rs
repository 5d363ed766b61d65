//! Address facts from ARP, IP and neighbor discovery headers

use crate::error::ParseError;
use crate::frame::Layer;
use crate::station::{MacAddr, StationTable};

/// ARP sender protocol address, unless it is the probe address 0.0.0.0.
///
/// Recognized only for IPv4 ARP (4-byte protocol addresses).
pub fn arp(table: &mut StationTable, source: &MacAddr, layer: &Layer<'_>) -> Result<bool, ParseError> {
    let Layer::Arp(arp) = layer else {
        return Ok(false);
    };
    if arp.proto_addr_len != 4 {
        return Ok(false);
    }

    let station = table.resolve(source);
    if !arp.sender_proto_addr.is_unspecified() {
        station.ips.add(arp.sender_proto_addr.to_string());
    }
    Ok(true)
}

/// IPv4 source address. Never counts as recognition.
pub fn ipv4(table: &mut StationTable, source: &MacAddr, layer: &Layer<'_>) -> Result<bool, ParseError> {
    if let Layer::Ipv4 { source: ip, .. } = layer {
        if !ip.is_unspecified() {
            table.resolve(source).ips.add(ip.to_string());
        }
    }
    Ok(false)
}

/// IPv6 source address. Never counts as recognition.
pub fn ipv6(table: &mut StationTable, source: &MacAddr, layer: &Layer<'_>) -> Result<bool, ParseError> {
    if let Layer::Ipv6 { source: ip, .. } = layer {
        if !ip.is_unspecified() {
            table.resolve(source).ips.add(ip.to_string());
        }
    }
    Ok(false)
}

pub fn neighbor_advertisement(
    table: &mut StationTable,
    source: &MacAddr,
    layer: &Layer<'_>,
) -> Result<bool, ParseError> {
    let Layer::Icmpv6NeighborAdvertisement { target } = layer else {
        return Ok(false);
    };
    table.resolve(source).ips.add(target.to_string());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ArpLayer;
    use std::net::{Ipv4Addr, Ipv6Addr};

    const MAC: MacAddr = MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);

    fn arp_layer(addr: Ipv4Addr) -> Layer<'static> {
        Layer::Arp(ArpLayer {
            proto_addr_len: 4,
            sender_proto_addr: addr,
        })
    }

    #[test]
    fn test_arp_adds_ip() {
        let mut table = StationTable::new();
        assert!(arp(&mut table, &MAC, &arp_layer(Ipv4Addr::new(192, 168, 1, 5))).unwrap());
        assert!(table.get(&MAC).unwrap().ips.contains("192.168.1.5"));
    }

    #[test]
    fn test_arp_probe_has_no_ip() {
        let mut table = StationTable::new();
        assert!(arp(&mut table, &MAC, &arp_layer(Ipv4Addr::UNSPECIFIED)).unwrap());
        assert!(table.get(&MAC).unwrap().ips.is_empty());
    }

    #[test]
    fn test_arp_non_ipv4() {
        let mut table = StationTable::new();
        let layer = Layer::Arp(ArpLayer {
            proto_addr_len: 16,
            sender_proto_addr: Ipv4Addr::new(1, 2, 3, 4),
        });
        assert!(!arp(&mut table, &MAC, &layer).unwrap());
        assert!(table.get(&MAC).is_none());
    }

    #[test]
    fn test_ip_layers_never_recognize() {
        let mut table = StationTable::new();
        let v4 = Layer::Ipv4 {
            source: Ipv4Addr::new(10, 1, 1, 1),
            destination: Ipv4Addr::BROADCAST,
        };
        let v6 = Layer::Ipv6 {
            source: "fe80::1".parse().unwrap(),
            destination: "ff02::1".parse().unwrap(),
        };
        let unspecified = Layer::Ipv6 {
            source: Ipv6Addr::UNSPECIFIED,
            destination: "ff02::16".parse().unwrap(),
        };
        assert!(!ipv4(&mut table, &MAC, &v4).unwrap());
        assert!(!ipv6(&mut table, &MAC, &v6).unwrap());
        assert!(!ipv6(&mut table, &MAC, &unspecified).unwrap());

        let ips: Vec<&str> = table.get(&MAC).unwrap().ips.iter().map(String::as_str).collect();
        assert_eq!(ips, vec!["10.1.1.1", "fe80::1"]);
    }

    #[test]
    fn test_neighbor_advertisement() {
        let mut table = StationTable::new();
        let layer = Layer::Icmpv6NeighborAdvertisement {
            target: "2001:db8::42".parse().unwrap(),
        };
        assert!(neighbor_advertisement(&mut table, &MAC, &layer).unwrap());
        assert!(table.get(&MAC).unwrap().ips.contains("2001:db8::42"));
    }

    #[test]
    fn test_wrong_layer_declined() {
        let mut table = StationTable::new();
        let layer = Layer::Icmpv6NeighborAdvertisement {
            target: "2001:db8::42".parse().unwrap(),
        };
        assert!(!arp(&mut table, &MAC, &layer).unwrap());
        assert!(table.is_empty());
    }
}

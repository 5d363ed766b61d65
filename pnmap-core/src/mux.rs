//! Layer dispatch.
//!
//! Routes each decoded layer of a frame to the dissector registered for its
//! kind. Every matching dissector runs; the frame counts as recognized if
//! any of them recognized something.

use std::collections::BTreeMap;

use crate::dissect::{dhcp, discovery, link, udp, Dissector};
use crate::frame::{DecodedFrame, LayerKind};
use crate::station::StationTable;

/// Fixed registry from layer kind to dissector
pub struct LayerMux {
    dissectors: BTreeMap<LayerKind, Dissector>,
}

impl Default for LayerMux {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerMux {
    pub fn new() -> Self {
        let mut dissectors: BTreeMap<LayerKind, Dissector> = BTreeMap::new();
        dissectors.insert(LayerKind::Arp, link::arp);
        dissectors.insert(LayerKind::Ipv4, link::ipv4);
        dissectors.insert(LayerKind::Ipv6, link::ipv6);
        dissectors.insert(LayerKind::Icmpv6NeighborAdvertisement, link::neighbor_advertisement);
        dissectors.insert(LayerKind::Udp, udp::udp);
        dissectors.insert(LayerKind::Dhcpv4, dhcp::dhcpv4);
        dissectors.insert(LayerKind::Dhcpv6, dhcp::dhcpv6);
        dissectors.insert(LayerKind::Mndp, discovery::mndp);
        dissectors.insert(LayerKind::UbiquitiDiscovery, discovery::ubiquiti);
        Self { dissectors }
    }

    pub fn kinds(&self) -> impl Iterator<Item = LayerKind> + '_ {
        self.dissectors.keys().copied()
    }

    /// Run every registered dissector whose layer is present in `frame`.
    ///
    /// Frames without a source address cannot be attributed and are not
    /// dissected. A dissector error is logged and counts as not recognized;
    /// the remaining dissectors still run.
    pub fn process(&self, table: &mut StationTable, frame: &DecodedFrame<'_>) -> bool {
        let Some(source) = frame.source else {
            return false;
        };

        let mut recognized = false;
        for layer in &frame.layers {
            let Some(dissector) = self.dissectors.get(&layer.kind()) else {
                continue;
            };
            match dissector(table, &source, layer) {
                Ok(r) => recognized |= r,
                Err(e) => log::trace!("{}: {} dissector failed: {}", source, layer.kind(), e),
            }
        }
        recognized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::tests::{arp, ipv4_udp, neighbor_advert, SRC};
    use crate::frame::{decode, DecodedFrame, Layer};
    use crate::protocol::dhcpv4::tests::message as dhcp_message;
    use crate::station::MacAddr;

    #[test]
    fn test_all_kinds_registered() {
        assert_eq!(LayerMux::new().kinds().count(), 9);
    }

    #[test]
    fn test_no_source_not_attributed() {
        let mux = LayerMux::new();
        let mut table = StationTable::new();
        let frame = DecodedFrame {
            source: None,
            destination: None,
            layers: vec![Layer::Icmpv6NeighborAdvertisement {
                target: "fe80::1".parse().unwrap(),
            }],
        };
        assert!(!mux.process(&mut table, &frame));
        assert!(table.is_empty());
    }

    #[test]
    fn test_or_of_all_dissectors() {
        let mux = LayerMux::new();
        let mut table = StationTable::new();

        // IPv4 says false, DHCPv4 says true, UDP on 67 says false
        let dhcp = dhcp_message(1, &[(12, b"laptop")]);
        let data = ipv4_udp([10, 0, 0, 9], [255, 255, 255, 255], 68, 67, &dhcp);
        assert!(mux.process(&mut table, &decode(&data)));

        // Every dissector ran: IPv4 source recorded as well as the host name
        let station = table.get(&MacAddr(SRC)).unwrap();
        assert!(station.ips.contains("10.0.0.9"));
        assert!(station.hostnames.contains("laptop"));
    }

    #[test]
    fn test_unrecognized_frame() {
        let mux = LayerMux::new();
        let mut table = StationTable::new();
        let data = ipv4_udp([10, 0, 0, 9], [255, 255, 255, 255], 5000, 5001, b"x");
        assert!(!mux.process(&mut table, &decode(&data)));
        // IP facts are still recorded
        assert!(table.get(&MacAddr(SRC)).unwrap().ips.contains("10.0.0.9"));
    }

    #[test]
    fn test_link_layers() {
        let mux = LayerMux::new();
        let mut table = StationTable::new();
        assert!(mux.process(&mut table, &decode(&arp([192, 168, 1, 5]))));
        assert!(mux.process(
            &mut table,
            &decode(&neighbor_advert("fe80::abcd".parse().unwrap()))
        ));
        let station = table.get(&MacAddr(SRC)).unwrap();
        assert!(station.ips.contains("192.168.1.5"));
        assert!(station.ips.contains("fe80::abcd"));
    }
}

//! Captured frames and their decoded layers.
//!
//! A [`Frame`] is raw Ethernet bytes plus capture metadata. [`decode`] walks
//! the link, network and transport headers once and produces a flat list of
//! [`Layer`]s that dissectors can match on. Header fields are read with
//! `pnet_packet`; payload slices are taken from the original buffer so the
//! decoded layers borrow from the frame instead of copying it.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};
use pnet_packet::arp::ArpPacket;
use pnet_packet::ethernet::{EtherTypes, EthernetPacket};
use pnet_packet::icmpv6::ndp::NeighborAdvertPacket;
use pnet_packet::icmpv6::{Icmpv6Packet, Icmpv6Types};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::ipv6::Ipv6Packet;
use pnet_packet::udp::UdpPacket;
use pnet_packet::vlan::VlanPacket;

use crate::protocol::dhcpv4::{self, Dhcpv4Message};
use crate::protocol::dhcpv6::{self, Dhcpv6Message};
use crate::protocol::mndp::{self, MndpRecord};
use crate::protocol::ubiquiti::{self, UbiquitiRecord};
use crate::station::MacAddr;

pub const ETHERNET_HEADER_LEN: usize = 14;
const VLAN_TAG_LEN: usize = 4;
const IPV4_MIN_HEADER_LEN: usize = 20;
const IPV6_HEADER_LEN: usize = 40;
const UDP_HEADER_LEN: usize = 8;

// =============================================================================
// Frames
// =============================================================================

/// Capture metadata, as found in a pcap record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureInfo {
    pub timestamp: DateTime<Utc>,
    /// Bytes actually captured
    pub caplen: usize,
    /// Length of the frame on the wire
    pub len: usize,
}

/// One captured link-layer frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub info: CaptureInfo,
    pub data: Vec<u8>,
}

impl Frame {
    /// Frame captured in full at `timestamp`
    pub fn new(timestamp: DateTime<Utc>, data: Vec<u8>) -> Self {
        Self {
            info: CaptureInfo {
                timestamp,
                caplen: data.len(),
                len: data.len(),
            },
            data,
        }
    }
}

// =============================================================================
// Layers
// =============================================================================

/// Layer discriminator, used as the dispatch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    Arp,
    Ipv4,
    Ipv6,
    Icmpv6NeighborAdvertisement,
    Udp,
    Dhcpv4,
    Dhcpv6,
    Mndp,
    UbiquitiDiscovery,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Arp => "ARP",
            LayerKind::Ipv4 => "IPv4",
            LayerKind::Ipv6 => "IPv6",
            LayerKind::Icmpv6NeighborAdvertisement => "ICMPv6-NA",
            LayerKind::Udp => "UDP",
            LayerKind::Dhcpv4 => "DHCPv4",
            LayerKind::Dhcpv6 => "DHCPv6",
            LayerKind::Mndp => "MNDP",
            LayerKind::UbiquitiDiscovery => "Ubiquiti-Discovery",
        }
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpLayer {
    /// Declared protocol address length; 4 for IPv4
    pub proto_addr_len: u8,
    pub sender_proto_addr: Ipv4Addr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpLayer<'a> {
    pub src_port: u16,
    pub dst_port: u16,
    pub payload: &'a [u8],
}

impl UdpLayer<'_> {
    pub fn either_port(&self, port: u16) -> bool {
        self.src_port == port || self.dst_port == port
    }
}

/// One decoded protocol layer of a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer<'a> {
    Arp(ArpLayer),
    Ipv4 {
        source: Ipv4Addr,
        destination: Ipv4Addr,
    },
    Ipv6 {
        source: Ipv6Addr,
        destination: Ipv6Addr,
    },
    Icmpv6NeighborAdvertisement {
        target: Ipv6Addr,
    },
    Udp(UdpLayer<'a>),
    Dhcpv4(Dhcpv4Message),
    Dhcpv6(Dhcpv6Message),
    Mndp(MndpRecord),
    UbiquitiDiscovery(UbiquitiRecord),
}

impl Layer<'_> {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Arp(_) => LayerKind::Arp,
            Layer::Ipv4 { .. } => LayerKind::Ipv4,
            Layer::Ipv6 { .. } => LayerKind::Ipv6,
            Layer::Icmpv6NeighborAdvertisement { .. } => LayerKind::Icmpv6NeighborAdvertisement,
            Layer::Udp(_) => LayerKind::Udp,
            Layer::Dhcpv4(_) => LayerKind::Dhcpv4,
            Layer::Dhcpv6(_) => LayerKind::Dhcpv6,
            Layer::Mndp(_) => LayerKind::Mndp,
            Layer::UbiquitiDiscovery(_) => LayerKind::UbiquitiDiscovery,
        }
    }
}

/// Result of decoding one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFrame<'a> {
    /// Ethernet source; `None` if there is no link-layer header
    pub source: Option<MacAddr>,
    pub destination: Option<MacAddr>,
    pub layers: Vec<Layer<'a>>,
}

impl<'a> DecodedFrame<'a> {
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer<'a>> {
        self.layers.iter().find(|l| l.kind() == kind)
    }

    pub fn has(&self, kind: LayerKind) -> bool {
        self.layer(kind).is_some()
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode an Ethernet frame as far as possible.
///
/// Never fails: a header that does not parse simply ends the walk, keeping
/// the layers decoded so far.
pub fn decode(data: &[u8]) -> DecodedFrame<'_> {
    let mut frame = DecodedFrame::default();

    let Some(ethernet) = EthernetPacket::new(data) else {
        return frame;
    };
    let s = ethernet.get_source();
    let d = ethernet.get_destination();
    frame.source = Some(MacAddr([s.0, s.1, s.2, s.3, s.4, s.5]));
    frame.destination = Some(MacAddr([d.0, d.1, d.2, d.3, d.4, d.5]));

    let mut ethertype = ethernet.get_ethertype();
    let mut offset = ETHERNET_HEADER_LEN;

    // Single 802.1Q tag
    if ethertype == EtherTypes::Vlan {
        let Some(vlan) = VlanPacket::new(&data[offset..]) else {
            return frame;
        };
        ethertype = vlan.get_ethertype();
        offset += VLAN_TAG_LEN;
    }

    let payload = &data[offset..];
    match ethertype {
        EtherTypes::Arp => decode_arp(payload, &mut frame.layers),
        EtherTypes::Ipv4 => decode_ipv4(payload, &mut frame.layers),
        EtherTypes::Ipv6 => decode_ipv6(payload, &mut frame.layers),
        _ => {}
    }

    frame
}

fn decode_arp(data: &[u8], layers: &mut Vec<Layer<'_>>) {
    if let Some(arp) = ArpPacket::new(data) {
        layers.push(Layer::Arp(ArpLayer {
            proto_addr_len: arp.get_proto_addr_len(),
            sender_proto_addr: arp.get_sender_proto_addr(),
        }));
    }
}

fn decode_ipv4<'a>(data: &'a [u8], layers: &mut Vec<Layer<'a>>) {
    let Some(ip) = Ipv4Packet::new(data) else {
        return;
    };
    let header_len = ip.get_header_length() as usize * 4;
    if ip.get_version() != 4 || header_len < IPV4_MIN_HEADER_LEN || header_len > data.len() {
        return;
    }
    layers.push(Layer::Ipv4 {
        source: ip.get_source(),
        destination: ip.get_destination(),
    });

    // Only the first fragment carries the transport header
    if ip.get_fragment_offset() != 0 {
        return;
    }
    let end = (ip.get_total_length() as usize).clamp(header_len, data.len());
    if ip.get_next_level_protocol() == IpNextHeaderProtocols::Udp {
        decode_udp(&data[header_len..end], layers);
    }
}

fn decode_ipv6<'a>(data: &'a [u8], layers: &mut Vec<Layer<'a>>) {
    let Some(ip) = Ipv6Packet::new(data) else {
        return;
    };
    if ip.get_version() != 6 {
        return;
    }
    layers.push(Layer::Ipv6 {
        source: ip.get_source(),
        destination: ip.get_destination(),
    });

    let end = (IPV6_HEADER_LEN + ip.get_payload_length() as usize).min(data.len());
    let payload = &data[IPV6_HEADER_LEN..end];
    match ip.get_next_header() {
        IpNextHeaderProtocols::Udp => decode_udp(payload, layers),
        IpNextHeaderProtocols::Icmpv6 => decode_icmpv6(payload, layers),
        _ => {}
    }
}

fn decode_icmpv6(data: &[u8], layers: &mut Vec<Layer<'_>>) {
    let Some(icmp) = Icmpv6Packet::new(data) else {
        return;
    };
    if icmp.get_icmpv6_type() != Icmpv6Types::NeighborAdvert {
        return;
    }
    if let Some(na) = NeighborAdvertPacket::new(data) {
        layers.push(Layer::Icmpv6NeighborAdvertisement {
            target: na.get_target_addr(),
        });
    }
}

fn decode_udp<'a>(data: &'a [u8], layers: &mut Vec<Layer<'a>>) {
    let Some(udp) = UdpPacket::new(data) else {
        return;
    };
    let end = (udp.get_length() as usize).clamp(UDP_HEADER_LEN, data.len());
    let udp = UdpLayer {
        src_port: udp.get_source(),
        dst_port: udp.get_destination(),
        payload: &data[UDP_HEADER_LEN..end],
    };

    layers.push(Layer::Udp(udp));

    // Application layers are decoded by well-known port, either direction
    let payload = udp.payload;
    if udp.either_port(dhcpv4::SERVER_PORT) || udp.either_port(dhcpv4::CLIENT_PORT) {
        if let Ok(msg) = dhcpv4::parse(payload) {
            layers.push(Layer::Dhcpv4(msg));
        }
    } else if udp.either_port(dhcpv6::SERVER_PORT) || udp.either_port(dhcpv6::CLIENT_PORT) {
        if let Ok(msg) = dhcpv6::parse(payload) {
            layers.push(Layer::Dhcpv6(msg));
        }
    } else if udp.either_port(mndp::PORT) {
        if let Ok(record) = mndp::parse(payload) {
            layers.push(Layer::Mndp(record));
        }
    } else if udp.either_port(ubiquiti::PORT) {
        match ubiquiti::parse(payload) {
            Ok(record) => layers.push(Layer::UbiquitiDiscovery(record)),
            Err(e) => log::trace!("Ubiquiti discovery not decoded: {}", e),
        }
    }
}

// =============================================================================
// Capture filter
// =============================================================================

/// True for frames worth dissecting: non-zero source and a group
/// destination (broadcast or multicast MAC), an IPv4 broadcast, or a
/// link-local multicast IP destination.
pub fn is_group_traffic(data: &[u8]) -> bool {
    let decoded = decode(data);
    let (Some(source), Some(destination)) = (decoded.source, decoded.destination) else {
        return false;
    };
    if source.is_zero() {
        return false;
    }
    if destination.is_group() {
        return true;
    }

    decoded.layers.iter().any(|layer| match layer {
        Layer::Ipv4 { destination, .. } => {
            destination.is_broadcast() || is_link_local_multicast_v4(destination)
        }
        Layer::Ipv6 { destination, .. } => is_link_local_multicast_v6(destination),
        _ => false,
    })
}

/// 224.0.0.0/24
fn is_link_local_multicast_v4(addr: &Ipv4Addr) -> bool {
    let o = addr.octets();
    o[0] == 224 && o[1] == 0 && o[2] == 0
}

/// ff02::/16
fn is_link_local_multicast_v6(addr: &Ipv6Addr) -> bool {
    addr.segments()[0] == 0xff02
}

//! Protocol dissectors.
//!
//! A dissector takes one decoded [`Layer`] sent by a station, records the
//! facts it can infer on that station and reports whether it positively
//! recognized application content. Dissectors are heuristic: anything they
//! do not understand is declined (`Ok(false)`) rather than treated as fatal.
//!
//! | Layer            | Dissector                      |
//! |------------------|--------------------------------|
//! | ARP              | [`link::arp`]                  |
//! | IPv4 / IPv6      | [`link::ipv4`], [`link::ipv6`] |
//! | ICMPv6 NA        | [`link::neighbor_advertisement`] |
//! | DHCPv4 / DHCPv6  | [`dhcp::dhcpv4`], [`dhcp::dhcpv6`] |
//! | UDP              | [`udp::udp`] (port demultiplexed) |
//! | MNDP / Ubiquiti  | [`discovery::mndp`], [`discovery::ubiquiti`] |

use crate::error::ParseError;
use crate::frame::Layer;
use crate::station::{MacAddr, StationTable};

pub mod dhcp;
pub mod discovery;
pub mod link;
pub mod mdns;
pub mod udp;

/// Signature shared by all dissectors
pub type Dissector = fn(&mut StationTable, &MacAddr, &Layer<'_>) -> Result<bool, ParseError>;

// =============================================================================
// Application names
// =============================================================================

pub const APP_DHCPV4: &str = "dhcpv4";
pub const APP_DHCPV6: &str = "dhcpv6";
pub const APP_NETBIOS_NAME: &str = "NetBIOS-Name-Service";
pub const APP_NETBIOS_DATAGRAM: &str = "NetBIOS-Datagram-Service";
pub const APP_HASP: &str = "HASP-License-Manager";
pub const APP_WS_DISCOVERY: &str = "WS-Discovery";
pub const APP_NOBO: &str = "nobo";
pub const APP_UBNT_DISCOVER: &str = "ubnt-discover";
pub const APP_DROPBOX: &str = "Dropbox";
pub const APP_MINECRAFT: &str = "Minecraft";
pub const APP_STEAM: &str = "Steam";
pub const APP_SPOTIFY: &str = "Spotify";
pub const APP_MNDP: &str = "MNDP";

pub const VENDOR_GLEN_DIMPLEX: &str = "Glen-Dimplex";
pub const VENDOR_UBIQUITI: &str = "Ubiquiti";

//! UDP application heuristics, selected by destination port.
//!
//! Most of these protocols are only recognized, not decoded: a datagram to
//! a well-known discovery port is evidence enough that the sender runs the
//! corresponding application.

use crate::dissect::{
    mdns, APP_DROPBOX, APP_HASP, APP_MINECRAFT, APP_NETBIOS_DATAGRAM, APP_NETBIOS_NAME, APP_NOBO,
    APP_SPOTIFY, APP_STEAM, APP_UBNT_DISCOVER, APP_WS_DISCOVERY, VENDOR_GLEN_DIMPLEX,
};
use crate::error::ParseError;
use crate::frame::Layer;
use crate::protocol::{dns, ssdp, steam, ubiquiti};
use crate::station::{MacAddr, Station, StationTable};

// =============================================================================
// Ports
// =============================================================================

pub const PORT_NETBIOS_NAME: u16 = 137;
pub const PORT_NETBIOS_DATAGRAM: u16 = 138;
pub const PORT_HASP: u16 = 1947;
pub const PORT_WS_DISCOVERY: u16 = 3702;
pub const PORT_NOBO: u16 = 10000;
pub const PORT_DROPBOX: u16 = 17500;
pub const PORT_MINECRAFT: u16 = 19133;
pub const PORT_SPOTIFY: u16 = 57621;

const NOBO_MARKER: &[u8] = b"__NOBOHUB__";
const SPOTIFY_PREFIX: &[u8] = b"SpotUdp";

pub fn udp(table: &mut StationTable, source: &MacAddr, layer: &Layer<'_>) -> Result<bool, ParseError> {
    let Layer::Udp(udp) = layer else {
        return Ok(false);
    };
    let payload = udp.payload;

    let station = table.resolve(source);

    let recognized = match udp.dst_port {
        PORT_NETBIOS_NAME => mark(station, APP_NETBIOS_NAME),
        PORT_NETBIOS_DATAGRAM => mark(station, APP_NETBIOS_DATAGRAM),
        ssdp::PORT => ssdp_user_agent(station, payload),
        PORT_HASP => mark(station, APP_HASP),
        PORT_WS_DISCOVERY => mark(station, APP_WS_DISCOVERY),
        dns::MDNS_PORT => match mdns::dissect(station, payload) {
            Ok(()) => true,
            Err(e) => {
                log::trace!("{}: mDNS not unpacked: {}", source, e);
                false
            }
        },
        PORT_NOBO | ubiquiti::PORT => nobo_or_ubiquiti(station, udp.dst_port, payload),
        PORT_DROPBOX => dropbox(station, payload),
        PORT_MINECRAFT => mark(station, APP_MINECRAFT),
        steam::PORT => steam_client(station, payload),
        PORT_SPOTIFY if payload.starts_with(SPOTIFY_PREFIX) => mark(station, APP_SPOTIFY),
        _ => false,
    };

    Ok(recognized)
}

fn mark(station: &mut Station, application: &str) -> bool {
    station.applications.add(application);
    true
}

fn ssdp_user_agent(station: &mut Station, payload: &[u8]) -> bool {
    match ssdp::parse_request(payload) {
        Ok(req) => {
            if let Some(ua) = req.user_agent() {
                station.user_agents.add(ua);
            }
            true
        }
        Err(_) => false,
    }
}

/// Nobø heating hubs beacon on 10000/10001; Ubiquiti discovery requests go
/// to 10001 with the payload length in byte 3.
fn nobo_or_ubiquiti(station: &mut Station, dst_port: u16, payload: &[u8]) -> bool {
    if contains(payload, NOBO_MARKER) {
        station.vendor.add(VENDOR_GLEN_DIMPLEX);
        station.applications.add(APP_NOBO);
        return true;
    }

    if dst_port == ubiquiti::PORT && payload.len() > 3 && payload[3] as usize + 4 == payload.len() {
        station.applications.add(APP_UBNT_DISCOVER);
        return true;
    }

    false
}

/// Dropbox LAN sync announces itself with a JSON object
fn dropbox(station: &mut Station, payload: &[u8]) -> bool {
    match serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(payload) {
        Ok(_) => mark(station, APP_DROPBOX),
        Err(_) => false,
    }
}

/// Recognized on the port alone; the body may add a host name and address
fn steam_client(station: &mut Station, payload: &[u8]) -> bool {
    station.applications.add(APP_STEAM);

    match steam::parse_announcement(payload) {
        Ok(announcement) => {
            if let Some(hostname) = announcement.hostname {
                station.hostnames.add(hostname);
            }
            for ip in announcement.addresses {
                station.ips.add(ip);
            }
        }
        Err(e) => log::trace!("{}: Steam body skipped: {}", station.mac, e),
    }

    true
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

//! DHCP client fingerprinting

use crate::dissect::{APP_DHCPV4, APP_DHCPV6};
use crate::error::ParseError;
use crate::frame::Layer;
use crate::protocol::dhcpv4::Operation;
use crate::station::{MacAddr, StationTable};

/// Client requests only: vendor class (option 60) and host name (option 12).
///
/// Server replies describe the server's view of the client, not the
/// sender, and are ignored.
pub fn dhcpv4(table: &mut StationTable, source: &MacAddr, layer: &Layer<'_>) -> Result<bool, ParseError> {
    let Layer::Dhcpv4(msg) = layer else {
        return Ok(false);
    };
    if msg.operation != Operation::Request {
        return Ok(false);
    }

    let station = table.resolve(source);
    station.applications.add(APP_DHCPV4);
    if let Some(class_id) = msg.class_id() {
        station.vendor.add(class_id);
    }
    if let Some(host_name) = msg.host_name() {
        station.hostnames.add(host_name);
    }
    Ok(true)
}

pub fn dhcpv6(table: &mut StationTable, source: &MacAddr, layer: &Layer<'_>) -> Result<bool, ParseError> {
    let Layer::Dhcpv6(_) = layer else {
        return Ok(false);
    };
    table.resolve(source).applications.add(APP_DHCPV6);
    Ok(true)
}

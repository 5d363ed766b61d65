//! Vendor discovery beacons (MikroTik MNDP, Ubiquiti)

use crate::dissect::{APP_MNDP, APP_UBNT_DISCOVER, VENDOR_UBIQUITI};
use crate::error::ParseError;
use crate::frame::Layer;
use crate::station::{MacAddr, StationTable};

pub fn mndp(table: &mut StationTable, source: &MacAddr, layer: &Layer<'_>) -> Result<bool, ParseError> {
    let Layer::Mndp(record) = layer else {
        return Ok(false);
    };

    let station = table.resolve(source);
    station.applications.add(APP_MNDP);
    if let Some(identity) = &record.identity {
        station.hostnames.add(identity.as_str());
    }
    for vendor in [&record.platform, &record.board].into_iter().flatten() {
        station.vendor.add(vendor.as_str());
    }
    Ok(true)
}

pub fn ubiquiti(table: &mut StationTable, source: &MacAddr, layer: &Layer<'_>) -> Result<bool, ParseError> {
    let Layer::UbiquitiDiscovery(record) = layer else {
        return Ok(false);
    };
    // A bare discovery request carries nothing about the sender
    if record.name.is_none() && record.model.is_none() && record.ip.is_none() {
        return Ok(false);
    }

    let station = table.resolve(source);
    station.applications.add(APP_UBNT_DISCOVER);
    station.vendor.add(VENDOR_UBIQUITI);
    if let Some(name) = &record.name {
        station.hostnames.add(name.as_str());
    }
    if let Some(ip) = record.ip {
        if !ip.is_unspecified() {
            station.ips.add(ip.to_string());
        }
    }
    if let Some(model) = &record.model {
        station.vendor.add(model.as_str());
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::mndp::MndpRecord;
    use crate::protocol::ubiquiti::UbiquitiRecord;
    use std::net::Ipv4Addr;

    const MAC: MacAddr = MacAddr([0x4c, 0x5e, 0x0c, 0x11, 0x22, 0x33]);

    #[test]
    fn test_mndp_facts() {
        let record = MndpRecord {
            identity: Some("core-switch".to_string()),
            platform: Some("MikroTik".to_string()),
            board: Some("CRS326-24G-2S+".to_string()),
            ..Default::default()
        };
        let mut table = StationTable::new();
        assert!(mndp(&mut table, &MAC, &Layer::Mndp(record)).unwrap());

        let station = table.get(&MAC).unwrap();
        assert!(station.hostnames.contains("core-switch"));
        let vendors: Vec<&str> = station.vendor.iter().map(String::as_str).collect();
        assert_eq!(vendors, vec!["MikroTik", "CRS326-24G-2S+"]);
        assert!(station.applications.contains(APP_MNDP));
    }

    #[test]
    fn test_ubiquiti_facts() {
        let record = UbiquitiRecord {
            name: Some("rooftop-ap".to_string()),
            model: Some("NanoStation M5".to_string()),
            ip: Some(Ipv4Addr::new(192, 168, 1, 20)),
            ..Default::default()
        };
        let mut table = StationTable::new();
        assert!(ubiquiti(&mut table, &MAC, &Layer::UbiquitiDiscovery(record)).unwrap());

        let station = table.get(&MAC).unwrap();
        assert!(station.hostnames.contains("rooftop-ap"));
        assert!(station.ips.contains("192.168.1.20"));
        assert!(station.vendor.contains(VENDOR_UBIQUITI));
        assert!(station.vendor.contains("NanoStation M5"));
    }

    #[test]
    fn test_ubiquiti_request_declined() {
        let mut table = StationTable::new();
        let layer = Layer::UbiquitiDiscovery(UbiquitiRecord::default());
        assert!(!ubiquiti(&mut table, &MAC, &layer).unwrap());
        assert!(table.is_empty());
    }
}

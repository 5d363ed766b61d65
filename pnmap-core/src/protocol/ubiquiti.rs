//! Ubiquiti device discovery
//!
//! UniFi/airOS devices answer (and broadcast) on UDP 10001:
//! - u8 version, u8 command
//! - u16 BE length of the remaining bytes
//! - repeated: u8 type, u16 BE length, value
//!
//! Unlike MNDP, a record that overruns the packet invalidates the whole
//! beacon.

use std::net::Ipv4Addr;

use crate::error::ParseError;
use crate::protocol::{be_u16, be_u32, text};

/// Discovery port
pub const PORT: u16 = 10001;

const HEADER_LEN: usize = 4;
const TLV_HEADER_LEN: usize = 3;

// =============================================================================
// Record Types
// =============================================================================

pub const TYPE_HW_ADDR: u8 = 1;
pub const TYPE_SOFTWARE: u8 = 3;
pub const TYPE_IPV4: u8 = 4;
pub const TYPE_UPTIME: u8 = 10;
pub const TYPE_NAME: u8 = 11;
pub const TYPE_MODEL: u8 = 12;
pub const TYPE_SERIES: u8 = 20;

/// Decoded Ubiquiti discovery beacon
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UbiquitiRecord {
    pub version: u8,
    pub command: u8,
    pub hw_addr: Option<[u8; 6]>,
    pub software: Option<String>,
    pub ip: Option<Ipv4Addr>,
    /// Seconds since boot
    pub uptime: Option<u32>,
    pub name: Option<String>,
    pub model: Option<String>,
    pub series: Option<String>,
}

/// Parse a Ubiquiti discovery beacon
pub fn parse(data: &[u8]) -> Result<UbiquitiRecord, ParseError> {
    if data.len() < HEADER_LEN {
        return Err(ParseError::TooShort {
            expected: HEADER_LEN,
            actual: data.len(),
        });
    }

    let total = be_u16(data, 2)? as usize;
    if total + HEADER_LEN != data.len() {
        return Err(ParseError::LengthMismatch {
            header_len: total,
            actual_len: data.len() - HEADER_LEN,
        });
    }

    let mut record = UbiquitiRecord {
        version: data[0],
        command: data[1],
        ..Default::default()
    };
    let mut rest = &data[HEADER_LEN..];

    while rest.len() >= 4 {
        let typ = rest[0];
        let len = be_u16(rest, 1)? as usize;
        rest = &rest[TLV_HEADER_LEN..];

        if len > rest.len() {
            return Err(ParseError::LengthMismatch {
                header_len: len,
                actual_len: rest.len(),
            });
        }
        let value = &rest[..len];
        rest = &rest[len..];

        match typ {
            TYPE_HW_ADDR if len == 6 => {
                let mut mac = [0u8; 6];
                mac.copy_from_slice(value);
                record.hw_addr = Some(mac);
            }
            TYPE_SOFTWARE => record.software = Some(text(value)),
            TYPE_IPV4 if len == 4 => {
                record.ip = Some(Ipv4Addr::new(value[0], value[1], value[2], value[3]))
            }
            TYPE_UPTIME if len >= 4 => record.uptime = Some(be_u32(value, 0)?),
            TYPE_NAME => record.name = Some(text(value)),
            TYPE_MODEL => record.model = Some(text(value)),
            TYPE_SERIES => record.series = Some(text(value)),
            _ => {}
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beacon(records: &[(u8, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (typ, value) in records {
            body.push(*typ);
            body.extend_from_slice(&(value.len() as u16).to_be_bytes());
            body.extend_from_slice(value);
        }
        let mut packet = vec![0x01, 0x00];
        packet.extend_from_slice(&(body.len() as u16).to_be_bytes());
        packet.extend(body);
        packet
    }

    #[test]
    fn test_parse_beacon() {
        let packet = beacon(&[
            (TYPE_HW_ADDR, &[0x24, 0xa4, 0x3c, 0x01, 0x02, 0x03]),
            (TYPE_IPV4, &[192, 168, 1, 20]),
            (TYPE_SOFTWARE, b"XM.ar7240.v6.3.6"),
            (TYPE_UPTIME, &[0, 0, 0x0e, 0x10]),
            (TYPE_NAME, b"rooftop-ap"),
            (TYPE_MODEL, b"NanoStation M5"),
            (TYPE_SERIES, b"XM"),
            (14, &[1]),
        ]);

        let record = parse(&packet).unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.hw_addr, Some([0x24, 0xa4, 0x3c, 0x01, 0x02, 0x03]));
        assert_eq!(record.ip, Some(Ipv4Addr::new(192, 168, 1, 20)));
        assert_eq!(record.software.as_deref(), Some("XM.ar7240.v6.3.6"));
        assert_eq!(record.uptime, Some(3600));
        assert_eq!(record.name.as_deref(), Some("rooftop-ap"));
        assert_eq!(record.model.as_deref(), Some("NanoStation M5"));
        assert_eq!(record.series.as_deref(), Some("XM"));
    }

    #[test]
    fn test_total_length_mismatch() {
        let mut packet = beacon(&[(TYPE_NAME, b"ap")]);
        packet.push(0);
        assert!(matches!(
            parse(&packet),
            Err(ParseError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_overrunning_record_aborts() {
        // Total length is consistent, record length is not
        let packet = vec![0x01, 0x00, 0x00, 0x05, TYPE_NAME, 0x00, 0x09, b'a', b'p'];
        assert!(parse(&packet).is_err());
    }

    #[test]
    fn test_discovery_request() {
        // Bare request: no records
        let record = parse(&[0x01, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(record.name, None);
        assert_eq!(record.command, 0);
    }
}

//! MikroTik Neighbor Discovery Protocol (MNDP)
//!
//! RouterOS devices broadcast a beacon on UDP 5678:
//! - 4 bytes: header (sequence and reserved, not interpreted)
//! - repeated: u16 BE type, u16 BE length, value
//!
//! A truncated trailing record is dropped silently; everything parsed before
//! it is kept.

use crate::error::ParseError;
use crate::protocol::{be_u16, text};

/// Beacon port (source and destination)
pub const PORT: u16 = 5678;

const HEADER_LEN: usize = 4;
const TLV_HEADER_LEN: usize = 4;

// =============================================================================
// Record Types
// =============================================================================

pub const TYPE_MAC: u16 = 1;
pub const TYPE_IDENTITY: u16 = 5;
pub const TYPE_VERSION: u16 = 7;
pub const TYPE_PLATFORM: u16 = 8;
pub const TYPE_UPTIME: u16 = 10;
pub const TYPE_SOFTWARE_ID: u16 = 11;
pub const TYPE_BOARD: u16 = 12;
pub const TYPE_INTERFACE: u16 = 16;

/// Decoded MNDP beacon
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MndpRecord {
    /// Hardware address as sent (string form)
    pub mac: Option<String>,
    pub identity: Option<String>,
    pub version: Option<String>,
    pub platform: Option<String>,
    pub uptime: Option<u16>,
    pub software_id: Option<String>,
    pub board: Option<String>,
    /// Name of the sending interface
    pub interface: Option<String>,
}

/// Parse an MNDP beacon
pub fn parse(data: &[u8]) -> Result<MndpRecord, ParseError> {
    if data.len() < HEADER_LEN {
        return Err(ParseError::TooShort {
            expected: HEADER_LEN,
            actual: data.len(),
        });
    }

    let mut record = MndpRecord::default();
    let mut rest = &data[HEADER_LEN..];

    while rest.len() >= TLV_HEADER_LEN {
        let typ = be_u16(rest, 0)?;
        let len = be_u16(rest, 2)? as usize;
        rest = &rest[TLV_HEADER_LEN..];

        if len > rest.len() {
            log::trace!("MNDP: record type {} claims {} bytes, {} left", typ, len, rest.len());
            break;
        }
        let value = &rest[..len];
        rest = &rest[len..];

        match typ {
            TYPE_MAC => record.mac = Some(text(value)),
            TYPE_IDENTITY => record.identity = Some(text(value)),
            TYPE_VERSION => record.version = Some(text(value)),
            TYPE_PLATFORM => record.platform = Some(text(value)),
            TYPE_UPTIME if value.len() >= 2 => record.uptime = Some(be_u16(value, 0)?),
            TYPE_SOFTWARE_ID => record.software_id = Some(text(value)),
            TYPE_BOARD => record.board = Some(text(value)),
            TYPE_INTERFACE => record.interface = Some(text(value)),
            _ => {}
        }
    }

    Ok(record)
}

//! Steam in-home streaming discovery (UDP 27036)
//!
//! Broadcast layout:
//! - 8 bytes: signature `FF FF FF FF 21 4C 5F A0`
//! - u32 LE: header length, then the header message
//! - u32 LE: body length, then the body message
//!
//! The body is a protobuf message. Only a few string fields are of
//! interest, so it is walked field by field instead of generated code.

use protobuf::CodedInputStream;

use crate::error::ParseError;

pub const PORT: u16 = 27036;

pub const SIGNATURE: [u8; 8] = [0xff, 0xff, 0xff, 0xff, 0x21, 0x4c, 0x5f, 0xa0];

/// Shorter datagrams never carry a usable body
pub const MIN_LEN: usize = 40;

pub const FIELD_HOSTNAME: u32 = 4;
pub const FIELD_IP_ADDRESS: u32 = 20;
pub const FIELD_IP_ADDRESS_ALT: u32 = 21;

const WIRE_VARINT: u32 = 0;
const WIRE_FIXED64: u32 = 1;
const WIRE_LENGTH_DELIMITED: u32 = 2;
const WIRE_FIXED32: u32 = 5;

/// Facts found in a discovery broadcast body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Announcement {
    pub hostname: Option<String>,
    pub addresses: Vec<String>,
}

/// Locate the body and walk its fields.
///
/// Fails only if the body cannot be located. A field that cannot be read
/// ends the walk and whatever was collected so far is returned.
pub fn parse_announcement(payload: &[u8]) -> Result<Announcement, ParseError> {
    if payload.len() < MIN_LEN {
        return Err(ParseError::TooShort {
            expected: MIN_LEN,
            actual: payload.len(),
        });
    }

    let header_len = u32::from_le_bytes([payload[8], payload[9], payload[10], payload[11]]) as usize;
    // signature + header length + header + body length
    let offset = SIGNATURE
        .len()
        .saturating_add(4)
        .saturating_add(header_len)
        .saturating_add(4);
    if offset > payload.len() {
        return Err(ParseError::LengthMismatch {
            header_len,
            actual_len: payload.len() - 12,
        });
    }

    let mut announcement = Announcement::default();
    let mut is = CodedInputStream::from_bytes(&payload[offset..]);

    loop {
        match is.eof() {
            Ok(false) => {}
            _ => break,
        }
        let Ok(tag) = is.read_raw_varint32() else {
            break;
        };
        let field = tag >> 3;

        let value = match tag & 0x7 {
            WIRE_VARINT => is.read_raw_varint64().map(|_| None),
            WIRE_FIXED64 => is.read_fixed64().map(|_| None),
            WIRE_LENGTH_DELIMITED => is.read_bytes().map(Some),
            WIRE_FIXED32 => is.read_fixed32().map(|_| None),
            wire => {
                log::trace!("Steam: unsupported wire type {} for field {}", wire, field);
                break;
            }
        };
        let value = match value {
            Ok(v) => v,
            Err(e) => {
                log::trace!("Steam: field {} unreadable: {}", field, e);
                break;
            }
        };

        let Some(bytes) = value else {
            continue;
        };
        let s = String::from_utf8_lossy(&bytes).into_owned();
        match field {
            FIELD_HOSTNAME => announcement.hostname = Some(s),
            FIELD_IP_ADDRESS | FIELD_IP_ADDRESS_ALT if s != "0.0.0.0" => {
                announcement.addresses.push(s)
            }
            _ => {}
        }
    }

    Ok(announcement)
}

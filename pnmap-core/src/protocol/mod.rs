//! Application protocol decoders.
//!
//! This module contains wire format parsing for the broadcast and discovery
//! protocols we fingerprint. All functions are pure (no I/O) and work on
//! borrowed payload bytes; nothing here touches station records.
//!
//! # Structure
//!
//! - [`dhcpv4`] / [`dhcpv6`] - address configuration requests
//! - [`dns`] - DNS message unpacking for multicast DNS
//! - [`ssdp`] - HTTP-over-UDP discovery requests
//! - [`mndp`] - MikroTik neighbor discovery TLV beacons
//! - [`ubiquiti`] - Ubiquiti discovery TLV beacons
//! - [`steam`] - Steam in-home streaming discovery
//!
//! # Example
//!
//! ```rust
//! use pnmap_core::protocol::mndp;
//!
//! let beacon = [0, 0, 0, 0, 0, 5, 0, 3, b'R', b't', b'r'];
//! let record = mndp::parse(&beacon).unwrap();
//! assert_eq!(record.identity.as_deref(), Some("Rtr"));
//! ```

pub mod dhcpv4;
pub mod dhcpv6;
pub mod dns;
pub mod mndp;
pub mod ssdp;
pub mod steam;
pub mod ubiquiti;

use crate::error::ParseError;

/// Decode a string field, replacing invalid UTF-8 and dropping trailing NULs
pub fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

/// Read a big-endian u16 at `offset`
pub(crate) fn be_u16(data: &[u8], offset: usize) -> Result<u16, ParseError> {
    match data.get(offset..offset + 2) {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => Err(ParseError::TooShort {
            expected: offset + 2,
            actual: data.len(),
        }),
    }
}

/// Read a big-endian u32 at `offset`
pub(crate) fn be_u32(data: &[u8], offset: usize) -> Result<u32, ParseError> {
    match data.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => Err(ParseError::TooShort {
            expected: offset + 4,
            actual: data.len(),
        }),
    }
}

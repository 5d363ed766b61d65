//! DHCPv4 message parsing (RFC 2131 / RFC 2132)
//!
//! Only the parts needed for fingerprinting are decoded: the operation, the
//! client hardware address and the option list.

use crate::error::ParseError;
use crate::protocol::{be_u32, text};

pub const SERVER_PORT: u16 = 67;
pub const CLIENT_PORT: u16 = 68;

/// Fixed BOOTP header before the magic cookie
pub const FIXED_HEADER_LEN: usize = 236;

pub const MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];

// =============================================================================
// Options
// =============================================================================

pub const OPTION_PAD: u8 = 0;
pub const OPTION_HOST_NAME: u8 = 12;
pub const OPTION_MESSAGE_TYPE: u8 = 53;
pub const OPTION_CLASS_ID: u8 = 60;
pub const OPTION_END: u8 = 255;

/// BOOTP operation code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Request,
    Reply,
    Unknown(u8),
}

impl Operation {
    pub fn from_value(v: u8) -> Self {
        match v {
            1 => Operation::Request,
            2 => Operation::Reply,
            _ => Operation::Unknown(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpOption {
    pub code: u8,
    pub data: Vec<u8>,
}

/// Decoded DHCPv4 message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dhcpv4Message {
    pub operation: Operation,
    pub xid: u32,
    /// First 6 bytes of `chaddr`
    pub client_hw_addr: [u8; 6],
    pub options: Vec<DhcpOption>,
}

impl Dhcpv4Message {
    pub fn option(&self, code: u8) -> Option<&[u8]> {
        self.options
            .iter()
            .find(|o| o.code == code)
            .map(|o| o.data.as_slice())
    }

    /// Option 12
    pub fn host_name(&self) -> Option<String> {
        self.option(OPTION_HOST_NAME).map(text)
    }

    /// Option 60, e.g. "MSFT 5.0" or "android-dhcp-13"
    pub fn class_id(&self) -> Option<String> {
        self.option(OPTION_CLASS_ID).map(text)
    }

    /// Option 53
    pub fn message_type(&self) -> Option<u8> {
        self.option(OPTION_MESSAGE_TYPE)
            .and_then(|d| d.first().copied())
    }
}

/// Parse a DHCPv4 message
///
/// Option parsing stops at the end option or at the first option that
/// overruns the packet; options before it are kept.
pub fn parse(data: &[u8]) -> Result<Dhcpv4Message, ParseError> {
    let min_len = FIXED_HEADER_LEN + MAGIC_COOKIE.len();
    if data.len() < min_len {
        return Err(ParseError::TooShort {
            expected: min_len,
            actual: data.len(),
        });
    }

    let cookie = &data[FIXED_HEADER_LEN..min_len];
    if cookie != MAGIC_COOKIE {
        return Err(ParseError::InvalidHeader {
            expected: MAGIC_COOKIE.to_vec(),
            actual: cookie.to_vec(),
        });
    }

    let mut client_hw_addr = [0u8; 6];
    client_hw_addr.copy_from_slice(&data[28..34]);

    let mut options = Vec::new();
    let mut rest = &data[min_len..];
    while let Some((&code, tail)) = rest.split_first() {
        match code {
            OPTION_PAD => {
                rest = tail;
                continue;
            }
            OPTION_END => break,
            _ => {}
        }
        let Some((&len, tail)) = tail.split_first() else {
            break;
        };
        let len = len as usize;
        if len > tail.len() {
            log::trace!("DHCPv4: option {} overruns packet", code);
            break;
        }
        options.push(DhcpOption {
            code,
            data: tail[..len].to_vec(),
        });
        rest = &tail[len..];
    }

    Ok(Dhcpv4Message {
        operation: Operation::from_value(data[0]),
        xid: be_u32(data, 4)?,
        client_hw_addr,
        options,
    })
}

//! DHCPv6 message header (RFC 8415)
//!
//! Clients talk to servers on UDP 547, servers answer on 546.

use crate::error::ParseError;

pub const CLIENT_PORT: u16 = 546;
pub const SERVER_PORT: u16 = 547;

const HEADER_LEN: usize = 4;

/// DHCPv6 message type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Solicit,
    Advertise,
    Request,
    Confirm,
    Renew,
    Rebind,
    Reply,
    Release,
    Decline,
    Reconfigure,
    InformationRequest,
    RelayForward,
    RelayReply,
    Unknown(u8),
}

impl MessageType {
    pub fn from_value(v: u8) -> Self {
        match v {
            1 => MessageType::Solicit,
            2 => MessageType::Advertise,
            3 => MessageType::Request,
            4 => MessageType::Confirm,
            5 => MessageType::Renew,
            6 => MessageType::Rebind,
            7 => MessageType::Reply,
            8 => MessageType::Release,
            9 => MessageType::Decline,
            10 => MessageType::Reconfigure,
            11 => MessageType::InformationRequest,
            12 => MessageType::RelayForward,
            13 => MessageType::RelayReply,
            _ => MessageType::Unknown(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dhcpv6Message {
    pub message_type: MessageType,
    /// 24-bit transaction id
    pub transaction_id: u32,
}

pub fn parse(data: &[u8]) -> Result<Dhcpv6Message, ParseError> {
    if data.len() < HEADER_LEN {
        return Err(ParseError::TooShort {
            expected: HEADER_LEN,
            actual: data.len(),
        });
    }

    Ok(Dhcpv6Message {
        message_type: MessageType::from_value(data[0]),
        transaction_id: u32::from_be_bytes([0, data[1], data[2], data[3]]),
    })
}

//! Error types for frame and protocol parsing

use thiserror::Error;

/// Errors that can occur when decoding a frame or an application payload
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Buffer is too short to contain required data
    #[error("Packet too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// Payload doesn't start with the expected signature
    #[error("Invalid header: expected {expected:02X?}, got {actual:02X?}")]
    InvalidHeader {
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// Length field doesn't match actual packet length
    #[error("Length mismatch: header says {header_len} bytes, packet has {actual_len}")]
    LengthMismatch { header_len: usize, actual_len: usize },

    /// Failed to deserialize an embedded structure
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Compressed name chases too many pointers or points forward
    #[error("Invalid name compression at offset {0}")]
    BadCompression(usize),

    /// Invalid packet data
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::DeserializationFailed(e.to_string())
    }
}

impl From<protobuf::Error> for ParseError {
    fn from(e: protobuf::Error) -> Self {
        ParseError::DeserializationFailed(e.to_string())
    }
}

impl From<httparse::Error> for ParseError {
    fn from(e: httparse::Error) -> Self {
        ParseError::InvalidPacket(e.to_string())
    }
}

//! SSDP (UPnP discovery) requests
//!
//! `M-SEARCH` and `NOTIFY` are HTTP/1.1 requests carried in a single UDP
//! datagram to 239.255.255.250:1900.

use httparse::Status;

use crate::error::ParseError;

pub const PORT: u16 = 1900;


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsdpRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl SsdpRequest {
    /// Case-insensitive header lookup, first match wins
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header("User-Agent").filter(|ua| !ua.is_empty())
    }
}

/// Parse a complete HTTP request header block
pub fn parse_request(payload: &[u8]) -> Result<SsdpRequest, ParseError> {
    // Every header ends a line, so the line count bounds the header count
    let lines = payload.iter().filter(|&&b| b == b'\n').count();
    let mut headers = vec![httparse::EMPTY_HEADER; lines.max(1)];
    let mut req = httparse::Request::new(&mut headers);

    match req.parse(payload)? {
        Status::Complete(_) => {}
        Status::Partial => {
            return Err(ParseError::InvalidPacket(
                "incomplete request header".to_string(),
            ))
        }
    }

    Ok(SsdpRequest {
        method: req.method.unwrap_or_default().to_string(),
        target: req.path.unwrap_or_default().to_string(),
        headers: req
            .headers
            .iter()
            .map(|h| {
                (
                    h.name.to_string(),
                    String::from_utf8_lossy(h.value).trim().to_string(),
                )
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const M_SEARCH: &[u8] = b"M-SEARCH * HTTP/1.1\r\n\
        HOST: 239.255.255.250:1900\r\n\
        MAN: \"ssdp:discover\"\r\n\
        MX: 1\r\n\
        ST: urn:dial-multiscreen-org:service:dial:1\r\n\
        USER-AGENT: Google Chrome/120.0.6099.71 Windows\r\n\
        \r\n";

    #[test]
    fn test_parse_m_search() {
        let req = parse_request(M_SEARCH).unwrap();
        assert_eq!(req.method, "M-SEARCH");
        assert_eq!(req.target, "*");
        assert_eq!(req.header("mx"), Some("1"));
        assert_eq!(req.user_agent(), Some("Google Chrome/120.0.6099.71 Windows"));
    }

    #[test]
    fn test_notify_without_user_agent() {
        let notify = b"NOTIFY * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nNTS: ssdp:alive\r\n\r\n";
        let req = parse_request(notify).unwrap();
        assert_eq!(req.method, "NOTIFY");
        assert_eq!(req.user_agent(), None);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_request(b"\x00\x01\x02binary").is_err());
        assert!(parse_request(b"M-SEARCH * HTTP/1.1\r\nHOST: x\r\n").is_err());
    }

    #[test]
    fn test_many_headers() {
        let mut notify = b"NOTIFY * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\n".to_vec();
        for i in 0..200 {
            notify.extend_from_slice(format!("X-VENDOR-{}: {}\r\n", i, i).as_bytes());
        }
        notify.extend_from_slice(b"USER-AGENT: Linux/5.10 UPnP/1.0 Sonos/80.1\r\n\r\n");

        let req = parse_request(&notify).unwrap();
        assert_eq!(req.headers.len(), 202);
        assert_eq!(req.user_agent(), Some("Linux/5.10 UPnP/1.0 Sonos/80.1"));
    }
}

//! DNS message unpacking, as used by multicast DNS (RFC 6762 / RFC 6763)
//!
//! Names are returned in presentation format: labels joined by `.`, a
//! trailing `.` for the root, and bytes that would be ambiguous in that
//! form escaped with a backslash. [`split_labels`] undoes the escaping.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::ParseError;
use crate::protocol::{be_u16, be_u32};

/// Multicast DNS port
pub const MDNS_PORT: u16 = 5353;

const HEADER_LEN: usize = 12;
const FLAG_RESPONSE: u16 = 0x8000;

/// Upper bound on compression pointers followed for one name
const MAX_POINTER_JUMPS: usize = 64;
/// Longest name in wire format
const MAX_NAME_LEN: usize = 255;

// =============================================================================
// Record Types
// =============================================================================

pub const TYPE_A: u16 = 1;
pub const TYPE_PTR: u16 = 12;
pub const TYPE_TXT: u16 = 16;
pub const TYPE_AAAA: u16 = 28;
pub const TYPE_SRV: u16 = 33;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: u16,
    pub qclass: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ptr(String),
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    Txt(Vec<String>),
    Other(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Owner name in presentation format
    pub name: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub data: RecordData,
}

/// Unpacked DNS message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u16,
    pub response: bool,
    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authorities: Vec<Record>,
    pub additionals: Vec<Record>,
}

// =============================================================================
// Unpacking
// =============================================================================

/// Unpack a complete DNS message.
///
/// Every section has to decode; a malformed record anywhere fails the
/// whole message.
pub fn unpack(data: &[u8]) -> Result<Message, ParseError> {
    if data.len() < HEADER_LEN {
        return Err(ParseError::TooShort {
            expected: HEADER_LEN,
            actual: data.len(),
        });
    }

    let id = be_u16(data, 0)?;
    let flags = be_u16(data, 2)?;
    let qdcount = be_u16(data, 4)?;
    let ancount = be_u16(data, 6)?;
    let nscount = be_u16(data, 8)?;
    let arcount = be_u16(data, 10)?;

    let mut offset = HEADER_LEN;

    let mut questions = Vec::new();
    for _ in 0..qdcount {
        let (name, next) = read_name(data, offset)?;
        questions.push(Question {
            name,
            qtype: be_u16(data, next)?,
            qclass: be_u16(data, next + 2)?,
        });
        offset = next + 4;
    }

    let answers = read_records(data, &mut offset, ancount)?;
    let authorities = read_records(data, &mut offset, nscount)?;
    let additionals = read_records(data, &mut offset, arcount)?;

    Ok(Message {
        id,
        response: flags & FLAG_RESPONSE != 0,
        questions,
        answers,
        authorities,
        additionals,
    })
}

fn read_records(data: &[u8], offset: &mut usize, count: u16) -> Result<Vec<Record>, ParseError> {
    let mut records = Vec::new();
    for _ in 0..count {
        let (record, next) = read_record(data, *offset)?;
        records.push(record);
        *offset = next;
    }
    Ok(records)
}

fn read_record(data: &[u8], offset: usize) -> Result<(Record, usize), ParseError> {
    let (name, offset) = read_name(data, offset)?;
    let rtype = be_u16(data, offset)?;
    let class = be_u16(data, offset + 2)?;
    let ttl = be_u32(data, offset + 4)?;
    let rdlength = be_u16(data, offset + 8)? as usize;

    let start = offset + 10;
    let end = start + rdlength;
    if end > data.len() {
        return Err(ParseError::LengthMismatch {
            header_len: rdlength,
            actual_len: data.len().saturating_sub(start),
        });
    }
    let rdata = &data[start..end];

    let record_data = match rtype {
        TYPE_A => {
            let o: [u8; 4] = rdata
                .try_into()
                .map_err(|_| ParseError::InvalidPacket(format!("A record of {} bytes", rdlength)))?;
            RecordData::A(Ipv4Addr::from(o))
        }
        TYPE_AAAA => {
            let o: [u8; 16] = rdata
                .try_into()
                .map_err(|_| ParseError::InvalidPacket(format!("AAAA record of {} bytes", rdlength)))?;
            RecordData::Aaaa(Ipv6Addr::from(o))
        }
        TYPE_PTR => {
            let (target, next) = read_name(data, start)?;
            check_within(next, end)?;
            RecordData::Ptr(target)
        }
        TYPE_SRV => {
            let (target, next) = read_name(data, start + 6)?;
            check_within(next, end)?;
            RecordData::Srv {
                priority: be_u16(rdata, 0)?,
                weight: be_u16(rdata, 2)?,
                port: be_u16(rdata, 4)?,
                target,
            }
        }
        TYPE_TXT => RecordData::Txt(read_character_strings(rdata)?),
        _ => RecordData::Other(rdata.to_vec()),
    };

    Ok((
        Record {
            name,
            rtype,
            class,
            ttl,
            data: record_data,
        },
        end,
    ))
}

fn check_within(next: usize, end: usize) -> Result<(), ParseError> {
    if next > end {
        return Err(ParseError::LengthMismatch {
            header_len: end,
            actual_len: next,
        });
    }
    Ok(())
}

fn read_character_strings(mut rdata: &[u8]) -> Result<Vec<String>, ParseError> {
    let mut strings = Vec::new();
    while let Some((&len, rest)) = rdata.split_first() {
        let len = len as usize;
        if len > rest.len() {
            return Err(ParseError::LengthMismatch {
                header_len: len,
                actual_len: rest.len(),
            });
        }
        strings.push(String::from_utf8_lossy(&rest[..len]).into_owned());
        rdata = &rest[len..];
    }
    Ok(strings)
}

/// Read a possibly compressed name starting at `offset`.
///
/// Returns the name in presentation format and the offset just past the
/// name as it appears at `offset` (not past any pointer target).
pub fn read_name(data: &[u8], offset: usize) -> Result<(String, usize), ParseError> {
    let mut name = String::new();
    let mut pos = offset;
    let mut end = None;
    let mut jumps = 0;
    let mut wire_len = 0;

    loop {
        let len = *data.get(pos).ok_or(ParseError::TooShort {
            expected: pos + 1,
            actual: data.len(),
        })? as usize;

        match len & 0xc0 {
            0x00 if len == 0 => {
                if end.is_none() {
                    end = Some(pos + 1);
                }
                break;
            }
            0x00 => {
                let label = data.get(pos + 1..pos + 1 + len).ok_or(ParseError::TooShort {
                    expected: pos + 1 + len,
                    actual: data.len(),
                })?;
                wire_len += len + 1;
                if wire_len > MAX_NAME_LEN {
                    return Err(ParseError::InvalidPacket("name too long".to_string()));
                }
                escape_label(label, &mut name);
                name.push('.');
                pos += 1 + len;
            }
            0xc0 => {
                let low = *data.get(pos + 1).ok_or(ParseError::TooShort {
                    expected: pos + 2,
                    actual: data.len(),
                })? as usize;
                if end.is_none() {
                    end = Some(pos + 2);
                }
                jumps += 1;
                if jumps > MAX_POINTER_JUMPS {
                    return Err(ParseError::BadCompression(pos));
                }
                pos = ((len & 0x3f) << 8) | low;
            }
            _ => return Err(ParseError::InvalidPacket(format!("label type {:#04x}", len))),
        }
    }

    if name.is_empty() {
        name.push('.');
    }

    // `end` is always set once the loop breaks
    Ok((name, end.unwrap_or(pos + 1)))
}

/// Append one label in presentation format
fn escape_label(label: &[u8], out: &mut String) {
    for c in String::from_utf8_lossy(label).chars() {
        match c {
            '.' | ' ' | '\'' | '@' | ';' | '(' | ')' | '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii_control() => {
                out.push_str(&format!("\\{:03}", c as u32));
            }
            c => out.push(c),
        }
    }
}

// =============================================================================
// Presentation helpers
// =============================================================================

/// Drop the `.local.` suffix of a multicast DNS name
pub fn strip_local(name: &str) -> &str {
    name.strip_suffix(".local.").unwrap_or(name)
}

/// Split a presentation-format name into unescaped labels.
///
/// The `.local.` suffix is removed first. A backslash takes the next
/// character literally, an unescaped dot starts a new label.
///
/// `Office\.Printer._ipp._tcp.local.` gives `["Office.Printer", "_ipp", "_tcp"]`.
pub fn split_labels(name: &str) -> Vec<String> {
    let mut labels = vec![String::new()];
    let mut chars = strip_local(name).chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_char(&mut labels, escaped);
                }
            }
            '.' => labels.push(String::new()),
            c => push_char(&mut labels, c),
        }
    }

    labels
}

fn push_char(labels: &mut [String], c: char) {
    if let Some(last) = labels.last_mut() {
        last.push(c);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode a dotted name without compression
    pub(crate) fn encode_name(name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for label in name.split('.').filter(|l| !l.is_empty()) {
            out.push(label.len() as u8);
            out.extend_from_slice(label.as_bytes());
        }
        out.push(0);
        out
    }

    /// Build a response carrying the given answers
    pub(crate) fn response(answers: &[(Vec<u8>, u16, Vec<u8>)]) -> Vec<u8> {
        let mut msg = vec![0, 0, 0x84, 0x00, 0, 0];
        msg.extend_from_slice(&(answers.len() as u16).to_be_bytes());
        msg.extend_from_slice(&[0, 0, 0, 0]);
        for (name, rtype, rdata) in answers {
            msg.extend_from_slice(name);
            msg.extend_from_slice(&rtype.to_be_bytes());
            msg.extend_from_slice(&0x8001u16.to_be_bytes());
            msg.extend_from_slice(&120u32.to_be_bytes());
            msg.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
            msg.extend_from_slice(rdata);
        }
        msg
    }

    #[test]
    fn test_unpack_query() {
        let mut msg = vec![0x12, 0x34, 0x00, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
        msg.extend(encode_name("_ipp._tcp.local"));
        msg.extend_from_slice(&[0, 12, 0, 1]);
        let m = unpack(&msg).unwrap();
        assert_eq!(m.id, 0x1234);
        assert!(!m.response);
        assert_eq!(m.questions[0].name, "_ipp._tcp.local.");
        assert_eq!(m.questions[0].qtype, TYPE_PTR);
    }

    #[test]
    fn test_unpack_answers() {
        let mut srv = vec![0, 0, 0, 0, 0x02, 0x77];
        srv.extend(encode_name("printer.local"));
        let msg = response(&[
            (encode_name("printer.local"), TYPE_A, vec![192, 168, 1, 9]),
            (encode_name("_ipp._tcp.local"), TYPE_PTR, encode_name("Office._ipp._tcp.local")),
            (encode_name("Office._ipp._tcp.local"), TYPE_SRV, srv),
            (encode_name("Office._ipp._tcp.local"), TYPE_TXT, b"\x07txtvers\x04rp=x".to_vec()),
        ]);
        let m = unpack(&msg).unwrap();
        assert!(m.response);
        assert_eq!(m.answers.len(), 4);
        assert_eq!(m.answers[0].data, RecordData::A(Ipv4Addr::new(192, 168, 1, 9)));
        assert_eq!(m.answers[1].data, RecordData::Ptr("Office._ipp._tcp.local.".to_string()));
        assert_eq!(
            m.answers[2].data,
            RecordData::Srv {
                priority: 0,
                weight: 0,
                port: 631,
                target: "printer.local.".to_string()
            }
        );
        assert_eq!(
            m.answers[3].data,
            RecordData::Txt(vec!["txtvers".to_string(), "rp=x".to_string()])
        );
    }

    #[test]
    fn test_txt_strings() {
        let msg = response(&[(
            encode_name("Office._device-info._tcp.local"),
            TYPE_TXT,
            b"\x0dmodel=Xserve1\x05osxv=".to_vec(),
        )]);
        let m = unpack(&msg).unwrap();
        assert_eq!(
            m.answers[0].data,
            RecordData::Txt(vec!["model=Xserve1".to_string(), "osxv=".to_string()])
        );
    }

    #[test]
    fn test_compressed_name() {
        // Question name at offset 12, answer owner points back at it
        let mut msg = vec![0, 0, 0x84, 0, 0, 1, 0, 1, 0, 0, 0, 0];
        msg.extend(encode_name("host.local"));
        msg.extend_from_slice(&[0, 1, 0, 1]);
        msg.extend_from_slice(&[0xc0, 12, 0, 1, 0, 1, 0, 0, 0, 120, 0, 4, 10, 0, 0, 1]);
        let m = unpack(&msg).unwrap();
        assert_eq!(m.answers[0].name, "host.local.");
        assert_eq!(m.answers[0].data, RecordData::A(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn test_pointer_loop_rejected() {
        let mut msg = vec![0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];
        msg.extend_from_slice(&[0xc0, 12, 0, 1, 0, 1]);
        assert!(matches!(unpack(&msg), Err(ParseError::BadCompression(_))));
    }

    #[test]
    fn test_truncated_message() {
        let msg = response(&[(encode_name("host.local"), TYPE_A, vec![10, 0, 0, 1])]);
        assert!(unpack(&msg[..msg.len() - 2]).is_err());
        assert!(unpack(&[0; 5]).is_err());
    }

    #[test]
    fn test_bad_a_length() {
        let msg = response(&[(encode_name("host.local"), TYPE_A, vec![10, 0, 0])]);
        assert!(unpack(&msg).is_err());
    }

    #[test]
    fn test_escaped_owner_name() {
        let mut owner = vec![14];
        owner.extend_from_slice(b"Office.Printer");
        owner.extend(encode_name("_ipp._tcp.local"));
        let (name, next) = read_name(&owner, 0).unwrap();
        assert_eq!(name, "Office\\.Printer._ipp._tcp.local.");
        assert_eq!(next, owner.len());
    }

    #[test]
    fn test_escape_specials() {
        let mut out = String::new();
        escape_label(b"a b\\c\x07", &mut out);
        assert_eq!(out, "a\\ b\\\\c\\007");
    }

    #[test]
    fn test_root_name() {
        assert_eq!(read_name(&[0], 0).unwrap(), (".".to_string(), 1));
    }

    #[test]
    fn test_split_labels() {
        assert_eq!(
            split_labels("Office\\.Printer._ipp._tcp.local."),
            vec!["Office.Printer", "_ipp", "_tcp"]
        );
        assert_eq!(split_labels("a\\\\b.c"), vec!["a\\b", "c"]);
        assert_eq!(split_labels("host.local."), vec!["host"]);
        assert_eq!(split_labels("1.0.168.192.in-addr.arpa."), vec!["1", "0", "168", "192", "in-addr", "arpa", ""]);
    }

    #[test]
    fn test_strip_local() {
        assert_eq!(strip_local("macbook.local."), "macbook");
        assert_eq!(strip_local("example.com."), "example.com.");
    }
}

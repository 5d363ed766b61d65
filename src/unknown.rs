//! Side capture of frames that no dissector recognized.
//!
//! Classic libpcap format, little-endian, microsecond timestamps. The file
//! is opened for append so successive sessions accumulate into one capture;
//! the global header is only written to an empty file.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use pnmap_core::Frame;

/// Magic number for microsecond-resolution pcap files
pub const PCAP_MAGIC: u32 = 0xa1b2_c3d4;
pub const PCAP_VERSION_MAJOR: u16 = 2;
pub const PCAP_VERSION_MINOR: u16 = 4;
pub const SNAPLEN: u32 = 65536;
/// LINKTYPE_ETHERNET
pub const LINKTYPE_ETHERNET: u32 = 1;

pub const GLOBAL_HEADER_SIZE: usize = 24;
pub const RECORD_HEADER_SIZE: usize = 16;

/// pcap global header (24 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcapGlobalHeader {
    pub snaplen: u32,
    pub linktype: u32,
}

impl Default for PcapGlobalHeader {
    fn default() -> Self {
        Self {
            snaplen: SNAPLEN,
            linktype: LINKTYPE_ETHERNET,
        }
    }
}

impl PcapGlobalHeader {
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = [0u8; GLOBAL_HEADER_SIZE];

        buf[0..4].copy_from_slice(&PCAP_MAGIC.to_le_bytes());
        buf[4..6].copy_from_slice(&PCAP_VERSION_MAJOR.to_le_bytes());
        buf[6..8].copy_from_slice(&PCAP_VERSION_MINOR.to_le_bytes());
        // Timezone offset and timestamp accuracy (8 bytes) stay zero
        buf[16..20].copy_from_slice(&self.snaplen.to_le_bytes());
        buf[20..24].copy_from_slice(&self.linktype.to_le_bytes());

        writer.write_all(&buf)
    }
}

/// pcap record header (16 bytes) followed by `incl_len` bytes of data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcapRecordHeader {
    pub ts_sec: u32,
    pub ts_usec: u32,
    pub incl_len: u32,
    pub orig_len: u32,
}

impl PcapRecordHeader {
    /// Header for `frame`, truncated to `snaplen`
    pub fn for_frame(frame: &Frame, snaplen: u32) -> Self {
        let ts = frame.info.timestamp;
        let incl_len = (frame.data.len() as u32).min(snaplen);
        Self {
            ts_sec: ts.timestamp() as u32,
            ts_usec: ts.timestamp_subsec_micros(),
            incl_len,
            orig_len: (frame.info.len as u32).max(incl_len),
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = [0u8; RECORD_HEADER_SIZE];

        buf[0..4].copy_from_slice(&self.ts_sec.to_le_bytes());
        buf[4..8].copy_from_slice(&self.ts_usec.to_le_bytes());
        buf[8..12].copy_from_slice(&self.incl_len.to_le_bytes());
        buf[12..16].copy_from_slice(&self.orig_len.to_le_bytes());

        writer.write_all(&buf)
    }
}

/// Appends frames to a pcap file
pub struct UnknownWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    header: PcapGlobalHeader,
    written: u64,
}

impl UnknownWriter {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let empty = file.metadata()?.len() == 0;

        let header = PcapGlobalHeader::default();
        let mut writer = BufWriter::new(file);
        if empty {
            header.write(&mut writer)?;
            writer.flush()?;
        }
        log::info!(
            "Writing unrecognized frames to {}{}",
            path.display(),
            if empty { "" } else { " (appending)" }
        );

        Ok(Self {
            path: path.to_owned(),
            writer,
            header,
            written: 0,
        })
    }

    pub fn write(&mut self, frame: &Frame) -> io::Result<()> {
        let record = PcapRecordHeader::for_frame(frame, self.header.snaplen);
        record.write(&mut self.writer)?;
        self.writer
            .write_all(&frame.data[..record.incl_len as usize])?;
        self.written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames written since opening
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Drop for UnknownWriter {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::warn!("Failed to flush {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pcap_parser::traits::PcapReaderIterator;
    use pcap_parser::{LegacyPcapReader, Linktype, PcapBlockOwned, PcapError};

    fn frame(micros: u32, data: Vec<u8>) -> Frame {
        let ts = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .unwrap()
            + chrono::Duration::microseconds(micros as i64);
        Frame::new(ts, data)
    }

    /// (ts_usec, data) of every record
    fn read_all(path: &Path) -> Vec<(u32, Vec<u8>)> {
        let mut reader = LegacyPcapReader::new(65536, File::open(path).unwrap()).unwrap();
        let mut packets = Vec::new();
        loop {
            match reader.next() {
                Ok((offset, block)) => {
                    match &block {
                        PcapBlockOwned::LegacyHeader(header) => {
                            assert_eq!(header.network, Linktype::ETHERNET);
                            assert_eq!(header.snaplen, SNAPLEN);
                        }
                        PcapBlockOwned::Legacy(packet) => {
                            packets.push((packet.ts_usec, packet.data.to_vec()));
                        }
                        PcapBlockOwned::NG(_) => panic!("unexpected pcapng block"),
                    }
                    drop(block);
                    reader.consume(offset);
                }
                Err(PcapError::Eof) => break,
                Err(PcapError::Incomplete { .. }) => reader.refill().unwrap(),
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        packets
    }

    #[test]
    fn test_header_layout() {
        let mut buf = Vec::new();
        PcapGlobalHeader::default().write(&mut buf).unwrap();
        assert_eq!(buf.len(), GLOBAL_HEADER_SIZE);
        assert_eq!(&buf[0..4], &[0xd4, 0xc3, 0xb2, 0xa1]);
        assert_eq!(&buf[4..8], &[2, 0, 4, 0]);
        assert_eq!(&buf[20..24], &[1, 0, 0, 0]);
    }

    #[test]
    fn test_readable_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unknown.pcap");

        let mut writer = UnknownWriter::open(&path).unwrap();
        writer.write(&frame(250, vec![1; 60])).unwrap();
        writer.write(&frame(500, vec![2; 42])).unwrap();
        assert_eq!(writer.written(), 2);
        drop(writer);

        let packets = read_all(&path);
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].1, vec![1; 60]);
        assert_eq!(packets[1].1, vec![2; 42]);
        assert_eq!(packets[0].0, 250);
    }

    #[test]
    fn test_append_keeps_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unknown.pcap");

        let mut writer = UnknownWriter::open(&path).unwrap();
        writer.write(&frame(0, vec![1; 20])).unwrap();
        drop(writer);

        let mut writer = UnknownWriter::open(&path).unwrap();
        writer.write(&frame(1, vec![3; 20])).unwrap();
        drop(writer);

        let len = std::fs::metadata(&path).unwrap().len() as usize;
        assert_eq!(len, GLOBAL_HEADER_SIZE + 2 * (RECORD_HEADER_SIZE + 20));
        assert_eq!(read_all(&path).len(), 2);
    }
}

//! Capture file replay.

use chrono::{DateTime, Utc};
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapBlock, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use pnmap_core::{CaptureInfo, Frame};

use crate::PnmapError;

/// Reader buffer; must hold the largest record
const BUFFER_SIZE: usize = 65536 + 16;

/// Frames of one libpcap file, in file order, with their capture
/// timestamps
pub struct Replay {
    path: PathBuf,
    reader: LegacyPcapReader<BufReader<File>>,
    nanosecond: bool,
    done: bool,
}

impl Replay {
    pub fn open(path: &Path) -> Result<Self, PnmapError> {
        let file = File::open(path)?;
        let reader = LegacyPcapReader::new(BUFFER_SIZE, BufReader::new(file))
            .map_err(|e| capture_file_error(path, e))?;

        Ok(Self {
            path: path.to_owned(),
            reader,
            nanosecond: false,
            done: false,
        })
    }
}

fn capture_file_error<I: std::fmt::Debug>(path: &Path, e: PcapError<I>) -> PnmapError {
    PnmapError::CaptureFile {
        path: path.to_owned(),
        message: format!("{:?}", e),
    }
}

fn to_frame(packet: &LegacyPcapBlock<'_>, nanosecond: bool) -> Frame {
    let subsec_nanos = if nanosecond {
        packet.ts_usec
    } else {
        packet.ts_usec.saturating_mul(1000)
    };
    let timestamp = DateTime::<Utc>::from_timestamp(packet.ts_sec as i64, subsec_nanos)
        .unwrap_or_default();

    let data = packet.data.to_vec();
    Frame {
        info: CaptureInfo {
            timestamp,
            caplen: data.len(),
            len: (packet.origlen as usize).max(data.len()),
        },
        data,
    }
}

impl Iterator for Replay {
    type Item = Result<Frame, PnmapError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.reader.next() {
                Ok((offset, block)) => {
                    let frame = match &block {
                        PcapBlockOwned::LegacyHeader(header) => {
                            self.nanosecond = header.is_nanosecond_precision();
                            if header.network != Linktype::ETHERNET {
                                log::warn!(
                                    "{}: link type {:?}, frames may not decode",
                                    self.path.display(),
                                    header.network
                                );
                            }
                            None
                        }
                        PcapBlockOwned::Legacy(packet) => Some(to_frame(packet, self.nanosecond)),
                        PcapBlockOwned::NG(_) => {
                            log::warn!("{}: pcapng block skipped", self.path.display());
                            None
                        }
                    };
                    drop(block);
                    self.reader.consume(offset);

                    if let Some(frame) = frame {
                        return Some(Ok(frame));
                    }
                }
                Err(PcapError::Eof) => self.done = true,
                Err(PcapError::Incomplete { .. }) => {
                    if let Err(e) = self.reader.refill() {
                        self.done = true;
                        return Some(Err(capture_file_error(&self.path, e)));
                    }
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(capture_file_error(&self.path, e)));
                }
            }
        }
        None
    }
}

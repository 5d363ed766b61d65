//! Session state persistence.
//!
//! The station table is stored as one pretty-printed JSON object keyed by
//! canonical hardware address:
//!
//! ```json
//! {
//!   "aa:bb:cc:dd:ee:ff": {
//!     "MAC": "aa:bb:cc:dd:ee:ff",
//!     "IPs": ["192.168.1.5"],
//!     "Hostnames": ["laptop"],
//!     "UserAgents": [],
//!     "Vendor": [],
//!     "Applications": ["dhcpv4"],
//!     "Seen": 2,
//!     "FirstSeen": "2024-05-04T12:00:00Z",
//!     "LastSeen": "2024-05-04T12:00:05Z"
//!   }
//! }
//! ```
//!
//! Default path: `<data dir>/state-<gateway mac>-<gateway ip>.json`, so each
//! network gets its own inventory.

use log::{debug, info};
use pnmap_core::Station;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::data_dir;
use crate::network;
use crate::PnmapError;

pub type Snapshot = BTreeMap<String, Station>;

/// State file for the network we are attached to
pub fn default_state_path() -> PathBuf {
    state_path_in(&data_dir(), network::default_gateway())
}

pub(crate) fn state_path_in(dir: &Path, gateway: Option<network::Gateway>) -> PathBuf {
    let name = match gateway {
        Some(gw) => format!("state-{}-{}.json", gw.mac, gw.ip),
        None => "state.json".to_string(),
    };
    dir.join(name)
}

/// Read a saved snapshot. A missing file is not an error.
pub fn load(path: &Path) -> Result<Option<Snapshot>, PnmapError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No state file at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(PnmapError::Io(e)),
    };

    let snapshot = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        PnmapError::State {
            path: path.to_owned(),
            source,
        }
    })?;
    Ok(Some(snapshot))
}

/// Write `snapshot` to `path`, creating the directory if needed.
///
/// Written to a sibling file first and renamed, so an interrupted save
/// leaves the previous state intact.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<(), PnmapError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let tmp = path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, snapshot).map_err(|source| {
            PnmapError::State {
                path: tmp.clone(),
                source,
            }
        })?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;

    info!("Saved {} stations to {}", snapshot.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pnmap_core::MacAddr;
    use std::net::Ipv4Addr;

    fn sample() -> Snapshot {
        let mac: MacAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        let mut station = Station::new(mac);
        station.ips.add("192.168.1.5");
        station.hostnames.add("laptop");
        station.sighted(Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap());
        let mut snapshot = Snapshot::new();
        snapshot.insert(mac.to_string(), station);
        snapshot
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        save(&path, &sample()).unwrap();
        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded, sample());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(load(&path), Err(PnmapError::State { .. })));
    }

    #[test]
    fn test_file_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        save(&path, &sample()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let record = &value["aa:bb:cc:dd:ee:ff"];
        assert_eq!(record["Hostnames"], serde_json::json!(["laptop"]));
        assert_eq!(record["Seen"], 1);
        assert_eq!(record["FirstSeen"], "2024-05-04T12:00:00Z");
    }

    #[test]
    fn test_state_path_per_gateway() {
        let dir = Path::new("/var/lib/pnmap");
        let gw = network::Gateway {
            ip: Ipv4Addr::new(192, 168, 1, 1),
            mac: "00:11:22:33:44:55".parse().unwrap(),
        };
        assert_eq!(
            state_path_in(dir, Some(gw)),
            dir.join("state-00:11:22:33:44:55-192.168.1.1.json")
        );
        assert_eq!(state_path_in(dir, None), dir.join("state.json"));
    }
}

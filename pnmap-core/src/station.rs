//! Station records and the table that owns them.
//!
//! A station is everything we have learned about one hardware address
//! during a session. Records are created on first sight, grow as
//! dissectors extract facts, and are never removed.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::unique::UniqueSet;

// =============================================================================
// Hardware address
// =============================================================================

/// 48-bit IEEE hardware address.
///
/// Rendered in canonical lower-case colon-hex, which is also the key used in
/// the state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const ZERO: MacAddr = MacAddr([0; 6]);
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Group bit set: multicast or broadcast destination
    pub fn is_group(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = ParseError;

    /// Accepts colon or dash separated hex in either case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(|c| c == ':' || c == '-');
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| ParseError::InvalidPacket(format!("short hardware address '{}'", s)))?;
            if part.len() != 2 {
                return Err(ParseError::InvalidPacket(format!(
                    "bad hardware address '{}'",
                    s
                )));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| ParseError::InvalidPacket(format!("bad hardware address '{}'", s)))?;
        }
        if parts.next().is_some() {
            return Err(ParseError::InvalidPacket(format!(
                "long hardware address '{}'",
                s
            )));
        }
        Ok(MacAddr(octets))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> Self {
        mac.to_string()
    }
}

// =============================================================================
// Station
// =============================================================================

/// Everything learned about one hardware address.
///
/// Field names follow the state file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "MAC")]
    pub mac: MacAddr,
    #[serde(rename = "IPs", default)]
    pub ips: UniqueSet,
    #[serde(rename = "Hostnames", default)]
    pub hostnames: UniqueSet,
    #[serde(rename = "UserAgents", default)]
    pub user_agents: UniqueSet,
    #[serde(rename = "Vendor", default)]
    pub vendor: UniqueSet,
    #[serde(rename = "Applications", default)]
    pub applications: UniqueSet,
    /// Number of frames attributed to this station
    #[serde(rename = "Seen", default)]
    pub seen: u64,
    #[serde(rename = "FirstSeen", default)]
    pub first_seen: Option<DateTime<Utc>>,
    #[serde(rename = "LastSeen", default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Station {
    pub fn new(mac: MacAddr) -> Self {
        Self {
            mac,
            ips: UniqueSet::new(),
            hostnames: UniqueSet::new(),
            user_agents: UniqueSet::new(),
            vendor: UniqueSet::new(),
            applications: UniqueSet::new(),
            seen: 0,
            first_seen: None,
            last_seen: None,
        }
    }

    /// Record one frame captured at `timestamp`.
    ///
    /// First-seen is only set once. Capture files replayed out of order may
    /// carry an older timestamp; first-seen then moves back so it never
    /// passes last-seen.
    pub fn sighted(&mut self, timestamp: DateTime<Utc>) {
        self.last_seen = Some(timestamp);
        match self.first_seen {
            None => self.first_seen = Some(timestamp),
            Some(first) if first > timestamp => self.first_seen = Some(timestamp),
            Some(_) => {}
        }
        self.seen += 1;
    }

    /// Cap every fact set at `max` entries, keeping the oldest.
    pub fn limit_facts(&mut self, max: usize) {
        for set in [
            &mut self.ips,
            &mut self.hostnames,
            &mut self.user_agents,
            &mut self.vendor,
            &mut self.applications,
        ] {
            set.truncate(max);
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} packets", self.mac, self.seen)?;
        if let Some(first) = self.first_seen {
            write!(f, ", first {}", first.format("%Y-%m-%d %H:%M:%S"))?;
        }
        if let Some(last) = self.last_seen {
            write!(f, ", last {}", last.format("%Y-%m-%d %H:%M:%S"))?;
        }
        write!(f, ")")?;

        for (label, set) in [
            ("IPs", &self.ips),
            ("Hostnames", &self.hostnames),
            ("User agents", &self.user_agents),
            ("Vendor", &self.vendor),
            ("Applications", &self.applications),
        ] {
            if !set.is_empty() {
                write!(f, "\n  {}: {}", label, set)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Station table
// =============================================================================

/// All stations of a session, keyed by hardware address.
///
/// Owned by a single writer. Every [`StationTable::resolve`] marks the
/// station as touched so the owner can publish snapshots afterwards.
#[derive(Debug, Default)]
pub struct StationTable {
    stations: HashMap<MacAddr, Station>,
    touched: Vec<MacAddr>,
}

impl StationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the record for `mac`, creating an empty one on first sight.
    pub fn resolve(&mut self, mac: &MacAddr) -> &mut Station {
        if !self.touched.contains(mac) {
            self.touched.push(*mac);
        }
        self.stations.entry(*mac).or_insert_with(|| {
            log::debug!("New station {}", mac);
            Station::new(*mac)
        })
    }

    pub fn get(&self, mac: &MacAddr) -> Option<&Station> {
        self.stations.get(mac)
    }

    /// Mutable access that does not count as a touch
    pub fn get_mut(&mut self, mac: &MacAddr) -> Option<&mut Station> {
        self.stations.get_mut(mac)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    /// Stations resolved since the last call, in first-touch order
    pub fn take_touched(&mut self) -> Vec<MacAddr> {
        std::mem::take(&mut self.touched)
    }

    /// Snapshot keyed by canonical address, in address order
    pub fn snapshot(&self) -> BTreeMap<String, Station> {
        self.stations
            .values()
            .map(|s| (s.mac.to_string(), s.clone()))
            .collect()
    }

    /// Load records from a snapshot, replacing any with the same address.
    ///
    /// The record's own address wins over the map key.
    pub fn restore(&mut self, snapshot: BTreeMap<String, Station>) {
        for (_, station) in snapshot {
            self.stations.insert(station.mac, station);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_mac_canonical_form() {
        let mac: MacAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
        let dashed: MacAddr = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        assert_eq!(mac, dashed);
    }

    #[test]
    fn test_mac_parse_errors() {
        assert!("aa:bb:cc:dd:ee".parse::<MacAddr>().is_err());
        assert!("aa:bb:cc:dd:ee:ff:00".parse::<MacAddr>().is_err());
        assert!("aa:bb:cc:dd:ee:gg".parse::<MacAddr>().is_err());
        assert!("a:bb:cc:dd:ee:ff".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_mac_group_bit() {
        assert!(MacAddr::BROADCAST.is_group());
        assert!(MacAddr([0x01, 0x00, 0x5e, 0, 0, 0xfb]).is_group());
        assert!(!MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]).is_group());
    }

    #[test]
    fn test_resolve_is_stable() {
        let mut table = StationTable::new();
        let mac: MacAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        table.resolve(&mac).ips.add("10.0.0.1");
        table.resolve(&mac).seen = 7;

        let upper: MacAddr = "AA:BB:CC:DD:EE:FF".parse().unwrap();
        let station = table.resolve(&upper);
        assert_eq!(station.seen, 7);
        assert!(station.ips.contains("10.0.0.1"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_touched_is_deduplicated() {
        let mut table = StationTable::new();
        let a = MacAddr([0, 1, 2, 3, 4, 5]);
        let b = MacAddr([0, 1, 2, 3, 4, 6]);
        table.resolve(&a);
        table.resolve(&b);
        table.resolve(&a);
        assert_eq!(table.take_touched(), vec![a, b]);
        assert!(table.take_touched().is_empty());
    }

    #[test]
    fn test_sighted_timestamps() {
        let mut station = Station::new(MacAddr::ZERO);
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 5).unwrap();
        station.sighted(t1);
        station.sighted(t2);
        assert_eq!(station.first_seen, Some(t1));
        assert_eq!(station.last_seen, Some(t2));
        assert_eq!(station.seen, 2);

        // Out-of-order capture keeps first <= last
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();
        station.sighted(t0);
        assert!(station.first_seen <= station.last_seen);
    }

    #[test]
    fn test_station_json_layout() {
        let mut station = Station::new("aa:bb:cc:dd:ee:ff".parse().unwrap());
        station.ips.add("192.168.1.5");
        station.seen = 3;
        let json = serde_json::to_value(&station).unwrap();
        assert_eq!(json["MAC"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(json["IPs"][0], "192.168.1.5");
        assert_eq!(json["Seen"], 3);
        assert!(json["FirstSeen"].is_null());

        let back: Station = serde_json::from_value(json).unwrap();
        assert_eq!(back, station);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut table = StationTable::new();
        let mac = MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        table.resolve(&mac).hostnames.add("laptop");
        let snapshot = table.snapshot();
        assert!(snapshot.contains_key("aa:bb:cc:dd:ee:ff"));

        let mut restored = StationTable::new();
        restored.restore(snapshot);
        assert!(restored.get(&mac).unwrap().hostnames.contains("laptop"));
    }

    #[test]
    fn test_limit_facts() {
        let mut station = Station::new(MacAddr::ZERO);
        for i in 0..5 {
            station.ips.add(format!("10.0.0.{}", i));
            station.applications.add(format!("app{}", i));
        }
        station.limit_facts(2);
        assert_eq!(station.ips.len(), 2);
        assert_eq!(station.applications.len(), 2);
        assert!(station.ips.contains("10.0.0.0"));
    }

    #[test]
    fn test_display() {
        let mut station = Station::new("00:11:22:33:44:55".parse().unwrap());
        station.hostnames.add("printer");
        let text = station.to_string();
        assert!(text.starts_with("00:11:22:33:44:55 (0 packets)"));
        assert!(text.contains("Hostnames: printer"));
        assert!(!text.contains("IPs"));
    }
}

//! Fingerprint engine.
//!
//! Owns the station table and is the only thing that writes to it. Frames
//! are observed one at a time from a single consumer; there is no internal
//! locking, so share snapshots, not the engine.
//!
//! ```rust
//! use chrono::Utc;
//! use pnmap_core::{EngineConfig, FingerprintEngine, Frame};
//!
//! let mut engine = FingerprintEngine::new(EngineConfig::default());
//! let frame = Frame::new(Utc::now(), vec![0u8; 10]); // too short for Ethernet
//! assert!(!engine.observe(&frame));
//! assert!(engine.stations().is_empty());
//! ```

use std::collections::BTreeMap;

use crate::frame::{decode, Frame};
use crate::mux::LayerMux;
use crate::station::{MacAddr, Station, StationTable};

/// Receives a snapshot of every station touched by an observed frame.
///
/// Called synchronously from [`FingerprintEngine::publish`]; implementations
/// must not block.
pub trait StationListener: Send {
    fn station_touched(&mut self, station: &Station);
}

/// Engine tunables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Cap on the number of entries in each fact set of a station.
    /// `None` keeps every fact.
    pub fact_limit: Option<usize>,
}

/// Frame counters for the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub frames: u64,
    pub attributed: u64,
    pub recognized: u64,
}

pub struct FingerprintEngine {
    config: EngineConfig,
    table: StationTable,
    mux: LayerMux,
    listener: Option<Box<dyn StationListener>>,
    stats: EngineStats,
}

impl FingerprintEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            table: StationTable::new(),
            mux: LayerMux::new(),
            listener: None,
            stats: EngineStats::default(),
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn StationListener>) {
        self.listener = Some(listener);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn stations(&self) -> &StationTable {
        &self.table
    }

    /// Look up or create the station for `mac`
    pub fn resolve(&mut self, mac: &MacAddr) -> &mut Station {
        self.table.resolve(mac)
    }

    /// Record one frame and dissect it.
    ///
    /// Returns true if any dissector recognized application content. Frames
    /// without an Ethernet header change nothing.
    pub fn observe(&mut self, frame: &Frame) -> bool {
        self.stats.frames += 1;

        let decoded = decode(&frame.data);
        let Some(source) = decoded.source else {
            return false;
        };
        self.stats.attributed += 1;

        self.table.resolve(&source).sighted(frame.info.timestamp);

        let recognized = self.mux.process(&mut self.table, &decoded);
        if recognized {
            self.stats.recognized += 1;
        }

        self.publish();
        recognized
    }

    /// Apply the fact cap to stations touched since the last call and hand
    /// their snapshots to the listener.
    pub fn publish(&mut self) {
        for mac in self.table.take_touched() {
            let Some(station) = self.table.get_mut(&mac) else {
                continue;
            };
            if let Some(limit) = self.config.fact_limit {
                station.limit_facts(limit);
            }
            if let Some(listener) = self.listener.as_mut() {
                listener.station_touched(station);
            }
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, Station> {
        self.table.snapshot()
    }

    /// Resume from a saved snapshot
    pub fn restore(&mut self, snapshot: BTreeMap<String, Station>) {
        self.table.restore(snapshot);
    }
}

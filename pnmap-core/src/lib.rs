//! # pnmap Core
//!
//! Platform-independent frame dissection and station fingerprinting for
//! passive network mapping.
//!
//! This crate turns raw Ethernet frames into per-station facts (addresses,
//! host names, user agents, vendor strings, applications) with **zero I/O
//! dependencies**. Capturing frames, replaying files and persisting state
//! live in the `pnmap` binary crate.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  pnmap-core (no tokio, no capture backends)                │
//! │  ├── frame      (Ethernet/VLAN/ARP/IP/UDP layer decoding)  │
//! │  ├── protocol/  (DHCP, DNS, SSDP, Steam, MNDP, Ubiquiti)   │
//! │  ├── dissect/   (facts from layers)                        │
//! │  ├── mux        (layer kind -> dissector)                  │
//! │  └── engine     (station table owner, listener fan-out)    │
//! └─────────────────────────────────────────────────────────────┘
//!                 ▲
//!    ┌────────────┴────────────┐
//!    │  pnmap                  │
//!    │  (live capture, pcap    │
//!    │   replay, state file)   │
//!    └─────────────────────────┘
//! ```
//!
//! ## Recognized traffic
//!
//! | Layer / port       | Facts                                  |
//! |--------------------|----------------------------------------|
//! | ARP, IPv4, IPv6    | IP addresses                           |
//! | ICMPv6 NA          | IPv6 target address                    |
//! | DHCPv4 request     | host name, vendor class                |
//! | mDNS 5353          | host names, services, device model     |
//! | SSDP 1900          | user agent                             |
//! | Steam 27036        | host name, addresses                   |
//! | MNDP 5678          | identity, platform, board              |
//! | Ubiquiti 10001     | name, model, address                   |
//! | misc UDP ports     | application by port                    |
//!
//! ## Example: Fingerprinting a frame
//!
//! ```rust
//! use chrono::Utc;
//! use pnmap_core::{EngineConfig, FingerprintEngine, Frame, MacAddr};
//!
//! // ARP request from aa:bb:cc:dd:ee:ff for 192.168.1.1, sender 192.168.1.5
//! let mut data = vec![0xff; 6];
//! data.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x08, 0x06]);
//! data.extend_from_slice(&[0, 1, 8, 0, 6, 4, 0, 1]);
//! data.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 192, 168, 1, 5]);
//! data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 192, 168, 1, 1]);
//!
//! let mut engine = FingerprintEngine::new(EngineConfig::default());
//! assert!(engine.observe(&Frame::new(Utc::now(), data)));
//!
//! let mac: MacAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
//! let station = engine.stations().get(&mac).unwrap();
//! assert!(station.ips.contains("192.168.1.5"));
//! ```

pub mod dissect;
pub mod engine;
pub mod error;
pub mod frame;
pub mod mux;
pub mod protocol;
pub mod station;
pub mod unique;

// Re-export commonly used types
pub use engine::{EngineConfig, EngineStats, FingerprintEngine, StationListener};
pub use error::ParseError;
pub use frame::{decode, is_group_traffic, CaptureInfo, DecodedFrame, Frame, Layer, LayerKind};
pub use mux::LayerMux;
pub use station::{MacAddr, Station, StationTable};
pub use unique::UniqueSet;

//! Multicast DNS answer mining
//!
//! Responders announce their host name (A records), the services they offer
//! (PTR/SRV) and device information (TXT under `_device-info`).

use crate::error::ParseError;
use crate::protocol::dns::{self, RecordData};
use crate::station::Station;

/// Application name for a DNS-SD service label.
///
/// Unknown labels are returned unchanged. An empty result means the label
/// is not an application (service enumeration).
pub fn service_name(label: &str) -> &str {
    match label {
        "_sftp-ssh" => "SSH",
        "_smb" => "Samba",
        "_ipp" => "IPP",
        "_ipps" => "IPPS",
        "_pdl-datastream" => "PDL-socket",
        "_afpovertcp" => "AFP",
        "_raop" => "AirPlay-RAOP",
        "_airplay" => "AirPlay-display",
        "_companion-link" => "AirPlay-client",
        "_services" => "",
        "_nvstream_dbd" => "NVidia-Gamestream",
        "_homekit" => "homekit?",
        "_ePCL" => "ePCL?",
        "_universal" => "universal?",
        "_print" => "print?",
        "_wfds-print" => "wfds-print?",
        "_printer" => "LPR-printer",
        "_http" => "HTTP-server",
        "_scanner" => "Scanner",
        "_http-alt" => "HTTP-server-alt",
        "_uscan" => "uscan?",
        "_privet" => "Privet",
        "_uscans" => "uscans?",
        "_soundtouch" => "SoundTouch",
        "_googlecast" => "Chromecast",
        "_spotify-connect" => "Spotify-Connect",
        "_teamviewer" => "TeamViewer",
        "_rfb" => "VNC",
        "_adisk" => "TimeCapsule",
        "_telnet" => "Telnet",
        "_sonos" => "Sonos",
        other => other,
    }
}

/// Unpack an mDNS message and record what its answers reveal.
///
/// Queries are recognized without adding facts. Fails only if the message
/// does not unpack.
pub fn dissect(station: &mut Station, payload: &[u8]) -> Result<(), ParseError> {
    let msg = dns::unpack(payload)?;
    if !msg.response {
        return Ok(());
    }

    for answer in &msg.answers {
        let labels = dns::split_labels(&answer.name);

        match &answer.data {
            RecordData::A(_) => {
                station.hostnames.add(dns::strip_local(&answer.name));
            }
            RecordData::Ptr(_) => {
                if answer.name.ends_with(".arpa.") {
                    continue;
                }
                station.applications.add(service_name(&labels[0]));
            }
            RecordData::Srv { .. } => {
                if labels.len() < 2 {
                    continue;
                }
                station.applications.add(service_name(&labels[1]));
                if !labels[0].starts_with('_') {
                    station.hostnames.add(labels[0].as_str());
                }
            }
            RecordData::Txt(strings) => {
                station.hostnames.add(labels[0].as_str());
                if labels.get(1).map(String::as_str) == Some("_device-info") {
                    if let Some(first) = strings.first() {
                        station.vendor.add(first.as_str());
                    }
                }
            }
            _ => {}
        }
    }

    Ok(())
}

//! Live capture with the `pnet` datalink layer.
//!
//! Receiving is blocking, so each interface gets its own blocking thread.
//! A receive timeout lets the thread notice shutdown.

use chrono::Utc;
use pnet::datalink::{self, Channel, DataLinkReceiver, NetworkInterface};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_graceful_shutdown::SubsystemHandle;
use tokio_util::sync::CancellationToken;

use pnmap_core::{is_group_traffic, Frame};

use crate::PnmapError;

/// One line per interface: name, hardware address, addresses
pub fn list_interfaces() -> Vec<String> {
    datalink::interfaces().iter().map(describe).collect()
}

fn describe(interface: &NetworkInterface) -> String {
    let mac = interface
        .mac
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string());
    let ips: Vec<String> = interface.ips.iter().map(|ip| ip.to_string()).collect();
    let state = if interface.is_up() { "up" } else { "down" };
    format!("{:<16} {:<17} {:<4} {}", interface.name, mac, state, ips.join(", "))
}

fn capturable(interface: &NetworkInterface) -> bool {
    interface.is_up() && !interface.is_loopback() && interface.mac.is_some()
}

/// Interfaces to capture on: the named ones, or every capturable one.
pub fn select_interfaces(names: &[String]) -> Result<Vec<NetworkInterface>, PnmapError> {
    pick(datalink::interfaces(), names)
}

fn pick(all: Vec<NetworkInterface>, names: &[String]) -> Result<Vec<NetworkInterface>, PnmapError> {
    if names.is_empty() {
        let selected: Vec<_> = all.into_iter().filter(capturable).collect();
        if selected.is_empty() {
            return Err(PnmapError::NoInterfaces);
        }
        return Ok(selected);
    }

    names
        .iter()
        .map(|name| {
            all.iter()
                .find(|i| &i.name == name)
                .cloned()
                .ok_or_else(|| PnmapError::InterfaceNotFound(name.clone()))
        })
        .collect()
}

/// Capture subsystem for one interface. Group traffic is forwarded to `tx`
/// until shutdown or until the engine goes away.
pub async fn run(
    subsys: SubsystemHandle,
    interface: NetworkInterface,
    tx: mpsc::Sender<Frame>,
    read_timeout: Duration,
) -> Result<(), PnmapError> {
    let config = datalink::Config {
        read_timeout: Some(read_timeout),
        promiscuous: true,
        ..Default::default()
    };

    let rx = match datalink::channel(&interface, config) {
        Ok(Channel::Ethernet(_, rx)) => rx,
        Ok(_) => return Err(PnmapError::UnsupportedChannel(interface.name)),
        Err(source) => {
            return Err(PnmapError::Capture {
                interface: interface.name,
                source,
            })
        }
    };
    log::info!("Capturing on {}", interface.name);

    let token = subsys.create_cancellation_token();
    let name = interface.name.clone();
    let frames = tokio::task::spawn_blocking(move || receive(rx, &tx, &token)).await??;

    log::info!("{}: capture stopped after {} frames", name, frames);
    Ok(())
}

fn receive(
    mut rx: Box<dyn DataLinkReceiver>,
    tx: &mpsc::Sender<Frame>,
    token: &CancellationToken,
) -> Result<u64, PnmapError> {
    let mut forwarded = 0;
    while !token.is_cancelled() {
        let data = match rx.next() {
            Ok(data) => data,
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                continue
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PnmapError::Io(e)),
        };

        if !is_group_traffic(data) {
            continue;
        }
        if tx.blocking_send(Frame::new(Utc::now(), data.to_vec())).is_err() {
            log::debug!("Engine gone, stopping capture");
            break;
        }
        forwarded += 1;
    }
    Ok(forwarded)
}

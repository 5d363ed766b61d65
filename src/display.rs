//! Station updates on stdout.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_graceful_shutdown::SubsystemHandle;

use pnmap_core::{Station, StationListener};

use crate::PnmapError;

/// Forwards touched stations to the display subsystem without ever
/// blocking the engine. Updates that find the queue full are dropped; the
/// next touch of the same station carries the newer state anyway.
pub struct DisplayListener {
    tx: mpsc::Sender<Station>,
    dropped: u64,
}

impl DisplayListener {
    pub fn new(tx: mpsc::Sender<Station>) -> Self {
        Self { tx, dropped: 0 }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl StationListener for DisplayListener {
    fn station_touched(&mut self, station: &Station) {
        match self.tx.try_send(station.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                log::trace!("Display busy, dropped update for {}", station.mac);
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

/// Prints every update directly, for replays
pub struct StationPrinter;

impl StationListener for StationPrinter {
    fn station_touched(&mut self, station: &Station) {
        println!("{}", station);
    }
}

pub async fn run(subsys: SubsystemHandle, mut rx: mpsc::Receiver<Station>) -> Result<(), PnmapError> {
    loop {
        tokio::select! { biased;
            _ = subsys.on_shutdown_requested() => {
                return Ok(());
            },
            r = rx.recv() => {
                match r {
                    Some(station) => {
                        if station.seen == 1 {
                            log::info!("New station {}", station.mac);
                        }
                        println!("{}", station);
                    }
                    None => return Ok(()),
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnmap_core::MacAddr;

    fn station(last: u8) -> Station {
        Station::new(MacAddr([0, 1, 2, 3, 4, last]))
    }

    #[tokio::test]
    async fn test_forwards_snapshot() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut listener = DisplayListener::new(tx);

        let mut s = station(1);
        s.hostnames.add("printer");
        listener.station_touched(&s);
        // Later changes do not leak into the sent snapshot
        s.hostnames.add("other");

        let received = rx.recv().await.unwrap();
        assert_eq!(received.hostnames.len(), 1);
    }

    #[test]
    fn test_full_queue_drops() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut listener = DisplayListener::new(tx);

        listener.station_touched(&station(1));
        listener.station_touched(&station(2));
        listener.station_touched(&station(3));
        assert_eq!(listener.dropped(), 2);

        let first = tokio_test::block_on(rx.recv()).unwrap();
        assert_eq!(first.mac, MacAddr([0, 1, 2, 3, 4, 1]));
    }

    #[test]
    fn test_closed_queue_ignored() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut listener = DisplayListener::new(tx);
        listener.station_touched(&station(1));
        assert_eq!(listener.dropped(), 0);
    }
}

//! The engine subsystem: the single consumer of captured frames.

use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_graceful_shutdown::SubsystemHandle;

use pnmap_core::{FingerprintEngine, Frame, StationListener};

use crate::config::Config;
use crate::storage;
use crate::unknown::UnknownWriter;
use crate::PnmapError;

pub struct Session {
    engine: FingerprintEngine,
    state_path: Option<PathBuf>,
    unknown: Option<UnknownWriter>,
    config: Config,
}

impl Session {
    pub fn new(
        engine: FingerprintEngine,
        state_path: Option<PathBuf>,
        unknown: Option<UnknownWriter>,
        config: Config,
    ) -> Self {
        Self {
            engine,
            state_path,
            unknown,
            config,
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn StationListener>) {
        self.engine.set_listener(listener);
    }

    pub fn engine(&self) -> &FingerprintEngine {
        &self.engine
    }

    pub fn state_path(&self) -> Option<&Path> {
        self.state_path.as_deref()
    }

    /// Observe one frame; unrecognized frames go to the side capture.
    pub fn handle(&mut self, frame: &Frame) -> bool {
        let recognized = self.engine.observe(frame);
        if !recognized {
            if let Some(unknown) = self.unknown.as_mut() {
                if let Err(e) = unknown.write(frame) {
                    log::warn!(
                        "Cannot write to {}, disabling: {}",
                        unknown.path().display(),
                        e
                    );
                    self.unknown = None;
                }
            }
        }
        recognized
    }

    /// Write the state file, if there is one, and flush the side capture
    pub fn save(&mut self) -> Result<(), PnmapError> {
        if let Some(unknown) = self.unknown.as_mut() {
            unknown.flush()?;
        }
        match &self.state_path {
            Some(path) => storage::save(path, &self.engine.snapshot()),
            None => Ok(()),
        }
    }

    /// Observe every frame still queued; captures can no longer send.
    async fn drain(&mut self, rx: &mut mpsc::Receiver<Frame>) {
        rx.close();
        let mut drained = 0;
        while let Some(frame) = rx.recv().await {
            self.handle(&frame);
            drained += 1;
        }
        if drained > 0 {
            log::debug!("Engine: drained {} queued frames", drained);
        }
    }

    pub async fn run(
        mut self,
        subsys: SubsystemHandle,
        mut rx: mpsc::Receiver<Frame>,
    ) -> Result<(), PnmapError> {
        let mut save_timer = interval(self.config.save_interval);
        save_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        save_timer.tick().await;

        loop {
            tokio::select! { biased;
                _ = subsys.on_shutdown_requested() => {
                    log::info!("Engine: Shutdown requested");
                    self.drain(&mut rx).await;
                    break;
                }
                frame = rx.recv() => {
                    match frame {
                        Some(frame) => {
                            self.handle(&frame);
                        }
                        None => {
                            log::warn!("Engine: all captures stopped");
                            break;
                        }
                    }
                }
                _ = save_timer.tick() => {
                    if let Err(e) = self.save() {
                        log::warn!("Engine: failed to save state: {}", e);
                    }
                }
            }
        }

        let stats = self.engine.stats();
        log::info!(
            "Engine: {} frames, {} recognized, {} stations",
            stats.frames,
            stats.recognized,
            self.engine.stations().len()
        );
        self.save()
    }
}

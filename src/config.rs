//! Runtime tunables and well-known locations.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

pub fn get_project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "pnmap", "pnmap")
}

/// Directory for state files. Falls back to the working directory when the
/// platform has no notion of a home directory.
pub fn data_dir() -> PathBuf {
    match get_project_dirs() {
        Some(dirs) => dirs.data_dir().to_owned(),
        None => {
            log::warn!("No data directory available, using current directory");
            PathBuf::from(".")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Frames buffered between the capture tasks and the engine
    pub frame_queue: usize,
    /// Station updates buffered for the display; more are dropped
    pub display_queue: usize,
    /// How often the state file is rewritten while monitoring
    pub save_interval: Duration,
    /// Capture receive timeout, bounds how long shutdown waits for a
    /// blocked interface
    pub read_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_queue: 1024,
            display_queue: 256,
            save_interval: Duration::from_secs(10),
            read_timeout: Duration::from_millis(500),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

//! # pnmap
//!
//! Passive network mapper. Listens to broadcast and discovery traffic on
//! the local segment and keeps a per-station inventory of what it learns.
//!
//! The fingerprinting itself lives in [`pnmap_core`]; this crate supplies
//! the collaborators around it:
//!
//! ```text
//! ┌──────────────┐   frames    ┌──────────────┐  stations  ┌───────────┐
//! │ capture (n)  │ ──────────▶ │   Engine     │ ─────────▶ │  Display  │
//! │ pnet         │   mpsc      │ (Session)    │  try_send  │  stdout   │
//! └──────────────┘             └──────┬───────┘            └───────────┘
//!                                     │
//!                     ┌───────────────┴───────────────┐
//!                     ▼                               ▼
//!              state JSON (storage)        unknown frames (pcap)
//! ```
//!
//! ## Commands
//!
//! | Command    | Description                                          |
//! |------------|------------------------------------------------------|
//! | `list`     | Show capture-capable interfaces                      |
//! | `monitor`  | Capture live on one or more interfaces               |
//! | `simulate` | Replay capture files through the same pipeline      |
//!
//! ## Example
//!
//! ```rust,no_run
//! use clap::Parser;
//! use pnmap::Cli;
//!
//! #[tokio::main]
//! async fn main() -> miette::Result<()> {
//!     let args = Cli::parse_from(["pnmap", "monitor", "-i", "eth0"]);
//!     pnmap::run(args).await
//! }
//! ```

use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

use pnmap_core::{EngineConfig, FingerprintEngine};

pub mod capture;
pub mod config;
pub mod display;
pub mod network;
pub mod replay;
pub mod session;
pub mod storage;
pub mod unknown;

use config::Config;
use session::Session;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Clone, Debug)]
#[command(version, about)]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// List network interfaces that can be monitored
    List,
    /// Capture live traffic
    Monitor(MonitorArgs),
    /// Replay capture files
    Simulate(SimulateArgs),
}

/// Options shared by `monitor` and `simulate`
#[derive(Args, Clone, Debug, Default)]
pub struct SessionArgs {
    /// Append frames no dissector recognized to this pcap file
    #[arg(short, long)]
    pub unknown: Option<PathBuf>,

    /// State file. `monitor` defaults to one per gateway in the data
    /// directory; `simulate` keeps no state unless given one
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Keep at most this many entries in each fact set of a station
    #[arg(long)]
    pub fact_limit: Option<usize>,
}

#[derive(Args, Clone, Debug)]
pub struct MonitorArgs {
    /// Interface to capture on; may be repeated. Default: all that are up
    #[arg(short, long = "interface")]
    pub interfaces: Vec<String>,

    #[clap(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Clone, Debug)]
pub struct SimulateArgs {
    /// Capture files in libpcap format
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Skip live display; print the station table at the end
    #[arg(short, long, default_value_t = false)]
    pub dissect_only: bool,

    #[clap(flatten)]
    pub session: SessionArgs,
}

#[derive(Error, Debug)]
pub enum PnmapError {
    #[error("I/O operation failed")]
    Io(#[from] std::io::Error),
    #[error("Interface '{0}' is not available")]
    InterfaceNotFound(String),
    #[error("No interface to capture on")]
    NoInterfaces,
    #[error("Cannot capture on '{interface}': {source}")]
    Capture {
        interface: String,
        source: std::io::Error,
    },
    #[error("Interface '{0}' does not provide an Ethernet channel")]
    UnsupportedChannel(String),
    #[error("Cannot read capture file '{path}': {message}")]
    CaptureFile { path: PathBuf, message: String },
    #[error("Cannot use state file '{path}': {source}")]
    State {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Task failed")]
    Task(#[from] tokio::task::JoinError),
}

/// Run the command selected on the command line
pub async fn run(args: Cli) -> Result<()> {
    match args.command {
        Command::List => {
            for line in capture::list_interfaces() {
                println!("{}", line);
            }
            Ok(())
        }
        Command::Monitor(monitor) => run_monitor(monitor).await,
        Command::Simulate(simulate) => run_simulate(simulate).into_diagnostic(),
    }
}

/// Build the engine session. `state_path` is loaded now if it exists and
/// written on every save.
fn new_session(
    args: &SessionArgs,
    state_path: Option<PathBuf>,
    config: &Config,
) -> std::result::Result<Session, PnmapError> {
    let mut engine = FingerprintEngine::new(EngineConfig {
        fact_limit: args.fact_limit,
    });

    if let Some(path) = &state_path {
        if let Some(snapshot) = storage::load(path)? {
            log::info!("Resuming {} stations from {}", snapshot.len(), path.display());
            engine.restore(snapshot);
        }
    }

    let unknown = match &args.unknown {
        Some(path) => Some(unknown::UnknownWriter::open(path)?),
        None => None,
    };

    Ok(Session::new(engine, state_path, unknown, config.clone()))
}

async fn run_monitor(args: MonitorArgs) -> Result<()> {
    let config = Config::default();
    let interfaces = capture::select_interfaces(&args.interfaces).into_diagnostic()?;
    let state_path = args
        .session
        .state
        .clone()
        .unwrap_or_else(storage::default_state_path);
    let mut session = new_session(&args.session, Some(state_path), &config).into_diagnostic()?;

    let (frame_tx, frame_rx) = mpsc::channel(config.frame_queue);
    let (station_tx, station_rx) = mpsc::channel(config.display_queue);
    session.set_listener(Box::new(display::DisplayListener::new(station_tx)));
    let shutdown_timeout = config.shutdown_timeout;

    Toplevel::new(move |s| async move {
        for interface in interfaces {
            let tx = frame_tx.clone();
            let read_timeout = config.read_timeout;
            let name = format!("Capture-{}", interface.name);
            s.start(SubsystemBuilder::new(name, move |subsys| {
                capture::run(subsys, interface, tx, read_timeout)
            }));
        }
        drop(frame_tx);

        s.start(SubsystemBuilder::new("Engine", move |subsys| {
            session.run(subsys, frame_rx)
        }));
        s.start(SubsystemBuilder::new("Display", move |subsys| {
            display::run(subsys, station_rx)
        }));
    })
    .catch_signals()
    .handle_shutdown_requests(shutdown_timeout)
    .await
    .into_diagnostic()
}

fn run_simulate(args: SimulateArgs) -> std::result::Result<(), PnmapError> {
    let config = Config::default();
    // Replays only touch a state file when asked to
    let mut session = new_session(&args.session, args.session.state.clone(), &config)?;
    if !args.dissect_only {
        session.set_listener(Box::new(display::StationPrinter));
    }

    for path in &args.files {
        let replay = replay::Replay::open(path)?;
        let mut frames = 0u64;
        for frame in replay {
            let frame = frame?;
            if !pnmap_core::is_group_traffic(&frame.data) {
                continue;
            }
            session.handle(&frame);
            frames += 1;
        }
        log::info!("{}: replayed {} frames", path.display(), frames);
    }

    session.save()?;

    if args.dissect_only {
        for station in session.engine().snapshot().values() {
            println!("{}", station);
        }
    }
    let stats = session.engine().stats();
    log::info!(
        "{} frames, {} recognized, {} stations",
        stats.frames,
        stats.recognized,
        session.engine().stations().len()
    );
    Ok(())
}

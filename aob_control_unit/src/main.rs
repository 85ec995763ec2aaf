//! # AOB Control Unit
//!
//! Boots the motion controller and runs its control loop.
//!
//! Hardware mode opens the RS-485 TTY adapters named in the configuration
//! and persists calibration under the configured store directory.
//! `--simulate` swaps in the in-process drive bank and an in-memory store.
//!
//! Commands are read line by line from standard input; responses go to
//! standard output.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use aob_common::consts::DEFAULT_CONFIG_PATH;
use aob_common::prelude::*;
use aob_control_unit::config::{ControlUnitConfig, load_config};
use aob_control_unit::cycle::ControlUnit;
use aob_control_unit::driver::bus::FieldBus;
use aob_control_unit::driver::commands::DriverLink;
use aob_control_unit::driver::tty::TtyPort;
use aob_control_unit::io::peripherals::SimPeripherals;
use aob_control_unit::io::session::{ChannelSource, ConsoleSink};
use aob_control_unit::sim::drives::SimulatedDrives;
use aob_control_unit::store::nv::{AxisStore, ImageStore};
use aob_control_unit::store::storage::{DirStorage, MemoryStorage};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// AOB Control Unit: RS-485 stepper axis controller
#[derive(Parser, Debug)]
#[command(name = "aob_control_unit")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Motion controller for 22 RS-485 stepper axes")]
struct Args {
    /// Path to the control unit configuration TOML.
    /// Defaults apply when the default path does not exist.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run against simulated drives with an in-memory store.
    #[arg(long)]
    simulate: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    let config = resolve_config(&args);
    let level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);

    info!("AOB Control Unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, &config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("AOB Control Unit shutdown complete");
}

/// Explicit path must load; the default path is optional.
fn resolve_config(args: &Args) -> Result<ControlUnitConfig, ConfigError> {
    match &args.config {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(Path::new(DEFAULT_CONFIG_PATH)),
        None => Ok(ControlUnitConfig::default()),
    }
}

fn run(args: &Args, config: &ControlUnitConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Config OK: service={}, baud={}, settle={}ms, limit axes={:?}",
        config.shared.service_name, config.bus.baud, config.bus.settle_ms, config.limits.axes,
    );

    let clock: Rc<dyn Clock> = Rc::new(SystemClock::new());
    let (primary, secondary, store) = if args.simulate {
        info!("Simulation mode: in-process drives, in-memory store");
        let drives = SimulatedDrives::new();
        let secondary: Option<Box<dyn SerialPort>> = config
            .bus
            .secondary_device
            .as_ref()
            .map(|_| Box::new(drives.echo_port()) as Box<dyn SerialPort>);
        let store: Box<dyn AxisStore> =
            Box::new(ImageStore::new(MemoryStorage::new(), config.store.file_name.clone()));
        (Box::new(drives.primary_port()) as Box<dyn SerialPort>, secondary, store)
    } else {
        let primary = TtyPort::open(&config.bus.primary_device, config.bus.baud)?;
        let secondary = match &config.bus.secondary_device {
            Some(device) => Some(Box::new(TtyPort::open(device, config.bus.baud)?) as Box<dyn SerialPort>),
            None => None,
        };
        if !config.store.dir.is_dir() {
            warn!(
                "Store directory {:?} not present; calibration will not persist",
                config.store.dir
            );
        }
        let store: Box<dyn AxisStore> = Box::new(ImageStore::new(
            DirStorage::new(&config.store.dir),
            config.store.file_name.clone(),
        ));
        (Box::new(primary) as Box<dyn SerialPort>, secondary, store)
    };

    let bus = FieldBus::new(primary, secondary, clock, &config.bus);
    let mut unit = ControlUnit::new(
        config,
        DriverLink::new(bus),
        store,
        Box::new(SimPeripherals::new()),
    );

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("console-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    unit.attach_source(Box::new(ChannelSource::new("console", rx)));
    unit.attach_sink(Box::new(ConsoleSink));

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    unit.boot();
    unit.run(&running);
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

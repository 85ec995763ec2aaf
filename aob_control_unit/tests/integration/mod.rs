//! Shared bench and scenario modules.

mod motion;
mod persistence;
mod polling;
mod session;

use std::rc::Rc;
use std::time::Duration;

use aob_common::bus::frame::{DecodedRequest, decode_request};
use aob_common::bus::registers::{FC_READ_HOLDING, FC_WRITE_SINGLE};
use aob_common::bus::transport::ManualClock;
use aob_control_unit::config::ControlUnitConfig;
use aob_control_unit::cycle::ControlUnit;
use aob_control_unit::driver::bus::FieldBus;
use aob_control_unit::driver::commands::DriverLink;
use aob_control_unit::io::peripherals::SimPeripherals;
use aob_control_unit::io::session::MemorySink;
use aob_control_unit::sim::drives::SimulatedDrives;
use aob_control_unit::state::axis::AxisId;
use aob_control_unit::store::image::Image;
use aob_control_unit::store::nv::ImageStore;
use aob_control_unit::store::storage::MemoryStorage;

pub const IMAGE: &str = "aob_nv.bin";

/// A booted control unit with two mirrored sinks.
pub struct Bench {
    pub drives: SimulatedDrives,
    pub clock: Rc<ManualClock>,
    pub storage: MemoryStorage,
    console: MemorySink,
    remote: MemorySink,
    pub unit: ControlUnit,
}

impl Bench {
    pub fn new() -> Self {
        Self::with(ControlUnitConfig::default(), MemoryStorage::new())
    }

    /// Boot on `storage`; boot traffic is discarded.
    pub fn with(config: ControlUnitConfig, storage: MemoryStorage) -> Self {
        let drives = SimulatedDrives::new();
        let clock = Rc::new(ManualClock::new());
        let bus = FieldBus::new(
            Box::new(drives.primary_port()),
            Some(Box::new(drives.echo_port())),
            clock.clone(),
            &config.bus,
        );
        let mut unit = ControlUnit::new(
            &config,
            DriverLink::new(bus),
            Box::new(ImageStore::new(storage.clone(), IMAGE)),
            Box::new(SimPeripherals::new()),
        );
        let console = MemorySink::new();
        let remote = MemorySink::new();
        unit.attach_sink(Box::new(console.clone()));
        unit.attach_sink(Box::new(remote.clone()));
        unit.boot();
        drives.clear_frames();

        Self {
            drives,
            clock,
            storage,
            console,
            remote,
            unit,
        }
    }

    /// Lines broadcast since the last call; both sinks must agree.
    pub fn output(&self) -> Vec<String> {
        let console = self.console.take();
        let remote = self.remote.take();
        assert_eq!(console, remote, "sinks diverged");
        console
    }

    /// Execute one operator line and return what was broadcast.
    pub fn send(&mut self, line: &str) -> Vec<String> {
        self.unit.execute_line(line);
        self.output()
    }

    /// Let time pass, then run one loop step.
    pub fn step_after(&mut self, ms: u64) -> Vec<String> {
        self.clock.advance(Duration::from_millis(ms));
        self.unit.step();
        self.output()
    }

    fn requests(&self, function: u8) -> Vec<DecodedRequest> {
        self.drives
            .frames()
            .iter()
            .filter_map(decode_request)
            .filter(|r| r.function == function)
            .collect()
    }

    pub fn writes(&self) -> Vec<DecodedRequest> {
        self.requests(FC_WRITE_SINGLE)
    }

    /// Node ids of every read of `register`, in order.
    pub fn reads_of(&self, register: u16) -> Vec<u8> {
        self.requests(FC_READ_HOLDING)
            .into_iter()
            .filter(|r| r.register == register)
            .map(|r| r.id)
            .collect()
    }

    pub fn persisted(&self) -> Image {
        let bytes = self.storage.contents(IMAGE).expect("image present");
        Image::decode(&bytes).expect("image valid")
    }
}

pub fn id(raw: u8) -> AxisId {
    AxisId::new(raw).expect("valid axis id")
}

//! Boot sequence and the cooperative control loop.
//!
//! ## Boot
//! 1. Registry from presets.
//! 2. Stamp the persistent image if it is missing or stale.
//! 3. Load calibration and tuning from the image.
//! 4. Push tuning to all 22 drives.
//! 5. Laser to its boot level.
//!
//! ## Step
//! Drain every line source through the interpreter, service the limit
//! monitor, run one poller tick, report fan transitions, then release idle
//! axes. Every step runs to completion, bus settle delays included.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use crate::command::interpreter::Interpreter;
use crate::command::response::status_line;
use crate::config::ControlUnitConfig;
use crate::driver::commands::DriverLink;
use crate::io::peripherals::{FanMonitor, Peripherals};
use crate::io::session::{Broadcast, LineSource, ResponseSink};
use crate::poller::HealthPoller;
use crate::safety::limits::LimitMonitor;
use crate::state::axis::Tuning;
use crate::state::modes::Modes;
use crate::state::registry::MotorRegistry;
use crate::store::nv::AxisStore;

/// Pause between loop steps.
const LOOP_IDLE: Duration = Duration::from_millis(1);

/// Owner of every piece of runtime state.
pub struct ControlUnit {
    registry: MotorRegistry,
    link: DriverLink,
    store: Box<dyn AxisStore>,
    poller: HealthPoller,
    limits: LimitMonitor,
    modes: Modes,
    peripherals: Box<dyn Peripherals>,
    fan: FanMonitor,
    sources: Vec<Box<dyn LineSource>>,
    sinks: Broadcast,
    presets: Tuning,
    fan_preset: u8,
    laser_at_boot: bool,
    auto_disable: Option<Duration>,
}

impl ControlUnit {
    pub fn new(
        config: &ControlUnitConfig,
        link: DriverLink,
        store: Box<dyn AxisStore>,
        peripherals: Box<dyn Peripherals>,
    ) -> Self {
        let presets = config.presets.tuning();
        let auto_disable =
            (config.idle.auto_disable_ms > 0).then(|| Duration::from_millis(config.idle.auto_disable_ms));
        Self {
            registry: MotorRegistry::new(presets),
            link,
            store,
            poller: HealthPoller::new(&config.poller),
            limits: LimitMonitor::from_config(&config.limits),
            modes: Modes::default(),
            peripherals,
            fan: FanMonitor::default(),
            sources: Vec::new(),
            sinks: Broadcast::new(),
            presets,
            fan_preset: config.peripherals.fan_preset,
            laser_at_boot: config.peripherals.laser_at_boot,
            auto_disable,
        }
    }

    pub fn attach_source(&mut self, source: Box<dyn LineSource>) {
        self.sources.push(source);
    }

    pub fn attach_sink(&mut self, sink: Box<dyn ResponseSink>) {
        self.sinks.attach(sink);
    }

    pub fn registry(&self) -> &MotorRegistry {
        &self.registry
    }

    pub fn modes(&self) -> &Modes {
        &self.modes
    }

    pub fn peripherals(&self) -> &dyn Peripherals {
        self.peripherals.as_ref()
    }

    pub fn poller(&self) -> &HealthPoller {
        &self.poller
    }

    /// Bring persistence and drives into their boot state.
    pub fn boot(&mut self) {
        if let Err(e) = self.store.initialize() {
            warn!("Persistent image not initialized: {}", e);
        }
        match self.store.load_all(&mut self.registry, &self.presets) {
            Ok(()) => info!("Calibration loaded from persistent image"),
            Err(e) => warn!("Calibration not loaded, using presets: {}", e),
        }

        for motor in self.registry.iter() {
            self.link.configure(motor);
        }
        info!("Configured {} drives", self.registry.iter().count());

        self.peripherals.set_laser(self.laser_at_boot);
        info!(
            "Boot complete (laser={}, limit axes={:?})",
            self.laser_at_boot,
            self.limits.axes().map(|id| id.get()).collect::<Vec<_>>()
        );
    }

    /// Interpret one line and broadcast the responses.
    pub fn execute_line(&mut self, line: &str) {
        let responses = self.interpreter().run_line(line);
        for response in &responses {
            self.sinks.send_line(response);
        }
    }

    /// One pass of the control loop.
    pub fn step(&mut self) {
        for index in 0..self.sources.len() {
            while let Some(line) = self.sources[index].poll_line() {
                self.execute_line(&line);
            }
        }

        for id in self.limits.service(&mut self.link, &mut self.registry) {
            let line = status_line(self.registry.get(id));
            self.sinks.send_line(&line);
        }

        if let Some(event) = self.poller.tick(&mut self.link) {
            self.sinks.send_line(&event.to_string());
        }

        self.fan.observe(self.peripherals.fan_duty());
        self.release_idle_axes();
    }

    /// Step until `running` clears.
    pub fn run(&mut self, running: &AtomicBool) {
        info!("Control loop running");
        while running.load(Ordering::SeqCst) {
            self.step();
            self.link.sleep(LOOP_IDLE);
        }
        info!("Control loop stopped");
    }

    fn interpreter(&mut self) -> Interpreter<'_> {
        Interpreter {
            registry: &mut self.registry,
            link: &mut self.link,
            store: self.store.as_mut(),
            poller: &mut self.poller,
            modes: &mut self.modes,
            peripherals: self.peripherals.as_mut(),
            fan_preset: self.fan_preset,
        }
    }

    fn release_idle_axes(&mut self) {
        let Some(timeout) = self.auto_disable else {
            return;
        };
        let now = self.link.now();
        for motor in self.registry.iter_mut() {
            let idle = motor
                .last_move
                .is_some_and(|at| now.saturating_sub(at) > timeout);
            if motor.enabled && idle {
                info!("m{} idle, disabling", motor.id);
                self.link.disable(motor);
            }
        }
    }
}

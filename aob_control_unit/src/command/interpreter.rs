//! Command dispatch.
//!
//! [`Interpreter`] borrows every piece of runtime state for the duration of
//! one line. Responses are returned in order; the caller broadcasts them.

use std::time::Duration;

use aob_common::bus::registers::REG_ALARM_STATUS;
use aob_common::consts::{ERROR_SWEEP_SPACING_MS, MAX_AXES};
use tracing::{debug, info, warn};

use super::grammar::{AxisVerb, Command, TuningUpdate, parse_segment, split_line};
use super::response::{
    self, ENG_REQUIRED, ERRORS_FOOTER, ERRORS_HEADER, ERRORS_NONE, PARAMS_FOOTER, PARAMS_HEADER,
};
use crate::driver::commands::DriverLink;
use crate::io::peripherals::Peripherals;
use crate::poller::HealthPoller;
use crate::safety::soft_limit::{MovePlan, plan_absolute, plan_relative};
use crate::state::axis::{AxisId, Tuning};
use crate::state::modes::{Modes, on_off};
use crate::state::registry::MotorRegistry;
use crate::store::nv::AxisStore;

/// Mutable view over the control unit for executing commands.
pub struct Interpreter<'a> {
    pub registry: &'a mut MotorRegistry,
    pub link: &'a mut DriverLink,
    pub store: &'a mut dyn AxisStore,
    pub poller: &'a mut HealthPoller,
    pub modes: &'a mut Modes,
    pub peripherals: &'a mut dyn Peripherals,
    /// Fan duty applied by `FG`.
    pub fan_preset: u8,
}

impl Interpreter<'_> {
    /// Split, parse and execute every segment of `line`.
    pub fn run_line(&mut self, line: &str) -> Vec<String> {
        let mut out = Vec::new();
        for segment in split_line(line) {
            let command = parse_segment(&segment);
            debug!("'{}' -> {:?}", segment.as_str(), command);
            out.extend(self.execute(command));
        }
        out
    }

    /// Execute one parsed command.
    pub fn execute(&mut self, command: Command) -> Vec<String> {
        match command {
            Command::StopAll => {
                for id in AxisId::all() {
                    self.link.stop(id);
                }
                info!("All axes stopped");
                vec!["all, stop".to_string()]
            }
            Command::Admin(set) => {
                if let Some(on) = set {
                    self.modes.admin = on;
                    info!("Admin mode {}", on_off(on));
                }
                vec![format!("admin={}", on_off(self.modes.admin))]
            }
            Command::Engineering(set) => {
                if let Some(on) = set {
                    self.modes.engineering = on;
                    info!("Engineering mode {}", on_off(on));
                }
                vec![format!("eng={}", on_off(self.modes.engineering))]
            }
            Command::ReadAll => {
                let mut out = Vec::with_capacity(MAX_AXES + 2);
                out.push(PARAMS_HEADER.to_string());
                out.extend(self.registry.iter().map(response::parameter_line));
                out.push(PARAMS_FOOTER.to_string());
                out
            }
            Command::ReadErrors => self.error_sweep(),
            Command::Laser(set) => {
                if let Some(on) = set {
                    self.peripherals.set_laser(on);
                }
                vec![format!("laser={}", on_off(self.peripherals.laser_on()))]
            }
            Command::Fan(on) => {
                self.peripherals.set_fan(if on { self.fan_preset } else { 0 });
                vec![format!("fan={}", on_off(on))]
            }
            Command::Axis { id, verb } => self.axis(id, verb),
            Command::Ignored => Vec::new(),
        }
    }

    fn error_sweep(&mut self) -> Vec<String> {
        let spacing = Duration::from_millis(ERROR_SWEEP_SPACING_MS);
        let mut out = vec![ERRORS_HEADER.to_string()];
        let mut found = false;
        for id in AxisId::all() {
            let code = self.link.read_register(id, REG_ALARM_STATUS);
            if code != 0 {
                found = true;
                out.push(response::alarm_line(id, code));
            }
            self.link.sleep(spacing);
        }
        if !found {
            out.push(ERRORS_NONE.to_string());
        }
        out.push(ERRORS_FOOTER.to_string());
        out
    }

    fn axis(&mut self, id: AxisId, verb: AxisVerb) -> Vec<String> {
        let mut out = Vec::new();
        match verb {
            AxisVerb::Poll(enabled) => {
                self.poller.set_enabled(id, enabled);
                out.push(response::polling_line(id, enabled));
            }
            AxisVerb::Read => {}
            AxisVerb::SetLower => {
                let motor = self.registry.get_mut(id);
                motor.position = 0;
                motor.lower = 0;
                motor.has_lower = true;
                if let Err(e) = self
                    .store
                    .save_position(id, 0)
                    .and_then(|()| self.store.save_lower(id, 0))
                {
                    warn!("m{} lower limit not persisted: {}", id, e);
                }
                info!("m{} lower limit set, position zeroed", id);
            }
            AxisVerb::SetUpper => {
                let motor = self.registry.get_mut(id);
                motor.upper = motor.position;
                motor.has_upper = true;
                let upper = motor.upper;
                if let Err(e) = self.store.save_upper(id, upper) {
                    warn!("m{} upper limit not persisted: {}", id, e);
                }
                info!("m{} upper limit set at {}", id, upper);
            }
            AxisVerb::SendConfig => {
                self.link.configure(self.registry.get(id));
                out.push(format!("m{id}, cfg_sent"));
            }
            AxisVerb::MoveTo(Err(e)) => return vec![format!("err={e}")],
            AxisVerb::MoveTo(Ok(target)) => {
                let (target, plan) = plan_absolute(self.registry.get(id), target, self.modes.admin);
                if let MovePlan::Move(steps) = plan {
                    out.push(response::moveto_line(id, target, steps));
                }
                self.apply(id, plan);
            }
            AxisVerb::Tune(update) => {
                if !self.modes.engineering {
                    return vec![ENG_REQUIRED.to_string()];
                }
                let tuning = apply_update(self.registry.get(id).tuning, update);
                self.registry.get_mut(id).tuning = tuning;
                if let Err(e) = self.store.save_tuning(id, tuning) {
                    warn!("m{} tuning not persisted: {}", id, e);
                }
                self.link.configure(self.registry.get(id));
                out.push(response::tuning_line(id, &tuning));
            }
            AxisVerb::Stop => self.link.stop(id),
            AxisVerb::Relative(steps) => {
                let plan = plan_relative(self.registry.get(id), steps, self.modes.admin);
                self.apply(id, plan);
            }
        }
        out.push(response::status_line(self.registry.get(id)));
        out
    }

    fn apply(&mut self, id: AxisId, plan: MovePlan) {
        match plan {
            MovePlan::Move(steps) => {
                self.link
                    .move_relative(self.registry.get_mut(id), steps, &mut *self.store);
            }
            MovePlan::Refused => debug!("m{} move refused", id),
            MovePlan::NoMotion => {}
        }
    }
}

fn apply_update(current: Tuning, update: TuningUpdate) -> Tuning {
    Tuning {
        velocity: update.velocity.unwrap_or(current.velocity),
        accel: update.accel.unwrap_or(current.accel),
        decel: update.decel.unwrap_or(current.decel),
        peak_current: update.peak_current.unwrap_or(current.peak_current),
        microstep: update.microstep.unwrap_or(current.microstep),
    }
}

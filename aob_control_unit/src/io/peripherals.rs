//! Laser and fan outputs.

use tracing::{debug, info};

/// Board-level outputs driven by console commands.
pub trait Peripherals {
    fn set_laser(&mut self, on: bool);
    fn laser_on(&self) -> bool;
    /// PWM duty, 0 = off.
    fn set_fan(&mut self, duty: u8);
    fn fan_duty(&self) -> u8;
}

/// Outputs held in memory.
///
/// Stands in for the board GPIO drivers, which live outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimPeripherals {
    laser: bool,
    fan: u8,
}

impl SimPeripherals {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Peripherals for SimPeripherals {
    fn set_laser(&mut self, on: bool) {
        debug!("laser output -> {}", on);
        self.laser = on;
    }

    fn laser_on(&self) -> bool {
        self.laser
    }

    fn set_fan(&mut self, duty: u8) {
        debug!("fan duty -> {}", duty);
        self.fan = duty;
    }

    fn fan_duty(&self) -> u8 {
        self.fan
    }
}

/// Logs fan on/off transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FanMonitor {
    was_on: bool,
}

impl FanMonitor {
    /// Observe the current duty; returns the new state on a transition.
    pub fn observe(&mut self, duty: u8) -> Option<bool> {
        let on = duty > 0;
        if on == self.was_on {
            return None;
        }
        self.was_on = on;
        info!("{}", if on { "Fan ON" } else { "Fan OFF" });
        Some(on)
    }
}

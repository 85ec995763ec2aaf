//! Motor registry: fixed array of 22 axis records.

use std::array;

use aob_common::consts::MAX_AXES;

use super::axis::{AxisId, MotorState, Tuning};

/// Container for all axis records, indexed by [`AxisId`].
#[derive(Debug, Clone)]
pub struct MotorRegistry {
    motors: [MotorState; MAX_AXES],
}

impl MotorRegistry {
    /// Boot registry: every axis at position 0, uncalibrated, carrying `presets`.
    pub fn new(presets: Tuning) -> Self {
        let motors = array::from_fn(|slot| MotorState::from_presets(AxisId::from_slot(slot), presets));
        Self { motors }
    }

    #[inline]
    pub fn get(&self, id: AxisId) -> &MotorState {
        &self.motors[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: AxisId) -> &mut MotorState {
        &mut self.motors[id.index()]
    }

    /// Ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &MotorState> {
        self.motors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MotorState> {
        self.motors.iter_mut()
    }
}

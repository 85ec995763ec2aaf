//! Limit switch translation.
//!
//! Monitored axes have their positive and negative limit switches wired to
//! drive inputs DI2 and DI3. The DI status register is sampled per axis at a
//! fixed interval. The idle level of each input is learned from the first
//! good sample after boot, so normally-open and normally-closed switches both
//! work. Leaving idle sets the matching direction block; returning clears it.

use std::time::Duration;

use aob_common::bus::frame::READ_SENTINEL;
use aob_common::bus::registers::{DI_NEGATIVE_LIMIT, DI_POSITIVE_LIMIT, REG_DI_STATUS};
use tracing::{debug, info};

use crate::config::LimitConfig;
use crate::driver::commands::DriverLink;
use crate::state::axis::AxisId;
use crate::state::registry::MotorRegistry;

/// One limit input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ChannelState {
    idle_level: bool,
    pressed: bool,
}

impl ChannelState {
    /// Feed a raw level; returns the new pressed state if it changed.
    fn update(&mut self, level: bool) -> Option<bool> {
        let pressed = level != self.idle_level;
        if pressed == self.pressed {
            return None;
        }
        self.pressed = pressed;
        Some(pressed)
    }
}

#[derive(Debug, Clone)]
struct MonitoredAxis {
    id: AxisId,
    learned: bool,
    positive: ChannelState,
    negative: ChannelState,
    last_poll: Option<Duration>,
}

impl MonitoredAxis {
    fn new(id: AxisId) -> Self {
        Self {
            id,
            learned: false,
            positive: ChannelState::default(),
            negative: ChannelState::default(),
            last_poll: None,
        }
    }
}

/// Polls DI status of the monitored axes and maintains their block flags.
#[derive(Debug, Clone)]
pub struct LimitMonitor {
    axes: Vec<MonitoredAxis>,
    interval: Duration,
    guard: Duration,
}

impl LimitMonitor {
    pub fn new(ids: impl IntoIterator<Item = AxisId>, interval: Duration, guard: Duration) -> Self {
        Self {
            axes: ids.into_iter().map(MonitoredAxis::new).collect(),
            interval,
            guard,
        }
    }

    /// Build from configuration; ids were range-checked at load.
    pub fn from_config(config: &LimitConfig) -> Self {
        Self::new(
            config.axes.iter().filter_map(|&raw| AxisId::new(raw)),
            Duration::from_millis(config.interval_ms),
            Duration::from_millis(config.guard_ms),
        )
    }

    /// Monitored ids in configuration order.
    pub fn axes(&self) -> impl Iterator<Item = AxisId> + '_ {
        self.axes.iter().map(|a| a.id)
    }

    /// Sample every axis whose interval has elapsed.
    ///
    /// Returns the axes whose block flags changed, one entry per axis.
    pub fn service(&mut self, link: &mut DriverLink, registry: &mut MotorRegistry) -> Vec<AxisId> {
        let mut changed = Vec::new();
        for axis in &mut self.axes {
            let now = link.now();
            if let Some(last) = axis.last_poll {
                if now.saturating_sub(last) < self.interval {
                    continue;
                }
            }
            axis.last_poll = Some(now);

            let di = link.read_register(axis.id, REG_DI_STATUS);
            if di == READ_SENTINEL {
                continue;
            }
            let positive = di & DI_POSITIVE_LIMIT != 0;
            let negative = di & DI_NEGATIVE_LIMIT != 0;

            if !axis.learned {
                axis.positive.idle_level = positive;
                axis.negative.idle_level = negative;
                axis.learned = true;
                debug!(
                    "m{} limit idle levels learned: DI2={} DI3={}",
                    axis.id, positive, negative
                );
            }

            let motor = registry.get_mut(axis.id);
            let mut axis_changed = false;
            if let Some(pressed) = axis.positive.update(positive) {
                motor.block_pos = pressed;
                axis_changed = true;
            }
            if let Some(pressed) = axis.negative.update(negative) {
                motor.block_neg = pressed;
                axis_changed = true;
            }
            if axis_changed {
                info!(
                    "m{} limits: pos={} neg={}",
                    axis.id, motor.block_pos, motor.block_neg
                );
                changed.push(axis.id);
            }

            link.sleep(self.guard);
        }
        changed
    }
}

//! Round-robin motion-status poller.
//!
//! At most one status read per tick, rotating over the poll-enabled axes so
//! the half-duplex bus stays available for commands. Only transitions
//! between the two recognized motion codes are reported.

use std::fmt;
use std::time::Duration;

use aob_common::bus::registers::{MOTION_MOVING, MOTION_STOPPED, REG_MOTION_STATUS};
use aob_common::consts::MAX_AXES;
use tracing::trace;

use crate::config::PollerConfig;
use crate::driver::commands::DriverLink;
use crate::state::axis::AxisId;

/// Reported motion transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEvent {
    pub id: AxisId,
    pub moving: bool,
}

impl fmt::Display for MotionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.moving { "moving" } else { "stopped" };
        write!(f, "m{} {}", self.id, state)
    }
}

/// Poll cursor plus per-axis memory.
#[derive(Debug, Clone)]
pub struct HealthPoller {
    next: AxisId,
    last_tick: Option<Duration>,
    last_code: [Option<u16>; MAX_AXES],
    enabled: [bool; MAX_AXES],
    tick: Duration,
    guard: Duration,
}

impl HealthPoller {
    pub fn new(config: &PollerConfig) -> Self {
        Self {
            next: AxisId::FIRST,
            last_tick: None,
            last_code: [None; MAX_AXES],
            enabled: [config.poll_at_boot; MAX_AXES],
            tick: Duration::from_millis(config.tick_ms),
            guard: Duration::from_millis(config.guard_ms),
        }
    }

    pub fn set_enabled(&mut self, id: AxisId, enabled: bool) {
        self.enabled[id.index()] = enabled;
    }

    pub fn is_enabled(&self, id: AxisId) -> bool {
        self.enabled[id.index()]
    }

    /// Id the next tick will start searching from.
    pub fn cursor(&self) -> AxisId {
        self.next
    }

    /// First poll-enabled id at or after the cursor, wrapping.
    fn next_enabled(&self) -> Option<AxisId> {
        let mut candidate = self.next;
        for _ in 0..MAX_AXES {
            if self.is_enabled(candidate) {
                return Some(candidate);
            }
            candidate = candidate.next_wrapping();
        }
        None
    }

    /// Run one tick if due.
    pub fn tick(&mut self, link: &mut DriverLink) -> Option<MotionEvent> {
        let now = link.now();
        if let Some(last) = self.last_tick {
            if now.saturating_sub(last) < self.tick {
                return None;
            }
        }
        self.last_tick = Some(now);

        let id = self.next_enabled()?;
        let code = link.read_register(id, REG_MOTION_STATUS);
        self.next = id.next_wrapping();
        link.sleep(self.guard);

        let moving = match code {
            MOTION_MOVING => true,
            MOTION_STOPPED => false,
            other => {
                trace!("m{} motion status 0x{:04X} ignored", id, other);
                return None;
            }
        };
        let previous = self.last_code[id.index()].replace(code);
        (previous != Some(code)).then_some(MotionEvent { id, moving })
    }
}

//! Axis identity and per-axis runtime record.

use std::fmt;
use std::time::Duration;

use aob_common::consts::{FIRST_AXIS_ID, LAST_AXIS_ID, MAX_AXES};

// ─── AxisId ─────────────────────────────────────────────────────────

/// Validated axis id in `1..=22`.
///
/// Equal to the drive's Modbus node address and one more than its registry
/// slot. Outside `state` the only constructor is [`AxisId::new`], so anything
/// holding an `AxisId` can index the registry without checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AxisId(u8);

impl AxisId {
    /// Lowest axis.
    pub const FIRST: Self = Self(FIRST_AXIS_ID);
    /// Highest axis.
    pub const LAST: Self = Self(LAST_AXIS_ID);

    /// Validate a raw id.
    pub const fn new(raw: u8) -> Option<Self> {
        if raw >= FIRST_AXIS_ID && raw <= LAST_AXIS_ID {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Parse from command text; rejects anything outside `1..=22`.
    pub fn parse(text: &str) -> Option<Self> {
        text.parse::<u8>().ok().and_then(Self::new)
    }

    /// Node address on the fieldbus.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Inverse of [`AxisId::index`]; `slot` must be below `MAX_AXES`.
    pub(super) const fn from_slot(slot: usize) -> Self {
        debug_assert!(slot < MAX_AXES);
        Self(slot as u8 + FIRST_AXIS_ID)
    }

    /// Zero-based registry slot.
    #[inline]
    pub const fn index(self) -> usize {
        (self.0 - FIRST_AXIS_ID) as usize
    }

    /// The id following this one, wrapping from 22 back to 1.
    pub const fn next_wrapping(self) -> Self {
        if self.0 >= LAST_AXIS_ID {
            Self::FIRST
        } else {
            Self(self.0 + 1)
        }
    }

    /// All ids in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (FIRST_AXIS_ID..=LAST_AXIS_ID).map(Self)
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Tuning ─────────────────────────────────────────────────────────

/// Drive tuning mirrored to hardware by `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    /// PR0 velocity [RPM].
    pub velocity: u16,
    /// PR0 acceleration.
    pub accel: u16,
    /// PR0 deceleration.
    pub decel: u16,
    /// Peak phase current.
    pub peak_current: u16,
    /// Microstep setting.
    pub microstep: u16,
}

impl Tuning {
    /// Replace every zero field with the matching preset.
    pub fn or_presets(self, presets: &Tuning) -> Self {
        let pick = |value: u16, preset: u16| if value == 0 { preset } else { value };
        Self {
            velocity: pick(self.velocity, presets.velocity),
            accel: pick(self.accel, presets.accel),
            decel: pick(self.decel, presets.decel),
            peak_current: pick(self.peak_current, presets.peak_current),
            microstep: pick(self.microstep, presets.microstep),
        }
    }
}

// ─── MotorState ─────────────────────────────────────────────────────

/// Runtime record of one axis.
///
/// `position` is tracked by the controller from commanded moves; it is never
/// read back from the drive.
#[derive(Debug, Clone, PartialEq)]
pub struct MotorState {
    pub id: AxisId,
    /// Force-enable last written to the drive.
    pub enabled: bool,
    /// Clock reading of the last accepted move.
    pub last_move: Option<Duration>,
    /// Commanded position [steps].
    pub position: i32,
    pub has_lower: bool,
    pub has_upper: bool,
    pub lower: i32,
    pub upper: i32,
    /// Sign of the last non-zero relative move.
    pub last_dir: i8,
    /// Negative-direction motion gate.
    pub block_neg: bool,
    /// Positive-direction motion gate.
    pub block_pos: bool,
    pub tuning: Tuning,
}

impl MotorState {
    /// Fresh boot record carrying `presets`.
    pub fn from_presets(id: AxisId, presets: Tuning) -> Self {
        Self {
            id,
            enabled: false,
            last_move: None,
            position: 0,
            has_lower: false,
            has_upper: false,
            lower: 0,
            upper: 0,
            last_dir: 0,
            block_neg: false,
            block_pos: false,
            tuning: presets,
        }
    }

    /// Lower soft limit if calibrated.
    #[inline]
    pub fn lower_limit(&self) -> Option<i32> {
        self.has_lower.then_some(self.lower)
    }

    /// Upper soft limit if calibrated.
    #[inline]
    pub fn upper_limit(&self) -> Option<i32> {
        self.has_upper.then_some(self.upper)
    }

    /// Whether motion with the sign of `steps` is gated.
    pub fn is_blocked_towards(&self, steps: i32) -> bool {
        (steps > 0 && self.block_pos) || (steps < 0 && self.block_neg)
    }
}

//! System-wide constants for the AOB workspace.
//!
//! Single source of truth for axis counts, motion presets and bus timing.
//! Imported by all crates; values are defined here only.

/// Number of addressable axes. Axis ids are dense in `1..=MAX_AXES`.
pub const MAX_AXES: usize = 22;

/// Lowest valid axis id (Modbus node address).
pub const FIRST_AXIS_ID: u8 = 1;

/// Highest valid axis id (Modbus node address).
pub const LAST_AXIS_ID: u8 = MAX_AXES as u8;

// ─── PR0 Motion Presets ─────────────────────────────────────────────

/// Preset PR0 velocity [RPM].
pub const PRESET_VELOCITY: u16 = 50;

/// Preset PR0 acceleration [ms per 1000 RPM].
pub const PRESET_ACCEL: u16 = 50;

/// Preset PR0 deceleration [ms per 1000 RPM].
pub const PRESET_DECEL: u16 = 50;

/// Preset peak phase current [0.1 A units].
pub const PRESET_PEAK_CURRENT: u16 = 10;

/// Preset microstep setting [steps per revolution].
pub const PRESET_MICROSTEP: u16 = 51200;

// ─── Bus Timing ─────────────────────────────────────────────────────

/// Default fieldbus baud rate.
pub const DEFAULT_BAUD: u32 = 19_200;

/// Silence held after every transmitted frame [ms].
pub const DEFAULT_SETTLE_MS: u64 = 30;

/// Upper bound on waiting for a read reply [ms].
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 50;

/// Health poller tick [ms].
pub const DEFAULT_POLL_TICK_MS: u64 = 100;

/// Guard delay after each monitor read [ms].
pub const DEFAULT_MONITOR_GUARD_MS: u64 = 5;

/// Per-axis limit switch sampling interval [ms].
pub const DEFAULT_LIMIT_INTERVAL_MS: u64 = 10;

/// Spacing between alarm reads during the bulk error sweep [ms].
pub const ERROR_SWEEP_SPACING_MS: u64 = 10;

// ─── Persistence & Peripherals ──────────────────────────────────────

/// Default persistent image file name.
pub const DEFAULT_STORE_FILE: &str = "aob_nv.bin";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/aob/aob.toml";

/// Fan duty applied by the "fan on" command.
pub const DEFAULT_FAN_PRESET: u8 = 60;

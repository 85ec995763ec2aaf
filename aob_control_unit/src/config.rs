//! TOML configuration for the control unit.
//!
//! Every section is optional; missing keys fall back to the compiled-in
//! defaults from `aob_common::consts`. Loading always runs [`ControlUnitConfig::validate`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aob_common::config::{ConfigError, ConfigLoader, SharedConfig};
use aob_common::consts::{
    DEFAULT_BAUD, DEFAULT_FAN_PRESET, DEFAULT_LIMIT_INTERVAL_MS, DEFAULT_MONITOR_GUARD_MS,
    DEFAULT_POLL_TICK_MS, DEFAULT_READ_TIMEOUT_MS, DEFAULT_SETTLE_MS, DEFAULT_STORE_FILE,
    FIRST_AXIS_ID, LAST_AXIS_ID, PRESET_ACCEL, PRESET_DECEL, PRESET_MICROSTEP,
    PRESET_PEAK_CURRENT, PRESET_VELOCITY,
};
use serde::{Deserialize, Serialize};

use crate::state::axis::Tuning;

// ─── Sections ───────────────────────────────────────────────────────

/// Fieldbus transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    /// Primary RS-485 TTY.
    pub primary_device: String,
    /// Optional second RS-485 TTY that receives an echo of every frame.
    pub secondary_device: Option<String>,
    /// Line speed (8N1).
    pub baud: u32,
    /// Silence after every transmitted frame [ms].
    pub settle_ms: u64,
    /// Read reply timeout [ms].
    pub read_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            primary_device: "/dev/ttyS1".to_string(),
            secondary_device: None,
            baud: DEFAULT_BAUD,
            settle_ms: DEFAULT_SETTLE_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl BusConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Tuning applied to every axis at boot and used to fill unset persisted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresetConfig {
    pub velocity: u16,
    pub accel: u16,
    pub decel: u16,
    pub peak_current: u16,
    pub microstep: u16,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            velocity: PRESET_VELOCITY,
            accel: PRESET_ACCEL,
            decel: PRESET_DECEL,
            peak_current: PRESET_PEAK_CURRENT,
            microstep: PRESET_MICROSTEP,
        }
    }
}

impl PresetConfig {
    /// Presets as a tuning block.
    pub fn tuning(&self) -> Tuning {
        Tuning {
            velocity: self.velocity,
            accel: self.accel,
            decel: self.decel,
            peak_current: self.peak_current,
            microstep: self.microstep,
        }
    }
}

/// Health poller pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollerConfig {
    /// Minimum spacing between two status reads [ms].
    pub tick_ms: u64,
    /// Bus guard after each read [ms].
    pub guard_ms: u64,
    /// Poll-enable every axis at boot.
    pub poll_at_boot: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_POLL_TICK_MS,
            guard_ms: DEFAULT_MONITOR_GUARD_MS,
            poll_at_boot: false,
        }
    }
}

/// Limit switch monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitConfig {
    /// Axes whose drive DI2/DI3 inputs are wired to limit switches.
    pub axes: Vec<u8>,
    /// Per-axis sampling interval [ms].
    pub interval_ms: u64,
    /// Bus guard after each sample [ms].
    pub guard_ms: u64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            axes: vec![1, 2],
            interval_ms: DEFAULT_LIMIT_INTERVAL_MS,
            guard_ms: DEFAULT_MONITOR_GUARD_MS,
        }
    }
}

/// Persistent image location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory standing in for the mounted block device.
    pub dir: PathBuf,
    /// Image file name inside `dir`.
    pub file_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/var/lib/aob"),
            file_name: DEFAULT_STORE_FILE.to_string(),
        }
    }
}

/// Fan and laser outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeripheralConfig {
    /// PWM duty applied by "fan on".
    pub fan_preset: u8,
    /// Laser output level after boot.
    pub laser_at_boot: bool,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        Self {
            fan_preset: DEFAULT_FAN_PRESET,
            laser_at_boot: true,
        }
    }
}

/// Idle handling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdleConfig {
    /// Disable an enabled axis this long after its last move [ms]; 0 = never.
    pub auto_disable_ms: u64,
}

// ─── Root ───────────────────────────────────────────────────────────

/// Complete control unit configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlUnitConfig {
    pub shared: SharedConfig,
    pub bus: BusConfig,
    pub presets: PresetConfig,
    pub poller: PollerConfig,
    pub limits: LimitConfig,
    pub store: StoreConfig,
    pub peripherals: PeripheralConfig,
    pub idle: IdleConfig,
}

impl ControlUnitConfig {
    /// Check parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.bus.baud == 0 {
            return Err(invalid("bus.baud must be non-zero"));
        }
        if self.bus.settle_ms == 0 {
            return Err(invalid("bus.settle_ms must be non-zero"));
        }
        if self.bus.read_timeout_ms == 0 {
            return Err(invalid("bus.read_timeout_ms must be non-zero"));
        }
        if self.bus.primary_device.is_empty() {
            return Err(invalid("bus.primary_device cannot be empty"));
        }

        let p = &self.presets;
        for (name, value) in [
            ("velocity", p.velocity),
            ("accel", p.accel),
            ("decel", p.decel),
            ("peak_current", p.peak_current),
            ("microstep", p.microstep),
        ] {
            if value == 0 {
                return Err(invalid(&format!("presets.{name} must be non-zero")));
            }
        }

        if self.poller.tick_ms == 0 {
            return Err(invalid("poller.tick_ms must be non-zero"));
        }

        let mut seen = HashSet::new();
        for &id in &self.limits.axes {
            if !(FIRST_AXIS_ID..=LAST_AXIS_ID).contains(&id) {
                return Err(invalid(&format!(
                    "limits.axes entry {id} out of range [{FIRST_AXIS_ID}, {LAST_AXIS_ID}]"
                )));
            }
            if !seen.insert(id) {
                return Err(invalid(&format!("limits.axes entry {id} duplicated")));
            }
        }

        if self.store.file_name.is_empty() {
            return Err(invalid("store.file_name cannot be empty"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}

/// Load and validate the control unit configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ControlUnitConfig, ConfigError> {
    let config = ControlUnitConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate from a TOML string (for testing).
pub fn load_config_from_str(content: &str) -> Result<ControlUnitConfig, ConfigError> {
    let config = ControlUnitConfig::from_toml_str(content)?;
    config.validate()?;
    Ok(config)
}

// ─── Tests ──────────────────────────────────────────────────────────

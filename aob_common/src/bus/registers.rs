//! Register map for DM556RS-style stepper drives.
//!
//! All addresses are 16-bit and travel big-endian in the PDU. Only the
//! registers the control unit actually touches are listed.

// ─── Function Codes ─────────────────────────────────────────────────

/// Read Holding Registers.
pub const FC_READ_HOLDING: u8 = 0x03;

/// Write Single Register.
pub const FC_WRITE_SINGLE: u8 = 0x06;

// ─── Core Control ───────────────────────────────────────────────────

/// Software enable independent of DI mapping (Pr0.07).
pub const REG_FORCE_ENABLE: u16 = 0x000F;
/// Payload for [`REG_FORCE_ENABLE`]: enable.
pub const FORCE_ENABLE_ON: u16 = 0x0001;
/// Payload for [`REG_FORCE_ENABLE`]: disable.
pub const FORCE_ENABLE_OFF: u16 = 0x0000;

/// Microstep resolution (Pr0.01).
pub const REG_MICROSTEP: u16 = 0x0001;

/// Peak phase current in 0.1 A units (Pr5.00).
pub const REG_PEAK_CURRENT: u16 = 0x0191;

// ─── Status ─────────────────────────────────────────────────────────

/// Current alarm code; non-zero means an active fault (Pr9.51).
pub const REG_ALARM_STATUS: u16 = 0x2203;

/// Motion status polled by the health poller.
pub const REG_MOTION_STATUS: u16 = 0x1003;
/// [`REG_MOTION_STATUS`] value while a profile is executing.
pub const MOTION_MOVING: u16 = 0x0006;
/// [`REG_MOTION_STATUS`] value once the profile completed.
pub const MOTION_STOPPED: u16 = 0x0032;

/// Digital input levels, bit0..bit6 = DI1..DI7.
pub const REG_DI_STATUS: u16 = 0x0179;
/// DI2 wired as positive limit.
pub const DI_POSITIVE_LIMIT: u16 = 0x0002;
/// DI3 wired as negative limit.
pub const DI_NEGATIVE_LIMIT: u16 = 0x0004;

// ─── PR0 Motion Profile ─────────────────────────────────────────────

/// Path control / software trigger (Pr8.02).
pub const REG_PR_CONTROL: u16 = 0x6002;
/// [`REG_PR_CONTROL`] payload: trigger the programmed path (CTRG).
pub const PR_CONTROL_TRIGGER: u16 = 0x0010;
/// [`REG_PR_CONTROL`] payload: quick stop.
pub const PR_CONTROL_QUICK_STOP: u16 = 0x0040;

/// PR0 mode word.
pub const REG_PR0_MODE: u16 = 0x6200;
/// [`REG_PR0_MODE`] payload for relative positioning.
pub const PR0_MODE_RELATIVE: u16 = 0x0041;

/// PR0 target, bits 31..16.
pub const REG_PR0_POS_HIGH: u16 = 0x6201;
/// PR0 target, bits 15..0.
pub const REG_PR0_POS_LOW: u16 = 0x6202;
/// PR0 velocity [RPM].
pub const REG_PR0_VELOCITY: u16 = 0x6203;
/// PR0 acceleration [ms per 1000 RPM].
pub const REG_PR0_ACCEL: u16 = 0x6204;
/// PR0 deceleration [ms per 1000 RPM].
pub const REG_PR0_DECEL: u16 = 0x6205;

/// Human-readable name for bus trace logging.
pub fn register_name(reg: u16) -> &'static str {
    match reg {
        REG_FORCE_ENABLE => "force_enable",
        REG_MICROSTEP => "microstep",
        REG_PEAK_CURRENT => "peak_current",
        REG_ALARM_STATUS => "alarm_status",
        REG_MOTION_STATUS => "motion_status",
        REG_DI_STATUS => "di_status",
        REG_PR_CONTROL => "pr_control",
        REG_PR0_MODE => "pr0_mode",
        REG_PR0_POS_HIGH => "pr0_pos_high",
        REG_PR0_POS_LOW => "pr0_pos_low",
        REG_PR0_VELOCITY => "pr0_velocity",
        REG_PR0_ACCEL => "pr0_accel",
        REG_PR0_DECEL => "pr0_decel",
        _ => "unknown",
    }
}

//! Response line rendering.

use crate::state::axis::{AxisId, MotorState, Tuning};

pub const PARAMS_HEADER: &str = "=== MOTOR PARAMETERS ===";
pub const PARAMS_FOOTER: &str = "======================";
pub const ERRORS_HEADER: &str = "=== DRIVER ERROR CHECK ===";
pub const ERRORS_FOOTER: &str = "==========================";
pub const ERRORS_NONE: &str = "All drivers OK - no errors";
pub const ENG_REQUIRED: &str =
    "ERROR: Engineering mode required to change parameters. Use 'eng on' first.";

fn limit_text(limit: Option<i32>) -> String {
    limit.map_or_else(|| "unset".to_string(), |v| v.to_string())
}

fn block_text(motor: &MotorState) -> &'static str {
    match (motor.block_neg, motor.block_pos) {
        (true, true) => "both",
        (true, false) => "neg",
        (false, true) => "pos",
        (false, false) => "none",
    }
}

/// `m<id>, pos=<p>, lo=<lo|unset>, hi=<hi|unset>, lim=<neg|pos|both|none>`
pub fn status_line(motor: &MotorState) -> String {
    format!(
        "m{}, pos={}, lo={}, hi={}, lim={}",
        motor.id,
        motor.position,
        limit_text(motor.lower_limit()),
        limit_text(motor.upper_limit()),
        block_text(motor),
    )
}

/// One row of the `read all` dump.
pub fn parameter_line(motor: &MotorState) -> String {
    let t = &motor.tuning;
    format!(
        "m{}: pos={} lo={} hi={} vel={} accel={} decel={} peak={} micro={}",
        motor.id,
        motor.position,
        limit_text(motor.lower_limit()),
        limit_text(motor.upper_limit()),
        t.velocity,
        t.accel,
        t.decel,
        t.peak_current,
        t.microstep,
    )
}

/// Tuning echo after an accepted parameter change.
pub fn tuning_line(id: AxisId, t: &Tuning) -> String {
    format!(
        "m{}, vel={}, accel={}, decel={}, peak={}, micro={:x}",
        id, t.velocity, t.accel, t.decel, t.peak_current, t.microstep
    )
}

pub fn moveto_line(id: AxisId, target: i32, steps: i32) -> String {
    format!("m{id}, moveto target={target}, steps={steps}")
}

pub fn alarm_line(id: AxisId, code: u16) -> String {
    format!("m{id}: ERROR 0x{code:x}")
}

pub fn polling_line(id: AxisId, enabled: bool) -> String {
    let state = if enabled { "enabled" } else { "disabled" };
    format!("Motor-{id} polling {state}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn motor() -> MotorState {
        MotorState::from_presets(
            AxisId::new(7).unwrap(),
            Tuning {
                velocity: 50,
                accel: 40,
                decel: 30,
                peak_current: 10,
                microstep: 51200,
            },
        )
    }

    #[test]
    fn status_unset_and_unblocked() {
        assert_eq!(
            status_line(&motor()),
            "m7, pos=0, lo=unset, hi=unset, lim=none"
        );
    }

    #[test]
    fn status_calibrated_and_blocked() {
        let mut m = motor();
        m.position = -120;
        m.has_lower = true;
        m.lower = -500;
        m.has_upper = true;
        m.upper = 900;
        m.block_pos = true;
        assert_eq!(status_line(&m), "m7, pos=-120, lo=-500, hi=900, lim=pos");
        m.block_neg = true;
        assert!(status_line(&m).ends_with("lim=both"));
        m.block_pos = false;
        assert!(status_line(&m).ends_with("lim=neg"));
    }

    #[test]
    fn parameter_row() {
        assert_eq!(
            parameter_line(&motor()),
            "m7: pos=0 lo=unset hi=unset vel=50 accel=40 decel=30 peak=10 micro=51200"
        );
    }

    #[test]
    fn parameter_row_shows_calibrated_limits() {
        let mut m = motor();
        m.has_lower = true;
        m.lower = -20;
        m.upper = 75;
        assert_eq!(
            parameter_line(&m),
            "m7: pos=0 lo=-20 hi=unset vel=50 accel=40 decel=30 peak=10 micro=51200"
        );
        m.has_upper = true;
        assert!(parameter_line(&m).starts_with("m7: pos=0 lo=-20 hi=75 "));
    }

    #[test]
    fn tuning_echo_hex_microstep() {
        let m = motor();
        assert_eq!(
            tuning_line(m.id, &m.tuning),
            "m7, vel=50, accel=40, decel=30, peak=10, micro=c800"
        );
    }

    #[test]
    fn small_lines() {
        let id = AxisId::new(3).unwrap();
        assert_eq!(moveto_line(id, 150, -50), "m3, moveto target=150, steps=-50");
        assert_eq!(alarm_line(id, 0xFFFF), "m3: ERROR 0xffff");
        assert_eq!(polling_line(id, true), "Motor-3 polling enabled");
        assert_eq!(polling_line(id, false), "Motor-3 polling disabled");
    }
}

//! Soft-limit clamping and direction-block gating.
//!
//! Admin mode skips both; block flags keep being maintained by the limit
//! monitor regardless.

use crate::state::axis::MotorState;

/// Outcome of planning a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// Send a relative move of this many steps (never zero).
    Move(i32),
    /// Gated by a direction block or already beyond the boundary.
    Refused,
    /// Nothing left to travel after clamping.
    NoMotion,
}

/// Plan a relative move of `steps`.
///
/// A move crossing a calibrated boundary is shortened to land on it. If the
/// axis already sits beyond that boundary the shortened move would reverse
/// direction; it is refused instead.
pub fn plan_relative(motor: &MotorState, steps: i32, admin: bool) -> MovePlan {
    if steps == 0 {
        return MovePlan::NoMotion;
    }
    if admin {
        return MovePlan::Move(steps);
    }
    if motor.is_blocked_towards(steps) {
        return MovePlan::Refused;
    }

    let position = i64::from(motor.position);
    let desired = position + i64::from(steps);
    let bounded = match (steps < 0, motor.lower_limit(), motor.upper_limit()) {
        (true, Some(lower), _) if desired < i64::from(lower) => i64::from(lower),
        (false, _, Some(upper)) if desired > i64::from(upper) => i64::from(upper),
        _ => desired,
    };

    let clamped = bounded - position;
    if clamped == 0 {
        return MovePlan::NoMotion;
    }
    if clamped.signum() != i64::from(steps.signum()) {
        return MovePlan::Refused;
    }
    // |clamped| <= |steps|, so it fits.
    MovePlan::Move(clamped as i32)
}

/// Clamp an absolute target into the calibrated window.
pub fn clamp_target(motor: &MotorState, target: i32, admin: bool) -> i32 {
    if admin {
        return target;
    }
    let mut target = target;
    if let Some(lower) = motor.lower_limit() {
        target = target.max(lower);
    }
    if let Some(upper) = motor.upper_limit() {
        target = target.min(upper);
    }
    target
}

/// Plan an absolute move to `target`.
///
/// Returns the clamped target alongside the plan. A target whose distance
/// from the current position does not fit one relative move is refused.
pub fn plan_absolute(motor: &MotorState, target: i32, admin: bool) -> (i32, MovePlan) {
    let target = clamp_target(motor, target, admin);
    let delta = i64::from(target) - i64::from(motor.position);
    let Ok(steps) = i32::try_from(delta) else {
        return (target, MovePlan::Refused);
    };
    let plan = if !admin && motor.is_blocked_towards(steps) {
        MovePlan::Refused
    } else if steps == 0 {
        MovePlan::NoMotion
    } else {
        MovePlan::Move(steps)
    };
    (target, plan)
}

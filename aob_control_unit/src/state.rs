//! Runtime axis state.
//!
//! The registry is the only authoritative copy of per-axis state; every other
//! component borrows it for the duration of one operation.

pub mod axis;
pub mod modes;
pub mod registry;

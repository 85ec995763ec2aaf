//! Driver command layer.
//!
//! Turns axis intents into ordered fieldbus transactions. The bus is owned
//! here and lent by `&mut` to the monitors, one user at a time.

pub mod bus;
pub mod commands;
pub mod tty;

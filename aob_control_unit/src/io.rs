//! Operator-facing seams: command line sources, response sinks, and the
//! laser/fan outputs.

pub mod peripherals;
pub mod session;

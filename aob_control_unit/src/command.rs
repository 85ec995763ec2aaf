//! Text command interpreter.
//!
//! Lines are split into segments, each segment is parsed once into a closed
//! [`grammar::Command`] and dispatched by exhaustive match.

pub mod grammar;
pub mod interpreter;
pub mod response;

//! # AOB Control Unit Library
//!
//! Motion control for up to 22 stepper axes on a shared RS-485 fieldbus.
//! Operators drive the axes through a line-oriented text protocol; the
//! unit tracks positions, enforces soft limits and limit-switch blocks, and
//! persists calibration across power loss.
//!
//! ## Layers
//!
//! 1. **Codec** (`aob_common::bus`): frames, CRC, register map
//! 2. **Driver** ([`driver`]): duplicated bus with settle delays, axis operations
//! 3. **State** ([`state`], [`store`]): registry of axis records and the persistent image
//! 4. **Policy** ([`safety`], [`poller`]): limit blocks, soft limits, motion polling
//! 5. **Interpreter** ([`command`]): grammar, dispatch, response rendering
//! 6. **Loop** ([`cycle`]): boot sequence and the cooperative control loop
//!
//! ## Single Thread
//!
//! All state is owned by [`cycle::ControlUnit`] and lent by `&mut` to each
//! component in turn. Nothing is shared across threads except the lines
//! forwarded by the console reader.

pub mod command;
pub mod config;
pub mod cycle;
pub mod driver;
pub mod io;
pub mod poller;
pub mod safety;
pub mod sim;
pub mod state;
pub mod store;

//! AOB Common Library
//!
//! Shared constants, configuration loading utilities and the RS-485
//! fieldbus codec used by every AOB workspace crate.
//!
//! # Module Structure
//!
//! - [`consts`] - Axis count, motion presets, timing defaults
//! - [`config`] - Configuration loading traits and types
//! - [`bus`] - Modbus RTU frame codec, register map, transport seams
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use aob_common::bus::frame::write_frame;
//! use aob_common::bus::registers::REG_PEAK_CURRENT;
//!
//! let frame = write_frame(5, REG_PEAK_CURRENT, 35);
//! assert_eq!(frame[..6], [5, 0x06, 0x01, 0x91, 0x00, 0x23]);
//! ```

pub mod bus;
pub mod config;
pub mod consts;
pub mod prelude;

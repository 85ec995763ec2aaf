//! Prelude module for common re-exports.
//!
//! ```rust
//! use aob_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{FIRST_AXIS_ID, LAST_AXIS_ID, MAX_AXES};

// ─── Fieldbus ───────────────────────────────────────────────────────
pub use crate::bus::frame::{READ_SENTINEL, RequestFrame, read_request, write_frame};
pub use crate::bus::transport::{Clock, ManualClock, SerialPort, SystemClock, TransportError};

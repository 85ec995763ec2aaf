//! Safety module root.
//!
//! Hardware limit switch translation into direction blocks, and the
//! soft-limit / block policy applied to every commanded move.

pub mod limits;
pub mod soft_limit;

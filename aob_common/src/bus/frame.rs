//! Fixed-shape Modbus RTU frames.
//!
//! Builders are pure functions of their arguments; nothing here touches a
//! transport. Write and read requests are always 8 bytes, a read reply for a
//! single register is always 7 bytes.

use thiserror::Error;

use super::crc::{append_crc, check_crc};
use super::registers::{FC_READ_HOLDING, FC_WRITE_SINGLE};

/// Length of a write-single or read-request frame.
pub const REQUEST_LEN: usize = 8;

/// Length of a single-register read reply.
pub const READ_REPLY_LEN: usize = 7;

/// Value returned by the bus read primitive on timeout or malformed reply.
///
/// Indistinguishable from a register that legitimately holds 0xFFFF.
pub const READ_SENTINEL: u16 = 0xFFFF;

/// An 8-byte request frame.
pub type RequestFrame = [u8; REQUEST_LEN];

/// Reasons a read reply is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Reply came from a different node.
    #[error("reply from node {got}, expected {expected}")]
    WrongNode { expected: u8, got: u8 },

    /// Reply carried an unexpected function code (including exceptions).
    #[error("reply function 0x{0:02X}, expected 0x03")]
    WrongFunction(u8),

    /// Byte count field is not 2.
    #[error("reply byte count {0}, expected 2")]
    WrongByteCount(u8),

    /// CRC residual non-zero.
    #[error("reply CRC mismatch")]
    BadCrc,
}

/// Build a request frame from six header/payload bytes plus CRC.
fn seal(id: u8, function: u8, reg: u16, value: u16) -> RequestFrame {
    let [reg_hi, reg_lo] = reg.to_be_bytes();
    let [val_hi, val_lo] = value.to_be_bytes();
    let mut frame = [id, function, reg_hi, reg_lo, val_hi, val_lo, 0, 0];
    append_crc(&mut frame);
    frame
}

/// Build an FC 0x06 Write Single Register frame.
///
/// `{id, 0x06, regHi, regLo, valHi, valLo, crcLo, crcHi}`
pub fn write_frame(id: u8, reg: u16, value: u16) -> RequestFrame {
    seal(id, FC_WRITE_SINGLE, reg, value)
}

/// Build an FC 0x03 Read Holding Registers request for exactly one register.
pub fn read_request(id: u8, reg: u16) -> RequestFrame {
    seal(id, FC_READ_HOLDING, reg, 1)
}

/// Decode a 7-byte single-register reply addressed from node `id`.
pub fn decode_read_reply(id: u8, reply: &[u8; READ_REPLY_LEN]) -> Result<u16, FrameError> {
    if reply[0] != id {
        return Err(FrameError::WrongNode {
            expected: id,
            got: reply[0],
        });
    }
    if reply[1] != FC_READ_HOLDING {
        return Err(FrameError::WrongFunction(reply[1]));
    }
    if reply[2] != 2 {
        return Err(FrameError::WrongByteCount(reply[2]));
    }
    if !check_crc(reply) {
        return Err(FrameError::BadCrc);
    }
    Ok(u16::from_be_bytes([reply[3], reply[4]]))
}

/// Build the 7-byte reply a drive sends for a single-register read.
pub fn read_reply(id: u8, value: u16) -> [u8; READ_REPLY_LEN] {
    let [hi, lo] = value.to_be_bytes();
    let mut reply = [id, FC_READ_HOLDING, 2, hi, lo, 0, 0];
    append_crc(&mut reply);
    reply
}

/// Split a signed step count into two's-complement `(high, low)` words.
#[inline]
pub const fn split_steps(steps: i32) -> (u16, u16) {
    (((steps >> 16) & 0xFFFF) as u16, (steps & 0xFFFF) as u16)
}

/// Inverse of [`split_steps`].
#[inline]
pub const fn join_steps(high: u16, low: u16) -> i32 {
    (((high as u32) << 16) | low as u32) as i32
}

/// Fields of an 8-byte request, as seen by a drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedRequest {
    /// Target node.
    pub id: u8,
    /// Function code.
    pub function: u8,
    /// Register address.
    pub register: u16,
    /// Value (write) or count (read).
    pub value: u16,
}

/// Parse a request frame, verifying its CRC.
pub fn decode_request(frame: &RequestFrame) -> Option<DecodedRequest> {
    if !check_crc(frame) {
        return None;
    }
    Some(DecodedRequest {
        id: frame[0],
        function: frame[1],
        register: u16::from_be_bytes([frame[2], frame[3]]),
        value: u16::from_be_bytes([frame[4], frame[5]]),
    })
}

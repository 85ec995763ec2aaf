//! Modbus RTU CRC-16.
//!
//! Feedback polynomial 0xA001 (reflected 0x8005), initial value 0xFFFF,
//! LSB-first bit order. The CRC travels low byte first on the wire.

/// Reflected CRC-16/MODBUS polynomial.
pub const CRC_POLY: u16 = 0xA001;

/// CRC register seed.
pub const CRC_INIT: u16 = 0xFFFF;

/// Compute the CRC-16 of `data`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRC_INIT;

    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc >>= 1;
                crc ^= CRC_POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

/// Split a CRC into wire order: `[low, high]`.
#[inline]
pub const fn crc_bytes(crc: u16) -> [u8; 2] {
    [(crc & 0xFF) as u8, (crc >> 8) as u8]
}

/// Fill the last two bytes of `frame` with the CRC of everything before them.
///
/// Frames shorter than three bytes are left untouched.
pub fn append_crc(frame: &mut [u8]) {
    let Some(split) = frame.len().checked_sub(2).filter(|&n| n > 0) else {
        return;
    };
    let [lo, hi] = crc_bytes(crc16(&frame[..split]));
    frame[split] = lo;
    frame[split + 1] = hi;
}

/// Check a frame whose last two bytes are its CRC (low, high).
///
/// Running the CRC over payload plus appended CRC leaves a zero residual.
pub fn check_crc(frame: &[u8]) -> bool {
    frame.len() >= 3 && crc16(frame) == 0
}

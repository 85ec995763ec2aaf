//! Binary image layout.
//!
//! ```text
//! 0x000  magic u32 | version u16 | reserved u16
//! 0x008  record[axis 1]   (24 bytes)
//! ...
//! 0x200  record[axis 22]
//! 0x218  zero padding up to 2048 bytes
//! ```
//!
//! All integers are little-endian; header and records go through bincode's
//! fixed-int encoding so each struct has a constant wire size.

use aob_common::consts::MAX_AXES;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use super::{ImageError, StoreError};
use crate::state::axis::{AxisId, MotorState, Tuning};

/// Total image size.
pub const IMAGE_BYTES: usize = 2048;

/// "AOB1".
pub const IMAGE_MAGIC: u32 = 0x414F_4231;

/// Current layout version. Any other value invalidates the image.
pub const IMAGE_VERSION: u16 = 1;

/// Encoded header size.
pub const HEADER_BYTES: usize = 8;

/// Encoded record size.
pub const RECORD_BYTES: usize = 24;

const_assert!(HEADER_BYTES + MAX_AXES * RECORD_BYTES <= IMAGE_BYTES);

bitflags! {
    /// Calibration flags stored in each record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RecordFlags: u8 {
        const HAS_LOWER = 0b0000_0001;
        const HAS_UPPER = 0b0000_0010;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct ImageHeader {
    magic: u32,
    version: u16,
    reserved: u16,
}

impl ImageHeader {
    const CURRENT: Self = Self {
        magic: IMAGE_MAGIC,
        version: IMAGE_VERSION,
        reserved: 0,
    };
}

/// One axis worth of persisted calibration and tuning.
///
/// Zero tuning fields mean "unset" and are replaced by presets on load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub position: i32,
    pub lower: i32,
    pub upper: i32,
    flags: u8,
    reserved: u8,
    pub velocity: u16,
    pub accel: u16,
    pub decel: u16,
    pub peak_current: u16,
    pub microstep: u16,
}

impl PersistedRecord {
    pub fn flags(&self) -> RecordFlags {
        RecordFlags::from_bits_truncate(self.flags)
    }

    pub fn insert_flags(&mut self, flags: RecordFlags) {
        self.flags = (self.flags() | flags).bits();
    }

    pub fn tuning(&self) -> Tuning {
        Tuning {
            velocity: self.velocity,
            accel: self.accel,
            decel: self.decel,
            peak_current: self.peak_current,
            microstep: self.microstep,
        }
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.velocity = tuning.velocity;
        self.accel = tuning.accel;
        self.decel = tuning.decel;
        self.peak_current = tuning.peak_current;
        self.microstep = tuning.microstep;
    }

    /// Copy the record into a runtime axis, filling unset tuning from `presets`.
    pub fn apply_to(&self, motor: &mut MotorState, presets: &Tuning) {
        let flags = self.flags();
        motor.position = self.position;
        motor.lower = self.lower;
        motor.upper = self.upper;
        motor.has_lower = flags.contains(RecordFlags::HAS_LOWER);
        motor.has_upper = flags.contains(RecordFlags::HAS_UPPER);
        motor.tuning = self.tuning().or_presets(presets);
    }
}

/// Decoded image: the header is implicit once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    records: [PersistedRecord; MAX_AXES],
}

impl Default for Image {
    fn default() -> Self {
        Self::fresh()
    }
}

impl Image {
    /// Correctly stamped image with every record zeroed.
    pub fn fresh() -> Self {
        Self {
            records: [PersistedRecord::default(); MAX_AXES],
        }
    }

    #[inline]
    pub fn record(&self, id: AxisId) -> &PersistedRecord {
        &self.records[id.index()]
    }

    #[inline]
    pub fn record_mut(&mut self, id: AxisId) -> &mut PersistedRecord {
        &mut self.records[id.index()]
    }

    /// Serialize to exactly [`IMAGE_BYTES`] bytes.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        let mut bytes = Vec::with_capacity(IMAGE_BYTES);
        bincode::serialize_into(&mut bytes, &ImageHeader::CURRENT)?;
        for record in &self.records {
            bincode::serialize_into(&mut bytes, record)?;
        }
        bytes.resize(IMAGE_BYTES, 0);
        Ok(bytes)
    }

    /// Validate the header and decode every record.
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() != IMAGE_BYTES {
            return Err(ImageError::WrongSize(bytes.len()).into());
        }
        let header: ImageHeader = bincode::deserialize(&bytes[..HEADER_BYTES])?;
        if header.magic != IMAGE_MAGIC {
            return Err(ImageError::BadMagic(header.magic).into());
        }
        if header.version != IMAGE_VERSION {
            return Err(ImageError::BadVersion(header.version).into());
        }

        let mut image = Self::fresh();
        for (slot, record) in image.records.iter_mut().enumerate() {
            let start = HEADER_BYTES + slot * RECORD_BYTES;
            *record = bincode::deserialize(&bytes[start..start + RECORD_BYTES])?;
        }
        Ok(image)
    }
}

//! Persistent calibration and tuning store.
//!
//! A single fixed-size versioned image holds one record per axis. Every
//! update loads the whole image, rewrites one record and writes the whole
//! image back. Failures are reported as [`StoreError`]; callers log them and
//! keep their in-memory state.

pub mod image;
pub mod nv;
pub mod storage;

use thiserror::Error;

/// Reasons a persisted image is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// No image exists under the configured name.
    #[error("no image present")]
    Missing,

    /// Image length differs from the fixed image size.
    #[error("image is {0} bytes, expected {expected}", expected = image::IMAGE_BYTES)]
    WrongSize(usize),

    /// Header magic does not match.
    #[error("bad magic 0x{0:08X}")]
    BadMagic(u32),

    /// Header version does not match.
    #[error("unsupported image version {0}")]
    BadVersion(u16),
}

/// Persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing medium is not mounted or not reachable.
    #[error("storage unavailable")]
    Unavailable,

    /// Medium-level I/O failure.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Header or record could not be (de)serialized.
    #[error("image encoding failed: {0}")]
    Encode(#[from] bincode::Error),

    /// Stored image is missing or not the current layout.
    #[error("invalid image: {0}")]
    Invalid(#[from] ImageError),
}

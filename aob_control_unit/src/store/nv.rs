//! Load-whole / mutate-one / write-whole axis store.

use tracing::{debug, info, warn};

use super::StoreError;
use super::image::{Image, PersistedRecord, RecordFlags};
use super::storage::BlockStorage;
use crate::state::axis::{AxisId, Tuning};
use crate::state::registry::MotorRegistry;

/// Persistence strategy for per-axis calibration and tuning.
pub trait AxisStore {
    /// Write a fresh stamped image unless a valid one already exists.
    fn initialize(&mut self) -> Result<(), StoreError>;

    /// Copy every record into `registry`.
    ///
    /// On an invalid or missing image nothing in `registry` is touched.
    fn load_all(&mut self, registry: &mut MotorRegistry, presets: &Tuning) -> Result<(), StoreError>;

    /// Rewrite exactly one record.
    fn read_modify_write(
        &mut self,
        id: AxisId,
        mutate: &mut dyn FnMut(&mut PersistedRecord),
    ) -> Result<(), StoreError>;

    fn save_position(&mut self, id: AxisId, position: i32) -> Result<(), StoreError> {
        self.read_modify_write(id, &mut |rec: &mut PersistedRecord| rec.position = position)
    }

    fn save_lower(&mut self, id: AxisId, lower: i32) -> Result<(), StoreError> {
        self.read_modify_write(id, &mut |rec: &mut PersistedRecord| {
            rec.lower = lower;
            rec.insert_flags(RecordFlags::HAS_LOWER);
        })
    }

    fn save_upper(&mut self, id: AxisId, upper: i32) -> Result<(), StoreError> {
        self.read_modify_write(id, &mut |rec: &mut PersistedRecord| {
            rec.upper = upper;
            rec.insert_flags(RecordFlags::HAS_UPPER);
        })
    }

    fn save_tuning(&mut self, id: AxisId, tuning: Tuning) -> Result<(), StoreError> {
        self.read_modify_write(id, &mut |rec: &mut PersistedRecord| rec.set_tuning(tuning))
    }
}

/// [`AxisStore`] over a single named image on a [`BlockStorage`].
#[derive(Debug)]
pub struct ImageStore<S: BlockStorage> {
    storage: S,
    name: String,
}

impl<S: BlockStorage> ImageStore<S> {
    pub fn new(storage: S, name: impl Into<String>) -> Self {
        Self {
            storage,
            name: name.into(),
        }
    }

    fn read_image(&mut self) -> Result<Image, StoreError> {
        match self.storage.read_whole(&self.name)? {
            Some(bytes) => Image::decode(&bytes),
            None => Err(super::ImageError::Missing.into()),
        }
    }

    fn write_image(&mut self, image: &Image) -> Result<(), StoreError> {
        let bytes = image.encode()?;
        self.storage.replace_whole(&self.name, &bytes)
    }
}

impl<S: BlockStorage> AxisStore for ImageStore<S> {
    fn initialize(&mut self) -> Result<(), StoreError> {
        match self.read_image() {
            Ok(_) => {
                debug!("Image '{}' valid, left untouched", self.name);
                Ok(())
            }
            Err(StoreError::Invalid(reason)) => {
                info!("Initializing image '{}' ({})", self.name, reason);
                self.write_image(&Image::fresh())
            }
            Err(e) => Err(e),
        }
    }

    fn load_all(&mut self, registry: &mut MotorRegistry, presets: &Tuning) -> Result<(), StoreError> {
        let image = self.read_image()?;
        for motor in registry.iter_mut() {
            image.record(motor.id).apply_to(motor, presets);
        }
        info!("Loaded calibration for all axes from '{}'", self.name);
        Ok(())
    }

    fn read_modify_write(
        &mut self,
        id: AxisId,
        mutate: &mut dyn FnMut(&mut PersistedRecord),
    ) -> Result<(), StoreError> {
        let mut image = match self.read_image() {
            Ok(image) => image,
            Err(StoreError::Invalid(reason)) => {
                warn!("Image '{}' invalid ({}), reinitializing", self.name, reason);
                Image::fresh()
            }
            Err(e) => return Err(e),
        };
        mutate(image.record_mut(id));
        self.write_image(&image)
    }
}

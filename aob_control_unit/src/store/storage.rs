//! Backing media for the persistent image.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use super::StoreError;

/// Whole-object storage addressed by name.
pub trait BlockStorage {
    /// Read the full object, `Ok(None)` if it does not exist.
    fn read_whole(&mut self, name: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the full object.
    fn replace_whole(&mut self, name: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

// ─── Directory ──────────────────────────────────────────────────────

/// Storage rooted in a directory standing in for a mounted volume.
///
/// A missing directory is treated as an unmounted medium.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::Unavailable);
        }
        Ok(self.root.join(name))
    }
}

impl BlockStorage for DirStorage {
    fn read_whole(&mut self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(name)?;
        match fs::read(&path) {
            Ok(bytes) => {
                debug!("Read {} bytes from {:?}", bytes.len(), path);
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn replace_whole(&mut self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(name)?;
        fs::write(&path, bytes)?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }
}

// ─── In-memory ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryMedium {
    mounted: bool,
    objects: HashMap<String, Vec<u8>>,
}

/// Volatile storage used by simulation and tests.
///
/// Clones share the same medium, so a test can keep a handle and inspect
/// what the store wrote.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    medium: Rc<RefCell<MemoryMedium>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Empty, mounted medium.
    pub fn new() -> Self {
        Self {
            medium: Rc::new(RefCell::new(MemoryMedium {
                mounted: true,
                objects: HashMap::new(),
            })),
        }
    }

    /// Medium that rejects every access with [`StoreError::Unavailable`].
    pub fn unmounted() -> Self {
        let storage = Self::new();
        storage.set_mounted(false);
        storage
    }

    pub fn set_mounted(&self, mounted: bool) {
        self.medium.borrow_mut().mounted = mounted;
    }

    /// Copy of a stored object.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.medium.borrow().objects.get(name).cloned()
    }

    /// Place raw bytes on the medium, bypassing the store.
    pub fn insert(&self, name: &str, bytes: Vec<u8>) {
        self.medium.borrow_mut().objects.insert(name.to_string(), bytes);
    }
}

impl BlockStorage for MemoryStorage {
    fn read_whole(&mut self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let medium = self.medium.borrow();
        if !medium.mounted {
            return Err(StoreError::Unavailable);
        }
        Ok(medium.objects.get(name).cloned())
    }

    fn replace_whole(&mut self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut medium = self.medium.borrow_mut();
        if !medium.mounted {
            return Err(StoreError::Unavailable);
        }
        medium.objects.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

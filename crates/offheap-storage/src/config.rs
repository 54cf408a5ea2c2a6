//! Backend selection

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::backend::{AnyStorage, StorageKind};
use crate::mapped::MappedStorage;
use crate::volatile::VolatileStorage;
use crate::{Result, StorageError};

/// Which backend to build, and where its file lives when file-mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backing strategy
    pub kind: StorageKind,

    /// Backing file, required for [`StorageKind::FileMapped`]
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Volatile,
            path: None,
        }
    }
}

impl StorageConfig {
    /// Anonymous-memory backend
    pub const fn volatile() -> Self {
        Self {
            kind: StorageKind::Volatile,
            path: None,
        }
    }

    /// File-mapped backend at `path`
    pub fn file_mapped<P: AsRef<Path>>(path: P) -> Self {
        Self {
            kind: StorageKind::FileMapped,
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Set the backing file path
    #[must_use]
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Build the configured backend, unallocated.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if a file-mapped backend has no path or
    /// its file cannot be opened.
    pub fn open(&self) -> Result<AnyStorage> {
        match self.kind {
            StorageKind::Volatile => Ok(VolatileStorage::new().into()),
            StorageKind::FileMapped => {
                let path = self.path.as_ref().ok_or_else(|| {
                    StorageError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "file-mapped storage requires a path",
                    ))
                })?;
                Ok(MappedStorage::open(path)?.into())
            }
        }
    }
}

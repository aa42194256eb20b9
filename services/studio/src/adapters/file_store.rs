//! services/studio/src/adapters/file_store.rs
//!
//! This module contains the storage adapter, the concrete implementation of the
//! `KeyValueStore` port. Every key is one JSON file inside the data directory,
//! always rewritten as a whole snapshot.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use kidsmart_core::ports::{KeyValueStore, PortError, PortResult};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed adapter that implements the `KeyValueStore` port.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates, if needed) the store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Storage(format!("reading {key}: {e}"))),
        }
    }

    fn put(&self, key: &str, value: &str) -> PortResult<()> {
        let path = self.path_for(key);
        // Write then rename so a crash never leaves a half-written snapshot.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)
            .and_then(|_| fs::rename(&staging, &path))
            .map_err(|e| PortError::Storage(format!("writing {key}: {e}")))?;
        debug!(key, bytes = value.len(), "snapshot written");
        Ok(())
    }
}

use super::{MemoryStore, Tables};
use crate::error::StoreError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use std::fs;
use std::path::Path;

impl MemoryStore {
    /// Encodes every table with bincode. Cached console output and the lookup
    /// indexes are not included.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let tables = self.read()?;
        encode_to_vec(&*tables, standard())
            .map_err(|e| StoreError::Snapshot(format!("Serialization failed: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        let (tables, _): (Tables, usize) = decode_from_slice(bytes, standard())
            .map_err(|e| StoreError::Snapshot(format!("Deserialization failed: {}", e)))?;
        Ok(Self::from_tables(tables))
    }

    /// Writes the `to_bytes` snapshot to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes).map_err(|e| {
            StoreError::Snapshot(format!("Could not write '{}': {}", path.display(), e))
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "saved store snapshot");
        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            StoreError::Snapshot(format!("Could not read '{}': {}", path.display(), e))
        })?;
        Self::from_bytes(&bytes)
    }
}

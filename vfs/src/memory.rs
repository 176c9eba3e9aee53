use std::collections::HashMap;
use std::sync::RwLock;

use crate::provider::AssetSource;
use crate::{path, VfsError};

/// In-memory asset source.
///
/// Used by tests and for small embedded assets. Keys are stored normalized,
/// so any spelling of a path finds the asset it was inserted under.
#[derive(Default)]
pub struct MemorySource {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an asset. Invalid paths are rejected.
    pub fn insert(&self, asset_path: &str, bytes: impl Into<Vec<u8>>) -> Result<(), VfsError> {
        let normalized = path::normalize(asset_path)?;
        self.files
            .write()
            .unwrap()
            .insert(normalized, bytes.into());
        Ok(())
    }

    /// Remove an asset, returning its bytes if it was present.
    pub fn remove(&self, asset_path: &str) -> Option<Vec<u8>> {
        let normalized = path::normalize(asset_path).ok()?;
        self.files.write().unwrap().remove(&normalized)
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().unwrap().is_empty()
    }
}

impl AssetSource for MemorySource {
    fn read(&self, asset_path: &str) -> Result<Vec<u8>, VfsError> {
        let normalized = path::normalize(asset_path)?;
        self.files
            .read()
            .unwrap()
            .get(&normalized)
            .cloned()
            .ok_or_else(|| VfsError::NotFound(normalized))
    }

    fn exists(&self, asset_path: &str) -> bool {
        match path::normalize(asset_path) {
            Ok(normalized) => self.files.read().unwrap().contains_key(&normalized),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_read() {
        let source = MemorySource::new();
        source.insert("textures/brick.png", b"pixels".to_vec()).unwrap();
        assert_eq!(source.read("textures/brick.png").unwrap(), b"pixels");
        assert!(source.exists("textures/brick.png"));
    }

    #[test]
    fn spellings_share_one_entry() {
        let source = MemorySource::new();
        source.insert("a//b.png", b"one".to_vec()).unwrap();
        source.insert("./a/b.png", b"two".to_vec()).unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(source.read("a/b.png").unwrap(), b"two");
    }

    #[test]
    fn missing_is_not_found() {
        let source = MemorySource::new();
        assert!(matches!(
            source.read("nothing.bin"),
            Err(VfsError::NotFound(_))
        ));
        assert!(!source.exists("nothing.bin"));
    }

    #[test]
    fn remove_deletes_entry() {
        let source = MemorySource::new();
        source.insert("f.bin", b"x".to_vec()).unwrap();
        assert_eq!(source.remove("f.bin").unwrap(), b"x");
        assert!(source.is_empty());
    }

    #[test]
    fn invalid_paths_rejected() {
        let source = MemorySource::new();
        assert!(source.insert("../up.bin", b"x".to_vec()).is_err());
        assert!(!source.exists("../up.bin"));
    }
}

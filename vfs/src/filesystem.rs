use std::path::PathBuf;

use crate::provider::AssetSource;
use crate::{path, VfsError};

/// Asset source reading from a directory on disk.
///
/// The root path is joined with the normalized asset path to form the actual
/// filesystem path. Traversal out of the root is impossible because
/// normalization rejects `..` segments.
///
/// # Example
///
/// ```no_run
/// use silkweed_vfs::{AssetSource, FilesystemSource};
///
/// let source = FilesystemSource::new("./assets");
/// // Reads ./assets/textures/brick.png
/// let bytes = source.read("textures/brick.png");
/// ```
pub struct FilesystemSource {
    root: PathBuf,
}

impl FilesystemSource {
    /// Create a source rooted at the given directory.
    ///
    /// The directory does not need to exist yet; it is checked at read time.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn resolve(&self, asset_path: &str) -> Result<PathBuf, VfsError> {
        let normalized = path::normalize(asset_path)?;
        Ok(self.root.join(normalized))
    }
}

impl AssetSource for FilesystemSource {
    fn read(&self, asset_path: &str) -> Result<Vec<u8>, VfsError> {
        let full_path = self.resolve(asset_path)?;
        std::fs::read(&full_path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                VfsError::NotFound(asset_path.to_string())
            } else {
                VfsError::Io(err)
            }
        })
    }

    fn exists(&self, asset_path: &str) -> bool {
        match self.resolve(asset_path) {
            Ok(full_path) => full_path.exists(),
            Err(_) => false,
        }
    }
}

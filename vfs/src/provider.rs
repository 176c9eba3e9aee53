use crate::VfsError;

/// Trait for asset byte sources.
///
/// Implementations accept any path spelling and normalize internally (see
/// [`crate::path::normalize`]), so callers and caches can pass user-provided
/// paths directly. Reads are blocking; resource managers run them on the
/// engine task pool, never on the logical or render threads.
pub trait AssetSource: Send + Sync + 'static {
    /// Read the entire contents of the asset at the given path.
    fn read(&self, path: &str) -> Result<Vec<u8>, VfsError>;

    /// Check whether an asset exists at the given path.
    ///
    /// Invalid paths report `false` rather than erroring.
    fn exists(&self, path: &str) -> bool;
}

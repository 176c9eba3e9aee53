//! # Silkweed VFS
//!
//! Byte-level asset access for the engine's resource managers. An
//! [`AssetSource`] hands out raw bytes for normalized paths; format parsing
//! happens elsewhere. Two sources ship: [`FilesystemSource`] (a directory
//! root on disk) and [`MemorySource`] (in-memory, for tests and embedded
//! assets).
//!
//! Paths use forward slashes and are normalized before lookup, so
//! `textures//brick.png` and `textures/./brick.png` name the same asset.
//! Traversal (`..`) is rejected.

mod error;
mod filesystem;
mod memory;
pub mod path;
mod provider;

pub use error::VfsError;
pub use filesystem::FilesystemSource;
pub use memory::MemorySource;
pub use path::normalize;
pub use provider::AssetSource;

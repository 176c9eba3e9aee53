//! Common types and descriptors for graphics resources.
//!
//! This module contains format enums, CPU-side resource payloads and the
//! small geometry structs used throughout the graphics system.

mod common;
mod mesh;
mod texture;

pub use common::{Color, Extent2d, Rect};
pub use mesh::{CpuMesh, Vertex, generate_cube, generate_quad, generate_uv_sphere};
pub use texture::{CpuTexture, TextureFormat};

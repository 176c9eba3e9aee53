//! # Silkweed Graphics
//!
//! Rendering layer for Silkweed: GPU resource lifecycle, frame handoff
//! and the forward renderer.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`RenderDevice`] - Trait for render backends, with a recording
//!   `Dummy` device and an optional `glow` OpenGL device
//! - [`entry`] - GPU resource entries with an atomic lifecycle state
//!   machine and double-buffered handles
//! - [`RenderResources`] - Texture/mesh/material/light managers sharing
//!   one GL-thread upload queue
//! - [`FrameSlot`] - Single-slot frame handoff between the logical and
//!   render threads
//! - [`SilkRenderer`] - Consumes published frames part by part
//!
//! ## Example
//!
//! ```ignore
//! use silkweed_graphics::{RenderResources, SilkRenderer, FrameSlot};
//!
//! let resources = RenderResources::headless();
//! let mut renderer = SilkRenderer::new(size);
//! if let Some(frame) = slot.take() {
//!     renderer.render_frame(device, &resources, &frame);
//! }
//! resources.service_uploads(device, budget);
//! ```

pub mod backend;
pub mod camera;
pub mod entry;
pub mod error;
pub mod frame;
pub mod frame_slot;
pub mod light;
pub mod managers;
pub mod render_state;
pub mod renderer;
pub mod types;

// Re-export main types for convenience
pub use backend::{
    DeviceCall, DummyDevice, MeshHandle, ProgramHandle, RenderDevice, RenderTargetHandle,
    TextureHandle, create_headless_device,
};
pub use camera::{CameraMask, CameraMaskPolicy, CameraParams, Projection};
pub use entry::{
    AnyEntry, EntryState, MaterialDesc, MaterialEntry, MeshEntry, RenderTargetEntry, ShaderEntry,
    TextureEntry, UploadQueue, request_upload,
};
pub use error::GraphicsError;
pub use frame::{DrawBatch, FrameStats, RenderFrame, RenderPart};
pub use frame_slot::{FrameSlot, FrameSlotStats};
pub use light::{FrameLight, LightBlock, LightKind, LightManager, MAX_FRAME_LIGHTS};
pub use managers::{MaterialManager, MeshManager, RenderResources, TextureManager};
pub use render_state::{RenderState, RenderStateStats};
pub use renderer::SilkRenderer;
pub use types::{
    Color, CpuMesh, CpuTexture, Extent2d, Rect, TextureFormat, Vertex, generate_cube,
    generate_quad, generate_uv_sphere,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the graphics version at startup.
pub fn init() {
    log::info!("Silkweed Graphics v{} initialized", VERSION);
}

//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction over the graphics API,
//! so the resource pipeline and renderer can run against different devices.
//!
//! # Available Backends
//!
//! - `dummy` (always built): records every command, used for testing and
//!   headless runs
//! - `glow-backend`: real OpenGL 3.3 core device via `glow`
//!
//! # Threading
//!
//! A [`RenderDevice`] is owned by the render thread and is deliberately not
//! `Send`: GL contexts are bound to the thread that created them. All
//! resource creation and deletion goes through the device, scheduled onto
//! the render thread via the upload queue.

pub mod dummy;

#[cfg(feature = "glow-backend")]
pub mod gl;

pub use dummy::{DeviceCall, DummyDevice};

#[cfg(feature = "glow-backend")]
pub use gl::GlowDevice;

use silkweed_core::math::Mat4;

use crate::error::GraphicsError;
use crate::types::{Color, CpuMesh, CpuTexture, Extent2d, Rect};

// ============================================================================
// Handles
// ============================================================================

/// Handle to a GPU texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Handle to an uploaded mesh.
///
/// Carries the index count so draw calls need no extra lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle {
    /// Vertex array object id.
    pub vao: u32,
    /// Vertex buffer id.
    pub vertex_buffer: u32,
    /// Index buffer id.
    pub index_buffer: u32,
    /// Number of indices to draw.
    pub index_count: u32,
}

/// Handle to an offscreen render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle {
    /// Framebuffer object id.
    pub framebuffer: u32,
    /// Color attachment, usable as a texture for sampling.
    pub color: TextureHandle,
    /// Target dimensions.
    pub extent: Extent2d,
}

// ============================================================================
// RenderDevice
// ============================================================================

/// Device abstraction executed on the render thread.
///
/// State setters are raw and unconditional; redundant-change elimination is
/// the renderer's [`RenderState`](crate::render_state::RenderState) cache's
/// job, not the device's.
pub trait RenderDevice {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    // ------------------------------------------------------------------
    // Pipeline state
    // ------------------------------------------------------------------

    /// Set the viewport rectangle.
    fn set_viewport(&mut self, rect: Rect);

    /// Enable or disable depth testing.
    fn set_depth_test(&mut self, enabled: bool);

    /// Enable or disable alpha blending.
    fn set_blend(&mut self, enabled: bool);

    /// Enable or disable back-face culling.
    fn set_cull_backface(&mut self, enabled: bool);

    /// Clear the current target. `color: None` leaves the color buffer
    /// untouched and clears only what `depth` requests.
    fn clear(&mut self, color: Option<Color>, depth: bool);

    /// Bind a shader program for subsequent draws and uniform updates.
    fn use_program(&mut self, program: ProgramHandle);

    /// Bind a texture to the given texture unit.
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    // ------------------------------------------------------------------
    // Uniforms, applied to the currently bound program
    // ------------------------------------------------------------------

    fn set_uniform_mat4(&mut self, name: &str, value: &Mat4);
    fn set_uniform_vec4(&mut self, name: &str, value: [f32; 4]);
    fn set_uniform_vec3(&mut self, name: &str, value: [f32; 3]);
    fn set_uniform_f32(&mut self, name: &str, value: f32);
    fn set_uniform_i32(&mut self, name: &str, value: i32);

    /// Issue an indexed draw of the whole mesh.
    fn draw_mesh(&mut self, mesh: &MeshHandle);

    // ------------------------------------------------------------------
    // Resource management, render thread only
    // ------------------------------------------------------------------

    /// Create and fill a texture from CPU pixels.
    fn create_texture(&mut self, texture: &CpuTexture) -> Result<TextureHandle, GraphicsError>;

    /// Delete a texture.
    fn delete_texture(&mut self, handle: TextureHandle);

    /// Create vertex/index buffers and a vertex array for a mesh.
    fn create_mesh(&mut self, mesh: &CpuMesh) -> Result<MeshHandle, GraphicsError>;

    /// Delete a mesh and its buffers.
    fn delete_mesh(&mut self, handle: MeshHandle);

    /// Compile and link a shader program.
    fn create_program(
        &mut self,
        label: &str,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<ProgramHandle, GraphicsError>;

    /// Delete a shader program.
    fn delete_program(&mut self, handle: ProgramHandle);

    /// Create an offscreen render target with a color attachment and a
    /// depth/stencil buffer.
    fn create_render_target(&mut self, extent: Extent2d)
        -> Result<RenderTargetHandle, GraphicsError>;

    /// Delete a render target and its attachments.
    fn delete_render_target(&mut self, handle: RenderTargetHandle);

    /// Bind a render target, or the default framebuffer when `None`.
    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>);

    /// Drain the device error queue, logging each error against the given
    /// operation label. Returns how many errors were drained.
    fn drain_errors(&mut self, operation: &str) -> u32;
}

/// Create the best available device for this build.
///
/// Real backends need a windowing layer to provide a context, so the
/// feature-independent path always yields the recording dummy device. The
/// `glow` device is constructed explicitly by the window shell instead.
pub fn create_headless_device() -> Box<dyn RenderDevice> {
    log::info!("using dummy render device");
    Box::new(DummyDevice::new())
}

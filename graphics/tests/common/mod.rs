//! Common utilities for frame pipeline integration tests.
//!
//! This module provides shared test infrastructure: a context bundling a
//! recording device with a full resource set, builders for frames and
//! cameras, and helpers for checking the recorded command stream.

use std::sync::Arc;
use std::time::{Duration, Instant};

use silkweed_core::math::{Vec3, look_at_rh};
use silkweed_core::task_runner::TaskRunner;
use silkweed_graphics::{
    CameraMask, CameraParams, Color, DeviceCall, DrawBatch, DummyDevice, EntryState, Extent2d,
    Projection, RenderFrame, RenderPart, RenderResources, SilkRenderer, TextureEntry,
};
use silkweed_vfs::{AssetSource, MemorySource};

/// Offscreen target dimensions shared by all pipeline tests.
pub const TARGET_WIDTH: u32 = 320;
pub const TARGET_HEIGHT: u32 = 240;

// ============================================================================
// Backend Enumeration
// ============================================================================

/// Devices the pipeline tests can run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Recording device, no GPU required.
    Dummy,
    /// OpenGL device via `glow`.
    Gl,
}

impl Backend {
    /// Check if this backend can run inside the test process.
    pub fn is_available(&self) -> bool {
        match self {
            Backend::Dummy => true,
            // The glow device needs a live context from the window shell,
            // which a test process does not have.
            Backend::Gl => false,
        }
    }

    /// Get the backend name for display.
    #[allow(dead_code)]
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Dummy => "dummy",
            Backend::Gl => "gl",
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// Everything a pipeline test needs: a recording device, the resource
/// bundle and a renderer aimed at a small offscreen-sized viewport.
pub struct TestContext {
    /// The backend being tested.
    #[allow(dead_code)]
    pub backend: Backend,
    /// Recording device; inspect its call log after rendering.
    pub device: DummyDevice,
    /// Texture, mesh, material and light managers over the test source.
    pub resources: RenderResources,
    /// Renderer under test.
    pub renderer: SilkRenderer,
}

impl TestContext {
    /// Create a test context over an empty in-memory asset source.
    ///
    /// Returns `None` if the backend is not available.
    pub fn new(backend: Backend) -> Option<Self> {
        Self::with_source(backend, Arc::new(MemorySource::new()))
    }

    /// Create a test context over a prepared asset source.
    pub fn with_source(backend: Backend, source: Arc<dyn AssetSource>) -> Option<Self> {
        if !backend.is_available() {
            return None;
        }
        let resources = RenderResources::new(source, Arc::new(TaskRunner::new(2)));
        Some(Self {
            backend,
            device: DummyDevice::new(),
            resources,
            renderer: SilkRenderer::new(Extent2d::new(TARGET_WIDTH, TARGET_HEIGHT)),
        })
    }

    /// Run upload passes until the queue is empty.
    ///
    /// Panics if the queue refuses to drain, which would mean an upload
    /// keeps re-enqueueing itself.
    pub fn pump_uploads(&mut self) {
        for _ in 0..64 {
            if self.resources.upload_queue().is_empty() {
                return;
            }
            self.resources
                .service_uploads(&mut self.device, Duration::from_millis(8));
        }
        panic!("upload queue did not drain after 64 passes");
    }

    /// Render one frame and return only the calls recorded for it.
    pub fn render(&mut self, frame: &RenderFrame) -> Vec<DeviceCall> {
        self.device.take_calls();
        self.renderer
            .render_frame(&mut self.device, &self.resources, frame);
        self.device.take_calls()
    }
}

// ============================================================================
// Loader Synchronization
// ============================================================================

/// Wait until a texture entry has left the loader pool, either with pixels
/// pending upload or with its failed flag set.
pub fn wait_for_loader(entry: &TextureEntry) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if entry.core().state() == EntryState::Uploading || entry.core().has_failed() {
            return;
        }
        assert!(Instant::now() < deadline, "loader did not finish in time");
        std::thread::sleep(Duration::from_millis(1));
    }
}

// ============================================================================
// Frame Builders
// ============================================================================

/// A world camera looking at the origin from above and behind.
pub fn world_camera() -> CameraParams {
    CameraParams {
        view: look_at_rh(&Vec3::new(0.0, 2.0, 5.0), &Vec3::zeros(), &Vec3::y()),
        clear_color: Color::rgb(0.1, 0.1, 0.12),
        ..CameraParams::default()
    }
}

/// An orthographic overlay camera drawing on top of the world.
#[allow(dead_code)]
pub fn overlay_camera() -> CameraParams {
    CameraParams {
        projection: Projection::Orthographic {
            half_height: 1.0,
            znear: -1.0,
            zfar: 1.0,
        },
        mask: CameraMask::HUD,
        z_order: 100,
        ..CameraParams::default()
    }
}

/// A part with `batches` opaque draws of the default material on the
/// built-in cube, spread along the x axis.
pub fn cube_part(ctx: &TestContext, camera: CameraParams, batches: usize) -> RenderPart {
    let material = Arc::clone(ctx.resources.materials().default_material());
    let cube = ctx.resources.meshes().cube();
    let mut part = RenderPart::new(camera);
    for i in 0..batches {
        part.opaque.push(DrawBatch::single(
            Arc::clone(&material),
            Arc::clone(&cube),
            silkweed_core::math::mat4_from_translation(Vec3::new(i as f32 * 2.0, 0.0, 0.0)),
        ));
    }
    part
}

/// Wrap parts into a numbered frame.
pub fn frame_of(frame_number: u64, parts: Vec<RenderPart>) -> RenderFrame {
    let mut frame = RenderFrame::new(frame_number, frame_number as f64 / 60.0);
    for part in parts {
        frame.push_part(part);
    }
    frame
}

// ============================================================================
// Call Stream Checks
// ============================================================================

/// Number of draw calls in the recorded stream.
pub fn draw_count(calls: &[DeviceCall]) -> usize {
    calls
        .iter()
        .filter(|call| matches!(call, DeviceCall::DrawMesh { .. }))
        .count()
}

/// Every clear in the recorded stream, in order.
pub fn clear_ops(calls: &[DeviceCall]) -> Vec<(Option<Color>, bool)> {
    calls
        .iter()
        .filter_map(|call| match call {
            DeviceCall::Clear { color, depth } => Some((*color, *depth)),
            _ => None,
        })
        .collect()
}

/// Last value pushed for a float uniform, if any.
#[allow(dead_code)]
pub fn last_uniform_f32(calls: &[DeviceCall], name: &str) -> Option<f32> {
    calls.iter().rev().find_map(|call| match call {
        DeviceCall::UniformF32(uniform, value) if uniform == name => Some(*value),
        _ => None,
    })
}

/// Texture ids bound to the given unit, in order.
#[allow(dead_code)]
pub fn bound_textures(calls: &[DeviceCall], want_unit: u32) -> Vec<u32> {
    calls
        .iter()
        .filter_map(|call| match call {
            DeviceCall::BindTexture { unit, texture } if *unit == want_unit => Some(*texture),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Test Data Generators
// ============================================================================

/// Encode a 1x1 red PNG for loader tests.
#[allow(dead_code)]
pub fn red_pixel_png() -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
    let mut buffer = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

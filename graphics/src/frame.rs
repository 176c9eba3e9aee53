//! The frame structure handed from the logical thread to the renderer.
//!
//! A `RenderFrame` is built in full on the logical thread, published, and
//! only then visible to the render thread. Nothing in here touches the
//! GPU; entries are referenced by `Arc` and resolved to handles at draw
//! time.

use std::sync::Arc;

use silkweed_core::math::Mat4;

use crate::camera::CameraParams;
use crate::entry::{MaterialEntry, MeshEntry};
use crate::light::FrameLight;

/// Instances sharing one (material, mesh) pair, drawn back to back.
#[derive(Clone)]
pub struct DrawBatch {
    /// Material all instances draw with.
    pub material: Arc<MaterialEntry>,
    /// Mesh all instances draw.
    pub mesh: Arc<MeshEntry>,
    /// One model matrix per instance.
    pub models: Vec<Mat4>,
}

impl DrawBatch {
    /// Batch of a single instance.
    pub fn single(material: Arc<MaterialEntry>, mesh: Arc<MeshEntry>, model: Mat4) -> Self {
        Self {
            material,
            mesh,
            models: vec![model],
        }
    }

    /// Number of instances in the batch.
    pub fn instance_count(&self) -> usize {
        self.models.len()
    }
}

impl std::fmt::Debug for DrawBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawBatch")
            .field("material", &self.material.name())
            .field("instances", &self.models.len())
            .finish()
    }
}

/// Everything one camera draws.
#[derive(Debug, Clone, Default)]
pub struct RenderPart {
    /// Camera snapshot this part renders through.
    pub camera: CameraParams,
    /// Opaque batches, drawn first with depth writes.
    pub opaque: Vec<DrawBatch>,
    /// Transparent batches, drawn after opaque with blending on.
    pub transparent: Vec<DrawBatch>,
    /// Lights visible to this camera, capped at the shader limit.
    pub lights: Vec<FrameLight>,
}

impl RenderPart {
    /// Part for a camera with nothing collected yet.
    pub fn new(camera: CameraParams) -> Self {
        Self {
            camera,
            opaque: Vec::new(),
            transparent: Vec::new(),
            lights: Vec::new(),
        }
    }

    /// Total batches in both lists.
    pub fn batch_count(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    /// Total instances in both lists.
    pub fn instance_count(&self) -> usize {
        self.opaque
            .iter()
            .chain(self.transparent.iter())
            .map(DrawBatch::instance_count)
            .sum()
    }
}

/// Counters accumulated while building a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Cameras that produced a part.
    pub cameras: usize,
    /// Batches across all parts.
    pub batches: usize,
    /// Instances across all parts.
    pub instances: usize,
    /// Renderables skipped because no camera mask matched.
    pub culled: usize,
}

/// One fully built frame.
#[derive(Debug, Clone, Default)]
pub struct RenderFrame {
    /// Monotonic frame counter from the logical thread.
    pub frame_number: u64,
    /// Simulation time at production, seconds.
    pub simulation_time: f64,
    /// Parts in camera z-order.
    pub parts: Vec<RenderPart>,
    /// Production counters.
    pub stats: FrameStats,
}

impl RenderFrame {
    /// Empty frame with a number and timestamp.
    pub fn new(frame_number: u64, simulation_time: f64) -> Self {
        Self {
            frame_number,
            simulation_time,
            parts: Vec::new(),
            stats: FrameStats::default(),
        }
    }

    /// Add a part and fold its counts into the stats.
    pub fn push_part(&mut self, part: RenderPart) {
        self.stats.cameras += 1;
        self.stats.batches += part.batch_count();
        self.stats.instances += part.instance_count();
        self.parts.push(part);
    }
}

use std::sync::Arc;

use silkweed_core::math::Mat4;
use silkweed_graphics::{
    CameraMask, CameraParams, Color, LightBlock, MaterialEntry, MeshEntry, Projection, Rect,
};

/// Camera component. The view matrix is not stored here; it comes from the
/// entity's world transform at frame production time.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub projection: Projection,
    /// Layers this camera draws.
    pub mask: CameraMask,
    /// Cameras draw in ascending z-order; ties keep storage order.
    pub z_order: i32,
    pub clear_color: Color,
    /// Distance at which world fog saturates.
    pub fog_distance: f32,
    /// Sub-rectangle of the target to render into; full target when absent.
    pub view_rect: Option<Rect>,
}

impl Camera {
    /// Snapshot into frame parameters using the given world-to-view matrix.
    pub fn params(&self, view: Mat4) -> CameraParams {
        CameraParams {
            view,
            projection: self.projection,
            mask: self.mask,
            z_order: self.z_order,
            clear_color: self.clear_color,
            fog_distance: self.fog_distance,
            view_rect: self.view_rect,
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        let params = CameraParams::default();
        Self {
            projection: params.projection,
            mask: params.mask,
            z_order: params.z_order,
            clear_color: params.clear_color,
            fog_distance: params.fog_distance,
            view_rect: params.view_rect,
        }
    }
}

/// Draws a mesh with a material at the entity's world transform.
///
/// Entities referencing the same entries batch together; sharing the `Arc`s
/// is what makes a hundred crates one draw.
#[derive(Clone)]
pub struct MeshRenderer {
    pub material: Arc<MaterialEntry>,
    pub mesh: Arc<MeshEntry>,
    /// Layers this renderable belongs to, matched against camera masks.
    pub layers: CameraMask,
}

impl MeshRenderer {
    pub fn new(material: Arc<MaterialEntry>, mesh: Arc<MeshEntry>) -> Self {
        Self {
            material,
            mesh,
            layers: CameraMask::default(),
        }
    }

    #[must_use]
    pub fn with_layers(mut self, layers: CameraMask) -> Self {
        self.layers = layers;
        self
    }
}

impl std::fmt::Debug for MeshRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshRenderer")
            .field("material", &self.material.name())
            .field("layers", &self.layers)
            .finish()
    }
}

/// Emits light from the entity's world position.
///
/// The cast shape and color live in the shared [`LightBlock`]; retuning the
/// block retunes every entity referencing it.
#[derive(Debug, Clone)]
pub struct LightSource {
    pub block: Arc<LightBlock>,
}

impl LightSource {
    pub fn new(block: Arc<LightBlock>) -> Self {
        Self { block }
    }
}

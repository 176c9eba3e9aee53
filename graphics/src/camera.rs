//! Camera parameters and the layer mask policy.

use bitflags::bitflags;
use silkweed_core::math::{Mat4, orthographic_gl, perspective_gl};

use crate::types::{Color, Rect};

bitflags! {
    /// Layer mask matching renderables to cameras.
    ///
    /// A renderable is drawn by a camera when the two masks intersect.
    /// The low half is conventionally world geometry and the high half
    /// overlay layers; [`CameraMaskPolicy`] decides what that split means
    /// for depth testing and fog.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CameraMask: u32 {
        /// Default world layer.
        const WORLD = 1 << 0;
        /// Terrain fragments.
        const TERRAIN = 1 << 1;
        /// Props and decorations.
        const PROPS = 1 << 2;
        /// Sky dome, drawn with the world but last among it.
        const SKY = 1 << 15;
        /// Screen-space HUD.
        const HUD = 1 << 16;
        /// Overlay map.
        const MAP = 1 << 17;
    }
}

impl Default for CameraMask {
    fn default() -> Self {
        CameraMask::WORLD
    }
}

/// Policy for interpreting the camera mask split.
///
/// The split is configuration, not protocol: `world_bits` names the bit
/// range whose cameras get depth testing and scene fog, and everything
/// outside it renders as an overlay with depth testing off and the fixed
/// `hud_fog_distance` pushed to the fog uniform so overlay pixels are
/// never fogged out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMaskPolicy {
    /// Bits whose cameras render world geometry.
    pub world_bits: u32,
    /// Fog distance substituted for overlay-only cameras.
    pub hud_fog_distance: f32,
}

impl Default for CameraMaskPolicy {
    fn default() -> Self {
        Self {
            world_bits: 0x0000_FFFF,
            hud_fog_distance: 10.0,
        }
    }
}

impl CameraMaskPolicy {
    /// Whether a camera with this mask renders world geometry.
    pub fn is_world(&self, mask: CameraMask) -> bool {
        mask.bits() & self.world_bits != 0
    }
}

/// Projection half of a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection from a vertical field of view.
    Perspective {
        /// Vertical field of view in radians.
        yfov: f32,
        /// Near clip distance.
        znear: f32,
        /// Far clip distance.
        zfar: f32,
    },
    /// Orthographic projection from a vertical half height.
    Orthographic {
        /// Half the vertical extent in world units.
        half_height: f32,
        /// Near clip distance.
        znear: f32,
        /// Far clip distance.
        zfar: f32,
    },
}

impl Projection {
    /// Projection matrix for a target with the given aspect ratio.
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        match *self {
            Projection::Perspective { yfov, znear, zfar } => {
                perspective_gl(yfov, aspect, znear, zfar)
            }
            Projection::Orthographic {
                half_height,
                znear,
                zfar,
            } => {
                let half_width = half_height * aspect;
                orthographic_gl(-half_width, half_width, -half_height, half_height, znear, zfar)
            }
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            yfov: std::f32::consts::FRAC_PI_3,
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

/// Snapshot of one camera taken at frame production time.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraParams {
    /// World-to-view matrix.
    pub view: Mat4,
    /// Projection parameters, resolved against the target aspect at draw time.
    pub projection: Projection,
    /// Layers this camera draws.
    pub mask: CameraMask,
    /// Cameras draw in ascending z-order; ties keep insertion order.
    pub z_order: i32,
    /// Color the first part of the frame clears to.
    pub clear_color: Color,
    /// Distance at which world fog saturates.
    pub fog_distance: f32,
    /// Sub-rectangle of the target to render into; full target when absent.
    pub view_rect: Option<Rect>,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            view: Mat4::identity(),
            projection: Projection::default(),
            mask: CameraMask::default(),
            z_order: 0,
            clear_color: Color::BLACK,
            fog_distance: 300.0,
            view_rect: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_splits_low_and_high_bits() {
        let policy = CameraMaskPolicy::default();
        assert!(policy.is_world(CameraMask::WORLD));
        assert!(policy.is_world(CameraMask::SKY));
        assert!(policy.is_world(CameraMask::WORLD | CameraMask::HUD));
        assert!(!policy.is_world(CameraMask::HUD));
        assert!(!policy.is_world(CameraMask::HUD | CameraMask::MAP));
    }

    #[test]
    fn orthographic_matrix_scales_with_aspect() {
        let projection = Projection::Orthographic {
            half_height: 2.0,
            znear: 0.1,
            zfar: 10.0,
        };
        let m = projection.matrix(2.0);
        // A point at x = half_width must land on the right clip edge.
        let edge = m * silkweed_core::math::Vec4::new(4.0, 0.0, -1.0, 1.0);
        assert!((edge.x / edge.w - 1.0).abs() < 1e-5);
    }
}

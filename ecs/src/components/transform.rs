//! Local and world-space transforms.

use silkweed_core::math::{
    Mat4, Quat, Vec3, mat4_from_scale_rotation_translation, mat4_translation, quat_look_toward,
    quat_rotate_vec3,
};

/// Position, rotation, and scale relative to the parent (or to the world for
/// hierarchy roots).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_translation(Vec3::new(x, y, z))
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::identity()
        }
    }

    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            scale,
            ..Self::identity()
        }
    }

    #[must_use]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Rotate so the local -Z axis points at `target`.
    #[must_use]
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        let dir = target - self.translation;
        if dir.norm_squared() > f32::EPSILON {
            self.rotation = quat_look_toward(dir, up);
        }
        self
    }

    /// Matrix mapping local space into the parent's space.
    pub fn matrix(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Local -Z axis expressed in parent space.
    pub fn forward(&self) -> Vec3 {
        quat_rotate_vec3(self.rotation, Vec3::new(0.0, 0.0, -1.0))
    }

    pub fn up(&self) -> Vec3 {
        quat_rotate_vec3(self.rotation, Vec3::new(0.0, 1.0, 0.0))
    }

    pub fn right(&self) -> Vec3 {
        quat_rotate_vec3(self.rotation, Vec3::new(1.0, 0.0, 0.0))
    }

    /// Apply the transform to a point in local space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        quat_rotate_vec3(self.rotation, point.component_mul(&self.scale)) + self.translation
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// World-space transform, recomputed from [`Transform`] and the hierarchy
/// once per tick (twice on ticks where physics moved something).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransform(Mat4);

impl GlobalTransform {
    pub fn identity() -> Self {
        Self(Mat4::identity())
    }

    pub fn matrix(&self) -> Mat4 {
        self.0
    }

    pub fn translation(&self) -> Vec3 {
        mat4_translation(&self.0)
    }

    /// World-space -Z axis.
    pub fn forward(&self) -> Vec3 {
        let axis = Vec3::new(self.0[(0, 2)], self.0[(1, 2)], self.0[(2, 2)]);
        if axis.norm_squared() <= f32::EPSILON {
            return Vec3::new(0.0, 0.0, -1.0);
        }
        -axis.normalize()
    }

    /// Compose with a child's local transform.
    #[must_use]
    pub fn mul_local(&self, local: &Transform) -> GlobalTransform {
        GlobalTransform(self.0 * local.matrix())
    }

    /// View matrix for a camera carrying this world transform.
    pub fn view_matrix(&self) -> Mat4 {
        self.0.try_inverse().unwrap_or_else(Mat4::identity)
    }
}

impl Default for GlobalTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Transform> for GlobalTransform {
    fn from(transform: Transform) -> Self {
        Self(transform.matrix())
    }
}

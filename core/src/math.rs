//! Math aliases over [`nalgebra`] plus the handful of helpers the engine
//! needs.
//!
//! All rendering math is f32. Projection helpers use the OpenGL clip-space
//! convention (depth range [-1, 1]).

pub use nalgebra;

/// Two-component f32 vector.
pub type Vec2 = nalgebra::Vector2<f32>;

/// Three-component f32 vector.
pub type Vec3 = nalgebra::Vector3<f32>;

/// Four-component f32 vector.
pub type Vec4 = nalgebra::Vector4<f32>;

/// Column-major 4x4 f32 matrix.
pub type Mat4 = nalgebra::Matrix4<f32>;

/// f32 quaternion, `[x, y, z, w]` in memory. `Quaternion::new` takes `w`
/// first, so prefer [`quat_from_xyzw`].
pub type Quat = nalgebra::Quaternion<f32>;

/// Compose scale, rotation and translation into one 4x4 transform,
/// applied in that order.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    let rot = nalgebra::UnitQuaternion::new_unchecked(rotation).to_homogeneous();
    let mut m = rot * Mat4::new_nonuniform_scaling(&scale);
    m[(0, 3)] = translation.x;
    m[(1, 3)] = translation.y;
    m[(2, 3)] = translation.z;
    m
}

/// 4x4 matrix that only translates.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Extract the translation column of a 4x4 transform.
pub fn mat4_translation(m: &Mat4) -> Vec3 {
    Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// Right-handed perspective projection, OpenGL depth range [-1, 1].
pub fn perspective_gl(yfov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    nalgebra::Perspective3::new(aspect, yfov, znear, zfar).to_homogeneous()
}

/// Right-handed orthographic projection, OpenGL depth range [-1, 1].
pub fn orthographic_gl(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    nalgebra::Orthographic3::new(left, right, bottom, top, near, far).to_homogeneous()
}

/// View matrix looking from `eye` toward `target`, right-handed.
pub fn look_at_rh(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4 {
    nalgebra::Isometry3::look_at_rh(
        &nalgebra::Point3::from(*eye),
        &nalgebra::Point3::from(*target),
        up,
    )
    .to_homogeneous()
}

/// Quaternion from explicit `x, y, z, w` components.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    nalgebra::Quaternion::new(w, x, y, z)
}

/// Quaternion for a rotation of `angle` radians about the X axis.
pub fn quat_from_rotation_x(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::x_axis(), angle).into_inner()
}

/// Quaternion for a rotation of `angle` radians about the Y axis.
pub fn quat_from_rotation_y(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::y_axis(), angle).into_inner()
}

/// Quaternion for a rotation of `angle` radians about the Z axis.
pub fn quat_from_rotation_z(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::z_axis(), angle).into_inner()
}

/// Quaternion rotating by `angle` radians around `axis`.
///
/// The axis does not need to be normalized.
pub fn quat_from_axis_angle(axis: Vec3, angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Unit::new_normalize(axis), angle)
        .into_inner()
}

/// Quaternion whose local -Z axis points along `forward`.
///
/// Follows the camera convention where forward is -Z and `up` steers roll.
pub fn quat_look_toward(forward: Vec3, up: Vec3) -> Quat {
    nalgebra::UnitQuaternion::face_towards(&(-forward), &up).into_inner()
}

/// Apply a quaternion rotation to a vector.
pub fn quat_rotate_vec3(q: Quat, v: Vec3) -> Vec3 {
    nalgebra::UnitQuaternion::new_unchecked(q) * v
}

/// Convert a 4x4 matrix to a column-major `[f32; 16]` array (GL uniform layout).
pub fn mat4_to_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn trs_with_identity_parts_is_identity() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::repeat(1.0),
            Quat::identity(),
            Vec3::zeros(),
        );
        assert!((m - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn trs_applies_scale_then_rotation_then_translation() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::repeat(2.0),
            quat_from_rotation_y(FRAC_PI_2),
            Vec3::new(10.0, 0.0, 0.0),
        );
        // +Z scales to length 2, turns onto +X, then shifts by 10.
        let p = m * Vec4::new(0.0, 0.0, 1.0, 1.0);
        assert!((p.xyz() - Vec3::new(12.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn translation_round_trips() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let m = mat4_from_translation(t);
        assert_eq!(mat4_translation(&m), t);
        let p = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(p.xyz(), t);
    }

    #[test]
    fn quarter_turn_about_y() {
        let q = quat_from_rotation_y(FRAC_PI_2);
        let v = quat_rotate_vec3(q, Vec3::z());
        assert!((v - Vec3::x()).norm() < 1e-5);
    }

    #[test]
    fn axis_angle_matches_axis_constructor() {
        let a = quat_from_axis_angle(Vec3::new(0.0, 2.0, 0.0), FRAC_PI_2);
        let b = quat_from_rotation_y(FRAC_PI_2);
        assert!((a - b).norm() < 1e-6);
    }

    #[test]
    fn look_toward_faces_target() {
        let q = quat_look_toward(Vec3::new(1.0, 0.0, 0.0), Vec3::y());
        let forward = quat_rotate_vec3(q, Vec3::new(0.0, 0.0, -1.0));
        assert!((forward - Vec3::new(1.0, 0.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn perspective_maps_near_plane_to_minus_one() {
        let proj = perspective_gl(FRAC_PI_2, 1.0, 0.1, 100.0);
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((near.z / near.w - (-1.0)).abs() < 1e-4);
        let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn look_at_moves_eye_to_origin() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let view = look_at_rh(&eye, &Vec3::zeros(), &Vec3::y());
        let p = view * Vec4::new(0.0, 0.0, 5.0, 1.0);
        assert!(p.xyz().norm() < 1e-5);
    }

    #[test]
    fn mat4_array_is_column_major() {
        let m = mat4_from_translation(Vec3::new(7.0, 8.0, 9.0));
        let a = mat4_to_array(&m);
        assert_eq!(a[12], 7.0);
        assert_eq!(a[13], 8.0);
        assert_eq!(a[14], 9.0);
        assert_eq!(a[15], 1.0);
    }
}

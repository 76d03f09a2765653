pub mod aabb;
pub mod frustum;

pub use aabb::Aabb;
pub use frustum::FrustumCuller;

use glam::{Mat4, Vec3};

/// Maps clip coordinates from [-1, 1] to [0, 1] so shadow projections can be
/// sampled directly as texture coordinates.
pub fn make_bias_matrix() -> Mat4 {
    Mat4::from_translation(Vec3::splat(0.5)) * Mat4::from_scale(Vec3::splat(0.5))
}

/// Right-handed perspective with the depth range reversed (near -> 1, far -> 0).
/// Reversed depth spreads floating point precision evenly across the frustum.
pub fn make_reversed_perspective(fov_y: f32, aspect: f32, z_near: f32, z_far: f32) -> Mat4 {
    let flip_z = Mat4::from_translation(Vec3::new(0.0, 0.0, 1.0))
        * Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0));
    flip_z * Mat4::perspective_rh(fov_y, aspect, z_near, z_far)
}

/// Off-center perspective frustum, [0, 1] depth. The bounds describe the
/// window on the near plane.
pub fn make_frustum_matrix(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    z_near: f32,
    z_far: f32,
) -> Mat4 {
    use glam::Vec4;
    Mat4::from_cols(
        Vec4::new(2.0 * z_near / (right - left), 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * z_near / (top - bottom), 0.0, 0.0),
        Vec4::new(
            (right + left) / (right - left),
            (top + bottom) / (top - bottom),
            z_far / (z_near - z_far),
            -1.0,
        ),
        Vec4::new(0.0, 0.0, z_near * z_far / (z_near - z_far), 0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn bias_matrix_maps_ndc_to_texture_space() {
        let bias = make_bias_matrix();
        let low = bias * Vec4::new(-1.0, -1.0, -1.0, 1.0);
        let high = bias * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert!(low.truncate().abs_diff_eq(glam::Vec3::ZERO, 1e-6));
        assert!(high.truncate().abs_diff_eq(glam::Vec3::ONE, 1e-6));
    }

    #[test]
    fn reversed_perspective_swaps_near_and_far_depth() {
        let proj = make_reversed_perspective(60f32.to_radians(), 1.0, 0.1, 100.0);
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w - 1.0).abs() < 1e-5);
        assert!((far.z / far.w).abs() < 1e-5);
    }

    #[test]
    fn frustum_matrix_matches_symmetric_perspective() {
        let fov = 90f32.to_radians();
        let near = 0.5;
        let half = near * (fov * 0.5).tan();
        let frustum = make_frustum_matrix(-half, half, -half, half, near, 50.0);
        let perspective = Mat4::perspective_rh(fov, 1.0, near, 50.0);
        assert!(frustum.abs_diff_eq(perspective, 1e-5));
    }
}

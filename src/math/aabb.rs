use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn unit() -> Self {
        Self {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// World-space bounds of the box after applying `matrix`. Transforms all
    /// eight corners, so rotated boxes stay conservative rather than exact.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for corner in corners {
            let p = matrix.transform_point3(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_scales_and_translates() {
        let aabb = Aabb::unit();
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)) * Mat4::from_scale(Vec3::splat(2.0));
        let out = aabb.transformed(m);
        assert!(out.min.abs_diff_eq(Vec3::new(0.0, 1.0, 2.0), 1e-6));
        assert!(out.max.abs_diff_eq(Vec3::new(2.0, 3.0, 4.0), 1e-6));
    }

    #[test]
    fn rotated_box_stays_conservative() {
        let aabb = Aabb::unit();
        let m = Mat4::from_rotation_y(45f32.to_radians());
        let out = aabb.transformed(m);
        let extent = 2f32.sqrt() * 0.5;
        assert!((out.max.x - extent).abs() < 1e-5);
        assert!((out.max.z - extent).abs() < 1e-5);
        assert!((out.max.y - 0.5).abs() < 1e-6);
    }
}

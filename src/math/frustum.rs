use glam::{Mat4, Vec3, Vec4};

/// View frustum extracted from a view-projection matrix, used to reject
/// render units whose bounding box falls fully outside the camera.
#[derive(Clone, Copy, Debug)]
pub struct FrustumCuller {
    planes: [Vec4; 6],
}

impl FrustumCuller {
    /// Gribb-Hartmann plane extraction. Works for perspective and
    /// orthographic matrices alike; planes are left unnormalized since only
    /// the sign of the distance matters for the visibility test.
    pub fn new(view_proj: Mat4) -> Self {
        let m = view_proj.transpose();
        let planes = [
            m.w_axis + m.x_axis, // left
            m.w_axis - m.x_axis, // right
            m.w_axis + m.y_axis, // bottom
            m.w_axis - m.y_axis, // top
            m.w_axis + m.z_axis, // near
            m.w_axis - m.z_axis, // far
        ];
        Self { planes }
    }

    pub fn is_aabb_visible(&self, min: Vec3, max: Vec3) -> bool {
        for plane in &self.planes {
            // positive vertex: the box corner furthest along the plane normal
            let p = Vec3::new(
                if plane.x >= 0.0 { max.x } else { min.x },
                if plane.y >= 0.0 { max.y } else { min.y },
                if plane.z >= 0.0 { max.z } else { min.z },
            );
            if plane.truncate().dot(p) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }
}

impl Default for FrustumCuller {
    fn default() -> Self {
        // an identity matrix accepts everything inside the unit cube and is a
        // safe stand-in before the first camera submission
        Self::new(Mat4::IDENTITY)
    }
}

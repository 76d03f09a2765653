use glam::{Mat4, Vec3};

use crate::math::make_reversed_perspective;
use crate::resources::{CubeMapHandle, GpuResources, TextureFormat, TextureHandle};

/// Number of shadow cascades every directional light carries.
pub const CASCADE_COUNT: usize = 3;

/// Directional light with cascaded orthographic shadow projections. The
/// cascade matrices are recomputed per frame around a world-space center,
/// normally the viewport camera position.
#[derive(Clone, Debug)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub ambient_intensity: f32,
    /// Half-extent of each cascade's orthographic box, near to far.
    pub projections: [f32; CASCADE_COUNT],
    pub depth_textures: [TextureHandle; CASCADE_COUNT],
    /// When set, the light recenters on the viewport camera every frame and
    /// the value is the update interval in seconds.
    pub follow_viewport: Option<f32>,
    shadow_map_size: u32,
}

impl DirectionalLight {
    pub fn new(resources: &mut GpuResources, shadow_map_size: u32) -> Self {
        let shadow_map_size = shadow_map_size.max(1);
        let depth_textures = std::array::from_fn(|i| {
            resources.create_texture(
                format!("DirectionalLightDepth{}", i),
                shadow_map_size,
                shadow_map_size,
                TextureFormat::Depth,
            )
        });
        Self {
            direction: Vec3::new(0.5, 1.0, 0.5),
            color: Vec3::ONE,
            intensity: 1.0,
            ambient_intensity: 0.3,
            projections: [15.0, 60.0, 300.0],
            depth_textures,
            follow_viewport: None,
            shadow_map_size,
        }
    }

    pub fn shadow_map_size(&self) -> u32 {
        self.shadow_map_size
    }

    fn view_basis(&self) -> Mat4 {
        // tiny offsets keep look_at well defined for a straight-down light
        Mat4::look_at_rh(
            self.direction,
            Vec3::new(0.0, 0.0, 0.00001),
            Vec3::new(0.0, 1.0, 0.00001),
        )
    }

    /// Cascade box in light space, quantized to the shadow-map texel grid so
    /// the shadow edge does not shimmer as the center moves.
    pub fn cascade_bounds(&self, center: Vec3, index: usize) -> (Vec3, Vec3) {
        let extent = self.projections[index];
        let texel = 2.0 * extent / self.shadow_map_size as f32;
        let c = self.view_basis().transform_point3(center);
        let snapped = Vec3::new(
            (c.x / texel).floor() * texel,
            (c.y / texel).floor() * texel,
            (c.z / texel).floor() * texel,
        );
        (snapped - Vec3::splat(extent), snapped + Vec3::splat(extent))
    }

    /// Light-space view-projection matrix for one cascade.
    pub fn matrix(&self, center: Vec3, index: usize) -> Mat4 {
        let (low, high) = self.cascade_bounds(center, index);
        let projection =
            Mat4::orthographic_rh(low.x, high.x, low.y, high.y, -high.z, -low.z);
        projection * self.view_basis()
    }
}

/// Omnidirectional light. A shadow-casting point light renders the caster
/// set into all six faces of a depth cube map.
#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub ambient_intensity: f32,
    radius: f32,
    pub shadow_map: Option<CubeMapHandle>,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            ambient_intensity: 0.0,
            radius: 5.0,
            shadow_map: None,
        }
    }
}

impl PointLight {
    pub fn casts_shadows(&self) -> bool {
        self.shadow_map.is_some()
    }

    /// Allocates the depth cube map. Shadowed point lights are drawn one by
    /// one; lights without a map go through the instanced path instead.
    pub fn enable_shadows(&mut self, resources: &mut GpuResources, size: u32) {
        if self.shadow_map.is_none() {
            self.shadow_map = Some(resources.create_cube_map(
                "PointLightDepth",
                size.max(1),
                TextureFormat::Depth,
            ));
        }
    }

    pub fn disable_shadows(&mut self) {
        self.shadow_map = None;
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.0);
    }

    /// View-projection for one cube-map face, 0..6 in +X -X +Y -Y +Z -Z order.
    pub fn matrix(&self, face: usize, position: Vec3) -> Mat4 {
        let (target, up) = match face {
            0 => (Vec3::X, -Vec3::Y),
            1 => (-Vec3::X, -Vec3::Y),
            2 => (Vec3::Y, Vec3::Z),
            3 => (-Vec3::Y, -Vec3::Z),
            4 => (Vec3::Z, -Vec3::Y),
            5 => (-Vec3::Z, -Vec3::Y),
            _ => panic!("cube map face index out of range: {face}"),
        };
        let projection =
            Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, self.radius.max(0.1));
        let view = Mat4::look_at_rh(position, position + target, up);
        projection * view
    }

    /// Model matrix of the light-volume sphere used during the light pass.
    pub fn sphere_transform(&self, position: Vec3) -> Mat4 {
        Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(self.radius))
    }
}

/// Cone-shaped light. Angles are stored in radians; the outer angle bounds
/// the cone and the inner angle bounds the fully lit core.
#[derive(Clone, Copy, Debug)]
pub struct SpotLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub ambient_intensity: f32,
    inner_angle: f32,
    outer_angle: f32,
    max_distance: f32,
    pub shadow_map: Option<TextureHandle>,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.0, -1.0, 0.0),
            color: Vec3::ONE,
            intensity: 1.0,
            ambient_intensity: 0.0,
            inner_angle: 25f32.to_radians(),
            outer_angle: 35f32.to_radians(),
            max_distance: 10.0,
            shadow_map: None,
        }
    }
}

impl SpotLight {
    pub fn casts_shadows(&self) -> bool {
        self.shadow_map.is_some()
    }

    pub fn enable_shadows(&mut self, resources: &mut GpuResources, size: u32) {
        if self.shadow_map.is_none() {
            self.shadow_map = Some(resources.create_texture(
                "SpotLightDepth",
                size.max(1),
                size.max(1),
                TextureFormat::Depth,
            ));
        }
    }

    pub fn disable_shadows(&mut self) {
        self.shadow_map = None;
    }

    pub fn inner_angle(&self) -> f32 {
        self.inner_angle
    }

    pub fn outer_angle(&self) -> f32 {
        self.outer_angle
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    pub fn set_outer_angle(&mut self, angle: f32) {
        self.outer_angle = angle.clamp(0.001, std::f32::consts::FRAC_PI_2);
        self.inner_angle = self.inner_angle.min(self.outer_angle);
    }

    pub fn set_inner_angle(&mut self, angle: f32) {
        self.inner_angle = angle.clamp(0.0, self.outer_angle);
    }

    pub fn set_max_distance(&mut self, distance: f32) {
        self.max_distance = distance.max(0.0);
    }

    pub fn inner_cos(&self) -> f32 {
        self.inner_angle.cos()
    }

    pub fn outer_cos(&self) -> f32 {
        self.outer_angle.cos()
    }

    /// Shadow-map view-projection covering the full cone.
    pub fn matrix(&self, position: Vec3) -> Mat4 {
        let fov = (2.0 * self.outer_angle).min(std::f32::consts::PI - 0.001);
        let projection = make_reversed_perspective(fov, 1.0, 0.1, self.max_distance.max(0.1));
        let view = Mat4::look_at_rh(
            position,
            position + self.direction,
            Vec3::new(0.0, 1.0, 0.00001),
        );
        projection * view
    }

    /// Model matrix of the light-volume pyramid used during the light pass.
    /// The unit pyramid has apex at the origin and a 45 degree half angle.
    pub fn pyramid_transform(&self, position: Vec3) -> Mat4 {
        let base = self.max_distance * self.outer_angle.tan();
        let scale = Vec3::new(base, base, self.max_distance);
        let rotation = rotation_to(Vec3::new(0.0, 0.0, -1.0), self.direction);
        Mat4::from_translation(position) * rotation * Mat4::from_scale(scale)
    }
}

fn rotation_to(from: Vec3, to: Vec3) -> Mat4 {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from.dot(to) < -0.9999 {
        // opposite vectors, rotate half a turn around any orthogonal axis
        let axis = from.cross(Vec3::X).normalize_or(Vec3::Y);
        return Mat4::from_axis_angle(axis, std::f32::consts::PI);
    }
    Mat4::from_quat(glam::Quat::from_rotation_arc(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiple_of(value: f32, step: f32) -> bool {
        let ratio = value / step;
        (ratio - ratio.round()).abs() < 1e-3
    }

    #[test]
    fn cascade_planes_land_on_texel_grid() {
        let mut resources = GpuResources::new();
        let light = DirectionalLight::new(&mut resources, 2048);
        let centers = [
            Vec3::new(0.3, 1.7, -4.2),
            Vec3::new(105.77, -3.01, 88.88),
            Vec3::ZERO,
        ];
        for center in centers {
            for index in 0..CASCADE_COUNT {
                let extent = light.projections[index];
                let texel = 2.0 * extent / light.shadow_map_size() as f32;
                let (low, high) = light.cascade_bounds(center, index);
                for plane in [low.x, low.y, high.x, high.y] {
                    assert!(multiple_of(plane, texel), "plane {plane} texel {texel}");
                }
            }
        }
    }

    #[test]
    fn centers_in_the_same_texel_cell_share_a_cascade_box() {
        let mut resources = GpuResources::new();
        let light = DirectionalLight::new(&mut resources, 2048);
        let texel = 2.0 * light.projections[0] / 2048.0;

        // snapping quantizes the light-space center, so two centers landing
        // in the same floor cell must produce identical bounds
        let to_world = light.view_basis().inverse();
        let a = to_world.transform_point3(Vec3::splat(texel * 10.25));
        let b = to_world.transform_point3(Vec3::splat(texel * 10.75));

        let bounds_a = light.cascade_bounds(a, 0);
        let bounds_b = light.cascade_bounds(b, 0);
        assert!(bounds_a.0.abs_diff_eq(bounds_b.0, 1e-4));
        assert!(bounds_a.1.abs_diff_eq(bounds_b.1, 1e-4));
    }

    #[test]
    fn point_light_radius_never_negative() {
        let mut light = PointLight::default();
        light.set_radius(-3.0);
        assert_eq!(light.radius(), 0.0);
    }

    #[test]
    fn spot_angles_keep_inner_within_outer() {
        let mut light = SpotLight::default();
        light.set_outer_angle(0.4);
        light.set_inner_angle(1.0);
        assert!(light.inner_angle() <= light.outer_angle());
        assert!(light.inner_cos() >= light.outer_cos());

        light.set_outer_angle(0.2);
        assert!(light.inner_angle() <= light.outer_angle());
    }

    #[test]
    fn cube_face_matrices_look_along_each_axis() {
        let light = PointLight::default();
        let position = Vec3::new(1.0, 2.0, 3.0);
        // a point straight ahead of each face projects to the center
        let ahead = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
        for (face, axis) in ahead.into_iter().enumerate() {
            let m = light.matrix(face, position);
            let p = m.project_point3(position + axis * 2.0);
            assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4, "face {face}");
        }
    }
}

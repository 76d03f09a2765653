use glam::{Mat4, Vec3};

use crate::math::{make_frustum_matrix, make_reversed_perspective};
use crate::resources::{
    Attachment, FrameBufferHandle, GpuResources, TextureFormat, TextureHandle,
};

const MIN_FOV_RADIANS: f32 = 10.0 * std::f32::consts::PI / 180.0;
const MAX_FOV_RADIANS: f32 = 150.0 * std::f32::consts::PI / 180.0;

#[derive(Clone, Copy, Debug)]
pub enum CameraProjection {
    Perspective {
        fov: f32,
        aspect: f32,
        z_near: f32,
        z_far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    },
    Frustum {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    },
}

/// Camera with lazily cached matrices. Mutating the projection parameters,
/// the zoom or the view only sets a dirty flag; the products are rebuilt on
/// the next `matrix()` call.
#[derive(Clone, Debug)]
pub struct Camera {
    kind: CameraProjection,
    zoom: f32,
    view: Mat4,
    projection: Mat4,
    matrix: Mat4,
    update_projection: bool,
    update_matrix: bool,
}

impl Camera {
    pub fn new(kind: CameraProjection) -> Self {
        Self {
            kind,
            zoom: 1.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            matrix: Mat4::IDENTITY,
            update_projection: true,
            update_matrix: true,
        }
    }

    pub fn perspective(fov: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        Self::new(CameraProjection::Perspective {
            fov,
            aspect,
            z_near,
            z_far,
        })
    }

    pub fn orthographic(extent: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        Self::new(CameraProjection::Orthographic {
            left: -extent * aspect,
            right: extent * aspect,
            bottom: -extent,
            top: extent,
            z_near,
            z_far,
        })
    }

    pub fn is_perspective(&self) -> bool {
        matches!(self.kind, CameraProjection::Perspective { .. })
    }

    pub fn projection_kind(&self) -> CameraProjection {
        self.kind
    }

    pub fn set_projection(&mut self, kind: CameraProjection) {
        self.kind = kind;
        self.update_projection = true;
        self.update_matrix = true;
    }

    pub fn set_aspect(&mut self, value: f32) {
        if let CameraProjection::Perspective { ref mut aspect, .. } = self.kind {
            *aspect = value;
            self.update_projection = true;
            self.update_matrix = true;
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(0.001);
        self.update_projection = true;
        self.update_matrix = true;
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
        self.update_matrix = true;
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn needs_projection_update(&self) -> bool {
        self.update_projection
    }

    pub fn needs_matrix_update(&self) -> bool {
        self.update_matrix
    }

    pub fn projection(&mut self) -> Mat4 {
        if self.update_projection {
            self.projection = self.build_projection();
            self.update_projection = false;
        }
        self.projection
    }

    pub fn matrix(&mut self) -> Mat4 {
        if self.update_projection {
            self.projection = self.build_projection();
            self.update_projection = false;
            self.update_matrix = true;
        }
        if self.update_matrix {
            self.matrix = self.projection * self.view;
            self.update_matrix = false;
        }
        self.matrix
    }

    fn build_projection(&self) -> Mat4 {
        match self.kind {
            CameraProjection::Perspective {
                fov,
                aspect,
                z_near,
                z_far,
            } => {
                let fov = (self.zoom * fov).clamp(MIN_FOV_RADIANS, MAX_FOV_RADIANS);
                make_reversed_perspective(fov, aspect, z_near, z_far)
            }
            CameraProjection::Orthographic {
                left,
                right,
                bottom,
                top,
                z_near,
                z_far,
            } => Mat4::orthographic_rh(
                left * self.zoom,
                right * self.zoom,
                bottom * self.zoom,
                top * self.zoom,
                z_near,
                z_far,
            ),
            CameraProjection::Frustum {
                left,
                right,
                bottom,
                top,
                z_near,
                z_far,
            } => make_frustum_matrix(
                left * self.zoom,
                right * self.zoom,
                bottom * self.zoom,
                top * self.zoom,
                z_near,
                z_far,
            ),
        }
    }
}

/// Render targets owned by one camera: the geometry buffer plus the HDR
/// ping-pong pair and the final output.
#[derive(Clone, Copy, Debug)]
pub struct CameraTargets {
    pub gbuffer: FrameBufferHandle,
    pub albedo: TextureHandle,
    pub normal: TextureHandle,
    pub material: TextureHandle,
    pub depth: TextureHandle,
    pub hdr: TextureHandle,
    pub swap_hdr: TextureHandle,
    pub output: TextureHandle,
    pub average_white: TextureHandle,
}

impl CameraTargets {
    pub fn new(resources: &mut GpuResources, width: u32, height: u32) -> Self {
        let albedo = resources.create_texture("CameraAlbedo", width, height, TextureFormat::Rgba8);
        let normal = resources.create_texture("CameraNormal", width, height, TextureFormat::Rgba16F);
        let material =
            resources.create_texture("CameraMaterial", width, height, TextureFormat::Rgba8);
        let depth = resources.create_texture("CameraDepth", width, height, TextureFormat::Depth);
        let hdr = resources.create_texture("CameraHDR", width, height, TextureFormat::Rgba16F);
        let swap_hdr =
            resources.create_texture("CameraSwapHDR", width, height, TextureFormat::Rgba16F);
        let output = resources.create_texture("CameraOutput", width, height, TextureFormat::Rgba8);
        let average_white =
            resources.create_texture("CameraAverageWhite", 1, 1, TextureFormat::Rgba16F);

        let gbuffer = resources.create_framebuffer("CameraGBuffer", width, height);
        resources.attach_texture(gbuffer, albedo, Attachment::Color0);
        resources.attach_texture(gbuffer, normal, Attachment::Color1);
        resources.attach_texture(gbuffer, material, Attachment::Color2);
        resources.attach_texture(gbuffer, depth, Attachment::Depth);

        Self {
            gbuffer,
            albedo,
            normal,
            material,
            depth,
            hdr,
            swap_hdr,
            output,
            average_white,
        }
    }
}

/// Drives a `Camera` from a position and a pair of spherical angles, and
/// owns the camera's render targets.
pub struct CameraController {
    pub camera: Camera,
    pub render_to_texture: bool,
    targets: CameraTargets,
    direction: Vec3,
    up: Vec3,
    forward: Vec3,
    right: Vec3,
    horizontal_angle: f32,
    vertical_angle: f32,
    move_speed: f32,
    rotate_speed: f32,
}

impl CameraController {
    pub fn new(camera: Camera, resources: &mut GpuResources, width: u32, height: u32) -> Self {
        let mut controller = Self {
            camera,
            render_to_texture: true,
            targets: CameraTargets::new(resources, width.max(1), height.max(1)),
            direction: Vec3::new(0.0, 0.0, 1.0),
            up: Vec3::Y,
            forward: Vec3::new(0.0, 0.0, 1.0),
            right: Vec3::new(-1.0, 0.0, 0.0),
            horizontal_angle: 0.0,
            vertical_angle: 0.0,
            move_speed: 1.0,
            rotate_speed: 1.0,
        };
        controller.rotate(0.0, 0.0);
        controller
    }

    pub fn targets(&self) -> &CameraTargets {
        &self.targets
    }

    /// Texture holding the finished frame for this camera.
    pub fn render_texture(&self) -> TextureHandle {
        self.targets.output
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn set_move_speed(&mut self, speed: f32) {
        self.move_speed = speed.max(0.001);
    }

    pub fn rotate_speed(&self) -> f32 {
        self.rotate_speed
    }

    pub fn set_rotate_speed(&mut self, speed: f32) {
        self.rotate_speed = speed.max(0.001);
    }

    pub fn horizontal_angle(&self) -> f32 {
        self.horizontal_angle
    }

    pub fn vertical_angle(&self) -> f32 {
        self.vertical_angle
    }

    /// Free-look rotation in radians, scaled by the rotate speed. The
    /// vertical angle is clamped just short of the poles so the view basis
    /// stays well defined.
    pub fn rotate(&mut self, horizontal: f32, vertical: f32) {
        const TWO_PI: f32 = 2.0 * std::f32::consts::PI;
        const MAX_VERTICAL: f32 = std::f32::consts::FRAC_PI_2 - 0.001;

        self.horizontal_angle =
            (self.horizontal_angle + self.rotate_speed * horizontal).rem_euclid(TWO_PI);
        self.vertical_angle = (self.vertical_angle + self.rotate_speed * vertical)
            .clamp(-MAX_VERTICAL, MAX_VERTICAL);

        let (h, v) = (self.horizontal_angle, self.vertical_angle);
        self.direction = Vec3::new(v.cos() * h.sin(), v.sin(), v.cos() * h.cos());
        self.forward = Vec3::new(h.sin(), 0.0, h.cos());
        self.right = Vec3::new(
            (h - std::f32::consts::FRAC_PI_2).sin(),
            0.0,
            (h - std::f32::consts::FRAC_PI_2).cos(),
        );
    }

    /// Refreshes the view matrix for a world position and returns the
    /// combined camera matrix.
    pub fn matrix_at(&mut self, position: Vec3) -> Mat4 {
        let view = Mat4::look_at_rh(position, position + self.direction, self.up);
        self.camera.set_view(view);
        self.camera.matrix()
    }

    pub fn view_at(&mut self, position: Vec3) -> Mat4 {
        let view = Mat4::look_at_rh(position, position + self.direction, self.up);
        self.camera.set_view(view);
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_is_cached_until_dirty() {
        let mut camera = Camera::perspective(1.0, 16.0 / 9.0, 0.1, 100.0);
        let first = camera.matrix();
        assert!(!camera.needs_matrix_update());
        assert_eq!(first, camera.matrix());

        camera.set_view(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
        assert!(camera.needs_matrix_update());
        assert_ne!(first, camera.matrix());
    }

    #[test]
    fn zoom_clamps_field_of_view() {
        let mut narrow = Camera::perspective(1.0, 1.0, 0.1, 100.0);
        narrow.set_zoom(0.01);
        let mut floor = Camera::perspective(MIN_FOV_RADIANS, 1.0, 0.1, 100.0);
        assert!(narrow.projection().abs_diff_eq(floor.projection(), 1e-6));

        let mut wide = Camera::perspective(1.0, 1.0, 0.1, 100.0);
        wide.set_zoom(100.0);
        let mut ceiling = Camera::perspective(MAX_FOV_RADIANS, 1.0, 0.1, 100.0);
        assert!(wide.projection().abs_diff_eq(ceiling.projection(), 1e-6));
    }

    #[test]
    fn vertical_rotation_is_clamped_at_poles() {
        let mut resources = GpuResources::new();
        let camera = Camera::perspective(1.0, 1.0, 0.1, 100.0);
        let mut controller = CameraController::new(camera, &mut resources, 64, 64);
        controller.rotate(0.0, 10.0);
        assert!(controller.vertical_angle() < std::f32::consts::FRAC_PI_2);
        assert!(controller.direction().is_finite());
    }

    #[test]
    fn looking_down_z_by_default() {
        let mut resources = GpuResources::new();
        let camera = Camera::perspective(1.0, 1.0, 0.1, 100.0);
        let controller = CameraController::new(camera, &mut resources, 64, 64);
        assert!(controller.direction().abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-6));
    }
}

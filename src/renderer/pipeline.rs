use glam::{Mat3, Mat4, Vec3};

use crate::math::{Aabb, FrustumCuller};
use crate::resources::{CubeMapHandle, FrameBufferHandle, GeometryHandle, TextureHandle};
use crate::scene::{CameraEffects, CameraSsr, CameraToneMapping, Transform};

use super::environment::EnvironmentUnit;
use super::lights::LightingData;
use super::material::MaterialUnit;

/// Per-frame snapshot of one camera. Built fresh by `submit_camera`, cleared
/// at `reset_pipeline`. Effect settings are copied in, an absent copy
/// disables the corresponding passes for this camera.
#[derive(Clone)]
pub struct CameraUnit {
    pub viewport_position: Vec3,
    pub view_projection: Mat4,
    pub inverse_view_projection: Mat4,
    /// View-projection with zero translation, for skybox rendering.
    pub static_view_projection: Mat4,
    pub culler: FrustumCuller,
    pub is_perspective: bool,
    pub gbuffer: FrameBufferHandle,
    pub albedo_texture: TextureHandle,
    pub normal_texture: TextureHandle,
    pub material_texture: TextureHandle,
    pub depth_texture: TextureHandle,
    pub average_white_texture: TextureHandle,
    pub hdr_texture: TextureHandle,
    pub swap_texture: TextureHandle,
    pub output_texture: TextureHandle,
    pub render_to_texture: bool,
    pub inverse_skybox_rotation: Mat3,
    pub skybox_texture: CubeMapHandle,
    pub irradiance_texture: CubeMapHandle,
    pub gamma: f32,
    pub effects: Option<CameraEffects>,
    pub tone_mapping: Option<CameraToneMapping>,
    pub ssr: Option<CameraSsr>,
}

/// One drawable primitive for this frame. `instance_count > 0` marks a
/// GPU-instanced draw which also opts out of frustum culling.
#[derive(Clone, Copy)]
pub struct RenderUnit {
    pub geometry: GeometryHandle,
    pub draw_count: u32,
    pub material_index: usize,
    pub model_matrix: Mat4,
    pub normal_matrix: Mat3,
    pub aabb_min: Vec3,
    pub aabb_max: Vec3,
    pub instance_count: u32,
}

/// Piece of a mesh sharing one material: geometry plus a local transform and
/// the mesh-local bounding box.
#[derive(Clone, Copy)]
pub struct SubMesh {
    pub geometry: GeometryHandle,
    pub draw_count: u32,
    pub aabb: Aabb,
    pub transform: Transform,
}

impl SubMesh {
    pub fn new(geometry: GeometryHandle, draw_count: u32) -> Self {
        Self {
            geometry,
            draw_count,
            aabb: Aabb::unit(),
            transform: Transform::default(),
        }
    }
}

/// All state the controller accumulates between `reset_pipeline` and
/// `end_pipeline`.
pub struct RenderPipeline {
    pub lighting: LightingData,
    pub opaque_units: Vec<RenderUnit>,
    pub transparent_units: Vec<RenderUnit>,
    pub shadow_caster_units: Vec<RenderUnit>,
    pub material_units: Vec<MaterialUnit>,
    pub cameras: Vec<CameraUnit>,
    pub environment: EnvironmentUnit,
}

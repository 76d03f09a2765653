use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::resources::{CubeMapHandle, GeometryHandle, TextureHandle};
use crate::scene::CASCADE_COUNT;

/// Hard cap on directional lights the lighting shader consumes per frame.
/// Excess submissions are kept in the list but ignored at draw time.
pub const MAX_DIR_LIGHT_COUNT: usize = 4;

/// Shadow-casting directional light as submitted for one frame.
#[derive(Clone, Copy, Debug)]
pub struct DirectionalLightUnit {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub ambient_intensity: f32,
    pub shadow_maps: [TextureHandle; CASCADE_COUNT],
    pub projection_matrices: [Mat4; CASCADE_COUNT],
    /// `bias * projection`, sampled directly by lighting shaders.
    pub biased_projection_matrices: [Mat4; CASCADE_COUNT],
}

/// Shadow-casting point light: one depth cube map, six face matrices.
#[derive(Clone, Copy, Debug)]
pub struct PointLightUnit {
    pub instance: PointLightInstance,
    pub shadow_map: CubeMapHandle,
    pub projection_matrices: [Mat4; 6],
}

/// Shadow-casting spot light: one flat depth map.
#[derive(Clone, Copy, Debug)]
pub struct SpotLightUnit {
    pub instance: SpotLightInstance,
    pub shadow_map: TextureHandle,
    pub projection_matrix: Mat4,
    pub biased_projection_matrix: Mat4,
}

/// Per-instance vertex data for the point-light volume draw. Layout matches
/// the instanced vertex buffer consumed by the light shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct PointLightInstance {
    pub transform: [[f32; 4]; 4],
    pub position_radius: [f32; 4],
    pub color_ambient: [f32; 4],
}

impl PointLightInstance {
    pub fn new(transform: Mat4, position: Vec3, radius: f32, color: Vec3, ambient: f32) -> Self {
        Self {
            transform: transform.to_cols_array_2d(),
            position_radius: [position.x, position.y, position.z, radius],
            color_ambient: [color.x, color.y, color.z, ambient],
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(
            self.position_radius[0],
            self.position_radius[1],
            self.position_radius[2],
        )
    }

    pub fn radius(&self) -> f32 {
        self.position_radius[3]
    }
}

/// Per-instance vertex data for the spot-light volume draw.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SpotLightInstance {
    pub transform: [[f32; 4]; 4],
    pub position_inner: [f32; 4],
    pub direction_outer: [f32; 4],
    pub color_ambient: [f32; 4],
}

impl SpotLightInstance {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transform: Mat4,
        position: Vec3,
        inner_cos: f32,
        direction: Vec3,
        outer_cos: f32,
        color: Vec3,
        ambient: f32,
    ) -> Self {
        Self {
            transform: transform.to_cols_array_2d(),
            position_inner: [position.x, position.y, position.z, inner_cos],
            direction_outer: [direction.x, direction.y, direction.z, outer_cos],
            color_ambient: [color.x, color.y, color.z, ambient],
        }
    }
}

/// CPU-side staging list for one kind of non-shadowed light, flushed to the
/// instanced vertex buffer right before the instanced volume draw.
#[derive(Clone, Debug)]
pub struct InstancedLightBuffer<T: Pod> {
    pub instances: Vec<T>,
}

impl<T: Pod> InstancedLightBuffer<T> {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Bytes uploaded to the instance buffer.
    pub fn packed_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl<T: Pod> Default for InstancedLightBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// All light submissions for one frame plus the shared light-volume meshes.
pub struct LightingData {
    pub directional_lights: Vec<DirectionalLightUnit>,
    pub point_lights: Vec<PointLightUnit>,
    pub spot_lights: Vec<SpotLightUnit>,
    pub point_lights_instanced: InstancedLightBuffer<PointLightInstance>,
    pub spot_lights_instanced: InstancedLightBuffer<SpotLightInstance>,
    pub sphere_volume: GeometryHandle,
    pub pyramid_volume: GeometryHandle,
}

impl LightingData {
    pub fn new(sphere_volume: GeometryHandle, pyramid_volume: GeometryHandle) -> Self {
        Self {
            directional_lights: Vec::new(),
            point_lights: Vec::new(),
            spot_lights: Vec::new(),
            point_lights_instanced: InstancedLightBuffer::new(),
            spot_lights_instanced: InstancedLightBuffer::new(),
            sphere_volume,
            pyramid_volume,
        }
    }

    pub fn clear(&mut self) {
        self.directional_lights.clear();
        self.point_lights.clear();
        self.spot_lights.clear();
        self.point_lights_instanced.clear();
        self.spot_lights_instanced.clear();
    }
}

use glam::{Vec2, Vec3};

use crate::resources::TextureHandle;

/// Number of texture slots a material occupies during the G-buffer pass.
pub const MATERIAL_TEXTURE_COUNT: u32 = 7;

/// Authoring-side PBR material. Unset texture slots are backfilled with
/// shared defaults at submission time, so shaders never branch on presence.
#[derive(Clone, Copy, Debug)]
pub struct Material {
    pub albedo_map: Option<TextureHandle>,
    pub metallic_map: Option<TextureHandle>,
    pub roughness_map: Option<TextureHandle>,
    pub emissive_map: Option<TextureHandle>,
    pub normal_map: Option<TextureHandle>,
    pub height_map: Option<TextureHandle>,
    pub occlusion_map: Option<TextureHandle>,
    pub base_color: Vec3,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emission: f32,
    /// Fully opaque at 1.0; anything below routes the draw to the
    /// transparent pass.
    pub transparency: f32,
    pub displacement: f32,
    pub uv_multipliers: Vec2,
    pub casts_shadow: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo_map: None,
            metallic_map: None,
            roughness_map: None,
            emissive_map: None,
            normal_map: None,
            height_map: None,
            occlusion_map: None,
            base_color: Vec3::ONE,
            metallic_factor: 0.0,
            roughness_factor: 0.75,
            emission: 0.0,
            transparency: 1.0,
            displacement: 0.0,
            uv_multipliers: Vec2::ONE,
            casts_shadow: true,
        }
    }
}

/// Shared fallback textures substituted for unset material slots.
#[derive(Clone, Copy, Debug)]
pub struct DefaultMaterialTextures {
    pub material: TextureHandle,
    pub normal: TextureHandle,
    pub black: TextureHandle,
}

/// Frame-resolved material: every slot holds a valid texture handle and the
/// displacement is already rescaled for the owning primitive.
#[derive(Clone, Copy, Debug)]
pub struct MaterialUnit {
    pub albedo_map: TextureHandle,
    pub metallic_map: TextureHandle,
    pub roughness_map: TextureHandle,
    pub emissive_map: TextureHandle,
    pub normal_map: TextureHandle,
    pub height_map: TextureHandle,
    pub occlusion_map: TextureHandle,
    pub base_color: Vec3,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emission: f32,
    pub transparency: f32,
    pub displacement: f32,
    pub uv_multipliers: Vec2,
}

impl MaterialUnit {
    pub fn resolve(
        material: &Material,
        defaults: &DefaultMaterialTextures,
        displacement_scale: f32,
    ) -> Self {
        // a supplied roughness/metallic map overrides the scalar factor
        let roughness_factor = if material.roughness_map.is_some() {
            1.0
        } else {
            material.roughness_factor
        };
        let metallic_factor = if material.metallic_map.is_some() {
            1.0
        } else {
            material.metallic_factor
        };

        Self {
            albedo_map: material.albedo_map.unwrap_or(defaults.material),
            metallic_map: material.metallic_map.unwrap_or(defaults.material),
            roughness_map: material.roughness_map.unwrap_or(defaults.material),
            emissive_map: material.emissive_map.unwrap_or(defaults.material),
            normal_map: material.normal_map.unwrap_or(defaults.normal),
            height_map: material.height_map.unwrap_or(defaults.black),
            occlusion_map: material.occlusion_map.unwrap_or(defaults.material),
            base_color: material.base_color,
            metallic_factor,
            roughness_factor,
            emission: material.emission,
            transparency: material.transparency,
            displacement: material.displacement * displacement_scale,
            uv_multipliers: material.uv_multipliers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{GpuResources, TextureFormat};

    fn defaults(resources: &mut GpuResources) -> DefaultMaterialTextures {
        DefaultMaterialTextures {
            material: resources.create_texture("DefaultMaterial", 1, 1, TextureFormat::Rgba8),
            normal: resources.create_texture("DefaultNormal", 1, 1, TextureFormat::Rgba8),
            black: resources.create_texture("DefaultBlack", 1, 1, TextureFormat::Rgba8),
        }
    }

    #[test]
    fn unset_slots_fall_back_to_defaults() {
        let mut resources = GpuResources::new();
        let defaults = defaults(&mut resources);
        let unit = MaterialUnit::resolve(&Material::default(), &defaults, 1.0);
        assert_eq!(unit.albedo_map, defaults.material);
        assert_eq!(unit.normal_map, defaults.normal);
        assert_eq!(unit.height_map, defaults.black);
    }

    #[test]
    fn supplied_map_forces_factor_to_one() {
        let mut resources = GpuResources::new();
        let defaults = defaults(&mut resources);
        let rough = resources.create_texture("Rough", 4, 4, TextureFormat::Rgba8);

        let material = Material {
            roughness_map: Some(rough),
            roughness_factor: 0.2,
            ..Material::default()
        };
        let unit = MaterialUnit::resolve(&material, &defaults, 1.0);
        assert_eq!(unit.roughness_map, rough);
        assert_eq!(unit.roughness_factor, 1.0);
        // metallic has no map, the factor survives
        assert_eq!(unit.metallic_factor, 0.0);
    }

    #[test]
    fn displacement_scales_with_object_size() {
        let mut resources = GpuResources::new();
        let defaults = defaults(&mut resources);
        let material = Material {
            displacement: 0.5,
            ..Material::default()
        };
        let unit = MaterialUnit::resolve(&material, &defaults, 2.0);
        assert_eq!(unit.displacement, 1.0);
    }
}

pub mod controller;
pub mod environment;
pub mod lights;
pub mod material;
pub mod pipeline;
pub mod shadow_maps;

pub use controller::RenderController;
pub use environment::{EnvironmentUnit, ShaderTable, AO_KERNEL_SIZE};
pub use lights::{
    DirectionalLightUnit, InstancedLightBuffer, LightingData, PointLightInstance, PointLightUnit,
    SpotLightInstance, SpotLightUnit, MAX_DIR_LIGHT_COUNT,
};
pub use material::{DefaultMaterialTextures, Material, MaterialUnit, MATERIAL_TEXTURE_COUNT};
pub use pipeline::{CameraUnit, RenderPipeline, RenderUnit, SubMesh};
pub use shadow_maps::ShadowMapGenerator;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::resources::{
    Attachment, CubeMapHandle, FrameBufferHandle, GeometryHandle, GpuResources, ShaderHandle,
    TextureFormat, TextureHandle,
};
use crate::settings::RenderSettings;

use super::material::DefaultMaterialTextures;

pub const AO_KERNEL_SIZE: usize = 32;

/// Every shader the pipeline drives, created once at startup.
pub struct ShaderTable {
    pub gbuffer: ShaderHandle,
    pub global_illumination: ShaderHandle,
    pub point_light: ShaderHandle,
    pub spot_light: ShaderHandle,
    pub transparent: ShaderHandle,
    pub skybox: ShaderHandle,
    pub debug_draw: ShaderHandle,
    pub depth_texture: ShaderHandle,
    pub depth_cube_map: ShaderHandle,
    pub ambient_occlusion: ShaderHandle,
    pub apply_ambient_occlusion: ShaderHandle,
    pub ssr: ShaderHandle,
    pub bloom_split: ShaderHandle,
    pub bloom_iteration: ShaderHandle,
    pub chromatic_aberration: ShaderHandle,
    pub fog: ShaderHandle,
    pub average_white: ShaderHandle,
    pub hdr_to_ldr: ShaderHandle,
    pub fxaa: ShaderHandle,
    pub vignette: ShaderHandle,
    pub image_forward: ShaderHandle,
}

impl ShaderTable {
    fn new(resources: &mut GpuResources) -> Self {
        Self {
            gbuffer: resources.create_shader("GBuffer"),
            global_illumination: resources.create_shader("GlobalIllumination"),
            point_light: resources.create_shader("PointLight"),
            spot_light: resources.create_shader("SpotLight"),
            transparent: resources.create_shader("Transparent"),
            skybox: resources.create_shader("Skybox"),
            debug_draw: resources.create_shader("DebugDraw"),
            depth_texture: resources.create_shader("DepthTexture"),
            depth_cube_map: resources.create_shader("DepthCubeMap"),
            ambient_occlusion: resources.create_shader("AmbientOcclusion"),
            apply_ambient_occlusion: resources.create_shader("ApplyAmbientOcclusion"),
            ssr: resources.create_shader("SSR"),
            bloom_split: resources.create_shader("BloomSplit"),
            bloom_iteration: resources.create_shader("BloomIteration"),
            chromatic_aberration: resources.create_shader("ChromaticAberration"),
            fog: resources.create_shader("Fog"),
            average_white: resources.create_shader("AverageWhite"),
            hdr_to_ldr: resources.create_shader("HDRToLDR"),
            fxaa: resources.create_shader("FXAA"),
            vignette: resources.create_shader("Vignette"),
            image_forward: resources.create_shader("ImageForward"),
        }
    }
}

/// Frame-independent pipeline state: shaders, shared default textures,
/// helper framebuffers and geometry, fog and shadow quality settings.
pub struct EnvironmentUnit {
    pub shaders: ShaderTable,
    pub default_material_map: TextureHandle,
    pub default_normal_map: TextureHandle,
    pub default_black_map: TextureHandle,
    /// Bound for unused directional light slots so shader sampler arrays
    /// stay fully populated.
    pub default_shadow_map: TextureHandle,
    pub default_black_cube_map: CubeMapHandle,
    pub ambient_occlusion_texture: TextureHandle,
    pub average_white_texture: TextureHandle,
    pub bloom_buffers: [FrameBufferHandle; 2],
    pub bloom_textures: [TextureHandle; 2],
    pub post_process_framebuffer: FrameBufferHandle,
    pub depth_framebuffer: FrameBufferHandle,
    pub rectangle: GeometryHandle,
    pub skybox_cube: GeometryHandle,
    pub debug_buffer: GeometryHandle,
    pub overlay_debug_draws: bool,
    pub fog_color: Vec3,
    pub fog_distance: f32,
    pub fog_density: f32,
    pub shadow_blur_iterations: u32,
    pub light_samples: u32,
    pub viewport: (u32, u32),
    pub main_camera_index: usize,
    pub render_to_default_frame_buffer: bool,
    pub time_delta: f32,
    /// Hemisphere sample directions fed to the ambient occlusion shader.
    pub ao_noise_kernel: Vec<Vec3>,
}

impl EnvironmentUnit {
    pub fn new(resources: &mut GpuResources, settings: &RenderSettings) -> Self {
        let (width, height) = (settings.resolution.width, settings.resolution.height);

        let default_material_map =
            resources.create_texture("DefaultMaterial", 1, 1, TextureFormat::Rgba8);
        let default_normal_map =
            resources.create_texture("DefaultNormal", 1, 1, TextureFormat::Rgba8);
        let default_black_map =
            resources.create_texture("DefaultBlack", 1, 1, TextureFormat::Rgba8);
        let default_shadow_map =
            resources.create_texture("DefaultShadowMap", 1, 1, TextureFormat::Depth);
        let default_black_cube_map =
            resources.create_cube_map("DefaultBlackCubeMap", 1, TextureFormat::Rgba8);

        let ambient_occlusion_texture = resources.create_texture(
            "AmbientOcclusion",
            width / 2,
            height / 2,
            TextureFormat::Rgba16F,
        );
        let average_white_texture =
            resources.create_texture("AverageWhite", 1, 1, TextureFormat::Rgba16F);

        let mut bloom_buffers = [FrameBufferHandle::new(0); 2];
        let mut bloom_textures = [TextureHandle::new(0); 2];
        for (i, (buffer, texture)) in bloom_buffers
            .iter_mut()
            .zip(bloom_textures.iter_mut())
            .enumerate()
        {
            *texture = resources.create_texture(
                format!("Bloom{}", i),
                width / 2,
                height / 2,
                TextureFormat::Rgba16F,
            );
            *buffer = resources.create_framebuffer(format!("BloomBuffer{}", i), width / 2, height / 2);
            resources.attach_texture(*buffer, *texture, Attachment::Color0);
        }

        let post_process_framebuffer =
            resources.create_framebuffer("PostProcess", width, height);
        let depth_framebuffer = resources.create_framebuffer(
            "Depth",
            settings.shadow_map_size,
            settings.shadow_map_size,
        );

        let rectangle = resources.create_geometry("Rectangle", 6, 0);
        let skybox_cube = resources.create_geometry("SkyboxCube", 36, 0);
        let debug_buffer = resources.create_geometry("DebugBuffer", 0, 0);

        Self {
            shaders: ShaderTable::new(resources),
            default_material_map,
            default_normal_map,
            default_black_map,
            default_shadow_map,
            default_black_cube_map,
            ambient_occlusion_texture,
            average_white_texture,
            bloom_buffers,
            bloom_textures,
            post_process_framebuffer,
            depth_framebuffer,
            rectangle,
            skybox_cube,
            debug_buffer,
            overlay_debug_draws: true,
            fog_color: Vec3::new(0.5, 0.6, 0.7),
            fog_distance: 1.0,
            fog_density: 0.0,
            shadow_blur_iterations: settings.shadow_blur_iterations,
            light_samples: settings.light_samples,
            viewport: (width, height),
            main_camera_index: settings.main_camera_index,
            render_to_default_frame_buffer: settings.render_to_default_frame_buffer,
            time_delta: 0.0,
            ao_noise_kernel: make_ao_kernel(AO_KERNEL_SIZE),
        }
    }

    pub fn default_material_textures(&self) -> DefaultMaterialTextures {
        DefaultMaterialTextures {
            material: self.default_material_map,
            normal: self.default_normal_map,
            black: self.default_black_map,
        }
    }
}

/// Cosine-weighted hemisphere samples around +Z, scaled so more samples
/// cluster near the origin.
fn make_ao_kernel(size: usize) -> Vec<Vec3> {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    (0..size)
        .map(|i| {
            let sample = Vec3::new(
                rng.gen_range(-1.0f32..1.0),
                rng.gen_range(-1.0f32..1.0),
                rng.gen_range(0.0f32..1.0),
            )
            .normalize_or_zero();
            let scale = i as f32 / size as f32;
            sample * (0.1 + 0.9 * scale * scale)
        })
        .collect()
}

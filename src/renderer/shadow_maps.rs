use glam::Vec4;

use crate::engine::{AttributeValue, RenderEngine};
use crate::resources::{Attachment, FrameBufferHandle, GpuResources, ShaderHandle};
use crate::scene::CASCADE_COUNT;

use super::lights::{DirectionalLightUnit, PointLightUnit, SpotLightUnit};
use super::material::MaterialUnit;
use super::pipeline::RenderUnit;

/// Renders the shadow-caster set into every shadow-casting light's depth
/// texture(s). Draws the full caster list per light view; no per-light
/// culling happens here.
pub struct ShadowMapGenerator<'a, E: RenderEngine> {
    engine: &'a mut E,
    resources: &'a mut GpuResources,
    casters: &'a [RenderUnit],
    materials: &'a [MaterialUnit],
    depth_framebuffer: FrameBufferHandle,
}

impl<'a, E: RenderEngine> ShadowMapGenerator<'a, E> {
    pub fn new(
        engine: &'a mut E,
        resources: &'a mut GpuResources,
        casters: &'a [RenderUnit],
        materials: &'a [MaterialUnit],
        depth_framebuffer: FrameBufferHandle,
    ) -> Self {
        Self {
            engine,
            resources,
            casters,
            materials,
            depth_framebuffer,
        }
    }

    pub fn generate_for_directional(
        &mut self,
        shader: ShaderHandle,
        lights: &[DirectionalLightUnit],
    ) {
        for light in lights {
            for cascade in 0..CASCADE_COUNT {
                self.resources.attach_texture(
                    self.depth_framebuffer,
                    light.shadow_maps[cascade],
                    Attachment::Depth,
                );
                self.attach_depth_target();
                self.resources
                    .shader_mut(shader)
                    .set_uniform_mat4("LightProjMatrix", light.projection_matrices[cascade]);
                self.draw_casters(shader);
            }
        }
    }

    pub fn generate_for_spot(&mut self, shader: ShaderHandle, lights: &[SpotLightUnit]) {
        for light in lights {
            self.resources.attach_texture(
                self.depth_framebuffer,
                light.shadow_map,
                Attachment::Depth,
            );
            self.attach_depth_target();
            self.resources
                .shader_mut(shader)
                .set_uniform_mat4("LightProjMatrix", light.projection_matrix);
            self.draw_casters(shader);
        }
    }

    pub fn generate_for_point(&mut self, shader: ShaderHandle, lights: &[PointLightUnit]) {
        for light in lights {
            self.resources.attach_cube_map(
                self.depth_framebuffer,
                light.shadow_map,
                Attachment::Depth,
            );
            self.attach_depth_target();
            {
                let program = self.resources.shader_mut(shader);
                for (face, matrix) in light.projection_matrices.iter().enumerate() {
                    program.set_uniform_mat4(&format!("LightProjMatrix[{}]", face), *matrix);
                }
                let position = light.instance.position();
                program.set_uniform_vec3("lightPos", position);
                program.set_uniform_float("zFar", light.instance.radius());
            }
            self.draw_casters(shader);
        }
    }

    fn attach_depth_target(&mut self) {
        self.engine.bind_framebuffer(Some(self.depth_framebuffer));
        let fb = self.resources.framebuffer(self.depth_framebuffer);
        let (width, height) = (fb.width() as i32, fb.height() as i32);
        self.engine.set_viewport(0, 0, width, height);
        self.engine.clear();
    }

    fn draw_casters(&mut self, shader: ShaderHandle) {
        for unit in self.casters {
            let material = &self.materials[unit.material_index];
            {
                let program = self.resources.shader_mut(shader);
                program.set_uniform_float("displacement", material.displacement);
                program.set_uniform_vec2("uvMultipliers", material.uv_multipliers);
            }
            let height_slot = self.resources.bind_texture(material.height_map, 0);
            self.resources
                .shader_mut(shader)
                .set_uniform_int("map_height", height_slot);

            self.engine
                .set_default_vertex_attribute(5, AttributeValue::Mat4(unit.model_matrix));
            // base color attribute slot is shared with the gbuffer shader
            self.engine.set_default_vertex_attribute(
                12,
                AttributeValue::Vec4(Vec4::ONE),
            );

            self.engine.draw_triangles_instanced(
                unit.geometry,
                unit.draw_count,
                self.resources.shader(shader),
                unit.instance_count.max(1),
            );
            self.resources.mark_framebuffer_written(self.depth_framebuffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat3, Mat4, Vec3};

    use super::*;
    use crate::engine::RecordingEngine;
    use crate::renderer::lights::PointLightInstance;
    use crate::resources::TextureFormat;

    fn make_caster(resources: &mut GpuResources) -> (RenderUnit, MaterialUnit) {
        let geometry = resources.create_geometry("Cube", 24, 36);
        let height = resources.create_texture("Height", 1, 1, TextureFormat::Rgba8);
        let unit = RenderUnit {
            geometry,
            draw_count: 36,
            material_index: 0,
            model_matrix: Mat4::IDENTITY,
            normal_matrix: Mat3::IDENTITY,
            aabb_min: Vec3::splat(-0.5),
            aabb_max: Vec3::splat(0.5),
            instance_count: 0,
        };
        let material = MaterialUnit {
            albedo_map: height,
            metallic_map: height,
            roughness_map: height,
            emissive_map: height,
            normal_map: height,
            height_map: height,
            occlusion_map: height,
            base_color: Vec3::ONE,
            metallic_factor: 0.0,
            roughness_factor: 1.0,
            emission: 0.0,
            transparency: 1.0,
            displacement: 0.25,
            uv_multipliers: glam::Vec2::ONE,
        };
        (unit, material)
    }

    #[test]
    fn directional_light_draws_once_per_cascade() {
        let mut engine = RecordingEngine::new();
        let mut resources = GpuResources::new();
        let (unit, material) = make_caster(&mut resources);
        let shader = resources.create_shader("DepthTexture");
        let depth_fb = resources.create_framebuffer("Depth", 512, 512);

        let shadow_maps = [
            resources.create_texture("Cascade0", 512, 512, TextureFormat::Depth),
            resources.create_texture("Cascade1", 512, 512, TextureFormat::Depth),
            resources.create_texture("Cascade2", 512, 512, TextureFormat::Depth),
        ];
        let light = DirectionalLightUnit {
            direction: Vec3::Y,
            color: Vec3::ONE,
            intensity: 1.0,
            ambient_intensity: 0.1,
            shadow_maps,
            projection_matrices: [Mat4::IDENTITY; CASCADE_COUNT],
            biased_projection_matrices: [Mat4::IDENTITY; CASCADE_COUNT],
        };

        let casters = [unit];
        let materials = [material];
        let mut generator =
            ShadowMapGenerator::new(&mut engine, &mut resources, &casters, &materials, depth_fb);
        generator.generate_for_directional(shader, &[light]);

        assert_eq!(engine.draws().len(), CASCADE_COUNT);
        for map in shadow_maps {
            assert!(resources.texture(map).write_count() > 0);
        }
    }

    #[test]
    fn point_light_sets_six_face_matrices() {
        let mut engine = RecordingEngine::new();
        let mut resources = GpuResources::new();
        let (unit, material) = make_caster(&mut resources);
        let shader = resources.create_shader("DepthCubeMap");
        let depth_fb = resources.create_framebuffer("Depth", 512, 512);
        let cube = resources.create_cube_map("PointShadow", 512, TextureFormat::Depth);

        let light = PointLightUnit {
            instance: PointLightInstance::new(Mat4::IDENTITY, Vec3::ONE, 7.0, Vec3::ONE, 0.0),
            shadow_map: cube,
            projection_matrices: [Mat4::IDENTITY; 6],
        };

        let casters = [unit];
        let materials = [material];
        let mut generator =
            ShadowMapGenerator::new(&mut engine, &mut resources, &casters, &materials, depth_fb);
        generator.generate_for_point(shader, &[light]);

        assert_eq!(engine.draws().len(), 1);
        let program = resources.shader(shader);
        for face in 0..6 {
            assert!(program.uniform(&format!("LightProjMatrix[{}]", face)).is_some());
        }
        assert_eq!(program.uniform_float("zFar"), Some(7.0));
        assert!(resources.cube_map(cube).write_count() > 0);
    }
}

use glam::{Mat3, Vec2, Vec3, Vec4};
use log::debug;

use crate::engine::{AttributeValue, BlendFactor, RenderEngine};
use crate::math::{make_bias_matrix, FrustumCuller};
use crate::resources::{
    Attachment, FrameBufferHandle, GpuResources, ShaderHandle, TextureHandle,
};
use crate::scene::{
    CameraController, CameraEffects, CameraSsr, CameraToneMapping, DirectionalLight, PointLight,
    Skybox, SpotLight, Transform, CASCADE_COUNT,
};
use crate::settings::RenderSettings;

use super::environment::EnvironmentUnit;
use super::lights::{
    DirectionalLightUnit, LightingData, PointLightInstance, PointLightUnit, SpotLightInstance,
    SpotLightUnit, MAX_DIR_LIGHT_COUNT,
};
use super::material::{Material, MaterialUnit, MATERIAL_TEXTURE_COUNT};
use super::pipeline::{CameraUnit, RenderPipeline, RenderUnit, SubMesh};
use super::shadow_maps::ShadowMapGenerator;

/// Orchestrates one frame: accepts submissions into the pipeline, then
/// sequences the shadow pass, per-camera G-buffer pass, light accumulation
/// and the post-process chain through the abstract render engine.
pub struct RenderController<E: RenderEngine> {
    engine: E,
    resources: GpuResources,
    pipeline: RenderPipeline,
    current_target: Option<FrameBufferHandle>,
}

impl<E: RenderEngine> RenderController<E> {
    pub fn new(engine: E, settings: &RenderSettings) -> Self {
        let mut resources = GpuResources::new();
        let environment = EnvironmentUnit::new(&mut resources, settings);
        let sphere = resources.create_geometry("LightSphere", 382, 2280);
        let pyramid = resources.create_geometry("LightPyramid", 5, 18);
        let pipeline = RenderPipeline {
            lighting: LightingData::new(sphere, pyramid),
            opaque_units: Vec::new(),
            transparent_units: Vec::new(),
            shadow_caster_units: Vec::new(),
            material_units: Vec::new(),
            cameras: Vec::new(),
            environment,
        };

        let mut controller = Self {
            engine,
            resources,
            pipeline,
            current_target: None,
        };
        controller
            .engine
            .use_anisotropic_filtering(settings.anisotropic_filtering);
        controller
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn resources(&self) -> &GpuResources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut GpuResources {
        &mut self.resources
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn environment(&self) -> &EnvironmentUnit {
        &self.pipeline.environment
    }

    pub fn environment_mut(&mut self) -> &mut EnvironmentUnit {
        &mut self.pipeline.environment
    }

    pub fn set_time_delta(&mut self, dt: f32) {
        self.pipeline.environment.time_delta = dt;
    }

    /// Refills the debug line buffer for this frame. Zero hides the pass.
    pub fn set_debug_line_count(&mut self, vertex_count: u32) {
        let geometry = self.pipeline.environment.debug_buffer;
        self.resources.geometry_mut(geometry).set_vertex_count(vertex_count);
    }

    // === frame submission ===

    pub fn reset_pipeline(&mut self) {
        self.pipeline.lighting.clear();
        self.pipeline.opaque_units.clear();
        self.pipeline.transparent_units.clear();
        self.pipeline.shadow_caster_units.clear();
        self.pipeline.material_units.clear();
        self.pipeline.cameras.clear();
    }

    pub fn submit_camera(
        &mut self,
        controller: &mut CameraController,
        transform: &Transform,
        skybox: &Skybox,
        effects: Option<CameraEffects>,
        tone_mapping: Option<CameraToneMapping>,
        ssr: Option<CameraSsr>,
    ) {
        let static_view_projection = controller.matrix_at(Vec3::ZERO);
        let view_projection = controller.matrix_at(transform.translation);
        let targets = *controller.targets();

        let skybox_texture = skybox
            .cube_map
            .unwrap_or(self.pipeline.environment.default_black_cube_map);
        let irradiance_texture = skybox.irradiance.unwrap_or(skybox_texture);

        self.pipeline.cameras.push(CameraUnit {
            viewport_position: transform.translation,
            view_projection,
            inverse_view_projection: view_projection.inverse(),
            static_view_projection,
            culler: FrustumCuller::new(view_projection),
            is_perspective: controller.camera.is_perspective(),
            gbuffer: targets.gbuffer,
            albedo_texture: targets.albedo,
            normal_texture: targets.normal,
            material_texture: targets.material,
            depth_texture: targets.depth,
            average_white_texture: targets.average_white,
            hdr_texture: targets.hdr,
            swap_texture: targets.swap_hdr,
            output_texture: targets.output,
            render_to_texture: controller.render_to_texture,
            inverse_skybox_rotation: Mat3::from_quat(skybox.rotation).transpose(),
            skybox_texture,
            irradiance_texture,
            gamma: tone_mapping.map_or(1.0, |t| t.gamma),
            effects,
            tone_mapping,
            ssr,
        });
    }

    pub fn submit_directional_light(&mut self, light: &DirectionalLight, transform: &Transform) {
        let center = transform.translation;
        let mut projection_matrices = [glam::Mat4::IDENTITY; CASCADE_COUNT];
        let mut biased_projection_matrices = [glam::Mat4::IDENTITY; CASCADE_COUNT];
        for i in 0..CASCADE_COUNT {
            projection_matrices[i] = light.matrix(center, i);
            biased_projection_matrices[i] = make_bias_matrix() * projection_matrices[i];
        }

        self.pipeline.lighting.directional_lights.push(DirectionalLightUnit {
            direction: light.direction,
            color: light.color,
            intensity: light.intensity,
            ambient_intensity: light.ambient_intensity,
            shadow_maps: light.depth_textures,
            projection_matrices,
            biased_projection_matrices,
        });
    }

    pub fn submit_point_light(&mut self, light: &PointLight, transform: &Transform) {
        let position = transform.translation;
        let instance = PointLightInstance::new(
            light.sphere_transform(position),
            position,
            light.radius(),
            light.color * light.intensity,
            light.ambient_intensity,
        );

        match light.shadow_map {
            Some(shadow_map) => {
                let projection_matrices = std::array::from_fn(|face| light.matrix(face, position));
                self.pipeline.lighting.point_lights.push(PointLightUnit {
                    instance,
                    shadow_map,
                    projection_matrices,
                });
            }
            None => self
                .pipeline
                .lighting
                .point_lights_instanced
                .instances
                .push(instance),
        }
    }

    pub fn submit_spot_light(&mut self, light: &SpotLight, transform: &Transform) {
        let position = transform.translation;
        let instance = SpotLightInstance::new(
            light.pyramid_transform(position),
            position,
            light.inner_cos(),
            light.direction,
            light.outer_cos(),
            light.color * light.intensity,
            light.ambient_intensity,
        );

        match light.shadow_map {
            Some(shadow_map) => {
                let projection_matrix = light.matrix(position);
                self.pipeline.lighting.spot_lights.push(SpotLightUnit {
                    instance,
                    shadow_map,
                    projection_matrix,
                    biased_projection_matrix: make_bias_matrix() * projection_matrix,
                });
            }
            None => self
                .pipeline
                .lighting
                .spot_lights_instanced
                .instances
                .push(instance),
        }
    }

    pub fn submit_primitive(
        &mut self,
        submesh: &SubMesh,
        material: &Material,
        parent: &Transform,
        instance_count: u32,
    ) {
        let model_matrix = parent.matrix() * submesh.transform.matrix();
        let normal_matrix = parent.normal_matrix() * submesh.transform.normal_matrix();
        let aabb = submesh.aabb.transformed(model_matrix);

        let unit = RenderUnit {
            geometry: submesh.geometry,
            draw_count: submesh.draw_count,
            material_index: self.pipeline.material_units.len(),
            model_matrix,
            normal_matrix,
            aabb_min: aabb.min,
            aabb_max: aabb.max,
            instance_count,
        };

        // transparent objects are drawn in a separate blended pass
        if material.transparency < 1.0 {
            self.pipeline.transparent_units.push(unit);
        } else {
            self.pipeline.opaque_units.push(unit);
        }

        // displacement must account for object scale; the average of the
        // combined scale components approximates it well enough
        let combined_scale = parent.scale * submesh.transform.scale;
        let displacement_scale = combined_scale.dot(Vec3::splat(1.0 / 3.0));
        let defaults = self.pipeline.environment.default_material_textures();
        self.pipeline
            .material_units
            .push(MaterialUnit::resolve(material, &defaults, displacement_scale));

        if material.casts_shadow {
            self.pipeline.shadow_caster_units.push(unit);
        }
    }

    // === frame execution ===

    pub fn start_pipeline(&mut self) {
        if self.pipeline.cameras.is_empty() {
            if self.pipeline.environment.render_to_default_frame_buffer {
                self.attach_default_framebuffer();
            }
            return;
        }

        self.prepare_shadow_maps();

        for index in 0..self.pipeline.cameras.len() {
            let mut camera = self.pipeline.cameras[index].clone();
            if !camera.render_to_texture {
                continue;
            }

            self.engine.use_blending(BlendFactor::One, BlendFactor::Zero);
            self.toggle_reversed_depth(camera.is_perspective);
            self.attach_framebuffer(camera.gbuffer);

            let gbuffer_shader = self.pipeline.environment.shaders.gbuffer;
            self.draw_objects(&camera, gbuffer_shader, false);
            self.perform_light_pass(&camera);
            self.perform_post_processing(&mut camera);

            self.copy_texture(camera.hdr_texture, camera.output_texture);
            self.resources.generate_texture_mipmaps(camera.output_texture);

            // keep the ping-pong swaps visible to later passes and tests
            self.pipeline.cameras[index] = camera;
        }
    }

    pub fn end_pipeline(&mut self) {
        self.attach_default_framebuffer();
        let environment = &self.pipeline.environment;
        if environment.render_to_default_frame_buffer
            && environment.main_camera_index < self.pipeline.cameras.len()
        {
            let output = self.pipeline.cameras[environment.main_camera_index].output_texture;
            self.submit_image(output);
        }
    }

    pub fn prepare_shadow_maps(&mut self) {
        debug!(
            "shadow pass: {} casters, {} dir / {} spot / {} point shadowed lights",
            self.pipeline.shadow_caster_units.len(),
            self.pipeline.lighting.directional_lights.len(),
            self.pipeline.lighting.spot_lights.len(),
            self.pipeline.lighting.point_lights.len()
        );

        let shaders = &self.pipeline.environment.shaders;
        let (flat_shader, cube_shader) = (shaders.depth_texture, shaders.depth_cube_map);
        let mut generator = ShadowMapGenerator::new(
            &mut self.engine,
            &mut self.resources,
            &self.pipeline.shadow_caster_units,
            &self.pipeline.material_units,
            self.pipeline.environment.depth_framebuffer,
        );

        generator.generate_for_directional(flat_shader, &self.pipeline.lighting.directional_lights);
        generator.generate_for_spot(flat_shader, &self.pipeline.lighting.spot_lights);
        generator.generate_for_point(cube_shader, &self.pipeline.lighting.point_lights);
    }

    fn draw_objects(&mut self, camera: &CameraUnit, shader: ShaderHandle, transparent: bool) {
        let count = if transparent {
            self.pipeline.transparent_units.len()
        } else {
            self.pipeline.opaque_units.len()
        };
        if count == 0 {
            return;
        }

        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_mat4("ViewProjMatrix", camera.view_projection);
            program.set_uniform_float("gamma", camera.gamma);
        }

        for i in 0..count {
            let unit = if transparent {
                self.pipeline.transparent_units[i]
            } else {
                self.pipeline.opaque_units[i]
            };
            // instanced draws skip culling, instances share one submitted box
            let visible = unit.instance_count > 0
                || camera.culler.is_aabb_visible(unit.aabb_min, unit.aabb_max);
            if visible {
                self.draw_object(unit, shader);
            }
        }
    }

    fn draw_object(&mut self, unit: RenderUnit, shader: ShaderHandle) {
        let material = self.pipeline.material_units[unit.material_index];
        self.resources
            .shader_mut(shader)
            .ignore_non_existing_uniform("material.transparency");

        let slots = [
            ("map_albedo", material.albedo_map),
            ("map_metallic", material.metallic_map),
            ("map_roughness", material.roughness_map),
            ("map_emmisive", material.emissive_map),
            ("map_normal", material.normal_map),
            ("map_height", material.height_map),
            ("map_occlusion", material.occlusion_map),
        ];
        for (index, (name, texture)) in slots.into_iter().enumerate() {
            let bound = self.resources.bind_texture(texture, index as u32);
            self.resources.shader_mut(shader).set_uniform_int(name, bound);
        }

        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_float("material.roughness", material.roughness_factor);
            program.set_uniform_float("material.metallic", material.metallic_factor);
            program.set_uniform_float("material.emmisive", material.emission);
            program.set_uniform_float("material.transparency", material.transparency);
            program.set_uniform_float("displacement", material.displacement);
            program.set_uniform_vec2("uvMultipliers", material.uv_multipliers);
        }

        self.engine
            .set_default_vertex_attribute(5, AttributeValue::Mat4(unit.model_matrix));
        self.engine
            .set_default_vertex_attribute(9, AttributeValue::Mat3(unit.normal_matrix));
        self.engine.set_default_vertex_attribute(
            12,
            AttributeValue::Vec4(Vec4::from((material.base_color, material.transparency))),
        );

        self.engine.draw_triangles_instanced(
            unit.geometry,
            unit.draw_count,
            self.resources.shader(shader),
            unit.instance_count.max(1),
        );
        self.mark_target_written();
    }

    // === light pass ===

    fn perform_light_pass(&mut self, camera: &CameraUnit) {
        self.draw_directional_lights(camera);

        self.engine.use_blending(BlendFactor::One, BlendFactor::One);
        // render back faces of light volumes for the camera-inside case
        self.toggle_face_culling(true, true, false);

        self.draw_shadowed_spot_lights(camera);
        self.draw_non_shadowed_spot_lights(camera);
        self.draw_shadowed_point_lights(camera);
        self.draw_non_shadowed_point_lights(camera);

        self.toggle_face_culling(true, true, true);
        self.engine.use_blending(BlendFactor::One, BlendFactor::Zero);
    }

    fn draw_directional_lights(&mut self, camera: &CameraUnit) {
        let shader = self.pipeline.environment.shaders.global_illumination;
        self.resources
            .shader_mut(shader)
            .ignore_non_existing_uniform("camera.viewProjMatrix");
        self.bind_gbuffer(camera, shader);
        self.bind_camera_information(camera, shader);

        let texture_id = self.bind_environment_maps(camera, shader, 4);
        self.bind_directional_light_array(shader, texture_id);

        self.render_to_texture(camera.hdr_texture, shader);
    }

    /// Packs up to `MAX_DIR_LIGHT_COUNT` directional lights into the shader's
    /// uniform arrays, padding unused slots with the default shadow map.
    fn bind_directional_light_array(&mut self, shader: ShaderHandle, mut texture_id: u32) {
        let lights: Vec<DirectionalLightUnit> = self
            .pipeline
            .lighting
            .directional_lights
            .iter()
            .take(MAX_DIR_LIGHT_COUNT)
            .copied()
            .collect();
        let light_count = lights.len();

        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_int("lightCount", light_count as i32);
            program.set_uniform_int(
                "pcfDistance",
                self.pipeline.environment.shadow_blur_iterations as i32,
            );
            program.set_uniform_int("lightSamples", self.pipeline.environment.light_samples as i32);
        }

        for (i, light) in lights.iter().enumerate() {
            {
                let program = self.resources.shader_mut(shader);
                let color_packed =
                    Vec4::from((light.color * light.intensity, light.ambient_intensity));
                program.set_uniform_vec4(&format!("lights[{}].color", i), color_packed);
                program.set_uniform_vec3(&format!("lights[{}].direction", i), light.direction);
            }
            for j in 0..CASCADE_COUNT {
                let bound = self.resources.bind_texture(light.shadow_maps[j], texture_id);
                texture_id += 1;
                let program = self.resources.shader_mut(shader);
                program.set_uniform_int(&format!("lightDepthMaps[{}][{}]", i, j), bound);
                program.set_uniform_mat4(
                    &format!("lights[{}].transform[{}]", i, j),
                    light.biased_projection_matrices[j],
                );
            }
        }

        let default_bound = self
            .resources
            .bind_texture(self.pipeline.environment.default_shadow_map, texture_id);
        let program = self.resources.shader_mut(shader);
        for i in light_count..MAX_DIR_LIGHT_COUNT {
            for j in 0..CASCADE_COUNT {
                program.set_uniform_int(&format!("lightDepthMaps[{}][{}]", i, j), default_bound);
            }
        }
    }

    /// Binds the skybox and irradiance maps starting at `first_slot` and
    /// returns the next free slot.
    fn bind_environment_maps(
        &mut self,
        camera: &CameraUnit,
        shader: ShaderHandle,
        first_slot: u32,
    ) -> u32 {
        let skybox = self.resources.bind_cube_map(camera.skybox_texture, first_slot);
        let irradiance = self
            .resources
            .bind_cube_map(camera.irradiance_texture, first_slot + 1);
        let program = self.resources.shader_mut(shader);
        program.set_uniform_int("environment.skybox", skybox);
        program.set_uniform_int("environment.irradiance", irradiance);
        program.set_uniform_mat3("environment.skyboxRotation", camera.inverse_skybox_rotation);
        first_slot + 2
    }

    fn light_pass_viewport_size(&self, camera: &CameraUnit) -> Vec2 {
        let output = self.resources.texture(camera.output_texture);
        Vec2::new(output.width() as f32, output.height() as f32)
    }

    fn draw_shadowed_spot_lights(&mut self, camera: &CameraUnit) {
        if self.pipeline.lighting.spot_lights.is_empty() {
            return;
        }

        let shader = self.pipeline.environment.shaders.spot_light;
        let pyramid = self.pipeline.lighting.pyramid_volume;
        let viewport_size = self.light_pass_viewport_size(camera);

        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_vec2("viewportSize", viewport_size);
            program.set_uniform_int("lightSamples", self.pipeline.environment.light_samples as i32);
            program.set_uniform_int(
                "pcfDistance",
                self.pipeline.environment.shadow_blur_iterations as i32,
            );
            program.set_uniform_bool("castsShadows", true);
        }
        self.bind_gbuffer(camera, shader);
        self.bind_camera_information(camera, shader);
        let texture_id = self.bind_environment_maps(camera, shader, 4);

        let lights: Vec<SpotLightUnit> = self.pipeline.lighting.spot_lights.clone();
        for light in lights {
            let bound = self.resources.bind_texture(light.shadow_map, texture_id);
            {
                let program = self.resources.shader_mut(shader);
                program.set_uniform_int("lightDepthMap", bound);
                program
                    .set_uniform_mat4("worldToLightTransform", light.biased_projection_matrix);
            }

            self.set_spot_light_attributes(&light.instance);
            let count = self.resources.geometry(pyramid).draw_count();
            self.engine
                .draw_triangles(pyramid, count, self.resources.shader(shader));
            self.mark_target_written();
        }
    }

    fn draw_shadowed_point_lights(&mut self, camera: &CameraUnit) {
        if self.pipeline.lighting.point_lights.is_empty() {
            return;
        }

        let shader = self.pipeline.environment.shaders.point_light;
        let sphere = self.pipeline.lighting.sphere_volume;
        let viewport_size = self.light_pass_viewport_size(camera);

        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_vec2("viewportSize", viewport_size);
            program.set_uniform_int("lightSamples", self.pipeline.environment.light_samples as i32);
            program.set_uniform_bool("castsShadows", true);
        }
        self.bind_gbuffer(camera, shader);
        self.bind_camera_information(camera, shader);
        let texture_id = self.bind_environment_maps(camera, shader, 4);

        let lights: Vec<PointLightUnit> = self.pipeline.lighting.point_lights.clone();
        for light in lights {
            let bound = self.resources.bind_cube_map(light.shadow_map, texture_id);
            self.resources
                .shader_mut(shader)
                .set_uniform_int("lightDepthMap", bound);

            self.set_point_light_attributes(&light.instance);
            let count = self.resources.geometry(sphere).draw_count();
            self.engine
                .draw_triangles(sphere, count, self.resources.shader(shader));
            self.mark_target_written();
        }
    }

    fn draw_non_shadowed_point_lights(&mut self, camera: &CameraUnit) {
        if self.pipeline.lighting.point_lights_instanced.is_empty() {
            return;
        }

        let shader = self.pipeline.environment.shaders.point_light;
        let sphere = self.pipeline.lighting.sphere_volume;
        let instance_count = self.pipeline.lighting.point_lights_instanced.len() as u32;
        self.bind_instanced_light_state(camera, shader);

        let count = self.resources.geometry(sphere).draw_count();
        self.engine.draw_triangles_instanced(
            sphere,
            count,
            self.resources.shader(shader),
            instance_count,
        );
        self.mark_target_written();
    }

    fn draw_non_shadowed_spot_lights(&mut self, camera: &CameraUnit) {
        if self.pipeline.lighting.spot_lights_instanced.is_empty() {
            return;
        }

        let shader = self.pipeline.environment.shaders.spot_light;
        let pyramid = self.pipeline.lighting.pyramid_volume;
        let instance_count = self.pipeline.lighting.spot_lights_instanced.len() as u32;
        self.bind_instanced_light_state(camera, shader);

        let count = self.resources.geometry(pyramid).draw_count();
        self.engine.draw_triangles_instanced(
            pyramid,
            count,
            self.resources.shader(shader),
            instance_count,
        );
        self.mark_target_written();
    }

    fn bind_instanced_light_state(&mut self, camera: &CameraUnit, shader: ShaderHandle) {
        self.bind_gbuffer(camera, shader);
        self.bind_camera_information(camera, shader);
        let texture_id = self.bind_environment_maps(camera, shader, 4);

        let viewport_size = self.light_pass_viewport_size(camera);
        let default_cube = self.pipeline.environment.default_black_cube_map;
        let bound = self.resources.bind_cube_map(default_cube, texture_id);
        let program = self.resources.shader_mut(shader);
        program.set_uniform_int("lightDepthMap", bound);
        program.set_uniform_int("lightSamples", self.pipeline.environment.light_samples as i32);
        program.set_uniform_vec2("viewportSize", viewport_size);
        program.set_uniform_bool("castsShadows", false);
    }

    fn set_point_light_attributes(&mut self, instance: &PointLightInstance) {
        self.engine.set_default_vertex_attribute(
            5,
            AttributeValue::Mat4(glam::Mat4::from_cols_array_2d(&instance.transform)),
        );
        self.engine
            .set_default_vertex_attribute(9, AttributeValue::Vec4(instance.position_radius.into()));
        self.engine
            .set_default_vertex_attribute(10, AttributeValue::Vec4(instance.color_ambient.into()));
    }

    fn set_spot_light_attributes(&mut self, instance: &SpotLightInstance) {
        self.engine.set_default_vertex_attribute(
            5,
            AttributeValue::Mat4(glam::Mat4::from_cols_array_2d(&instance.transform)),
        );
        self.engine
            .set_default_vertex_attribute(9, AttributeValue::Vec4(instance.position_inner.into()));
        self.engine
            .set_default_vertex_attribute(10, AttributeValue::Vec4(instance.direction_outer.into()));
        self.engine
            .set_default_vertex_attribute(11, AttributeValue::Vec4(instance.color_ambient.into()));
    }

    // === post processing ===

    fn perform_post_processing(&mut self, camera: &mut CameraUnit) {
        self.resources.generate_texture_mipmaps(camera.albedo_texture);
        self.resources.generate_texture_mipmaps(camera.material_texture);
        self.resources.generate_texture_mipmaps(camera.normal_texture);
        self.resources.generate_texture_mipmaps(camera.depth_texture);

        self.apply_ambient_occlusion(camera);
        self.apply_ssr(camera);

        // skybox, transparents and debug lines land in the lit HDR image,
        // depth-tested against the G-buffer depth but without writing it
        let post_process = self.pipeline.environment.post_process_framebuffer;
        self.resources
            .attach_texture(post_process, camera.hdr_texture, Attachment::Color0);
        self.resources
            .attach_texture(post_process, camera.depth_texture, Attachment::Depth);
        self.attach_framebuffer_no_clear(post_process);
        self.engine.use_depth_buffer_mask(false);
        self.draw_skybox(camera);
        self.draw_transparent_objects(camera);
        self.draw_debug_buffer(camera);
        self.engine.use_depth_buffer_mask(true);
        self.resources.detach(post_process, Attachment::Depth);

        self.compute_bloom_effect(camera);
        self.apply_chromatic_aberration(camera);
        self.apply_fog_effect(camera);

        self.apply_hdr_to_ldr_conversion(camera);

        self.apply_fxaa(camera);
        self.apply_vignette(camera);
    }

    fn apply_ambient_occlusion(&mut self, camera: &mut CameraUnit) {
        let samples = match camera.effects {
            Some(effects) if effects.ambient_occlusion_samples > 0 => effects,
            _ => return,
        };

        let compute = self.pipeline.environment.shaders.ambient_occlusion;
        {
            let program = self.resources.shader_mut(compute);
            program.ignore_non_existing_uniform("materialTex");
            program.ignore_non_existing_uniform("albedoTex");
        }
        self.bind_gbuffer(camera, compute);
        self.bind_camera_information(camera, compute);

        {
            let kernel = self.pipeline.environment.ao_noise_kernel.clone();
            let program = self.resources.shader_mut(compute);
            program.set_uniform_int("sampleCount", samples.ambient_occlusion_samples as i32);
            program.set_uniform_float("radius", samples.ambient_occlusion_radius);
            program.set_uniform_float("intensity", samples.ambient_occlusion_intensity);
            for (i, sample) in kernel.iter().enumerate() {
                program.set_uniform_vec3(&format!("kernel[{}]", i), *sample);
            }
        }

        let ao_texture = self.pipeline.environment.ambient_occlusion_texture;
        self.render_to_texture(ao_texture, compute);
        self.resources.generate_texture_mipmaps(ao_texture);

        let apply = self.pipeline.environment.shaders.apply_ambient_occlusion;
        let input = self.resources.bind_texture(camera.hdr_texture, 0);
        let ao = self.resources.bind_texture(ao_texture, 1);
        {
            let program = self.resources.shader_mut(apply);
            program.set_uniform_int("inputTex", input);
            program.set_uniform_int("aoTex", ao);
        }

        self.render_to_texture(camera.swap_texture, apply);
        std::mem::swap(&mut camera.hdr_texture, &mut camera.swap_texture);
    }

    fn apply_ssr(&mut self, camera: &mut CameraUnit) {
        let ssr = match camera.ssr {
            Some(ssr) => ssr,
            None => return,
        };
        self.resources.generate_texture_mipmaps(camera.hdr_texture);

        let shader = self.pipeline.environment.shaders.ssr;
        self.resources
            .shader_mut(shader)
            .ignore_non_existing_uniform("albedoTex");

        self.bind_gbuffer(camera, shader);
        self.bind_camera_information(camera, shader);
        let input = self.resources.bind_texture(camera.hdr_texture, 4);
        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_int("HDRTex", input);
            program.set_uniform_float("thickness", ssr.thickness);
            program.set_uniform_float("maxCosAngle", ssr.max_cos_angle);
            program.set_uniform_int("steps", ssr.steps as i32);
            program.set_uniform_float("maxDistance", ssr.max_distance);
        }

        self.render_to_texture(camera.swap_texture, shader);
        std::mem::swap(&mut camera.hdr_texture, &mut camera.swap_texture);
    }

    fn compute_bloom_effect(&mut self, camera: &mut CameraUnit) {
        let effects = match camera.effects {
            Some(effects) => effects,
            None => return,
        };
        let iterations = 2 * effects.bloom_iterations;
        if iterations == 0 {
            return;
        }

        let environment = &self.pipeline.environment;
        let bloom_buffers = environment.bloom_buffers;
        let bloom_textures = environment.bloom_textures;
        let split_shader = environment.shaders.bloom_split;
        let iter_shader = environment.shaders.bloom_iteration;

        // dense fog swallows bloom, fade it out accordingly
        let fog_reduce = environment.fog_distance * (-25.0 * environment.fog_density).exp();
        let bloom_weight = effects.bloom_weight * fog_reduce;

        let albedo = self.resources.bind_texture(camera.albedo_texture, 0);
        let material = self.resources.bind_texture(camera.material_texture, 1);
        {
            let program = self.resources.shader_mut(split_shader);
            program.set_uniform_int("albedoTex", albedo);
            program.set_uniform_int("materialTex", material);
            program.set_uniform_float("weight", bloom_weight);
        }
        self.render_to_framebuffer(bloom_buffers[1], split_shader);

        self.resources
            .shader_mut(iter_shader)
            .set_uniform_int("BloomTexture", 0);
        for i in 0..iterations {
            let target = bloom_buffers[(i & 1) as usize];
            let source_texture = bloom_textures[(1 - (i & 1)) as usize];
            self.resources
                .shader_mut(iter_shader)
                .set_uniform_int("horizontalKernel", (i & 1) as i32);
            self.resources.bind_texture(source_texture, 0);
            self.render_to_framebuffer(target, iter_shader);
        }
        let result = bloom_textures[1];
        self.resources.generate_texture_mipmaps(result);

        // additive blend the blurred highlights back into the HDR image
        self.engine.use_blending(BlendFactor::One, BlendFactor::One);
        let post_process = self.pipeline.environment.post_process_framebuffer;
        self.attach_framebuffer_no_clear(post_process);
        self.submit_image(result);
        self.engine.use_blending(BlendFactor::One, BlendFactor::Zero);
    }

    fn apply_fog_effect(&mut self, camera: &mut CameraUnit) {
        let environment = &self.pipeline.environment;
        // these exact parameters produce no fog at all, skip the pass
        if environment.fog_distance == 1.0 && environment.fog_density == 0.0 {
            return;
        }

        let shader = environment.shaders.fog;
        {
            let program = self.resources.shader_mut(shader);
            program.ignore_non_existing_uniform("camera.viewProjMatrix");
            program.ignore_non_existing_uniform("normalTex");
            program.ignore_non_existing_uniform("albedoTex");
            program.ignore_non_existing_uniform("materialTex");
        }

        let input = self.resources.bind_texture(camera.hdr_texture, 4);
        self.resources
            .shader_mut(shader)
            .set_uniform_int("cameraOutput", input);

        let color_multiplier = camera.effects.map_or(1.0, |e| e.fog_color_multiplier);
        self.bind_gbuffer(camera, shader);
        self.bind_fog_information(shader, color_multiplier);
        self.bind_camera_information(camera, shader);

        self.render_to_texture(camera.swap_texture, shader);
        std::mem::swap(&mut camera.hdr_texture, &mut camera.swap_texture);
    }

    fn apply_chromatic_aberration(&mut self, camera: &mut CameraUnit) {
        let effects = match camera.effects {
            Some(effects) if effects.chromatic_aberration_intensity > 0.0 => effects,
            _ => return,
        };

        let shader = self.pipeline.environment.shaders.chromatic_aberration;
        let input = self.resources.bind_texture(camera.hdr_texture, 0);
        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_int("tex", input);
            program.set_uniform_vec3(
                "chromaticAberrationParams",
                Vec3::new(
                    effects.chromatic_aberration_min_distance,
                    effects.chromatic_aberration_intensity,
                    effects.chromatic_aberration_distortion,
                ),
            );
        }

        self.render_to_texture(camera.swap_texture, shader);
        std::mem::swap(&mut camera.hdr_texture, &mut camera.swap_texture);
    }

    fn compute_average_white(
        &mut self,
        camera: &CameraUnit,
        tone_mapping: &CameraToneMapping,
    ) -> TextureHandle {
        self.resources.generate_texture_mipmaps(camera.hdr_texture);

        let eye_adaptation = 1.0
            - (-tone_mapping.eye_adaptation_speed * self.pipeline.environment.time_delta).exp();

        let shader = self.pipeline.environment.shaders.average_white;
        let output = self.pipeline.environment.average_white_texture;
        self.resources.bind_texture(camera.hdr_texture, 0);
        self.resources.bind_texture(camera.average_white_texture, 1);
        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_int("curFrameHDR", 0);
            program.set_uniform_int("prevFrameWhite", 1);
            program.set_uniform_float("eyeAdaptation", eye_adaptation);
            program.set_uniform_float(
                "eyeAdaptationThreshold",
                tone_mapping.eye_adaptation_threshold,
            );
        }
        self.render_to_texture(output, shader);
        self.resources.generate_texture_mipmaps(output);
        // persist this frame's result for the next frame's adaptation
        self.copy_texture(output, camera.average_white_texture);
        output
    }

    fn apply_hdr_to_ldr_conversion(&mut self, camera: &mut CameraUnit) {
        let tone_mapping = match camera.tone_mapping {
            Some(tone_mapping) => tone_mapping,
            None => return,
        };

        let average_white = self.compute_average_white(camera, &tone_mapping);
        let shader = self.pipeline.environment.shaders.hdr_to_ldr;
        let [a, b, c, d, e, f] = tone_mapping.aces_coefficients;

        let input = self.resources.bind_texture(camera.hdr_texture, 0);
        let white = self.resources.bind_texture(average_white, 1);
        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_int("HDRTex", input);
            program.set_uniform_int("averageWhiteTex", white);
            program.set_uniform_float("exposure", tone_mapping.exposure);
            program.set_uniform_float("colorMultiplier", tone_mapping.color_multiplier);
            program.set_uniform_float("whitePoint", tone_mapping.white_point);
            program.set_uniform_float("minLuminance", tone_mapping.min_luminance);
            program.set_uniform_float("maxLuminance", tone_mapping.max_luminance);
            program.set_uniform_vec3("ABCcoefsACES", Vec3::new(a, b, c));
            program.set_uniform_vec3("DEFcoefsACES", Vec3::new(d, e, f));
            program.set_uniform_float("gamma", camera.gamma);
        }

        self.render_to_texture(camera.swap_texture, shader);
        std::mem::swap(&mut camera.hdr_texture, &mut camera.swap_texture);
    }

    fn apply_fxaa(&mut self, camera: &mut CameraUnit) {
        match camera.effects {
            Some(effects) if effects.is_fxaa_enabled => {}
            _ => return,
        }

        let shader = self.pipeline.environment.shaders.fxaa;
        let input = self.resources.bind_texture(camera.hdr_texture, 0);
        self.resources.shader_mut(shader).set_uniform_int("tex", input);

        self.render_to_texture(camera.swap_texture, shader);
        std::mem::swap(&mut camera.hdr_texture, &mut camera.swap_texture);
    }

    fn apply_vignette(&mut self, camera: &mut CameraUnit) {
        let effects = match camera.effects {
            Some(effects) if effects.vignette_radius > 0.0 => effects,
            _ => return,
        };

        let shader = self.pipeline.environment.shaders.vignette;
        let input = self.resources.bind_texture(camera.hdr_texture, 0);
        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_int("tex", input);
            program.set_uniform_float("radius", effects.vignette_radius);
            program.set_uniform_float("intensity", effects.vignette_intensity);
        }

        self.render_to_texture(camera.swap_texture, shader);
        std::mem::swap(&mut camera.hdr_texture, &mut camera.swap_texture);
    }

    fn draw_skybox(&mut self, camera: &CameraUnit) {
        let shader = self.pipeline.environment.shaders.skybox;
        let geometry = self.pipeline.environment.skybox_cube;

        // the sky is lit by the sum of the enabled directional lights
        let sky_luminance: f32 = self
            .pipeline
            .lighting
            .directional_lights
            .iter()
            .take(MAX_DIR_LIGHT_COUNT)
            .map(|light| light.intensity)
            .sum();

        let skybox = self.resources.bind_cube_map(camera.skybox_texture, 0);
        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_mat4("StaticViewProjection", camera.static_view_projection);
            program.set_uniform_mat3("Rotation", camera.inverse_skybox_rotation.transpose());
            program.set_uniform_float("gamma", camera.gamma);
            program.set_uniform_float("luminance", sky_luminance);
            program.set_uniform_int("skybox", skybox);
        }

        let count = self.resources.geometry(geometry).draw_count();
        self.engine
            .draw_triangles(geometry, count, self.resources.shader(shader));
        self.mark_target_written();
    }

    fn draw_transparent_objects(&mut self, camera: &CameraUnit) {
        if self.pipeline.transparent_units.is_empty() {
            return;
        }

        self.engine
            .use_blending(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        self.toggle_face_culling(false, true, true);

        let shader = self.pipeline.environment.shaders.transparent;
        {
            let program = self.resources.shader_mut(shader);
            program.set_uniform_vec3("viewportPosition", camera.viewport_position);
            program.set_uniform_float("gamma", camera.gamma);
        }

        // material textures occupy the first slots, lighting data follows
        let texture_id = self.bind_environment_maps(camera, shader, MATERIAL_TEXTURE_COUNT);
        self.bind_directional_light_array(shader, texture_id);

        self.draw_objects(camera, shader, true);

        self.toggle_face_culling(true, true, true);
        self.engine.use_blending(BlendFactor::One, BlendFactor::Zero);
    }

    fn draw_debug_buffer(&mut self, camera: &CameraUnit) {
        let geometry = self.pipeline.environment.debug_buffer;
        let vertex_count = self.resources.geometry(geometry).vertex_count();
        if vertex_count == 0 {
            return;
        }

        self.engine
            .use_depth_buffer(!self.pipeline.environment.overlay_debug_draws);

        let shader = self.pipeline.environment.shaders.debug_draw;
        self.resources
            .shader_mut(shader)
            .set_uniform_mat4("ViewProjMatrix", camera.view_projection);

        self.engine
            .draw_lines(geometry, vertex_count, self.resources.shader(shader));
        self.mark_target_written();

        self.engine.use_depth_buffer(true);
    }

    // === shared binding helpers ===

    fn bind_gbuffer(&mut self, camera: &CameraUnit, shader: ShaderHandle) {
        let albedo = self.resources.bind_texture(camera.albedo_texture, 0);
        let normal = self.resources.bind_texture(camera.normal_texture, 1);
        let material = self.resources.bind_texture(camera.material_texture, 2);
        let depth = self.resources.bind_texture(camera.depth_texture, 3);

        let program = self.resources.shader_mut(shader);
        program.set_uniform_int("albedoTex", albedo);
        program.set_uniform_int("normalTex", normal);
        program.set_uniform_int("materialTex", material);
        program.set_uniform_int("depthTex", depth);
    }

    fn bind_camera_information(&mut self, camera: &CameraUnit, shader: ShaderHandle) {
        let program = self.resources.shader_mut(shader);
        program.set_uniform_vec3("camera.position", camera.viewport_position);
        program.set_uniform_mat4("camera.viewProjMatrix", camera.view_projection);
        program.set_uniform_mat4("camera.invViewProjMatrix", camera.inverse_view_projection);
    }

    fn bind_fog_information(&mut self, shader: ShaderHandle, color_multiplier: f32) {
        let environment = &self.pipeline.environment;
        let (distance, density, color) = (
            environment.fog_distance,
            environment.fog_density,
            environment.fog_color,
        );
        let program = self.resources.shader_mut(shader);
        program.set_uniform_float("fog.distance", distance);
        program.set_uniform_float("fog.density", density);
        program.set_uniform_vec3("fog.color", color * color_multiplier);
    }

    // === framebuffer plumbing ===

    fn attach_framebuffer(&mut self, framebuffer: FrameBufferHandle) {
        self.attach_framebuffer_no_clear(framebuffer);
        self.engine.clear();
    }

    fn attach_framebuffer_no_clear(&mut self, framebuffer: FrameBufferHandle) {
        self.engine.bind_framebuffer(Some(framebuffer));
        let fb = self.resources.framebuffer(framebuffer);
        let (width, height) = (fb.width() as i32, fb.height() as i32);
        self.engine.set_viewport(0, 0, width, height);
        self.current_target = Some(framebuffer);
    }

    fn attach_default_framebuffer(&mut self) {
        self.engine.bind_framebuffer(None);
        let (width, height) = self.pipeline.environment.viewport;
        self.engine.set_viewport(0, 0, width as i32, height as i32);
        self.engine.clear();
        self.current_target = None;
    }

    fn render_to_framebuffer(&mut self, framebuffer: FrameBufferHandle, shader: ShaderHandle) {
        self.attach_framebuffer(framebuffer);
        let rectangle = self.pipeline.environment.rectangle;
        let count = self.resources.geometry(rectangle).draw_count();
        self.engine
            .draw_triangles(rectangle, count, self.resources.shader(shader));
        self.mark_target_written();
    }

    fn render_to_texture(&mut self, texture: TextureHandle, shader: ShaderHandle) {
        let post_process = self.pipeline.environment.post_process_framebuffer;
        self.resources
            .attach_texture(post_process, texture, Attachment::Color0);
        self.render_to_framebuffer(post_process, shader);
    }

    fn copy_texture(&mut self, input: TextureHandle, output: TextureHandle) {
        let post_process = self.pipeline.environment.post_process_framebuffer;
        self.resources
            .attach_texture(post_process, output, Attachment::Color0);
        self.attach_framebuffer_no_clear(post_process);
        self.submit_image(input);
    }

    /// Full-screen blit of `texture` into the currently attached target.
    fn submit_image(&mut self, texture: TextureHandle) {
        let shader = self.pipeline.environment.shaders.image_forward;
        let rectangle = self.pipeline.environment.rectangle;

        self.resources.shader_mut(shader).set_uniform_int("tex", 0);
        self.resources.bind_texture(texture, 0);

        let count = self.resources.geometry(rectangle).draw_count();
        self.engine
            .draw_triangles(rectangle, count, self.resources.shader(shader));
        self.mark_target_written();
    }

    fn mark_target_written(&mut self) {
        if let Some(target) = self.current_target {
            self.resources.mark_framebuffer_written(target);
        }
    }

    // === render state ===

    pub fn toggle_reversed_depth(&mut self, value: bool) {
        self.engine.use_reversed_depth(value);
    }

    pub fn toggle_face_culling(&mut self, value: bool, counter_clockwise: bool, cull_back: bool) {
        self.engine.use_culling(value, counter_clockwise, cull_back);
    }

    pub fn set_anisotropic_filtering(&mut self, value: f32) {
        self.engine.use_anisotropic_filtering(value);
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.engine.set_viewport(x, y, width, height);
    }

    pub fn render(&mut self) {
        self.engine.flush();
    }

    pub fn clear(&mut self) {
        self.engine.clear();
    }
}

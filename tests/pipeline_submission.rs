use glam::{Quat, Vec3};

use helios::engine::RecordingEngine;
use helios::renderer::{Material, RenderController, SubMesh, MAX_DIR_LIGHT_COUNT};
use helios::resources::BoundResource;
use helios::scene::{
    Camera, CameraController, DirectionalLight, PointLight, Skybox, SpotLight, Transform,
    CASCADE_COUNT,
};
use helios::settings::RenderSettings;

fn make_controller() -> RenderController<RecordingEngine> {
    RenderController::new(RecordingEngine::new(), &RenderSettings::default())
}

fn make_camera(controller: &mut RenderController<RecordingEngine>) -> CameraController {
    let camera = Camera::perspective(1.0, 16.0 / 9.0, 0.1, 500.0);
    CameraController::new(camera, controller.resources_mut(), 128, 128)
}

fn make_submesh(controller: &mut RenderController<RecordingEngine>) -> SubMesh {
    let cube = controller.resources_mut().create_geometry("Cube", 24, 36);
    SubMesh::new(cube, 36)
}

#[test]
fn transparency_below_one_routes_to_transparent_pass() {
    let mut controller = make_controller();
    let submesh = make_submesh(&mut controller);

    let opaque = Material::default();
    controller.submit_primitive(&submesh, &opaque, &Transform::default(), 0);
    assert_eq!(controller.pipeline().opaque_units.len(), 1);
    assert_eq!(controller.pipeline().transparent_units.len(), 0);

    let translucent = Material {
        transparency: 0.99,
        ..Material::default()
    };
    controller.submit_primitive(&submesh, &translucent, &Transform::default(), 0);
    assert_eq!(controller.pipeline().opaque_units.len(), 1);
    assert_eq!(controller.pipeline().transparent_units.len(), 1);
}

#[test]
fn displacement_scales_with_combined_transform() {
    let mut controller = make_controller();
    let submesh = make_submesh(&mut controller);
    let material = Material {
        displacement: 0.5,
        ..Material::default()
    };
    let parent = Transform::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::splat(2.0));

    controller.submit_primitive(&submesh, &material, &parent, 0);
    let unit = &controller.pipeline().material_units[0];
    assert!((unit.displacement - 1.0).abs() < 1e-6);
}

#[test]
fn shadow_casters_follow_the_material_flag() {
    let mut controller = make_controller();
    let submesh = make_submesh(&mut controller);

    let casting = Material::default();
    let non_casting = Material {
        casts_shadow: false,
        ..Material::default()
    };
    controller.submit_primitive(&submesh, &casting, &Transform::default(), 0);
    controller.submit_primitive(&submesh, &non_casting, &Transform::default(), 0);

    assert_eq!(controller.pipeline().opaque_units.len(), 2);
    assert_eq!(controller.pipeline().shadow_caster_units.len(), 1);
}

#[test]
fn material_indices_reference_already_appended_entries() {
    let mut controller = make_controller();
    let submesh = make_submesh(&mut controller);

    for i in 0..5 {
        let material = Material {
            transparency: if i % 2 == 0 { 1.0 } else { 0.5 },
            ..Material::default()
        };
        controller.submit_primitive(&submesh, &material, &Transform::default(), 0);
    }

    let pipeline = controller.pipeline();
    let all_units = pipeline
        .opaque_units
        .iter()
        .chain(pipeline.transparent_units.iter())
        .chain(pipeline.shadow_caster_units.iter());
    for unit in all_units {
        assert!(unit.material_index < pipeline.material_units.len());
    }
}

#[test]
fn unset_material_maps_are_backfilled_with_defaults() {
    let mut controller = make_controller();
    let submesh = make_submesh(&mut controller);

    controller.submit_primitive(&submesh, &Material::default(), &Transform::default(), 0);

    let defaults = controller.environment().default_material_textures();
    let unit = &controller.pipeline().material_units[0];
    assert_eq!(unit.albedo_map, defaults.material);
    assert_eq!(unit.normal_map, defaults.normal);
    assert_eq!(unit.height_map, defaults.black);
}

#[test]
fn reset_pipeline_clears_every_submission_list() {
    let mut controller = make_controller();
    let submesh = make_submesh(&mut controller);
    let mut camera = make_camera(&mut controller);

    let sun = DirectionalLight::new(controller.resources_mut(), 512);
    let lamp = PointLight::default();
    let mut spot = SpotLight::default();
    spot.enable_shadows(controller.resources_mut(), 512);

    controller.submit_camera(&mut camera, &Transform::default(), &Skybox::default(), None, None, None);
    controller.submit_directional_light(&sun, &Transform::default());
    controller.submit_point_light(&lamp, &Transform::default());
    controller.submit_spot_light(&spot, &Transform::default());
    controller.submit_primitive(&submesh, &Material::default(), &Transform::default(), 0);

    controller.reset_pipeline();

    let pipeline = controller.pipeline();
    assert!(pipeline.cameras.is_empty());
    assert!(pipeline.lighting.directional_lights.is_empty());
    assert!(pipeline.lighting.point_lights_instanced.is_empty());
    assert!(pipeline.lighting.spot_lights.is_empty());
    assert!(pipeline.opaque_units.is_empty());
    assert!(pipeline.material_units.is_empty());
}

#[test]
fn directional_lights_beyond_the_cap_are_ignored_at_draw_time() {
    let mut controller = make_controller();
    let submesh = make_submesh(&mut controller);
    let mut camera = make_camera(&mut controller);

    let lights: Vec<DirectionalLight> = (0..MAX_DIR_LIGHT_COUNT + 1)
        .map(|_| DirectionalLight::new(controller.resources_mut(), 256))
        .collect();

    controller.submit_camera(&mut camera, &Transform::default(), &Skybox::default(), None, None, None);
    for light in &lights {
        controller.submit_directional_light(light, &Transform::default());
    }
    controller.submit_primitive(&submesh, &Material::default(), &Transform::default(), 0);
    controller.start_pipeline();

    let shader_handle = controller.environment().shaders.global_illumination;
    let shader = controller.resources().shader(shader_handle);
    assert_eq!(shader.uniform_int("lightCount"), Some(MAX_DIR_LIGHT_COUNT as i32));

    // slots 4 and 5 hold the environment maps, cascades fill the next
    // 4 * 3 slots, the padding sampler sits right after them
    let padding_slot = 6 + (MAX_DIR_LIGHT_COUNT * CASCADE_COUNT) as u32;
    let default_shadow_map = controller.environment().default_shadow_map;
    assert_eq!(
        controller.resources().bound_resource(padding_slot),
        Some(BoundResource::Texture(default_shadow_map))
    );
}

#[test]
fn missing_directional_slots_sample_the_default_shadow_map() {
    let mut controller = make_controller();
    let submesh = make_submesh(&mut controller);
    let mut camera = make_camera(&mut controller);
    let sun = DirectionalLight::new(controller.resources_mut(), 256);

    controller.submit_camera(&mut camera, &Transform::default(), &Skybox::default(), None, None, None);
    controller.submit_directional_light(&sun, &Transform::default());
    controller.submit_primitive(&submesh, &Material::default(), &Transform::default(), 0);
    controller.start_pipeline();

    let padding_slot = (6 + CASCADE_COUNT) as i32;
    let shader_handle = controller.environment().shaders.global_illumination;
    let shader = controller.resources().shader(shader_handle);
    assert_eq!(shader.uniform_int("lightCount"), Some(1));
    for i in 1..MAX_DIR_LIGHT_COUNT {
        for j in 0..CASCADE_COUNT {
            let name = format!("lightDepthMaps[{}][{}]", i, j);
            assert_eq!(shader.uniform_int(&name), Some(padding_slot));
        }
    }
}

#[test]
fn shadowed_lights_take_the_per_light_path() {
    let mut controller = make_controller();

    let mut shadowed = PointLight::default();
    shadowed.enable_shadows(controller.resources_mut(), 512);
    let plain = PointLight::default();

    controller.submit_point_light(&shadowed, &Transform::default());
    controller.submit_point_light(&plain, &Transform::default());

    let lighting = &controller.pipeline().lighting;
    assert_eq!(lighting.point_lights.len(), 1);
    assert_eq!(lighting.point_lights_instanced.len(), 1);
}

#[test]
fn shadowed_light_matrices_carry_the_texture_space_bias() {
    let mut controller = make_controller();
    let mut spot = SpotLight::default();
    spot.enable_shadows(controller.resources_mut(), 512);
    let position = Transform::from_translation(Vec3::new(0.0, 5.0, 0.0));

    controller.submit_spot_light(&spot, &position);

    let unit = &controller.pipeline().lighting.spot_lights[0];
    // [-1, 1] clip space maps to [0, 1] texture space
    let clip_max = unit.projection_matrix * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
    let biased = unit.biased_projection_matrix * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
    let expected = (clip_max.truncate() * 0.5 + glam::Vec3::splat(0.5) * clip_max.w).extend(clip_max.w);
    assert!(biased.abs_diff_eq(expected, 1e-5));
}

#[test]
fn instanced_light_color_is_premultiplied_by_intensity() {
    let mut controller = make_controller();
    let mut lamp = PointLight::default();
    lamp.color = Vec3::new(1.0, 0.5, 0.25);
    lamp.intensity = 2.0;
    lamp.ambient_intensity = 0.1;

    controller.submit_point_light(&lamp, &Transform::default());

    let instance = &controller.pipeline().lighting.point_lights_instanced.instances[0];
    assert_eq!(instance.color_ambient, [2.0, 1.0, 0.5, 0.1]);
}

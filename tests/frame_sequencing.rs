use helios::engine::{BlendFactor, RecordingEngine};
use helios::renderer::{Material, RenderController, SubMesh};
use helios::scene::{Camera, CameraController, DirectionalLight, PointLight, Skybox, Transform};
use helios::settings::RenderSettings;

fn make_controller() -> RenderController<RecordingEngine> {
    RenderController::new(RecordingEngine::new(), &RenderSettings::default())
}

fn make_camera(controller: &mut RenderController<RecordingEngine>) -> CameraController {
    let camera = Camera::perspective(1.0, 1.0, 0.1, 500.0);
    CameraController::new(camera, controller.resources_mut(), 64, 64)
}

fn submit_basic_scene(
    controller: &mut RenderController<RecordingEngine>,
    camera: &mut CameraController,
) {
    let cube = controller.resources_mut().create_geometry("Cube", 24, 36);
    let submesh = SubMesh::new(cube, 36);
    let sun = DirectionalLight::new(controller.resources_mut(), 256);

    controller.submit_camera(camera, &Transform::default(), &Skybox::default(), None, None, None);
    controller.submit_directional_light(&sun, &Transform::default());
    controller.submit_primitive(&submesh, &Material::default(), &Transform::default(), 0);
}

#[test]
fn no_cameras_falls_back_to_the_default_framebuffer() {
    let mut controller = make_controller();
    controller.start_pipeline();

    assert!(controller.engine().draws().is_empty());
    // default framebuffer still gets attached and cleared
    assert_eq!(controller.engine().clear_count(), 1);
}

#[test]
fn cameras_not_rendering_to_texture_are_skipped() {
    let mut controller = make_controller();
    let mut camera = make_camera(&mut controller);
    camera.render_to_texture = false;
    submit_basic_scene(&mut controller, &mut camera);

    controller.start_pipeline();

    // only the shadow pass runs for a disabled camera
    assert_eq!(controller.engine().draw_count_for_shader("GBuffer"), 0);
    assert!(controller.engine().draw_count_for_shader("DepthTexture") > 0);
}

#[test]
fn passes_run_in_shadow_geometry_lighting_order() {
    let mut controller = make_controller();
    let mut camera = make_camera(&mut controller);
    submit_basic_scene(&mut controller, &mut camera);

    controller.start_pipeline();

    let draws = controller.engine().draws();
    let position = |shader: &str| draws.iter().position(|d| d.shader == shader).unwrap();

    let shadow = position("DepthTexture");
    let gbuffer = position("GBuffer");
    let lighting = position("GlobalIllumination");
    let sky = position("Skybox");
    let blit = position("ImageForward");
    assert!(shadow < gbuffer);
    assert!(gbuffer < lighting);
    assert!(lighting < sky);
    assert!(sky < blit);
}

#[test]
fn finished_frame_lands_in_the_output_texture_with_mipmaps() {
    let mut controller = make_controller();
    let mut camera = make_camera(&mut controller);
    let output = camera.render_texture();
    let hdr = camera.targets().hdr;
    submit_basic_scene(&mut controller, &mut camera);

    controller.start_pipeline();

    assert!(controller.resources().texture(hdr).write_count() > 0);
    assert!(controller.resources().texture(output).write_count() > 0);
    assert!(controller.resources().texture(output).mip_count() > 1);
}

#[test]
fn gbuffer_pass_writes_all_four_targets() {
    let mut controller = make_controller();
    let mut camera = make_camera(&mut controller);
    let targets = *camera.targets();
    submit_basic_scene(&mut controller, &mut camera);

    controller.start_pipeline();

    for texture in [targets.albedo, targets.normal, targets.material, targets.depth] {
        assert!(controller.resources().texture(texture).write_count() > 0);
    }
}

#[test]
fn light_volumes_blend_additively() {
    let mut controller = make_controller();
    let mut camera = make_camera(&mut controller);
    submit_basic_scene(&mut controller, &mut camera);
    controller.submit_point_light(&PointLight::default(), &Transform::default());

    controller.start_pipeline();

    let volume_draws: Vec<_> = controller
        .engine()
        .draws_with_shader("PointLight")
        .collect();
    assert_eq!(volume_draws.len(), 1);
    assert_eq!(volume_draws[0].blending, (BlendFactor::One, BlendFactor::One));

    // state is restored before post processing
    let last = controller.engine().draws().last().unwrap();
    assert_eq!(last.blending, (BlendFactor::One, BlendFactor::Zero));
}

#[test]
fn debug_lines_draw_without_depth_writes() {
    use helios::engine::{DrawKind, RenderStateFlags};

    let mut controller = make_controller();
    let mut camera = make_camera(&mut controller);
    submit_basic_scene(&mut controller, &mut camera);
    controller.set_debug_line_count(12);

    controller.start_pipeline();

    let debug_draw = controller
        .engine()
        .draws_with_shader("DebugDraw")
        .next()
        .expect("debug buffer should have been drawn");
    assert_eq!(debug_draw.kind, DrawKind::Lines);
    assert!(!debug_draw.state.contains(RenderStateFlags::DEPTH_WRITE));
    // overlay mode also disables the depth test
    assert!(!debug_draw.state.contains(RenderStateFlags::DEPTH_TEST));
}

#[test]
fn end_pipeline_blits_the_main_camera_to_the_window() {
    let mut controller = make_controller();
    let mut camera = make_camera(&mut controller);
    submit_basic_scene(&mut controller, &mut camera);

    controller.start_pipeline();
    controller.end_pipeline();

    let last = controller.engine().draws().last().unwrap();
    assert_eq!(last.shader, "ImageForward");
    assert!(last.framebuffer.is_none());
}

#[test]
fn end_pipeline_without_cameras_only_clears() {
    let mut controller = make_controller();
    controller.start_pipeline();
    controller.end_pipeline();
    assert!(controller.engine().draws().is_empty());
}

#[test]
fn perspective_cameras_enable_reversed_depth() {
    use helios::engine::RenderStateFlags;

    let mut controller = make_controller();
    let mut camera = make_camera(&mut controller);
    submit_basic_scene(&mut controller, &mut camera);

    controller.start_pipeline();

    let gbuffer_draw = controller
        .engine()
        .draws_with_shader("GBuffer")
        .next()
        .unwrap();
    assert!(gbuffer_draw.state.contains(RenderStateFlags::REVERSED_DEPTH));
}

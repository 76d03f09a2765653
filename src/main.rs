use glam::Vec3;
use log::info;

use helios::engine::RecordingEngine;
use helios::renderer::{Material, RenderController, SubMesh};
use helios::scene::{
    Camera, CameraController, CameraToneMapping, DirectionalLight, PointLight, Skybox, Transform,
};
use helios::settings::RenderSettings;
use helios::time::FrameTimer;

const FRAME_COUNT: u32 = 8;

fn main() {
    helios::init_logging();

    let settings = RenderSettings::load();
    let (width, height) = (settings.resolution.width, settings.resolution.height);
    info!(
        "starting headless renderer at {}x{}, shadow maps {}px",
        width, height, settings.shadow_map_size
    );

    let mut controller = RenderController::new(RecordingEngine::new(), &settings);

    let camera = Camera::perspective(65f32.to_radians(), width as f32 / height as f32, 0.1, 500.0);
    let mut viewport = CameraController::new(camera, controller.resources_mut(), width, height);
    viewport.rotate(std::f32::consts::PI, -0.3);
    let camera_transform = Transform::from_translation(Vec3::new(0.0, 3.0, 8.0));

    let mut sun = DirectionalLight::new(controller.resources_mut(), settings.shadow_map_size);
    sun.follow_viewport = Some(0.0);
    let mut lamp = PointLight::default();
    lamp.set_radius(6.0);
    let lamp_transform = Transform::from_translation(Vec3::new(2.0, 2.0, 0.0));

    let cube = controller.resources_mut().create_geometry("Cube", 24, 36);
    let cube_mesh = SubMesh::new(cube, 36);
    let floor_mesh = SubMesh {
        transform: Transform::from_trs(
            Vec3::new(0.0, -0.5, 0.0),
            glam::Quat::IDENTITY,
            Vec3::new(20.0, 0.1, 20.0),
        ),
        ..cube_mesh
    };
    let cube_material = Material {
        base_color: Vec3::new(0.8, 0.3, 0.2),
        roughness_factor: 0.4,
        ..Material::default()
    };
    let floor_material = Material::default();

    let mut timer = FrameTimer::new();
    for frame in 0..FRAME_COUNT {
        controller.reset_pipeline();
        controller.set_time_delta(timer.tick());

        controller.submit_camera(
            &mut viewport,
            &camera_transform,
            &Skybox::default(),
            None,
            Some(CameraToneMapping::default()),
            None,
        );
        // cascades recenter on the viewport when the light follows it
        let sun_center = if sun.follow_viewport.is_some() {
            camera_transform
        } else {
            Transform::default()
        };
        controller.submit_directional_light(&sun, &sun_center);
        controller.submit_point_light(&lamp, &lamp_transform);
        controller.submit_primitive(&cube_mesh, &cube_material, &Transform::default(), 0);
        controller.submit_primitive(&floor_mesh, &floor_material, &Transform::default(), 0);

        controller.start_pipeline();
        controller.end_pipeline();
        controller.render();

        info!(
            "frame {}: {} draw calls, {} clears",
            frame,
            controller.engine().draws().len(),
            controller.engine().clear_count()
        );
        controller.engine_mut().reset();
    }

    let output = viewport.render_texture();
    info!(
        "final image written {} times",
        controller.resources().texture(output).write_count()
    );
}

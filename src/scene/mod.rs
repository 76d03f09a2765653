pub mod camera;
pub mod effects;
pub mod lights;
pub mod skybox;
pub mod transform;

pub use camera::{Camera, CameraController, CameraProjection, CameraTargets};
pub use effects::{CameraEffects, CameraSsr, CameraToneMapping};
pub use lights::{DirectionalLight, PointLight, SpotLight, CASCADE_COUNT};
pub use skybox::Skybox;
pub use transform::Transform;

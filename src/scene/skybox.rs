use glam::Quat;

use crate::resources::CubeMapHandle;

/// Environment cube maps for a camera. `cube_map` is the visible background,
/// `irradiance` feeds image-based ambient lighting; either may be absent.
#[derive(Clone, Copy, Debug)]
pub struct Skybox {
    pub cube_map: Option<CubeMapHandle>,
    pub irradiance: Option<CubeMapHandle>,
    pub rotation: Quat,
    pub intensity: f32,
}

impl Default for Skybox {
    fn default() -> Self {
        Self {
            cube_map: None,
            irradiance: None,
            rotation: Quat::IDENTITY,
            intensity: 1.0,
        }
    }
}

impl Skybox {
    pub fn new() -> Self {
        Self::default()
    }
}

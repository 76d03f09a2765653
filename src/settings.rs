use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "RenderSettings::default_shadow_map_size")]
    pub shadow_map_size: u32,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "RenderSettings::default_anisotropic_filtering")]
    pub anisotropic_filtering: f32,
    #[serde(default = "RenderSettings::default_shadow_blur_iterations")]
    pub shadow_blur_iterations: u32,
    #[serde(default = "RenderSettings::default_light_samples")]
    pub light_samples: u32,
    #[serde(default)]
    pub main_camera_index: usize,
    #[serde(default = "RenderSettings::default_render_to_default_frame_buffer")]
    pub render_to_default_frame_buffer: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadow_map_size: Self::default_shadow_map_size(),
            resolution: Resolution::default(),
            anisotropic_filtering: Self::default_anisotropic_filtering(),
            shadow_blur_iterations: Self::default_shadow_blur_iterations(),
            light_samples: Self::default_light_samples(),
            main_camera_index: 0,
            render_to_default_frame_buffer: Self::default_render_to_default_frame_buffer(),
        }
    }
}

impl RenderSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RenderSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded render settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default render settings.",
                        path, err
                    );
                    RenderSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        if self.shadow_map_size == 0 {
            warn!("Shadow map size must be greater than zero. Using default value.");
            self.shadow_map_size = Self::default_shadow_map_size();
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        if self.anisotropic_filtering < 1.0 {
            warn!("Anisotropic filtering must be at least 1.0. Using default value.");
            self.anisotropic_filtering = Self::default_anisotropic_filtering();
        }

        if self.light_samples == 0 {
            warn!("Light sample count must be greater than zero. Using default value.");
            self.light_samples = Self::default_light_samples();
        }

        self
    }

    const fn default_shadow_map_size() -> u32 {
        2048
    }

    const fn default_anisotropic_filtering() -> f32 {
        4.0
    }

    const fn default_shadow_blur_iterations() -> u32 {
        1
    }

    const fn default_light_samples() -> u32 {
        4
    }

    const fn default_render_to_default_frame_buffer() -> bool {
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

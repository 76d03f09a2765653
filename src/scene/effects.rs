/// Screen-space effect settings attached to a camera. Absent component means
/// the whole group of passes is skipped for that camera.
#[derive(Clone, Copy, Debug)]
pub struct CameraEffects {
    pub fog_color_multiplier: f32,
    pub bloom_weight: f32,
    pub bloom_iterations: u32,
    pub vignette_radius: f32,
    pub vignette_intensity: f32,
    pub chromatic_aberration_intensity: f32,
    pub chromatic_aberration_min_distance: f32,
    pub chromatic_aberration_distortion: f32,
    pub ambient_occlusion_radius: f32,
    pub ambient_occlusion_intensity: f32,
    pub ambient_occlusion_samples: u32,
    pub is_fxaa_enabled: bool,
}

impl Default for CameraEffects {
    fn default() -> Self {
        Self {
            fog_color_multiplier: 1.0,
            bloom_weight: 0.5,
            bloom_iterations: 0,
            vignette_radius: 0.0,
            vignette_intensity: 100.0,
            chromatic_aberration_intensity: 0.0,
            chromatic_aberration_min_distance: 0.8,
            chromatic_aberration_distortion: 0.8,
            ambient_occlusion_radius: 1.0,
            ambient_occlusion_intensity: 1.0,
            ambient_occlusion_samples: 16,
            is_fxaa_enabled: false,
        }
    }
}

/// Tone-mapping settings: exposure, the filmic curve coefficients and the
/// eye-adaptation parameters for temporal luminance smoothing.
#[derive(Clone, Copy, Debug)]
pub struct CameraToneMapping {
    pub gamma: f32,
    pub exposure: f32,
    pub color_multiplier: f32,
    pub white_point: f32,
    pub min_luminance: f32,
    pub max_luminance: f32,
    pub eye_adaptation_speed: f32,
    pub eye_adaptation_threshold: f32,
    /// Shoulder strength, linear strength, linear angle, toe strength,
    /// toe numerator, toe denominator of the filmic curve.
    pub aces_coefficients: [f32; 6],
}

impl Default for CameraToneMapping {
    fn default() -> Self {
        Self {
            gamma: 2.2,
            exposure: 1.0,
            color_multiplier: 1.0,
            white_point: 1.0,
            min_luminance: 0.0,
            max_luminance: 100_000.0,
            eye_adaptation_speed: 1.0,
            eye_adaptation_threshold: 0.01,
            aces_coefficients: [0.22, 0.30, 0.10, 0.20, 0.01, 0.30],
        }
    }
}

/// Screen-space reflection settings.
#[derive(Clone, Copy, Debug)]
pub struct CameraSsr {
    pub thickness: f32,
    pub max_cos_angle: f32,
    pub steps: u32,
    pub max_distance: f32,
}

impl Default for CameraSsr {
    fn default() -> Self {
        Self {
            thickness: 0.5,
            max_cos_angle: 0.5,
            steps: 10,
            max_distance: 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_optional_passes_off() {
        let effects = CameraEffects::default();
        assert_eq!(effects.bloom_iterations, 0);
        assert_eq!(effects.vignette_radius, 0.0);
        assert_eq!(effects.chromatic_aberration_intensity, 0.0);
        assert!(!effects.is_fxaa_enabled);
    }
}

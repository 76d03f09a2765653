#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    Rgba16F,
    Depth,
}

/// CPU-side descriptor of a 2D GPU texture. The backing storage lives with
/// the rendering backend; this layer only tracks the metadata the frame
/// orchestration depends on (dimensions, mip chain, write history).
#[derive(Clone, Debug)]
pub struct Texture {
    label: String,
    width: u32,
    height: u32,
    format: TextureFormat,
    mip_count: u32,
    writes: u64,
}

impl Texture {
    pub fn new(label: impl Into<String>, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: label.into(),
            width: width.max(1),
            height: height.max(1),
            format,
            mip_count: 1,
            writes: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn mip_count(&self) -> u32 {
        self.mip_count
    }

    pub fn max_mip_count(&self) -> u32 {
        32 - self.width.max(self.height).leading_zeros()
    }

    pub fn generate_mipmaps(&mut self) {
        self.mip_count = self.max_mip_count();
    }

    /// Number of times this texture has been a render target for a draw.
    /// Lets headless frames observe that a pass actually produced output.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub(crate) fn mark_written(&mut self) {
        self.writes += 1;
    }
}

/// Descriptor of a cube map (six square faces). Used for skyboxes,
/// irradiance probes and point-light shadow maps.
#[derive(Clone, Debug)]
pub struct CubeMap {
    label: String,
    size: u32,
    format: TextureFormat,
    writes: u64,
}

impl CubeMap {
    pub fn new(label: impl Into<String>, size: u32, format: TextureFormat) -> Self {
        Self {
            label: label.into(),
            size: size.max(1),
            format,
            writes: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub(crate) fn mark_written(&mut self) {
        self.writes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_covers_largest_dimension() {
        let mut tex = Texture::new("Test", 256, 64, TextureFormat::Rgba8);
        assert_eq!(tex.mip_count(), 1);
        tex.generate_mipmaps();
        assert_eq!(tex.mip_count(), 9); // log2(256) + 1
    }

    #[test]
    fn zero_sized_texture_is_clamped() {
        let tex = Texture::new("Degenerate", 0, 0, TextureFormat::Depth);
        assert_eq!(tex.width(), 1);
        assert_eq!(tex.height(), 1);
    }
}

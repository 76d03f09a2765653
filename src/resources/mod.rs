pub mod framebuffer;
pub mod geometry;
pub mod handle;
pub mod registry;
pub mod shader;
pub mod texture;

pub use framebuffer::{Attachment, AttachmentTarget, FrameBuffer};
pub use geometry::Geometry;
pub use handle::Handle;
pub use registry::ResourceRegistry;
pub use shader::{Shader, UniformValue};
pub use texture::{CubeMap, Texture, TextureFormat};

pub type TextureHandle = Handle<Texture>;
pub type CubeMapHandle = Handle<CubeMap>;
pub type ShaderHandle = Handle<Shader>;
pub type FrameBufferHandle = Handle<FrameBuffer>;
pub type GeometryHandle = Handle<Geometry>;

/// Everything a texture binding slot may point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundResource {
    Texture(TextureHandle),
    CubeMap(CubeMapHandle),
}

/// Owner of all GPU resource descriptors plus the texture binding table.
/// Replaces scattered lazily-initialized globals with one explicit manager
/// that is created at startup and passed by reference.
pub struct GpuResources {
    textures: ResourceRegistry<Texture>,
    cube_maps: ResourceRegistry<CubeMap>,
    shaders: ResourceRegistry<Shader>,
    framebuffers: ResourceRegistry<FrameBuffer>,
    geometries: ResourceRegistry<Geometry>,
    bindings: Vec<Option<BoundResource>>,
}

impl GpuResources {
    pub fn new() -> Self {
        Self {
            textures: ResourceRegistry::new(),
            cube_maps: ResourceRegistry::new(),
            shaders: ResourceRegistry::new(),
            framebuffers: ResourceRegistry::new(),
            geometries: ResourceRegistry::new(),
            bindings: Vec::new(),
        }
    }

    pub fn create_texture(
        &mut self,
        label: impl Into<String>,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> TextureHandle {
        self.textures.insert(Texture::new(label, width, height, format))
    }

    pub fn create_cube_map(
        &mut self,
        label: impl Into<String>,
        size: u32,
        format: TextureFormat,
    ) -> CubeMapHandle {
        self.cube_maps.insert(CubeMap::new(label, size, format))
    }

    pub fn create_shader(&mut self, name: impl Into<String>) -> ShaderHandle {
        self.shaders.insert(Shader::new(name))
    }

    pub fn create_framebuffer(
        &mut self,
        label: impl Into<String>,
        width: u32,
        height: u32,
    ) -> FrameBufferHandle {
        self.framebuffers.insert(FrameBuffer::new(label, width, height))
    }

    pub fn create_geometry(
        &mut self,
        label: impl Into<String>,
        vertex_count: u32,
        index_count: u32,
    ) -> GeometryHandle {
        self.geometries.insert(Geometry::new(label, vertex_count, index_count))
    }

    pub fn texture(&self, handle: TextureHandle) -> &Texture {
        self.textures.get(handle)
    }

    pub fn texture_mut(&mut self, handle: TextureHandle) -> &mut Texture {
        self.textures.get_mut(handle)
    }

    pub fn cube_map(&self, handle: CubeMapHandle) -> &CubeMap {
        self.cube_maps.get(handle)
    }

    pub fn shader(&self, handle: ShaderHandle) -> &Shader {
        self.shaders.get(handle)
    }

    pub fn shader_mut(&mut self, handle: ShaderHandle) -> &mut Shader {
        self.shaders.get_mut(handle)
    }

    pub fn framebuffer(&self, handle: FrameBufferHandle) -> &FrameBuffer {
        self.framebuffers.get(handle)
    }

    pub fn geometry(&self, handle: GeometryHandle) -> &Geometry {
        self.geometries.get(handle)
    }

    pub fn geometry_mut(&mut self, handle: GeometryHandle) -> &mut Geometry {
        self.geometries.get_mut(handle)
    }

    /// Binds a texture to a binding slot and returns the slot id, which is
    /// what gets written into sampler uniforms.
    pub fn bind_texture(&mut self, handle: TextureHandle, slot: u32) -> i32 {
        // touch the registry so stale handles assert at bind time
        let _ = self.textures.get(handle);
        self.store_binding(slot, BoundResource::Texture(handle));
        slot as i32
    }

    pub fn bind_cube_map(&mut self, handle: CubeMapHandle, slot: u32) -> i32 {
        let _ = self.cube_maps.get(handle);
        self.store_binding(slot, BoundResource::CubeMap(handle));
        slot as i32
    }

    pub fn bound_resource(&self, slot: u32) -> Option<BoundResource> {
        self.bindings.get(slot as usize).copied().flatten()
    }

    fn store_binding(&mut self, slot: u32, resource: BoundResource) {
        let slot = slot as usize;
        if slot >= self.bindings.len() {
            self.bindings.resize(slot + 1, None);
        }
        self.bindings[slot] = Some(resource);
    }

    pub fn attach_texture(
        &mut self,
        framebuffer: FrameBufferHandle,
        texture: TextureHandle,
        slot: Attachment,
    ) {
        let (width, height) = {
            let tex = self.textures.get(texture);
            (tex.width(), tex.height())
        };
        self.framebuffers.get_mut(framebuffer).set_attachment(
            slot,
            Some(AttachmentTarget::Texture(texture)),
            width,
            height,
        );
    }

    pub fn attach_cube_map(
        &mut self,
        framebuffer: FrameBufferHandle,
        cube_map: CubeMapHandle,
        slot: Attachment,
    ) {
        let size = self.cube_maps.get(cube_map).size();
        self.framebuffers.get_mut(framebuffer).set_attachment(
            slot,
            Some(AttachmentTarget::CubeMap(cube_map)),
            size,
            size,
        );
    }

    pub fn detach(&mut self, framebuffer: FrameBufferHandle, slot: Attachment) {
        self.framebuffers
            .get_mut(framebuffer)
            .set_attachment(slot, None, 0, 0);
    }

    pub fn generate_texture_mipmaps(&mut self, handle: TextureHandle) {
        self.textures.get_mut(handle).generate_mipmaps();
    }

    /// Records a write to every attachment of the framebuffer. Called by the
    /// controller whenever a draw lands in a bound target.
    pub fn mark_framebuffer_written(&mut self, handle: FrameBufferHandle) {
        let attachments = {
            let fb = self.framebuffers.get(handle);
            Attachment::ALL.map(|slot| fb.attachment(slot))
        };
        for target in attachments.into_iter().flatten() {
            match target {
                AttachmentTarget::Texture(tex) => self.textures.get_mut(tex).mark_written(),
                AttachmentTarget::CubeMap(cube) => self.cube_maps.get_mut(cube).mark_written(),
            }
        }
    }
}

impl Default for GpuResources {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_table_tracks_latest_resource() {
        let mut resources = GpuResources::new();
        let a = resources.create_texture("A", 4, 4, TextureFormat::Rgba8);
        let b = resources.create_texture("B", 4, 4, TextureFormat::Rgba8);

        assert_eq!(resources.bind_texture(a, 2), 2);
        assert_eq!(resources.bound_resource(2), Some(BoundResource::Texture(a)));

        resources.bind_texture(b, 2);
        assert_eq!(resources.bound_resource(2), Some(BoundResource::Texture(b)));
        assert_eq!(resources.bound_resource(5), None);
    }

    #[test]
    fn attaching_texture_resizes_framebuffer() {
        let mut resources = GpuResources::new();
        let fb = resources.create_framebuffer("Post", 1, 1);
        let tex = resources.create_texture("HDR", 1280, 720, TextureFormat::Rgba16F);
        resources.attach_texture(fb, tex, Attachment::Color0);
        assert_eq!(resources.framebuffer(fb).width(), 1280);
        assert_eq!(resources.framebuffer(fb).height(), 720);
    }

    #[test]
    fn framebuffer_writes_propagate_to_every_attachment() {
        let mut resources = GpuResources::new();
        let fb = resources.create_framebuffer("GBuffer", 1, 1);
        let color0 = resources.create_texture("Albedo", 64, 64, TextureFormat::Rgba8);
        let color1 = resources.create_texture("Normal", 64, 64, TextureFormat::Rgba16F);
        let color2 = resources.create_texture("Material", 64, 64, TextureFormat::Rgba8);
        let depth = resources.create_texture("Depth", 64, 64, TextureFormat::Depth);
        resources.attach_texture(fb, color0, Attachment::Color0);
        resources.attach_texture(fb, color1, Attachment::Color1);
        resources.attach_texture(fb, color2, Attachment::Color2);
        resources.attach_texture(fb, depth, Attachment::Depth);

        resources.mark_framebuffer_written(fb);
        for tex in [color0, color1, color2, depth] {
            assert_eq!(resources.texture(tex).write_count(), 1);
        }
    }
}

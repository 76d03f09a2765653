use std::collections::HashMap;

use bitflags::bitflags;

use crate::resources::{FrameBufferHandle, GeometryHandle, Shader};

use super::{AttributeValue, BlendFactor, RenderEngine};

bitflags! {
    /// Rasterizer state captured per draw.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RenderStateFlags: u32 {
        const DEPTH_TEST = 1 << 0;
        const DEPTH_WRITE = 1 << 1;
        const REVERSED_DEPTH = 1 << 2;
        const CULLING = 1 << 3;
        const CULL_BACK = 1 << 4;
        const CULL_CCW = 1 << 5;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawKind {
    Triangles,
    TrianglesInstanced,
    Lines,
}

/// One recorded draw with the pipeline state that was current when it was
/// issued.
#[derive(Clone, Debug)]
pub struct DrawCommand {
    pub shader: String,
    pub kind: DrawKind,
    pub geometry: GeometryHandle,
    pub count: u32,
    pub instance_count: u32,
    pub framebuffer: Option<FrameBufferHandle>,
    pub blending: (BlendFactor, BlendFactor),
    pub state: RenderStateFlags,
}

/// `RenderEngine` implementation that records the command stream instead of
/// talking to a GPU. Used by the headless demo and by every pipeline test to
/// assert on pass ordering, blend state and draw counts.
pub struct RecordingEngine {
    draws: Vec<DrawCommand>,
    clears: u32,
    flushes: u32,
    framebuffer: Option<FrameBufferHandle>,
    blending: (BlendFactor, BlendFactor),
    state: RenderStateFlags,
    viewport: (i32, i32, i32, i32),
    attributes: HashMap<u32, AttributeValue>,
    anisotropy: f32,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            draws: Vec::new(),
            clears: 0,
            flushes: 0,
            framebuffer: None,
            blending: (BlendFactor::One, BlendFactor::Zero),
            state: RenderStateFlags::DEPTH_TEST
                | RenderStateFlags::DEPTH_WRITE
                | RenderStateFlags::CULLING
                | RenderStateFlags::CULL_BACK
                | RenderStateFlags::CULL_CCW,
            viewport: (0, 0, 0, 0),
            attributes: HashMap::new(),
            anisotropy: 1.0,
        }
    }

    pub fn draws(&self) -> &[DrawCommand] {
        &self.draws
    }

    pub fn draws_with_shader<'a>(&'a self, shader: &'a str) -> impl Iterator<Item = &'a DrawCommand> {
        self.draws.iter().filter(move |draw| draw.shader == shader)
    }

    pub fn draw_count_for_shader(&self, shader: &str) -> usize {
        self.draws_with_shader(shader).count()
    }

    pub fn clear_count(&self) -> u32 {
        self.clears
    }

    pub fn flush_count(&self) -> u32 {
        self.flushes
    }

    pub fn viewport(&self) -> (i32, i32, i32, i32) {
        self.viewport
    }

    pub fn attribute(&self, slot: u32) -> Option<&AttributeValue> {
        self.attributes.get(&slot)
    }

    pub fn anisotropy(&self) -> f32 {
        self.anisotropy
    }

    pub fn reset(&mut self) {
        self.draws.clear();
        self.clears = 0;
        self.flushes = 0;
    }

    fn record(&mut self, shader: &Shader, kind: DrawKind, geometry: GeometryHandle, count: u32, instances: u32) {
        self.draws.push(DrawCommand {
            shader: shader.name().to_string(),
            kind,
            geometry,
            count,
            instance_count: instances.max(1),
            framebuffer: self.framebuffer,
            blending: self.blending,
            state: self.state,
        });
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for RecordingEngine {
    fn clear(&mut self) {
        self.clears += 1;
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.viewport = (x, y, width, height);
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FrameBufferHandle>) {
        self.framebuffer = framebuffer;
    }

    fn draw_triangles(&mut self, geometry: GeometryHandle, count: u32, shader: &Shader) {
        self.record(shader, DrawKind::Triangles, geometry, count, 1);
    }

    fn draw_triangles_instanced(
        &mut self,
        geometry: GeometryHandle,
        count: u32,
        shader: &Shader,
        instance_count: u32,
    ) {
        self.record(shader, DrawKind::TrianglesInstanced, geometry, count, instance_count);
    }

    fn draw_lines(&mut self, geometry: GeometryHandle, count: u32, shader: &Shader) {
        self.record(shader, DrawKind::Lines, geometry, count, 1);
    }

    fn use_blending(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.blending = (src, dst);
    }

    fn use_culling(&mut self, enabled: bool, counter_clockwise: bool, cull_back: bool) {
        self.state.set(RenderStateFlags::CULLING, enabled);
        self.state.set(RenderStateFlags::CULL_CCW, counter_clockwise);
        self.state.set(RenderStateFlags::CULL_BACK, cull_back);
    }

    fn use_depth_buffer(&mut self, enabled: bool) {
        self.state.set(RenderStateFlags::DEPTH_TEST, enabled);
    }

    fn use_depth_buffer_mask(&mut self, enabled: bool) {
        self.state.set(RenderStateFlags::DEPTH_WRITE, enabled);
    }

    fn use_reversed_depth(&mut self, enabled: bool) {
        self.state.set(RenderStateFlags::REVERSED_DEPTH, enabled);
    }

    fn set_default_vertex_attribute(&mut self, slot: u32, value: AttributeValue) {
        self.attributes.insert(slot, value);
    }

    fn use_anisotropic_filtering(&mut self, value: f32) {
        self.anisotropy = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::GpuResources;

    #[test]
    fn draws_capture_current_state() {
        let mut resources = GpuResources::new();
        let geometry = resources.create_geometry("Quad", 6, 0);
        let shader = Shader::new("Fog");

        let mut engine = RecordingEngine::new();
        engine.use_blending(BlendFactor::One, BlendFactor::One);
        engine.use_depth_buffer_mask(false);
        engine.draw_triangles(geometry, 6, &shader);

        let draw = &engine.draws()[0];
        assert_eq!(draw.shader, "Fog");
        assert_eq!(draw.blending, (BlendFactor::One, BlendFactor::One));
        assert!(!draw.state.contains(RenderStateFlags::DEPTH_WRITE));
        assert!(draw.state.contains(RenderStateFlags::DEPTH_TEST));
    }

    #[test]
    fn instance_count_is_never_zero() {
        let mut resources = GpuResources::new();
        let geometry = resources.create_geometry("Cube", 24, 36);
        let shader = Shader::new("GBuffer");

        let mut engine = RecordingEngine::new();
        engine.draw_triangles_instanced(geometry, 36, &shader, 0);
        assert_eq!(engine.draws()[0].instance_count, 1);
    }
}

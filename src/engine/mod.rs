pub mod recording;

pub use recording::{DrawCommand, DrawKind, RecordingEngine, RenderStateFlags};

use glam::{Mat3, Mat4, Vec4};

use crate::resources::{FrameBufferHandle, GeometryHandle, Shader};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Value pushed into a disabled vertex attribute slot, used for per-draw
/// instance data (model/normal matrices, light parameters) without a
/// dedicated instance buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttributeValue {
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

/// The rendering backend surface the controller drives. Implementations
/// translate these calls into actual GPU commands; the crate ships a
/// `RecordingEngine` that captures the stream for headless runs and tests.
pub trait RenderEngine {
    fn clear(&mut self);
    fn flush(&mut self);
    fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32);

    /// `None` selects the default (window) framebuffer.
    fn bind_framebuffer(&mut self, framebuffer: Option<FrameBufferHandle>);

    fn draw_triangles(&mut self, geometry: GeometryHandle, count: u32, shader: &Shader);
    fn draw_triangles_instanced(
        &mut self,
        geometry: GeometryHandle,
        count: u32,
        shader: &Shader,
        instance_count: u32,
    );
    fn draw_lines(&mut self, geometry: GeometryHandle, count: u32, shader: &Shader);

    fn use_blending(&mut self, src: BlendFactor, dst: BlendFactor);
    fn use_culling(&mut self, enabled: bool, counter_clockwise: bool, cull_back: bool);
    fn use_depth_buffer(&mut self, enabled: bool);
    fn use_depth_buffer_mask(&mut self, enabled: bool);
    fn use_reversed_depth(&mut self, enabled: bool);
    fn set_default_vertex_attribute(&mut self, slot: u32, value: AttributeValue);
    fn use_anisotropic_filtering(&mut self, value: f32);
}

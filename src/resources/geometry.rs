/// Geometry descriptor: a vertex array plus optional index buffer on the
/// backend side. Non-indexed helper surfaces (fullscreen rectangle, skybox
/// cube, debug lines) leave `index_count` at zero and draw by vertex count.
#[derive(Clone, Debug)]
pub struct Geometry {
    label: String,
    vertex_count: u32,
    index_count: u32,
}

impl Geometry {
    pub fn new(label: impl Into<String>, vertex_count: u32, index_count: u32) -> Self {
        Self {
            label: label.into(),
            vertex_count,
            index_count,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Count passed to a draw call: indices when indexed, vertices otherwise.
    pub fn draw_count(&self) -> u32 {
        if self.index_count > 0 {
            self.index_count
        } else {
            self.vertex_count
        }
    }

    /// Debug line buffers are refilled each frame with a varying vertex count.
    pub fn set_vertex_count(&mut self, count: u32) {
        self.vertex_count = count;
    }
}

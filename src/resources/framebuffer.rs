use super::{CubeMap, Handle, Texture};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attachment {
    Color0,
    Color1,
    Color2,
    Depth,
}

impl Attachment {
    pub const ALL: [Attachment; 4] = [
        Attachment::Color0,
        Attachment::Color1,
        Attachment::Color2,
        Attachment::Depth,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentTarget {
    Texture(Handle<Texture>),
    CubeMap(Handle<CubeMap>),
}

/// Framebuffer descriptor: up to three color attachments and a depth
/// attachment plus the viewport size inherited from the last attached
/// target. Attaching is done through `GpuResources` so the size can be read
/// from the texture.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    label: String,
    width: u32,
    height: u32,
    colors: [Option<AttachmentTarget>; 3],
    depth: Option<AttachmentTarget>,
}

impl FrameBuffer {
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width: width.max(1),
            height: height.max(1),
            colors: [None; 3],
            depth: None,
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

    pub fn attachment(&self, slot: Attachment) -> Option<AttachmentTarget> {
        match slot {
            Attachment::Color0 => self.colors[0],
            Attachment::Color1 => self.colors[1],
            Attachment::Color2 => self.colors[2],
            Attachment::Depth => self.depth,
        }
    }

    pub(crate) fn set_attachment(
        &mut self,
        slot: Attachment,
        target: Option<AttachmentTarget>,
        width: u32,
        height: u32,
    ) {
        match slot {
            Attachment::Color0 => self.colors[0] = target,
            Attachment::Color1 => self.colors[1] = target,
            Attachment::Color2 => self.colors[2] = target,
            Attachment::Depth => self.depth = target,
        }
        if target.is_some() {
            self.width = width.max(1);
            self.height = height.max(1);
        }
    }
}

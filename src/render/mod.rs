//! Drawing: the per-frame pass sequence over a backend seam, plus the WebGL2 backend.

pub mod frame;
pub mod webgl;

use glam::Mat4;
use thiserror::Error;

use crate::host::DecodedImage;
use crate::scene::{Batch, ColorVertex, TexturedVertex};
use crate::transform::Viewport;

pub use frame::FrameRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("WebGL2 context unavailable: {0}")]
    Context(String),
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: &'static str, log: String },
    #[error("program failed to link: {0}")]
    Link(String),
    #[error("shader is missing attribute `{0}`")]
    MissingAttribute(&'static str),
    #[error("shader is missing uniform `{0}`")]
    MissingUniform(&'static str),
    #[error("failed to allocate {0}")]
    Allocation(&'static str),
    #[error("texture upload failed: {0}")]
    Texture(String),
    #[error("{0:?} pass does not take this vertex format")]
    UnsupportedPass(Pass),
}

/// The three programs; the highlight pass reuses the line program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Line,
    Triangle,
    Texture,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 3] = [ShaderKind::Line, ShaderKind::Triangle, ShaderKind::Texture];
}

/// Draw passes in the order they are issued each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Lines,
    Triangles,
    Textured,
    Highlight,
}

impl Pass {
    pub const ORDER: [Pass; 4] = [Pass::Lines, Pass::Triangles, Pass::Textured, Pass::Highlight];

    pub fn shader(self) -> ShaderKind {
        match self {
            Pass::Lines | Pass::Highlight => ShaderKind::Line,
            Pass::Triangles => ShaderKind::Triangle,
            Pass::Textured => ShaderKind::Texture,
        }
    }
}

/// What the frame renderer needs from a graphics API. Uploads replace whatever the pass held
/// before; `draw` uses the last upload.
pub trait RenderBackend {
    fn set_viewport(&mut self, viewport: Viewport);
    fn upload_colored(&mut self, pass: Pass, batch: &Batch<ColorVertex>) -> Result<(), RenderError>;
    fn upload_textured(&mut self, batch: &Batch<TexturedVertex>) -> Result<(), RenderError>;
    fn upload_texture(&mut self, image: &DecodedImage) -> Result<(), RenderError>;
    fn has_texture(&self) -> bool;
    fn set_projection(&mut self, shader: ShaderKind, projection: &Mat4);
    fn set_model(&mut self, shader: ShaderKind, model: &Mat4);
    fn clear(&mut self);
    fn draw(&mut self, pass: Pass);
    /// Browsers present implicitly when the animation frame callback returns.
    fn present(&mut self) {}
}

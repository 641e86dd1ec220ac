//! WebGL2 implementation of [`RenderBackend`].
//!
//! Every GL object lives inside a wrapper that deletes it on drop, so a failed setup half way
//! through releases what it already created.

use std::collections::HashMap;

use glam::Mat4;
use tracing::info;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlTexture, WebGlUniformLocation, WebGlVertexArrayObject,
};

use super::{Pass, RenderBackend, RenderError, ShaderKind};
use crate::host::DecodedImage;
use crate::scene::{Batch, ColorVertex, TexturedVertex};
use crate::transform::Viewport;

const COLOR_VERTEX_SHADER: &str = r#"#version 300 es
in vec3 inPosition;
in vec3 inColor;
uniform mat4 uModel;
uniform mat4 uProjection;
out vec3 vColor;
void main() {
    vColor = inColor;
    gl_Position = uProjection * uModel * vec4(inPosition, 1.0);
}
"#;

const COLOR_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
in vec3 vColor;
out vec4 fragColor;
void main() {
    fragColor = vec4(vColor, 1.0);
}
"#;

const TEXTURE_VERTEX_SHADER: &str = r#"#version 300 es
in vec3 inPosition;
in vec2 inTexCoord;
uniform mat4 uModel;
uniform mat4 uProjection;
out vec2 vTexCoord;
void main() {
    vTexCoord = inTexCoord;
    gl_Position = uProjection * uModel * vec4(inPosition, 1.0);
}
"#;

const TEXTURE_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
in vec2 vTexCoord;
uniform sampler2D uTexture;
out vec4 fragColor;
void main() {
    fragColor = texture(uTexture, vTexCoord);
}
"#;

const COLOR_ATTRIBUTES: &[&str] = &["inPosition", "inColor"];
const TEXTURE_ATTRIBUTES: &[&str] = &["inPosition", "inTexCoord"];
const COLOR_UNIFORMS: &[&str] = &["uModel", "uProjection"];
const TEXTURE_UNIFORMS: &[&str] = &["uModel", "uProjection", "uTexture"];

/// A compiled stage, deleted once the program has linked (or failed to).
struct ShaderStage {
    gl: Gl,
    shader: WebGlShader,
}

impl ShaderStage {
    fn compile(gl: &Gl, kind: u32, stage: &'static str, source: &str) -> Result<Self, RenderError> {
        let shader = gl
            .create_shader(kind)
            .ok_or(RenderError::Allocation("shader"))?;
        let stage_guard = ShaderStage {
            gl: gl.clone(),
            shader,
        };
        gl.shader_source(&stage_guard.shader, source);
        gl.compile_shader(&stage_guard.shader);
        let ok = gl
            .get_shader_parameter(&stage_guard.shader, Gl::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false);
        if !ok {
            let log = gl
                .get_shader_info_log(&stage_guard.shader)
                .unwrap_or_else(|| "unknown error".into());
            return Err(RenderError::Compile { stage, log });
        }
        Ok(stage_guard)
    }
}

impl Drop for ShaderStage {
    fn drop(&mut self) {
        self.gl.delete_shader(Some(&self.shader));
    }
}

pub struct ShaderProgram {
    gl: Gl,
    program: WebGlProgram,
    attributes: HashMap<&'static str, u32>,
    uniforms: HashMap<&'static str, WebGlUniformLocation>,
}

impl ShaderProgram {
    /// Compiles and links a program and resolves every named attribute and uniform up front.
    pub fn compile(
        gl: &Gl,
        vertex: &str,
        fragment: &str,
        attributes: &[&'static str],
        uniforms: &[&'static str],
    ) -> Result<Self, RenderError> {
        let vs = ShaderStage::compile(gl, Gl::VERTEX_SHADER, "vertex", vertex)?;
        let fs = ShaderStage::compile(gl, Gl::FRAGMENT_SHADER, "fragment", fragment)?;
        let program = gl
            .create_program()
            .ok_or(RenderError::Allocation("program"))?;
        let mut out = ShaderProgram {
            gl: gl.clone(),
            program,
            attributes: HashMap::new(),
            uniforms: HashMap::new(),
        };
        gl.attach_shader(&out.program, &vs.shader);
        gl.attach_shader(&out.program, &fs.shader);
        gl.link_program(&out.program);
        let linked = gl
            .get_program_parameter(&out.program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        if !linked {
            let log = gl
                .get_program_info_log(&out.program)
                .unwrap_or_else(|| "unknown error".into());
            return Err(RenderError::Link(log));
        }

        for &name in attributes {
            let loc = gl.get_attrib_location(&out.program, name);
            if loc < 0 {
                return Err(RenderError::MissingAttribute(name));
            }
            out.attributes.insert(name, loc as u32);
        }
        for &name in uniforms {
            let loc = gl
                .get_uniform_location(&out.program, name)
                .ok_or(RenderError::MissingUniform(name))?;
            out.uniforms.insert(name, loc);
        }
        Ok(out)
    }

    pub fn attribute(&self, name: &'static str) -> Result<u32, RenderError> {
        self.attributes
            .get(name)
            .copied()
            .ok_or(RenderError::MissingAttribute(name))
    }

    fn bind(&self) {
        self.gl.use_program(Some(&self.program));
    }

    fn set_mat4(&self, name: &str, value: &Mat4) {
        if let Some(loc) = self.uniforms.get(name) {
            self.bind();
            self.gl
                .uniform_matrix4fv_with_f32_array(Some(loc), false, &value.to_cols_array());
        }
    }

    fn set_sampler(&self, name: &str, unit: i32) {
        if let Some(loc) = self.uniforms.get(name) {
            self.gl.uniform1i(Some(loc), unit);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.gl.delete_program(Some(&self.program));
    }
}

struct GlBuffer {
    gl: Gl,
    buffer: WebGlBuffer,
}

impl GlBuffer {
    fn new(gl: &Gl) -> Result<Self, RenderError> {
        let buffer = gl
            .create_buffer()
            .ok_or(RenderError::Allocation("buffer"))?;
        Ok(Self {
            gl: gl.clone(),
            buffer,
        })
    }
}

impl Drop for GlBuffer {
    fn drop(&mut self) {
        self.gl.delete_buffer(Some(&self.buffer));
    }
}

struct VertexArray {
    gl: Gl,
    vao: WebGlVertexArrayObject,
}

impl VertexArray {
    fn new(gl: &Gl) -> Result<Self, RenderError> {
        let vao = gl
            .create_vertex_array()
            .ok_or(RenderError::Allocation("vertex array"))?;
        Ok(Self {
            gl: gl.clone(),
            vao,
        })
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.gl.delete_vertex_array(Some(&self.vao));
    }
}

struct GlTexture {
    gl: Gl,
    texture: WebGlTexture,
}

impl GlTexture {
    fn from_image(gl: &Gl, image: &DecodedImage) -> Result<Self, RenderError> {
        if image.pixels.len() != image.byte_len() {
            return Err(RenderError::Texture(format!(
                "{}x{} image carries {} bytes",
                image.width,
                image.height,
                image.pixels.len()
            )));
        }
        let texture = gl
            .create_texture()
            .ok_or(RenderError::Allocation("texture"))?;
        let out = GlTexture {
            gl: gl.clone(),
            texture,
        };
        gl.bind_texture(Gl::TEXTURE_2D, Some(&out.texture));
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            Gl::TEXTURE_2D,
            0,
            Gl::RGBA as i32,
            image.width as i32,
            image.height as i32,
            0,
            Gl::RGBA,
            Gl::UNSIGNED_BYTE,
            Some(&image.pixels),
        )
        .map_err(|e| RenderError::Texture(format!("{e:?}")))?;
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MIN_FILTER, Gl::LINEAR as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_MAG_FILTER, Gl::LINEAR as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_S, Gl::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(Gl::TEXTURE_2D, Gl::TEXTURE_WRAP_T, Gl::CLAMP_TO_EDGE as i32);
        gl.bind_texture(Gl::TEXTURE_2D, None);
        Ok(out)
    }
}

impl Drop for GlTexture {
    fn drop(&mut self) {
        self.gl.delete_texture(Some(&self.texture));
    }
}

/// Vertex array plus its two buffers, refilled on every upload.
struct GpuBatch {
    vao: VertexArray,
    vertices: GlBuffer,
    indices: GlBuffer,
    mode: u32,
    count: i32,
}

impl GpuBatch {
    /// `layout` is (attribute, component count) in vertex order, all f32.
    fn new(
        gl: &Gl,
        program: &ShaderProgram,
        layout: &[(&'static str, i32)],
        mode: u32,
    ) -> Result<Self, RenderError> {
        let vao = VertexArray::new(gl)?;
        let vertices = GlBuffer::new(gl)?;
        let indices = GlBuffer::new(gl)?;
        let stride: i32 = layout.iter().map(|(_, n)| n * 4).sum();

        gl.bind_vertex_array(Some(&vao.vao));
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&vertices.buffer));
        gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&indices.buffer));
        let mut offset = 0;
        for &(name, components) in layout {
            let loc = program.attribute(name)?;
            gl.enable_vertex_attrib_array(loc);
            gl.vertex_attrib_pointer_with_i32(loc, components, Gl::FLOAT, false, stride, offset);
            offset += components * 4;
        }
        gl.bind_vertex_array(None);

        Ok(Self {
            vao,
            vertices,
            indices,
            mode,
            count: 0,
        })
    }

    fn upload<V: bytemuck::Pod>(&mut self, gl: &Gl, batch: &Batch<V>) {
        gl.bind_vertex_array(Some(&self.vao.vao));
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&self.vertices.buffer));
        gl.buffer_data_with_u8_array(
            Gl::ARRAY_BUFFER,
            bytemuck::cast_slice(&batch.vertices),
            Gl::DYNAMIC_DRAW,
        );
        gl.bind_buffer(Gl::ELEMENT_ARRAY_BUFFER, Some(&self.indices.buffer));
        gl.buffer_data_with_u8_array(
            Gl::ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(&batch.indices),
            Gl::DYNAMIC_DRAW,
        );
        gl.bind_vertex_array(None);
        self.count = batch.indices.len() as i32;
    }

    fn draw(&self, gl: &Gl) {
        if self.count == 0 {
            return;
        }
        gl.bind_vertex_array(Some(&self.vao.vao));
        gl.draw_elements_with_i32(self.mode, self.count, Gl::UNSIGNED_INT, 0);
        gl.bind_vertex_array(None);
    }
}

pub struct WebGlBackend {
    gl: Gl,
    line_program: ShaderProgram,
    triangle_program: ShaderProgram,
    texture_program: ShaderProgram,
    lines: GpuBatch,
    triangles: GpuBatch,
    textured: GpuBatch,
    highlight: GpuBatch,
    texture: Option<GlTexture>,
}

impl WebGlBackend {
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> Result<Self, RenderError> {
        let gl = canvas
            .get_context("webgl2")
            .map_err(|e| RenderError::Context(format!("{e:?}")))?
            .ok_or_else(|| RenderError::Context("webgl2 not supported".into()))?
            .dyn_into::<Gl>()
            .map_err(|_| RenderError::Context("unexpected context type".into()))?;
        Self::new(gl)
    }

    pub fn new(gl: Gl) -> Result<Self, RenderError> {
        let line_program = ShaderProgram::compile(
            &gl,
            COLOR_VERTEX_SHADER,
            COLOR_FRAGMENT_SHADER,
            COLOR_ATTRIBUTES,
            COLOR_UNIFORMS,
        )?;
        let triangle_program = ShaderProgram::compile(
            &gl,
            COLOR_VERTEX_SHADER,
            COLOR_FRAGMENT_SHADER,
            COLOR_ATTRIBUTES,
            COLOR_UNIFORMS,
        )?;
        let texture_program = ShaderProgram::compile(
            &gl,
            TEXTURE_VERTEX_SHADER,
            TEXTURE_FRAGMENT_SHADER,
            TEXTURE_ATTRIBUTES,
            TEXTURE_UNIFORMS,
        )?;
        let color_layout = [("inPosition", 3), ("inColor", 3)];
        let lines = GpuBatch::new(&gl, &line_program, &color_layout, Gl::LINES)?;
        let highlight = GpuBatch::new(&gl, &line_program, &color_layout, Gl::LINES)?;
        let triangles = GpuBatch::new(&gl, &triangle_program, &color_layout, Gl::TRIANGLES)?;
        let textured = GpuBatch::new(
            &gl,
            &texture_program,
            &[("inPosition", 3), ("inTexCoord", 2)],
            Gl::TRIANGLES,
        )?;

        gl.clear_color(0.0, 0.0, 0.0, 1.0);
        gl.enable(Gl::BLEND);
        gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
        info!("WebGL2 backend ready");

        Ok(Self {
            gl,
            line_program,
            triangle_program,
            texture_program,
            lines,
            triangles,
            textured,
            highlight,
            texture: None,
        })
    }

    fn program(&self, shader: ShaderKind) -> &ShaderProgram {
        match shader {
            ShaderKind::Line => &self.line_program,
            ShaderKind::Triangle => &self.triangle_program,
            ShaderKind::Texture => &self.texture_program,
        }
    }
}

impl RenderBackend for WebGlBackend {
    fn set_viewport(&mut self, viewport: Viewport) {
        self.gl
            .viewport(0, 0, viewport.width as i32, viewport.height as i32);
    }

    fn upload_colored(&mut self, pass: Pass, batch: &Batch<ColorVertex>) -> Result<(), RenderError> {
        let target = match pass {
            Pass::Lines => &mut self.lines,
            Pass::Triangles => &mut self.triangles,
            Pass::Highlight => &mut self.highlight,
            Pass::Textured => return Err(RenderError::UnsupportedPass(pass)),
        };
        target.upload(&self.gl, batch);
        Ok(())
    }

    fn upload_textured(&mut self, batch: &Batch<TexturedVertex>) -> Result<(), RenderError> {
        self.textured.upload(&self.gl, batch);
        Ok(())
    }

    fn upload_texture(&mut self, image: &DecodedImage) -> Result<(), RenderError> {
        self.texture = Some(GlTexture::from_image(&self.gl, image)?);
        Ok(())
    }

    fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    fn set_projection(&mut self, shader: ShaderKind, projection: &Mat4) {
        self.program(shader).set_mat4("uProjection", projection);
    }

    fn set_model(&mut self, shader: ShaderKind, model: &Mat4) {
        self.program(shader).set_mat4("uModel", model);
    }

    fn clear(&mut self) {
        self.gl.clear(Gl::COLOR_BUFFER_BIT);
    }

    fn draw(&mut self, pass: Pass) {
        self.program(pass.shader()).bind();
        match pass {
            Pass::Lines => self.lines.draw(&self.gl),
            Pass::Triangles => self.triangles.draw(&self.gl),
            Pass::Highlight => self.highlight.draw(&self.gl),
            Pass::Textured => {
                let Some(texture) = &self.texture else {
                    return;
                };
                self.gl.active_texture(Gl::TEXTURE0);
                self.gl.bind_texture(Gl::TEXTURE_2D, Some(&texture.texture));
                self.texture_program.set_sampler("uTexture", 0);
                self.textured.draw(&self.gl);
                self.gl.bind_texture(Gl::TEXTURE_2D, None);
            }
        }
    }
}

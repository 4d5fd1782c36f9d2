//! GL-style graphics context.
//!
//! `GraphicsContext` is the WebGL 1 subset the draw sequence needs. Object
//! handles are plain ids owned by the context; every call is synchronous from
//! the caller's point of view and misuse is logged, never a panic.
//!
//! Backends:
//! - `WgpuContext` renders into an offscreen canvas texture
//! - `RecordingContext` (tests) records calls and shares compile/link rules

mod objects;
mod wgpu_backend;

#[cfg(test)]
pub(crate) mod recording;

pub use wgpu_backend::WgpuContext;

pub(crate) use objects::{ObjectTable, ProgramObject, ShaderObject};

use core::fmt;

/// Pipeline stage a shader object is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub(crate) fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderKind::Vertex => naga::ShaderStage::Vertex,
            ShaderKind::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => f.write_str("vertex"),
            ShaderKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Primitive assembly mode for `draw_arrays`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// Usage hint passed with buffer uploads. Backends may ignore it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Shader(pub(crate) u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Program(pub(crate) u32);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Buffer(pub(crate) u32);

/// Uniform slot resolved against one linked program.
///
/// Only valid while that program is current; setters ignore it otherwise.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformLocation {
    pub(crate) program: Program,
    pub(crate) index: usize,
}

/// WebGL-style rendering context.
///
/// Naming follows the GL entry points so a draw sequence reads the same on any
/// backend. The context owns a single color drawing buffer.
pub trait GraphicsContext {
    fn create_shader(&mut self, kind: ShaderKind) -> Result<Shader, String>;
    fn shader_source(&mut self, shader: Shader, source: &str);
    fn compile_shader(&mut self, shader: Shader);
    fn get_shader_compile_status(&self, shader: Shader) -> bool;
    fn get_shader_info_log(&self, shader: Shader) -> String;
    fn delete_shader(&mut self, shader: Shader);

    fn create_program(&mut self) -> Result<Program, String>;
    fn attach_shader(&mut self, program: Program, shader: Shader);
    fn link_program(&mut self, program: Program);
    fn get_program_link_status(&self, program: Program) -> bool;
    fn get_program_info_log(&self, program: Program) -> String;
    fn delete_program(&mut self, program: Program);

    /// Returns `None` for unknown names and for programs that are not linked.
    fn get_attrib_location(&self, program: Program, name: &str) -> Option<u32>;
    /// Returns `None` for unknown names and for programs that are not linked.
    fn get_uniform_location(&self, program: Program, name: &str) -> Option<UniformLocation>;

    fn create_buffer(&mut self) -> Result<Buffer, String>;
    fn bind_array_buffer(&mut self, buffer: Option<Buffer>);
    /// Replaces the whole content of the bound array buffer.
    fn buffer_data_f32(&mut self, data: &[f32], usage: BufferUsage);

    /// Drawing buffer size in physical pixels.
    fn drawing_buffer_size(&self) -> (u32, u32);
    /// Resizes the drawing buffer. Existing content is discarded.
    fn set_drawing_buffer_size(&mut self, width: u32, height: u32);

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    /// Clears the color buffer to the current clear color.
    fn clear(&mut self);

    fn use_program(&mut self, program: Option<Program>);
    fn enable_vertex_attrib_array(&mut self, index: u32);
    /// Sources attribute `index` from the currently bound array buffer.
    fn vertex_attrib_pointer_f32(
        &mut self,
        index: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    fn uniform_2_f32(&mut self, location: Option<&UniformLocation>, x: f32, y: f32);
    fn uniform_4_f32(&mut self, location: Option<&UniformLocation>, x: f32, y: f32, z: f32, w: f32);

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: i32, count: i32);
}

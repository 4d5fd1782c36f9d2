//! Call-recording context for GPU-free tests.
//!
//! Compile and link go through the same naga rules as the wgpu backend;
//! everything else is recorded verbatim.

use crate::frame::CanvasSurface;

use super::{
    Buffer, BufferUsage, GraphicsContext, ObjectTable, PrimitiveMode, Program, ProgramObject,
    Shader, ShaderKind, ShaderObject, UniformLocation,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateShader(ShaderKind),
    CompileShader(Shader),
    DeleteShader(Shader),
    CreateProgram(Program),
    AttachShader(Program, Shader),
    LinkProgram(Program),
    DeleteProgram(Program),
    CreateBuffer(Buffer),
    BindArrayBuffer(Option<Buffer>),
    BufferData(Vec<f32>),
    SetDrawingBufferSize(u32, u32),
    Viewport(i32, i32, i32, i32),
    ClearColor([f32; 4]),
    Clear,
    UseProgram(Option<Program>),
    EnableVertexAttribArray(u32),
    VertexAttribPointer {
        index: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    Uniform2f(String, [f32; 2]),
    Uniform4f(String, [f32; 4]),
    DrawArrays(PrimitiveMode, i32, i32),
}

#[derive(Debug)]
pub(crate) struct RecordingContext {
    shaders: ObjectTable<ShaderObject>,
    programs: ObjectTable<ProgramObject>,
    buffers: ObjectTable<()>,
    current: Option<Program>,
    size: (u32, u32),
    pub(crate) calls: Vec<Call>,
}

impl RecordingContext {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            shaders: ObjectTable::default(),
            programs: ObjectTable::default(),
            buffers: ObjectTable::default(),
            current: None,
            size: (width, height),
            calls: Vec::new(),
        }
    }

    pub(crate) fn draw_calls(&self) -> Vec<(PrimitiveMode, i32, i32)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawArrays(mode, first, count) => Some((*mode, *first, *count)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn shader_exists(&self, shader: Shader) -> bool {
        self.shaders.get(shader.0).is_some()
    }

    pub(crate) fn program_exists(&self, program: Program) -> bool {
        self.programs.get(program.0).is_some()
    }

    fn uniform_name(&self, location: &UniformLocation) -> Option<String> {
        if self.current != Some(location.program) {
            return None;
        }
        let program = self.programs.get(location.program.0)?;
        let linked = program.linked.as_ref()?;
        linked.uniforms.get(location.index).map(|u| u.name.clone())
    }
}

impl GraphicsContext for RecordingContext {
    fn create_shader(&mut self, kind: ShaderKind) -> Result<Shader, String> {
        self.calls.push(Call::CreateShader(kind));
        Ok(Shader(self.shaders.insert(ShaderObject::new(kind))))
    }

    fn shader_source(&mut self, shader: Shader, source: &str) {
        if let Some(s) = self.shaders.get_mut(shader.0) {
            s.source = source.to_owned();
        }
    }

    fn compile_shader(&mut self, shader: Shader) {
        self.calls.push(Call::CompileShader(shader));
        if let Some(s) = self.shaders.get_mut(shader.0) {
            s.compile();
        }
    }

    fn get_shader_compile_status(&self, shader: Shader) -> bool {
        self.shaders
            .get(shader.0)
            .is_some_and(|s| s.compiled.is_some())
    }

    fn get_shader_info_log(&self, shader: Shader) -> String {
        self.shaders
            .get(shader.0)
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: Shader) {
        self.calls.push(Call::DeleteShader(shader));
        self.shaders.remove(shader.0);
    }

    fn create_program(&mut self) -> Result<Program, String> {
        let program = Program(self.programs.insert(ProgramObject::default()));
        self.calls.push(Call::CreateProgram(program));
        Ok(program)
    }

    fn attach_shader(&mut self, program: Program, shader: Shader) {
        self.calls.push(Call::AttachShader(program, shader));
        if let Some(p) = self.programs.get_mut(program.0) {
            let _ = p.attach(shader, &self.shaders);
        }
    }

    fn link_program(&mut self, program: Program) {
        self.calls.push(Call::LinkProgram(program));
        if let Some(p) = self.programs.get_mut(program.0) {
            p.link(&self.shaders);
        }
    }

    fn get_program_link_status(&self, program: Program) -> bool {
        self.programs
            .get(program.0)
            .is_some_and(|p| p.linked.is_some())
    }

    fn get_program_info_log(&self, program: Program) -> String {
        self.programs
            .get(program.0)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: Program) {
        self.calls.push(Call::DeleteProgram(program));
        self.programs.remove(program.0);
    }

    fn get_attrib_location(&self, program: Program, name: &str) -> Option<u32> {
        self.programs
            .get(program.0)?
            .linked
            .as_ref()?
            .attribute_location(name)
    }

    fn get_uniform_location(&self, program: Program, name: &str) -> Option<UniformLocation> {
        let index = self
            .programs
            .get(program.0)?
            .linked
            .as_ref()?
            .uniform_index(name)?;
        Some(UniformLocation { program, index })
    }

    fn create_buffer(&mut self) -> Result<Buffer, String> {
        let buffer = Buffer(self.buffers.insert(()));
        self.calls.push(Call::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn bind_array_buffer(&mut self, buffer: Option<Buffer>) {
        self.calls.push(Call::BindArrayBuffer(buffer));
    }

    fn buffer_data_f32(&mut self, data: &[f32], _usage: BufferUsage) {
        self.calls.push(Call::BufferData(data.to_vec()));
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn set_drawing_buffer_size(&mut self, width: u32, height: u32) {
        self.calls.push(Call::SetDrawingBufferSize(width, height));
        self.size = (width, height);
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.calls.push(Call::Viewport(x, y, width, height));
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.calls.push(Call::ClearColor([r, g, b, a]));
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn use_program(&mut self, program: Option<Program>) {
        self.calls.push(Call::UseProgram(program));
        self.current = program;
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.calls.push(Call::EnableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer_f32(
        &mut self,
        index: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.calls.push(Call::VertexAttribPointer {
            index,
            size,
            normalized,
            stride,
            offset,
        });
    }

    fn uniform_2_f32(&mut self, location: Option<&UniformLocation>, x: f32, y: f32) {
        if let Some(name) = location.and_then(|l| self.uniform_name(l)) {
            self.calls.push(Call::Uniform2f(name, [x, y]));
        }
    }

    fn uniform_4_f32(&mut self, location: Option<&UniformLocation>, x: f32, y: f32, z: f32, w: f32) {
        if let Some(name) = location.and_then(|l| self.uniform_name(l)) {
            self.calls.push(Call::Uniform4f(name, [x, y, z, w]));
        }
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: i32, count: i32) {
        self.calls.push(Call::DrawArrays(mode, first, count));
    }
}

/// Canvas stand-in: an optional context plus a displayed size.
#[derive(Debug)]
pub(crate) struct RecordingSurface {
    pub(crate) context: Option<RecordingContext>,
    pub(crate) display: (u32, u32),
}

impl RecordingSurface {
    pub(crate) fn new(drawing: (u32, u32), display: (u32, u32)) -> Self {
        Self {
            context: Some(RecordingContext::new(drawing.0, drawing.1)),
            display,
        }
    }

    pub(crate) fn without_context(display: (u32, u32)) -> Self {
        Self {
            context: None,
            display,
        }
    }

    pub(crate) fn calls(&self) -> &[Call] {
        self.context.as_ref().map_or(&[][..], |c| c.calls.as_slice())
    }
}

impl CanvasSurface for RecordingSurface {
    type Context = RecordingContext;

    fn context(&mut self) -> Option<&mut RecordingContext> {
        self.context.as_mut()
    }

    fn display_size(&self) -> (u32, u32) {
        self.display
    }
}

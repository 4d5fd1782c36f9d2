use core::fmt;

use rand::Rng;

use crate::coords::ColorRgba;
use crate::gl::{BufferUsage, GraphicsContext, PrimitiveMode, Program, ShaderKind};
use crate::shader::{
    compile_shader, link_program, ShaderSourceLookup, FRAGMENT_SHADER_ID, VERTEX_SHADER_ID,
};

use super::scenario::{random_color, random_rect, Scenario, TRIANGLE_POSITIONS};
use super::surface::CanvasSurface;

const POSITION_ATTRIBUTE: &str = "a_position";
const RESOLUTION_UNIFORM: &str = "u_resolution";
const COLOR_UNIFORM: &str = "u_color";

/// Progress of one run of the draw sequence.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameState {
    Uninitialized,
    ContextAcquired,
    ProgramReady,
    Configured,
    Drawing,
    Done,
    /// Terminal; nothing was drawn.
    Aborted,
}

/// Why a run stopped before drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameAbort {
    ContextUnavailable,
    MissingShaderSource(&'static str),
    ShaderCompileFailure(ShaderKind),
    ProgramLinkFailure,
    BufferUnavailable(String),
}

impl fmt::Display for FrameAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameAbort::ContextUnavailable => f.write_str("graphics context is unavailable"),
            FrameAbort::MissingShaderSource(id) => write!(f, "shader source `{id}` not found"),
            FrameAbort::ShaderCompileFailure(kind) => write!(f, "{kind} shader failed to compile"),
            FrameAbort::ProgramLinkFailure => f.write_str("shader program failed to link"),
            FrameAbort::BufferUnavailable(e) => write!(f, "vertex buffer could not be created: {e}"),
        }
    }
}

impl std::error::Error for FrameAbort {}

/// Summary of a completed run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FrameReport {
    pub draw_calls: u32,
    pub vertices: u32,
    /// Drawing buffer size the frame was rendered at.
    pub drawing_buffer: (u32, u32),
}

/// Runs the one-shot draw sequence of a scenario against a canvas.
///
/// Each call to [`FrameRenderer::render`] starts from `Uninitialized`; the
/// renderer keeps only the state reached by the last run.
#[derive(Debug)]
pub struct FrameRenderer {
    state: FrameState,
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self {
            state: FrameState::Uninitialized,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Draws `scenario` once.
    ///
    /// `resize` brings the drawing buffer to the surface's displayed size;
    /// [`resize_canvas_to_display_size`](super::resize_canvas_to_display_size)
    /// is the usual choice.
    pub fn render<S, L, R, F>(
        &mut self,
        surface: &mut S,
        sources: &L,
        scenario: &Scenario,
        rng: &mut R,
        mut resize: F,
    ) -> Result<FrameReport, FrameAbort>
    where
        S: CanvasSurface + ?Sized,
        L: ShaderSourceLookup + ?Sized,
        R: Rng + ?Sized,
        F: FnMut(&mut S::Context, (u32, u32)) -> bool,
    {
        self.state = FrameState::Uninitialized;

        let display = surface.display_size();
        let Some(gl) = surface.context() else {
            return Err(self.abort(FrameAbort::ContextUnavailable));
        };
        self.transition(FrameState::ContextAcquired);

        let program = match build_program(gl, sources) {
            Ok(p) => p,
            Err(reason) => return Err(self.abort(reason)),
        };
        self.transition(FrameState::ProgramReady);

        let position = gl.get_attrib_location(program, POSITION_ATTRIBUTE);
        if position.is_none() {
            log::warn!("attribute `{POSITION_ATTRIBUTE}` is not used by the program");
        }
        let (resolution, color) = match scenario {
            Scenario::Triangle => (None, None),
            Scenario::Rectangles(_) => (
                gl.get_uniform_location(program, RESOLUTION_UNIFORM),
                gl.get_uniform_location(program, COLOR_UNIFORM),
            ),
        };

        let buffer = match gl.create_buffer() {
            Ok(b) => b,
            Err(e) => {
                gl.delete_program(program);
                return Err(self.abort(FrameAbort::BufferUnavailable(e)));
            }
        };
        gl.bind_array_buffer(Some(buffer));
        if let Scenario::Triangle = scenario {
            gl.buffer_data_f32(&TRIANGLE_POSITIONS, BufferUsage::StaticDraw);
        }

        if resize(gl, display) {
            log::debug!("drawing buffer resized to {}x{}", display.0, display.1);
        }
        let (width, height) = gl.drawing_buffer_size();
        gl.viewport(0, 0, clamp_i32(width), clamp_i32(height));
        let clear = ColorRgba::transparent();
        gl.clear_color(clear.r, clear.g, clear.b, clear.a);
        gl.clear();
        self.transition(FrameState::Configured);

        gl.use_program(Some(program));
        if let Some(index) = position {
            gl.enable_vertex_attrib_array(index);
        }
        gl.bind_array_buffer(Some(buffer));
        if let Some(index) = position {
            gl.vertex_attrib_pointer_f32(index, 2, false, 0, 0);
        }
        self.transition(FrameState::Drawing);

        let mut report = FrameReport {
            draw_calls: 0,
            vertices: 0,
            drawing_buffer: (width, height),
        };

        match scenario {
            Scenario::Triangle => {
                gl.draw_arrays(PrimitiveMode::Triangles, 0, 3);
                report.draw_calls = 1;
                report.vertices = 3;
            }
            Scenario::Rectangles(config) => {
                gl.uniform_2_f32(resolution.as_ref(), width as f32, height as f32);

                for _ in 0..config.count {
                    let rect = random_rect(rng, config.extent);
                    gl.buffer_data_f32(&rect.triangle_list(), BufferUsage::StaticDraw);

                    let c = random_color(rng);
                    gl.uniform_4_f32(color.as_ref(), c.r, c.g, c.b, c.a);

                    gl.draw_arrays(PrimitiveMode::Triangles, 0, 6);
                    report.draw_calls += 1;
                    report.vertices += 6;
                }
            }
        }

        self.transition(FrameState::Done);
        log::info!(
            "{} frame done: {} draw call(s) at {}x{}",
            scenario.kind(),
            report.draw_calls,
            width,
            height
        );
        Ok(report)
    }

    fn transition(&mut self, to: FrameState) {
        log::debug!("frame state {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    fn abort(&mut self, reason: FrameAbort) -> FrameAbort {
        log::debug!("frame aborted in {:?}: {reason}", self.state);
        self.state = FrameState::Aborted;
        reason
    }
}

/// Compiles both stages and links them.
///
/// Shader objects of a failed build are released.
fn build_program<G, L>(gl: &mut G, sources: &L) -> Result<Program, FrameAbort>
where
    G: GraphicsContext + ?Sized,
    L: ShaderSourceLookup + ?Sized,
{
    let vertex_text = sources
        .shader_text(VERTEX_SHADER_ID)
        .ok_or(FrameAbort::MissingShaderSource(VERTEX_SHADER_ID))?;
    let fragment_text = sources
        .shader_text(FRAGMENT_SHADER_ID)
        .ok_or(FrameAbort::MissingShaderSource(FRAGMENT_SHADER_ID))?;

    // Both stages compile before either failure is reported, so every broken
    // stage gets its own diagnostic.
    let vertex = compile_shader(gl, ShaderKind::Vertex, &vertex_text);
    let fragment = compile_shader(gl, ShaderKind::Fragment, &fragment_text);

    let (vertex, fragment) = match (vertex, fragment) {
        (Some(v), Some(f)) => (v, f),
        (None, fragment) => {
            if let Some(f) = fragment {
                gl.delete_shader(f);
            }
            return Err(FrameAbort::ShaderCompileFailure(ShaderKind::Vertex));
        }
        (Some(v), None) => {
            gl.delete_shader(v);
            return Err(FrameAbort::ShaderCompileFailure(ShaderKind::Fragment));
        }
    };

    match link_program(gl, vertex, fragment) {
        Some(program) => Ok(program),
        None => {
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            Err(FrameAbort::ProgramLinkFailure)
        }
    }
}

fn clamp_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

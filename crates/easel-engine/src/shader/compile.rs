use crate::gl::{GraphicsContext, Program, Shader, ShaderKind};

/// Compiles one shader stage.
///
/// On failure the info log is written as a single error record, the shader
/// object is deleted and `None` is returned.
pub fn compile_shader<G>(gl: &mut G, kind: ShaderKind, source: &str) -> Option<Shader>
where
    G: GraphicsContext + ?Sized,
{
    let shader = match gl.create_shader(kind) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to create {kind} shader: {e}");
            return None;
        }
    };

    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if gl.get_shader_compile_status(shader) {
        log::trace!("{kind} shader compiled: {shader:?}");
        return Some(shader);
    }

    log::error!("{kind} shader compile failed:\n{}", gl.get_shader_info_log(shader));
    gl.delete_shader(shader);
    None
}

/// Links a vertex and a fragment shader into a program.
///
/// On success both shaders stay attached. On failure the info log is written
/// as a single error record, the program object is deleted and `None` is
/// returned.
pub fn link_program<G>(gl: &mut G, vertex: Shader, fragment: Shader) -> Option<Program>
where
    G: GraphicsContext + ?Sized,
{
    let program = match gl.create_program() {
        Ok(p) => p,
        Err(e) => {
            log::error!("failed to create program: {e}");
            return None;
        }
    };

    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    gl.link_program(program);

    if gl.get_program_link_status(program) {
        log::trace!("program linked: {program:?}");
        return Some(program);
    }

    log::error!("program link failed:\n{}", gl.get_program_info_log(program));
    gl.delete_program(program);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::recording::{Call, RecordingContext};
    use crate::testing::{capture_logs, error_count};

    const VS: &str = r#"
        @vertex
        fn main(@location(0) a_position: vec2<f32>) -> @builtin(position) vec4<f32> {
            return vec4<f32>(a_position, 0.0, 1.0);
        }
    "#;

    const FS: &str = r#"
        @fragment
        fn main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 0.0, 0.5, 1.0);
        }
    "#;

    // Reads a varying the vertex stage above never writes.
    const FS_NEEDS_VARYING: &str = r#"
        @fragment
        fn main(@location(0) v_color: vec4<f32>) -> @location(0) vec4<f32> {
            return v_color;
        }
    "#;

    // ── compile_shader ────────────────────────────────────────────────────

    #[test]
    fn valid_source_compiles() {
        let mut gl = RecordingContext::new(1, 1);
        let (shader, logs) = capture_logs(|| compile_shader(&mut gl, ShaderKind::Vertex, VS));
        let shader = shader.expect("vertex shader should compile");
        assert!(gl.shader_exists(shader));
        assert_eq!(error_count(&logs), 0);
    }

    #[test]
    fn invalid_source_logs_once_and_releases_shader() {
        let mut gl = RecordingContext::new(1, 1);
        let (shader, logs) =
            capture_logs(|| compile_shader(&mut gl, ShaderKind::Fragment, "fn main( {"));
        assert!(shader.is_none());
        assert_eq!(error_count(&logs), 1);
        assert!(logs[0].1.contains("fragment shader compile failed"), "{}", logs[0].1);
        assert!(gl.calls.iter().any(|c| matches!(c, Call::DeleteShader(_))));
    }

    #[test]
    fn stage_mismatch_is_a_compile_failure() {
        let mut gl = RecordingContext::new(1, 1);
        let (shader, logs) = capture_logs(|| compile_shader(&mut gl, ShaderKind::Vertex, FS));
        assert!(shader.is_none());
        assert_eq!(error_count(&logs), 1);
    }

    // ── link_program ──────────────────────────────────────────────────────

    #[test]
    fn valid_pair_links_and_keeps_shaders_attached() {
        let mut gl = RecordingContext::new(1, 1);
        let vs = compile_shader(&mut gl, ShaderKind::Vertex, VS).unwrap();
        let fs = compile_shader(&mut gl, ShaderKind::Fragment, FS).unwrap();

        let (program, logs) = capture_logs(|| link_program(&mut gl, vs, fs));
        let program = program.expect("program should link");

        assert_eq!(error_count(&logs), 0);
        assert!(gl.program_exists(program));
        assert!(gl.shader_exists(vs) && gl.shader_exists(fs));
        assert!(gl.calls.contains(&Call::AttachShader(program, vs)));
        assert!(gl.calls.contains(&Call::AttachShader(program, fs)));
        assert_eq!(gl.get_attrib_location(program, "a_position"), Some(0));
    }

    #[test]
    fn interface_mismatch_logs_once_and_releases_program() {
        let mut gl = RecordingContext::new(1, 1);
        let vs = compile_shader(&mut gl, ShaderKind::Vertex, VS).unwrap();
        let fs = compile_shader(&mut gl, ShaderKind::Fragment, FS_NEEDS_VARYING).unwrap();

        let (program, logs) = capture_logs(|| link_program(&mut gl, vs, fs));

        assert!(program.is_none());
        assert_eq!(error_count(&logs), 1);
        assert!(logs[0].1.contains("v_color"), "{}", logs[0].1);
        assert!(gl.calls.iter().any(|c| matches!(c, Call::DeleteProgram(_))));
    }

    #[test]
    fn locations_on_unlinked_program_are_absent() {
        let mut gl = RecordingContext::new(1, 1);
        let program = gl.create_program().unwrap();
        assert_eq!(gl.get_attrib_location(program, "a_position"), None);
        assert_eq!(gl.get_uniform_location(program, "u_color"), None);
    }
}

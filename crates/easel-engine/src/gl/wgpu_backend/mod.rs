//! `GraphicsContext` on top of wgpu.
//!
//! Draws go to an offscreen canvas texture. Every `clear` and `draw_arrays`
//! is recorded into its own encoder and submitted immediately, so buffer and
//! uniform writes queued before a call are visible to exactly that call.

mod canvas;
mod program;

use std::collections::BTreeMap;

use anyhow::Result;
use wgpu::util::DeviceExt;

use crate::gl::{
    Buffer, BufferUsage, GraphicsContext, ObjectTable, PrimitiveMode, Program, ProgramObject,
    Shader, ShaderKind, ShaderObject, UniformLocation,
};

use canvas::Canvas;
use program::{AttribLayout, PipelineKey, ProgramResources};

struct GpuProgram {
    object: ProgramObject,
    resources: Option<ProgramResources>,
}

#[derive(Default)]
struct GpuBuffer {
    gpu: Option<wgpu::Buffer>,
}

#[derive(Debug, Copy, Clone)]
struct AttribPointer {
    buffer: Buffer,
    size: u32,
    stride: u64,
    offset: u64,
}

#[derive(Debug, Default, Copy, Clone)]
struct AttribState {
    enabled: bool,
    pointer: Option<AttribPointer>,
}

/// wgpu-backed rendering context with its own drawing buffer.
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    canvas: Canvas,

    shaders: ObjectTable<ShaderObject>,
    programs: ObjectTable<GpuProgram>,
    buffers: ObjectTable<GpuBuffer>,

    array_buffer: Option<Buffer>,
    current: Option<Program>,
    attribs: BTreeMap<u32, AttribState>,
    viewport: [i32; 4],
    clear_color: wgpu::Color,
}

impl WgpuContext {
    /// Creates a context whose drawing buffer is `width` x `height`.
    ///
    /// The viewport starts out covering the whole drawing buffer.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, width: u32, height: u32) -> Self {
        let canvas = Canvas::new(&device, width, height);
        Self {
            device,
            queue,
            canvas,
            shaders: ObjectTable::default(),
            programs: ObjectTable::default(),
            buffers: ObjectTable::default(),
            array_buffer: None,
            current: None,
            attribs: BTreeMap::new(),
            viewport: [0, 0, clamp_i32(width), clamp_i32(height)],
            clear_color: wgpu::Color::TRANSPARENT,
        }
    }

    /// Reads the drawing buffer back as RGBA8 rows, top row first.
    pub fn read_pixels(&self) -> Result<Vec<u8>> {
        self.canvas.read_pixels(&self.device, &self.queue)
    }

    pub fn canvas_view(&self) -> &wgpu::TextureView {
        self.canvas.view()
    }

    fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    fn current_resources(&self, location: &UniformLocation) -> Option<&ProgramResources> {
        if self.current != Some(location.program) {
            log::warn!("uniform set for {:?} while it is not the current program", location.program);
            return None;
        }
        self.programs.get(location.program.0)?.resources.as_ref()
    }

    fn write_uniform(&mut self, location: Option<&UniformLocation>, bytes: &[u8]) {
        let Some(location) = location else { return };
        let Some(program) = self.programs.get(location.program.0) else { return };
        let Some(uniform) = program
            .object
            .linked
            .as_ref()
            .and_then(|l| l.uniforms.get(location.index))
        else {
            return;
        };
        if uniform.size as usize != bytes.len() {
            log::warn!(
                "uniform `{}` is {} bytes, refusing a {} byte write",
                uniform.name,
                uniform.size,
                bytes.len()
            );
            return;
        }
        let Some(buffer) = self
            .current_resources(location)
            .and_then(|r| r.uniform_buffer(location.index))
        else {
            return;
        };
        self.queue.write_buffer(buffer, 0, bytes);
    }

    /// Resolves every vertex input of `program` to an enabled attribute.
    ///
    /// Returns the pipeline key and the buffer slice start of each slot.
    fn vertex_inputs(
        &self,
        program: &ProgramObject,
        mode: PrimitiveMode,
        first: u32,
        count: u32,
    ) -> Option<(PipelineKey, Vec<(wgpu::Buffer, u64)>)> {
        let linked = program.linked.as_ref()?;
        let mut key = PipelineKey { mode, attribs: Vec::new() };
        let mut slots = Vec::new();

        for input in &linked.vertex.inputs {
            let label = input.name.as_deref().unwrap_or("<unnamed>");
            let Some(pointer) = enabled_pointer(&self.attribs, input.location) else {
                log::warn!("draw skipped: vertex input `{label}` (location {}) is not enabled", input.location);
                return None;
            };
            let Some(buffer) = self.buffers.get(pointer.buffer.0).and_then(|b| b.gpu.clone()) else {
                log::warn!("draw skipped: vertex input `{label}` has no buffer data");
                return None;
            };

            let last_end = vertex_read_end(&pointer, first, count).unwrap_or(0);
            if last_end > buffer.size() {
                log::warn!(
                    "draw skipped: vertex input `{label}` reads {last_end} bytes of a {} byte buffer",
                    buffer.size()
                );
                return None;
            }

            key.attribs.push(AttribLayout {
                location: input.location,
                size: pointer.size,
                stride: pointer.stride,
            });
            slots.push((buffer, pointer.offset + u64::from(first) * pointer.stride));
        }

        Some((key, slots))
    }
}

impl GraphicsContext for WgpuContext {
    fn create_shader(&mut self, kind: ShaderKind) -> Result<Shader, String> {
        Ok(Shader(self.shaders.insert(ShaderObject::new(kind))))
    }

    fn shader_source(&mut self, shader: Shader, source: &str) {
        match self.shaders.get_mut(shader.0) {
            Some(s) => s.source = source.to_owned(),
            None => log::warn!("shader_source: {shader:?} does not exist"),
        }
    }

    fn compile_shader(&mut self, shader: Shader) {
        match self.shaders.get_mut(shader.0) {
            Some(s) => s.compile(),
            None => log::warn!("compile_shader: {shader:?} does not exist"),
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
        self.shaders.remove(shader.0);
    }

    fn create_program(&mut self) -> Result<Program, String> {
        let id = self.programs.insert(GpuProgram {
            object: ProgramObject::default(),
            resources: None,
        });
        Ok(Program(id))
    }

    fn attach_shader(&mut self, program: Program, shader: Shader) {
        let Some(p) = self.programs.get_mut(program.0) else {
            log::warn!("attach_shader: {program:?} does not exist");
            return;
        };
        if let Err(e) = p.object.attach(shader, &self.shaders) {
            log::warn!("attach_shader: {e}");
        }
    }

    fn link_program(&mut self, program: Program) {
        let Some(p) = self.programs.get_mut(program.0) else {
            log::warn!("link_program: {program:?} does not exist");
            return;
        };
        p.resources = None;
        if p.object.link(&self.shaders) {
            p.resources = p
                .object
                .linked
                .as_ref()
                .map(|interface| ProgramResources::new(&self.device, interface));
        }
    }

    fn get_program_link_status(&self, program: Program) -> bool {
        self.programs
            .get(program.0)
            .is_some_and(|p| p.object.linked.is_some())
    }

    fn get_program_info_log(&self, program: Program) -> String {
        self.programs
            .get(program.0)
            .map(|p| p.object.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&mut self, program: Program) {
        self.programs.remove(program.0);
        if self.current == Some(program) {
            self.current = None;
        }
    }

    fn get_attrib_location(&self, program: Program, name: &str) -> Option<u32> {
        self.programs
            .get(program.0)?
            .object
            .linked
            .as_ref()?
            .attribute_location(name)
    }

    fn get_uniform_location(&self, program: Program, name: &str) -> Option<UniformLocation> {
        let index = self
            .programs
            .get(program.0)?
            .object
            .linked
            .as_ref()?
            .uniform_index(name)?;
        Some(UniformLocation { program, index })
    }

    fn create_buffer(&mut self) -> Result<Buffer, String> {
        Ok(Buffer(self.buffers.insert(GpuBuffer::default())))
    }

    fn bind_array_buffer(&mut self, buffer: Option<Buffer>) {
        if let Some(b) = buffer
            && self.buffers.get(b.0).is_none()
        {
            log::warn!("bind_array_buffer: {b:?} does not exist");
            return;
        }
        self.array_buffer = buffer;
    }

    fn buffer_data_f32(&mut self, data: &[f32], _usage: BufferUsage) {
        let Some(bound) = self.array_buffer else {
            log::warn!("buffer_data: no array buffer bound");
            return;
        };
        let Some(slot) = self.buffers.get_mut(bound.0) else { return };
        if data.is_empty() {
            slot.gpu = None;
            return;
        }
        slot.gpu = Some(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("easel array buffer"),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::VERTEX,
        }));
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.canvas.size()
    }

    fn set_drawing_buffer_size(&mut self, width: u32, height: u32) {
        if self.canvas.size() == (width, height) {
            return;
        }
        log::debug!("drawing buffer resized to {width}x{height}");
        self.canvas = Canvas::new(&self.device, width, height);
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if width < 0 || height < 0 {
            log::warn!("viewport: negative size {width}x{height} ignored");
            return;
        }
        self.viewport = [x, y, width, height];
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.clear_color = wgpu::Color {
            r: f64::from(r.clamp(0.0, 1.0)),
            g: f64::from(g.clamp(0.0, 1.0)),
            b: f64::from(b.clamp(0.0, 1.0)),
            a: f64::from(a.clamp(0.0, 1.0)),
        };
    }

    fn clear(&mut self) {
        let mut encoder = self.encoder("easel clear encoder");
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("easel clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.canvas.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn use_program(&mut self, program: Option<Program>) {
        if let Some(p) = program
            && !self.get_program_link_status(p)
        {
            log::warn!("use_program: {p:?} is not a linked program");
            return;
        }
        self.current = program;
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.attribs.entry(index).or_default().enabled = true;
    }

    fn vertex_attrib_pointer_f32(
        &mut self,
        index: u32,
        size: i32,
        _normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        let Some(buffer) = self.array_buffer else {
            log::warn!("vertex_attrib_pointer: no array buffer bound");
            return;
        };
        let (Ok(size @ 1..=4), Ok(stride), Ok(offset)) =
            (u32::try_from(size), u64::try_from(stride), u64::try_from(offset))
        else {
            log::warn!("vertex_attrib_pointer: invalid size {size}, stride {stride} or offset {offset}");
            return;
        };
        // wgpu requires 4-byte aligned vertex strides and buffer offsets.
        if stride % 4 != 0 || offset % 4 != 0 {
            log::warn!("vertex_attrib_pointer: stride {stride} and offset {offset} must be multiples of 4");
            return;
        }
        let stride = if stride == 0 { u64::from(size) * 4 } else { stride };
        self.attribs.entry(index).or_default().pointer = Some(AttribPointer {
            buffer,
            size,
            stride,
            offset,
        });
    }

    fn uniform_2_f32(&mut self, location: Option<&UniformLocation>, x: f32, y: f32) {
        self.write_uniform(location, bytemuck::cast_slice(&[x, y]));
    }

    fn uniform_4_f32(&mut self, location: Option<&UniformLocation>, x: f32, y: f32, z: f32, w: f32) {
        self.write_uniform(location, bytemuck::cast_slice(&[x, y, z, w]));
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: i32, count: i32) {
        let (Ok(first), Ok(count)) = (u32::try_from(first), u32::try_from(count)) else {
            log::warn!("draw_arrays: negative first {first} or count {count}");
            return;
        };
        if count == 0 {
            return;
        }
        if self.canvas.is_empty() {
            log::warn!("draw skipped: drawing buffer is empty");
            return;
        }
        let Some(program) = self.current else {
            log::warn!("draw skipped: no current program");
            return;
        };
        let Some(rect) = self.canvas.viewport_rect(self.viewport) else {
            log::debug!("draw skipped: viewport is off the drawing buffer");
            return;
        };

        let Some((key, slots)) = self
            .programs
            .get(program.0)
            .and_then(|p| self.vertex_inputs(&p.object, mode, first, count))
        else {
            return;
        };

        let Some(p) = self.programs.get_mut(program.0) else { return };
        let Some(resources) = p.resources.as_mut() else { return };
        let pipeline = resources.pipeline(&self.device, &key);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("easel draw encoder") });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("easel draw pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.canvas.view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let [x, y, w, h] = rect;
            rpass.set_viewport(x, y, w, h, 0.0, 1.0);
            rpass.set_pipeline(&pipeline);
            for (group, bind_group) in resources.bind_groups().iter().enumerate() {
                rpass.set_bind_group(group as u32, bind_group, &[]);
            }
            for (slot, (buffer, start)) in slots.iter().enumerate() {
                rpass.set_vertex_buffer(slot as u32, buffer.slice(*start..));
            }
            rpass.draw(0..count, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Pointer of an attribute that is both enabled and described.
fn enabled_pointer(attribs: &BTreeMap<u32, AttribState>, location: u32) -> Option<AttribPointer> {
    attribs
        .get(&location)
        .filter(|a| a.enabled)
        .and_then(|a| a.pointer)
}

/// One past the last byte `pointer` reads for vertices `first..first + count`.
///
/// `None` for an empty range.
fn vertex_read_end(pointer: &AttribPointer, first: u32, count: u32) -> Option<u64> {
    let last = (u64::from(first) + u64::from(count)).checked_sub(1)?;
    Some(pointer.offset + last * pointer.stride + u64::from(pointer.size) * 4)
}

fn clamp_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer(size: u32, stride: u64, offset: u64) -> AttribPointer {
        AttribPointer {
            buffer: Buffer(1),
            size,
            stride,
            offset,
        }
    }

    // ── vertex_read_end ───────────────────────────────────────────────────

    #[test]
    fn tightly_packed_range_ends_at_last_vertex() {
        // Six vec2<f32> vertices fill exactly 48 bytes.
        let p = pointer(2, 8, 0);
        assert_eq!(vertex_read_end(&p, 0, 6), Some(48));
        assert_eq!(vertex_read_end(&p, 0, 1), Some(8));
        assert_eq!(vertex_read_end(&p, 5, 1), Some(48));
        assert_eq!(vertex_read_end(&p, 1, 6), Some(56));
    }

    #[test]
    fn last_vertex_reads_only_its_components() {
        // Interleaved: the final vertex reads size*4 bytes, not a full stride.
        let p = pointer(2, 16, 4);
        assert_eq!(vertex_read_end(&p, 0, 3), Some(4 + 2 * 16 + 8));
    }

    #[test]
    fn empty_range_reads_nothing() {
        assert_eq!(vertex_read_end(&pointer(2, 8, 0), 0, 0), None);
    }

    // ── enabled_pointer ───────────────────────────────────────────────────

    #[test]
    fn attribute_needs_enable_and_pointer() {
        let mut attribs = BTreeMap::new();
        assert!(enabled_pointer(&attribs, 0).is_none());

        attribs.insert(0, AttribState { enabled: true, pointer: None });
        assert!(enabled_pointer(&attribs, 0).is_none());

        attribs.insert(0, AttribState { enabled: false, pointer: Some(pointer(2, 8, 0)) });
        assert!(enabled_pointer(&attribs, 0).is_none());

        attribs.insert(0, AttribState { enabled: true, pointer: Some(pointer(2, 8, 0)) });
        let p = enabled_pointer(&attribs, 0).unwrap();
        assert_eq!((p.size, p.stride), (2, 8));
        assert!(enabled_pointer(&attribs, 1).is_none());
    }
}

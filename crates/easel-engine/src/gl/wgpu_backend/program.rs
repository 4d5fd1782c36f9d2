use std::collections::HashMap;

use crate::gl::PrimitiveMode;
use crate::shader::interface::{ProgramInterface, ProgramUniform};

use super::canvas::CANVAS_FORMAT;

/// One vertex input as described by `vertex_attrib_pointer_f32`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) struct AttribLayout {
    pub location: u32,
    /// Components per vertex, 1..=4.
    pub size: u32,
    /// Bytes between consecutive vertices; never 0.
    pub stride: u64,
}

/// Everything a render pipeline depends on besides the program itself.
///
/// Each attribute gets its own vertex buffer slot, in `attribs` order.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub(super) struct PipelineKey {
    pub mode: PrimitiveMode,
    pub attribs: Vec<AttribLayout>,
}

/// GPU objects backing a linked program.
///
/// Uniform values live in one buffer per binding, so they persist across
/// `use_program` switches the way GL program state does.
pub(super) struct ProgramResources {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    vertex_entry: String,
    fragment_entry: String,
    layout: wgpu::PipelineLayout,
    uniform_buffers: Vec<wgpu::Buffer>,
    bind_groups: Vec<wgpu::BindGroup>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl ProgramResources {
    pub(super) fn new(device: &wgpu::Device, interface: &ProgramInterface) -> Self {
        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("easel vertex shader"),
            source: wgpu::ShaderSource::Wgsl(interface.vertex.source.as_str().into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("easel fragment shader"),
            source: wgpu::ShaderSource::Wgsl(interface.fragment.source.as_str().into()),
        });

        let uniform_buffers: Vec<wgpu::Buffer> = interface
            .uniforms
            .iter()
            .map(|u| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(u.name.as_str()),
                    size: uniform_buffer_size(u.size),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        // Groups are dense from 0 to the highest one used; gaps get empty layouts.
        let group_count = interface.max_group().map_or(0, |g| g + 1);
        let mut group_layouts = Vec::with_capacity(group_count as usize);
        let mut bind_groups = Vec::with_capacity(group_count as usize);

        for group in 0..group_count {
            let members: Vec<(&ProgramUniform, &wgpu::Buffer)> = interface
                .uniforms
                .iter()
                .zip(&uniform_buffers)
                .filter(|(u, _)| u.group == group)
                .collect();

            let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = members
                .iter()
                .map(|(u, _)| wgpu::BindGroupLayoutEntry {
                    binding: u.binding,
                    visibility: stage_visibility(u),
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                })
                .collect();

            let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("easel program bgl"),
                entries: &layout_entries,
            });

            let group_entries: Vec<wgpu::BindGroupEntry<'_>> = members
                .iter()
                .map(|(u, buffer)| wgpu::BindGroupEntry {
                    binding: u.binding,
                    resource: buffer.as_entire_binding(),
                })
                .collect();

            bind_groups.push(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("easel program bind group"),
                layout: &bgl,
                entries: &group_entries,
            }));
            group_layouts.push(bgl);
        }

        let layout_refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("easel program pipeline layout"),
            bind_group_layouts: &layout_refs,
            immediate_size: 0,
        });

        Self {
            vertex,
            fragment,
            vertex_entry: interface.vertex.entry_point.clone(),
            fragment_entry: interface.fragment.entry_point.clone(),
            layout,
            uniform_buffers,
            bind_groups,
            pipelines: HashMap::new(),
        }
    }

    pub(super) fn bind_groups(&self) -> &[wgpu::BindGroup] {
        &self.bind_groups
    }

    pub(super) fn uniform_buffer(&self, index: usize) -> Option<&wgpu::Buffer> {
        self.uniform_buffers.get(index)
    }

    /// Returns the pipeline for `key`, building it on first use.
    pub(super) fn pipeline(&mut self, device: &wgpu::Device, key: &PipelineKey) -> wgpu::RenderPipeline {
        if let Some(p) = self.pipelines.get(key) {
            return p.clone();
        }

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .attribs
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    format: vertex_format(a.size),
                    offset: 0,
                    shader_location: a.location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .attribs
            .iter()
            .zip(&attributes)
            .map(|(a, attrs)| wgpu::VertexBufferLayout {
                array_stride: a.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("easel program pipeline"),
            layout: Some(&self.layout),

            vertex: wgpu::VertexState {
                module: &self.vertex,
                entry_point: Some(self.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.fragment,
                entry_point: Some(self.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: CANVAS_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: topology(key.mode),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("built pipeline for {:?} with {} attribute(s)", key.mode, key.attribs.len());
        self.pipelines.insert(key.clone(), pipeline.clone());
        pipeline
    }
}

fn stage_visibility(u: &ProgramUniform) -> wgpu::ShaderStages {
    let mut stages = wgpu::ShaderStages::NONE;
    if u.in_vertex {
        stages |= wgpu::ShaderStages::VERTEX;
    }
    if u.in_fragment {
        stages |= wgpu::ShaderStages::FRAGMENT;
    }
    stages
}

/// Uniform buffers are padded to 16 bytes.
pub(super) fn uniform_buffer_size(size: u32) -> u64 {
    u64::from(size.max(1)).next_multiple_of(16)
}

fn vertex_format(size: u32) -> wgpu::VertexFormat {
    match size {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

fn topology(mode: PrimitiveMode) -> wgpu::PrimitiveTopology {
    match mode {
        PrimitiveMode::Points => wgpu::PrimitiveTopology::PointList,
        PrimitiveMode::Lines => wgpu::PrimitiveTopology::LineList,
        PrimitiveMode::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        PrimitiveMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

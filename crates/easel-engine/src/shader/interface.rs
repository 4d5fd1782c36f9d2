//! Stage reflection and program linking rules.
//!
//! A stage "compiles" when naga parses and validates it and it contains
//! exactly one entry point for its stage. A program "links" when the two
//! stage interfaces agree. Both backends share these rules so a source pair
//! behaves the same on the GPU and in tests.

use std::collections::BTreeMap;

use naga::{Binding, Handle, ScalarKind, Type, TypeInner, VectorSize};

use crate::gl::ShaderKind;

/// Component layout of a located stage input or output.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VarFormat {
    Float,
    Float2,
    Float3,
    Float4,
    Other,
}

impl VarFormat {
    fn of(inner: &TypeInner) -> Self {
        match inner {
            TypeInner::Scalar(s) if s.kind == ScalarKind::Float && s.width == 4 => VarFormat::Float,
            TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float && scalar.width == 4 => {
                match size {
                    VectorSize::Bi => VarFormat::Float2,
                    VectorSize::Tri => VarFormat::Float3,
                    VectorSize::Quad => VarFormat::Float4,
                }
            }
            _ => VarFormat::Other,
        }
    }
}

/// A `@location` input or output of an entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceVar {
    pub name: Option<String>,
    pub location: u32,
    pub format: VarFormat,
}

/// A `var<uniform>` global.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformVar {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    /// Size in bytes of the uniform's type.
    pub size: u32,
}

/// A bound global that is not a uniform buffer (texture, sampler, storage).
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceVar {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    /// naga's address space, as written in diagnostics.
    pub space: String,
}

/// Reflected interface of one compiled stage.
#[derive(Debug, Clone)]
pub struct StageInterface {
    pub kind: ShaderKind,
    pub entry_point: String,
    /// Source snapshot taken at compile time.
    pub source: String,
    pub inputs: Vec<InterfaceVar>,
    pub outputs: Vec<InterfaceVar>,
    pub uniforms: Vec<UniformVar>,
    pub resources: Vec<ResourceVar>,
}

/// Parses, validates and reflects a WGSL stage.
///
/// The error string is the diagnostic a GL info log would carry.
pub fn reflect_stage(kind: ShaderKind, source: &str) -> Result<StageInterface, String> {
    if source.trim().is_empty() {
        return Err(format!("{kind} shader source is empty"));
    }

    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let stage = kind.naga_stage();
    let mut entries = module.entry_points.iter().filter(|ep| ep.stage == stage);
    let entry = entries
        .next()
        .ok_or_else(|| format!("no {kind} entry point found"))?;
    if entries.next().is_some() {
        return Err(format!("more than one {kind} entry point found"));
    }

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_located(&module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_located(&module, None, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let uniforms = module
        .global_variables
        .iter()
        .filter(|(_, var)| var.space == naga::AddressSpace::Uniform)
        .filter_map(|(_, var)| {
            let rb = var.binding.as_ref()?;
            Some(UniformVar {
                name: var.name.clone().unwrap_or_default(),
                group: rb.group,
                binding: rb.binding,
                size: module.types[var.ty].inner.size(module.to_ctx()),
            })
        })
        .collect();

    let resources = module
        .global_variables
        .iter()
        .filter(|(_, var)| var.space != naga::AddressSpace::Uniform)
        .filter_map(|(_, var)| {
            let rb = var.binding.as_ref()?;
            Some(ResourceVar {
                name: var.name.clone().unwrap_or_default(),
                group: rb.group,
                binding: rb.binding,
                space: format!("{:?}", var.space),
            })
        })
        .collect();

    Ok(StageInterface {
        kind,
        entry_point: entry.name.clone(),
        source: source.to_owned(),
        inputs,
        outputs,
        uniforms,
        resources,
    })
}

fn collect_located(
    module: &naga::Module,
    name: Option<&str>,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<InterfaceVar>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(InterfaceVar {
            name: name.map(str::to_owned),
            location: *location,
            format: VarFormat::of(&module.types[ty].inner),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_located(module, m.name.as_deref(), m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

/// A uniform binding merged across both stages of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramUniform {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    pub size: u32,
    pub in_vertex: bool,
    pub in_fragment: bool,
}

/// Interface of a successfully linked program.
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    pub vertex: StageInterface,
    pub fragment: StageInterface,
    /// Sorted by `(group, binding)`.
    pub uniforms: Vec<ProgramUniform>,
}

impl ProgramInterface {
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.vertex
            .inputs
            .iter()
            .find(|v| v.name.as_deref() == Some(name))
            .map(|v| v.location)
    }

    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|u| u.name == name)
    }

    /// Highest bind group index used, if any uniform exists.
    pub fn max_group(&self) -> Option<u32> {
        self.uniforms.iter().map(|u| u.group).max()
    }
}

/// Checks that two stages form a valid program.
///
/// Errors name the first mismatch found.
pub fn link_stages(
    vertex: &StageInterface,
    fragment: &StageInterface,
) -> Result<ProgramInterface, String> {
    if vertex.kind != ShaderKind::Vertex || fragment.kind != ShaderKind::Fragment {
        return Err("program needs one vertex and one fragment stage".to_owned());
    }

    // Programs bind uniform buffers and float vertex attributes only.
    for stage in [vertex, fragment] {
        if let Some(r) = stage.resources.first() {
            return Err(format!(
                "{} stage binds `{}` at @group({}) @binding({}) in address space {}; only uniform buffers are supported",
                stage.kind, r.name, r.group, r.binding, r.space
            ));
        }
    }
    for input in &vertex.inputs {
        if input.format == VarFormat::Other {
            return Err(format!(
                "vertex input `{}` at location {} is not a 32-bit float scalar or vector",
                input.name.as_deref().unwrap_or("<unnamed>"),
                input.location
            ));
        }
    }

    for input in &fragment.inputs {
        let label = input.name.as_deref().unwrap_or("<unnamed>");
        let Some(output) = vertex.outputs.iter().find(|o| o.location == input.location) else {
            return Err(format!(
                "fragment input `{label}` at location {} is not written by the vertex stage",
                input.location
            ));
        };
        if output.format != input.format {
            return Err(format!(
                "fragment input `{label}` at location {} does not match the vertex output type",
                input.location
            ));
        }
    }

    if !fragment.outputs.iter().any(|o| o.location == 0) {
        return Err("fragment stage does not write color location 0".to_owned());
    }

    let mut merged: BTreeMap<(u32, u32), ProgramUniform> = BTreeMap::new();
    let stages = [(vertex, true), (fragment, false)];
    for (stage, is_vertex) in stages {
        for u in &stage.uniforms {
            let entry = merged
                .entry((u.group, u.binding))
                .or_insert_with(|| ProgramUniform {
                    name: u.name.clone(),
                    group: u.group,
                    binding: u.binding,
                    size: u.size,
                    in_vertex: false,
                    in_fragment: false,
                });
            if entry.name != u.name || entry.size != u.size {
                return Err(format!(
                    "uniform binding @group({}) @binding({}) is declared as `{}` and `{}`",
                    u.group, u.binding, entry.name, u.name
                ));
            }
            if is_vertex {
                entry.in_vertex = true;
            } else {
                entry.in_fragment = true;
            }
        }
    }

    let uniforms: Vec<ProgramUniform> = merged.into_values().collect();
    for (i, u) in uniforms.iter().enumerate() {
        if uniforms[..i].iter().any(|other| other.name == u.name) {
            return Err(format!("uniform `{}` is bound more than once", u.name));
        }
    }

    Ok(ProgramInterface {
        vertex: vertex.clone(),
        fragment: fragment.clone(),
        uniforms,
    })
}

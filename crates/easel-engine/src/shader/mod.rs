//! Shader bootstrap: source lookup, stage compilation and program linking.

mod compile;
pub mod interface;
mod sources;

pub use compile::{compile_shader, link_program};
pub use sources::{
    BundledSources, ShaderDirectory, ShaderSourceLookup, FRAGMENT_SHADER_ID, VERTEX_SHADER_ID,
};

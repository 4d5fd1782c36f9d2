use std::path::PathBuf;

use crate::frame::ScenarioKind;

/// Id of the vertex stage source.
pub const VERTEX_SHADER_ID: &str = "vertex-sharder-2d";

/// Id of the fragment stage source.
pub const FRAGMENT_SHADER_ID: &str = "fragment-sharder-2d";

/// Resolves shader source text by id.
pub trait ShaderSourceLookup {
    fn shader_text(&self, id: &str) -> Option<String>;
}

/// Shader pairs compiled into the binary.
#[derive(Debug, Copy, Clone)]
pub struct BundledSources {
    vertex: &'static str,
    fragment: &'static str,
}

impl BundledSources {
    pub fn for_scenario(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Triangle => Self {
                vertex: include_str!("wgsl/triangle.vert.wgsl"),
                fragment: include_str!("wgsl/triangle.frag.wgsl"),
            },
            ScenarioKind::Rectangles => Self {
                vertex: include_str!("wgsl/rectangles.vert.wgsl"),
                fragment: include_str!("wgsl/rectangles.frag.wgsl"),
            },
        }
    }
}

impl ShaderSourceLookup for BundledSources {
    fn shader_text(&self, id: &str) -> Option<String> {
        match id {
            VERTEX_SHADER_ID => Some(self.vertex.to_owned()),
            FRAGMENT_SHADER_ID => Some(self.fragment.to_owned()),
            _ => None,
        }
    }
}

/// Reads `<root>/<id>.wgsl`.
#[derive(Debug, Clone)]
pub struct ShaderDirectory {
    root: PathBuf,
}

impl ShaderDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.wgsl"))
    }
}

impl ShaderSourceLookup for ShaderDirectory {
    fn shader_text(&self, id: &str) -> Option<String> {
        let path = self.path_for(id);
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("cannot read shader `{id}` from {}: {e}", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_sources_answer_both_ids() {
        for kind in [ScenarioKind::Triangle, ScenarioKind::Rectangles] {
            let s = BundledSources::for_scenario(kind);
            assert!(s.shader_text(VERTEX_SHADER_ID).is_some());
            assert!(s.shader_text(FRAGMENT_SHADER_ID).is_some());
            assert!(s.shader_text("canvas").is_none());
        }
    }

    #[test]
    fn rectangle_sources_declare_both_uniforms() {
        let s = BundledSources::for_scenario(ScenarioKind::Rectangles);
        assert!(s.shader_text(VERTEX_SHADER_ID).unwrap().contains("u_resolution"));
        assert!(s.shader_text(FRAGMENT_SHADER_ID).unwrap().contains("u_color"));
    }

    #[test]
    fn directory_maps_id_to_wgsl_file() {
        let dir = ShaderDirectory::new("shaders");
        assert_eq!(
            dir.path_for(VERTEX_SHADER_ID),
            std::path::Path::new("shaders").join("vertex-sharder-2d.wgsl")
        );
    }

    #[test]
    fn missing_file_is_absent() {
        let dir = ShaderDirectory::new("/nonexistent/easel/shaders");
        assert!(dir.shader_text(VERTEX_SHADER_ID).is_none());
    }
}

//! Context-owned shader and program objects.

use std::collections::HashMap;

use crate::shader::interface::{link_stages, reflect_stage, ProgramInterface, StageInterface};

use super::{Shader, ShaderKind};

/// Id-keyed object storage. Ids start at 1 and are never reused.
#[derive(Debug)]
pub(crate) struct ObjectTable<T> {
    next: u32,
    objects: HashMap<u32, T>,
}

impl<T> Default for ObjectTable<T> {
    fn default() -> Self {
        Self {
            next: 1,
            objects: HashMap::new(),
        }
    }
}

impl<T> ObjectTable<T> {
    pub(crate) fn insert(&mut self, value: T) -> u32 {
        let id = self.next;
        self.next += 1;
        self.objects.insert(id, value);
        id
    }

    pub(crate) fn get(&self, id: u32) -> Option<&T> {
        self.objects.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.objects.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: u32) -> Option<T> {
        self.objects.remove(&id)
    }
}

#[derive(Debug)]
pub(crate) struct ShaderObject {
    pub(crate) kind: ShaderKind,
    pub(crate) source: String,
    pub(crate) compiled: Option<StageInterface>,
    pub(crate) info_log: String,
}

impl ShaderObject {
    pub(crate) fn new(kind: ShaderKind) -> Self {
        Self {
            kind,
            source: String::new(),
            compiled: None,
            info_log: String::new(),
        }
    }

    pub(crate) fn compile(&mut self) {
        match reflect_stage(self.kind, &self.source) {
            Ok(interface) => {
                self.compiled = Some(interface);
                self.info_log.clear();
            }
            Err(log) => {
                self.compiled = None;
                self.info_log = log;
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ProgramObject {
    pub(crate) attached: Vec<Shader>,
    pub(crate) linked: Option<ProgramInterface>,
    pub(crate) info_log: String,
}

impl ProgramObject {
    /// GL allows one shader per stage; a second one of the same kind is refused.
    pub(crate) fn attach(
        &mut self,
        shader: Shader,
        shaders: &ObjectTable<ShaderObject>,
    ) -> Result<(), String> {
        let Some(kind) = shaders.get(shader.0).map(|s| s.kind) else {
            return Err(format!("{shader:?} does not exist"));
        };
        if self.attached.contains(&shader) {
            return Err(format!("{shader:?} is already attached"));
        }
        let same_kind = self
            .attached
            .iter()
            .any(|s| shaders.get(s.0).is_some_and(|o| o.kind == kind));
        if same_kind {
            return Err(format!("a {kind} shader is already attached"));
        }
        self.attached.push(shader);
        Ok(())
    }

    /// Relinks from the currently attached shaders; returns the link status.
    pub(crate) fn link(&mut self, shaders: &ObjectTable<ShaderObject>) -> bool {
        let result = self
            .compiled_stage(ShaderKind::Vertex, shaders)
            .and_then(|vs| {
                let fs = self.compiled_stage(ShaderKind::Fragment, shaders)?;
                link_stages(vs, fs)
            });

        match result {
            Ok(interface) => {
                self.linked = Some(interface);
                self.info_log.clear();
                true
            }
            Err(log) => {
                self.linked = None;
                self.info_log = log;
                false
            }
        }
    }

    fn compiled_stage<'a>(
        &self,
        kind: ShaderKind,
        shaders: &'a ObjectTable<ShaderObject>,
    ) -> Result<&'a StageInterface, String> {
        let object = self
            .attached
            .iter()
            .filter_map(|s| shaders.get(s.0))
            .find(|o| o.kind == kind)
            .ok_or_else(|| format!("no {kind} shader attached"))?;
        object
            .compiled
            .as_ref()
            .ok_or_else(|| format!("attached {kind} shader is not compiled"))
    }
}

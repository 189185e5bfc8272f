use super::{ownership::ChildList, MaterialHandle};
use crate::gpu::{AttributeMask, GpuResource, ProgramDesc, ProgramHandle};

/// Compilation state of a shader's program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    /// Not compiled yet; the pipeline compiles it before the next frame.
    Pending,
    Ready(ProgramHandle),
    /// Compilation failed. Materials under this shader are not drawn.
    Failed,
}

/// A vertex + pixel program pair and the materials drawn with it.
#[derive(Debug, Clone)]
pub struct Shader {
    desc: ProgramDesc,
    state: ProgramState,
    materials: Vec<MaterialHandle>,
}

impl Shader {
    pub fn new(desc: ProgramDesc) -> Self {
        Self {
            desc,
            state: ProgramState::Pending,
            materials: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.desc.label
    }

    pub fn desc(&self) -> &ProgramDesc {
        &self.desc
    }

    /// Vertex streams this shader reads.
    pub fn attributes(&self) -> AttributeMask {
        self.desc.attributes
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn program(&self) -> Option<ProgramHandle> {
        match self.state {
            ProgramState::Ready(program) => Some(program),
            _ => None,
        }
    }

    pub fn materials(&self) -> &[MaterialHandle] {
        &self.materials
    }

    pub(crate) fn set_state(&mut self, state: ProgramState) {
        self.state = state;
    }

    pub(crate) fn take_gpu_resources(&mut self) -> Vec<GpuResource> {
        match std::mem::replace(&mut self.state, ProgramState::Pending) {
            ProgramState::Ready(program) => vec![GpuResource::Program(program)],
            _ => Vec::new(),
        }
    }
}

impl ChildList<MaterialHandle> for Shader {
    fn children(&self) -> &[MaterialHandle] {
        &self.materials
    }

    fn children_mut(&mut self) -> &mut Vec<MaterialHandle> {
        &mut self.materials
    }
}

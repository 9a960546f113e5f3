use crate::handles::{MeshHandle, ShaderHandle};

/// Ordered mesh handles of one loaded model. Cheap to clone, so many scene
/// entities can draw the same model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelComponent {
    pub meshes: Vec<MeshHandle>,
}

impl ModelComponent {
    pub fn new(meshes: Vec<MeshHandle>) -> Self {
        Self { meshes }
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// The program a scene entity is drawn with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderRef(pub ShaderHandle);

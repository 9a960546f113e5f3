//! Handles into the resource manager's private entity store.
//!
//! They wrap `hecs::Entity` but are distinct types, so a resource handle can
//! never be passed where a scene entity is expected or vice versa.

use hecs::Entity;

/// A mesh entity: mesh record, material record and local transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub(crate) Entity);

/// A texture entity shared by every material that samples the same image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) Entity);

/// A compiled shader program entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub(crate) Entity);

impl MeshHandle {
    pub fn entity(&self) -> Entity {
        self.0
    }
}

impl TextureHandle {
    pub fn entity(&self) -> Entity {
        self.0
    }
}

impl ShaderHandle {
    pub fn entity(&self) -> Entity {
        self.0
    }
}

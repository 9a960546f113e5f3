//! CPU-side descriptors produced by the model loader and consumed by the
//! resource manager. Nothing in here touches the GPU.

use cgmath::{Quaternion, Vector3};

#[derive(Debug, Clone)]
pub struct TextureData {
    /// Cache key; textures with the same name are uploaded once.
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Channels per pixel, 1 to 4.
    pub components: u32,
    /// Bits per channel, 8 or 16.
    pub bits: u32,
    pub pixels: Vec<u8>,
    pub wrap_s: u32,
    pub wrap_t: u32,
}

#[derive(Debug, Clone)]
pub struct MaterialData {
    pub base_color: Vector3<f32>,
    pub texture: Option<TextureData>,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            base_color: Vector3::new(1.0, 1.0, 1.0),
            texture: None,
        }
    }
}

/// One draw call worth of raw vertex and index bytes.
#[derive(Debug, Clone)]
pub struct PrimitiveData {
    pub positions: Vec<u8>,
    pub normals: Vec<u8>,
    pub texcoords: Vec<u8>,
    pub indices: Vec<u8>,
    pub index_count: usize,
    /// GL primitive topology, e.g. `glow::TRIANGLES`.
    pub mode: u32,
    /// GL index component type, e.g. `glow::UNSIGNED_SHORT`.
    pub index_type: u32,
    pub material: MaterialData,
}

impl PrimitiveData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / std::mem::size_of::<[f32; 3]>()
    }
}

/// A scene node that owns a mesh, with its node-relative placement.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
    pub primitives: Vec<PrimitiveData>,
}

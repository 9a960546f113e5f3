use cgmath::Vector3;

use crate::handles::TextureHandle;

/// Base color plus an optional shared texture.
///
/// Copied by value into every primitive that uses it; only the texture is
/// shared, through its handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialComponent {
    pub base_color: Vector3<f32>,
    pub texture: Option<TextureHandle>,
}

impl Default for MaterialComponent {
    fn default() -> Self {
        Self {
            base_color: Vector3::new(1.0, 1.0, 1.0),
            texture: None,
        }
    }
}

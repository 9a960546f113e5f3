use glow::NativeTexture;
use log::{debug, warn};

use crate::data::TextureData;
use crate::error::{EngineError, EngineResult};
use crate::opengl::GraphicsDevice;

#[derive(Debug, Clone)]
pub struct TextureComponent {
    pub name: String,
    pub texture: NativeTexture,
    pub width: u32,
    pub height: u32,
}

impl TextureComponent {
    /// Rows are read tightly packed, whatever their byte width.
    pub fn create(device: &dyn GraphicsDevice, data: &TextureData) -> EngineResult<Self> {
        let format = pixel_format(data.components, &data.name);
        let ty = pixel_type(data.bits, &data.name);

        let required = data.width as usize * data.height as usize * channels(format) * bytes_per_channel(ty);
        if data.pixels.len() < required {
            return Err(EngineError::Gpu(format!(
                "texture {} needs {} bytes of pixels, got {}",
                data.name,
                required,
                data.pixels.len()
            )));
        }

        let texture = device.create_texture().map_err(EngineError::Gpu)?;
        device.bind_texture(glow::TEXTURE_2D, Some(texture));

        device.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, data.wrap_s as i32);
        device.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, data.wrap_t as i32);
        device.tex_parameter_i32(
            glow::TEXTURE_2D,
            glow::TEXTURE_MIN_FILTER,
            glow::LINEAR_MIPMAP_LINEAR as i32,
        );
        device.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);

        device.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        device.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            format as i32,
            data.width as i32,
            data.height as i32,
            format,
            ty,
            Some(&data.pixels),
        );
        device.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
        device.generate_mipmap(glow::TEXTURE_2D);
        device.bind_texture(glow::TEXTURE_2D, None);

        debug!("Created new texture {}", data.name);

        Ok(Self {
            name: data.name.clone(),
            texture,
            width: data.width,
            height: data.height,
        })
    }

    pub fn release(&self, device: &dyn GraphicsDevice) {
        device.delete_texture(self.texture);
    }
}

fn pixel_format(components: u32, name: &str) -> u32 {
    match components {
        1 => glow::RED,
        2 => glow::RG,
        3 => glow::RGB,
        4 => glow::RGBA,
        _ => {
            warn!("Unknown component count {} in texture {}", components, name);
            glow::RGB
        }
    }
}

fn pixel_type(bits: u32, name: &str) -> u32 {
    match bits {
        8 => glow::UNSIGNED_BYTE,
        16 => glow::UNSIGNED_SHORT,
        _ => {
            warn!("Unknown bit depth {} in texture {}", bits, name);
            glow::UNSIGNED_BYTE
        }
    }
}

fn channels(format: u32) -> usize {
    match format {
        glow::RED => 1,
        glow::RG => 2,
        glow::RGBA => 4,
        _ => 3,
    }
}

fn bytes_per_channel(ty: u32) -> usize {
    if ty == glow::UNSIGNED_SHORT {
        2
    } else {
        1
    }
}

use glow::{NativeBuffer, NativeVertexArray};
use log::debug;

use crate::data::PrimitiveData;
use crate::error::{EngineError, EngineResult};
use crate::opengl::{GraphicsDevice, Layout};

const POSITION_SIZE: i32 = 3;
const NORMAL_SIZE: i32 = 3;
const TEXCOORD_SIZE: i32 = 2;
const FLOAT_SIZE: i32 = std::mem::size_of::<f32>() as i32;

/// GPU buffers of one primitive. The vertex buffer is laid out as
/// `[positions | normals | texcoords]`.
#[derive(Debug, Clone)]
pub struct MeshComponent {
    pub vao: NativeVertexArray,
    pub vbo: NativeBuffer,
    pub ebo: Option<NativeBuffer>,
    pub vertex_count: i32,
    pub index_count: i32,
    pub index_type: u32,
    pub mode: u32,
}

impl MeshComponent {
    /// Nothing stays allocated when an error is returned.
    pub fn create(device: &dyn GraphicsDevice, primitive: &PrimitiveData) -> EngineResult<Self> {
        let vao = device.create_vertex_array().map_err(EngineError::Gpu)?;
        let vbo = match device.create_buffer() {
            Ok(vbo) => vbo,
            Err(err) => {
                device.delete_vertex_array(vao);
                return Err(EngineError::Gpu(err));
            }
        };
        let ebo = if primitive.indices.is_empty() {
            None
        } else {
            match device.create_buffer() {
                Ok(ebo) => Some(ebo),
                Err(err) => {
                    device.delete_vertex_array(vao);
                    device.delete_buffer(vbo);
                    return Err(EngineError::Gpu(err));
                }
            }
        };

        device.bind_vertex_array(Some(vao));
        device.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));

        let total = primitive.positions.len() + primitive.normals.len() + primitive.texcoords.len();
        device.buffer_data_size(glow::ARRAY_BUFFER, total as i32, glow::STATIC_DRAW);

        let normal_offset = primitive.positions.len();
        let texcoord_offset = normal_offset + primitive.normals.len();
        device.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, &primitive.positions);
        device.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, normal_offset as i32, &primitive.normals);
        device.buffer_sub_data_u8_slice(
            glow::ARRAY_BUFFER,
            texcoord_offset as i32,
            &primitive.texcoords,
        );

        let layouts = [
            Layout::new(0, POSITION_SIZE, glow::FLOAT, false, POSITION_SIZE * FLOAT_SIZE, 0),
            Layout::new(1, NORMAL_SIZE, glow::FLOAT, false, NORMAL_SIZE * FLOAT_SIZE, normal_offset),
            Layout::new(2, TEXCOORD_SIZE, glow::FLOAT, false, TEXCOORD_SIZE * FLOAT_SIZE, texcoord_offset),
        ];
        for layout in &layouts {
            layout.apply(device);
        }

        // Bound while the vertex array is, so the array captures it.
        if let Some(ebo) = ebo {
            device.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            device.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, &primitive.indices, glow::STATIC_DRAW);
        }

        device.bind_vertex_array(None);
        device.bind_buffer(glow::ARRAY_BUFFER, None);
        if ebo.is_some() {
            device.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        }

        debug!("Created new mesh");

        Ok(Self {
            vao,
            vbo,
            ebo,
            vertex_count: primitive.vertex_count() as i32,
            index_count: primitive.index_count as i32,
            index_type: primitive.index_type,
            mode: primitive.mode,
        })
    }

    pub fn draw(&self, device: &dyn GraphicsDevice) {
        if self.ebo.is_some() {
            device.draw_elements(self.mode, self.index_count, self.index_type, 0);
        } else {
            device.draw_arrays(self.mode, 0, self.vertex_count);
        }
    }

    pub fn release(&self, device: &dyn GraphicsDevice) {
        device.delete_vertex_array(self.vao);
        device.delete_buffer(self.vbo);
        if let Some(ebo) = self.ebo {
            device.delete_buffer(ebo);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MaterialData;
    use crate::headless::{GpuCommand, HeadlessDevice};

    fn triangle(indexed: bool) -> PrimitiveData {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = [[0.0f32, 0.0, 1.0]; 3];
        let texcoords: [[f32; 2]; 3] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let indices: [u16; 3] = [0, 1, 2];

        PrimitiveData {
            positions: bytemuck::cast_slice(&positions).to_vec(),
            normals: bytemuck::cast_slice(&normals).to_vec(),
            texcoords: bytemuck::cast_slice(&texcoords).to_vec(),
            indices: if indexed { bytemuck::cast_slice(&indices).to_vec() } else { Vec::new() },
            index_count: if indexed { 3 } else { 0 },
            mode: glow::TRIANGLES,
            index_type: glow::UNSIGNED_SHORT,
            material: MaterialData::default(),
        }
    }

    #[test]
    fn attributes_follow_the_packed_layout() {
        let device = HeadlessDevice::new();
        let mesh = MeshComponent::create(&device, &triangle(true)).unwrap();

        assert_eq!(mesh.vertex_count, 3);
        assert!(mesh.ebo.is_some());

        let pointers: Vec<GpuCommand> = device
            .commands()
            .into_iter()
            .filter(|c| matches!(c, GpuCommand::VertexAttribPointer { .. }))
            .collect();
        assert_eq!(
            pointers,
            vec![
                GpuCommand::VertexAttribPointer { index: 0, size: 3, stride: 12, offset: 0 },
                GpuCommand::VertexAttribPointer { index: 1, size: 3, stride: 12, offset: 36 },
                GpuCommand::VertexAttribPointer { index: 2, size: 2, stride: 8, offset: 72 },
            ]
        );
        assert_eq!(device.count(|c| matches!(c, GpuCommand::BufferData { target: glow::ARRAY_BUFFER, size: 96 })), 1);
    }

    #[test]
    fn draws_indexed_or_arrays() {
        let device = HeadlessDevice::new();
        let indexed = MeshComponent::create(&device, &triangle(true)).unwrap();
        let plain = MeshComponent::create(&device, &triangle(false)).unwrap();
        device.clear_commands();

        indexed.draw(&device);
        plain.draw(&device);

        assert_eq!(
            device.commands(),
            vec![
                GpuCommand::DrawElements { mode: glow::TRIANGLES, count: 3, element_type: glow::UNSIGNED_SHORT },
                GpuCommand::DrawArrays { mode: glow::TRIANGLES, first: 0, count: 3 },
            ]
        );
    }

    #[test]
    fn release_frees_every_buffer() {
        let device = HeadlessDevice::new();
        let mesh = MeshComponent::create(&device, &triangle(true)).unwrap();
        assert_eq!(device.live_objects(), 3);

        mesh.release(&device);
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn failed_buffer_creation_leaks_nothing() {
        for budget in [0, 1] {
            let device = HeadlessDevice::new();
            device.limit_buffers(Some(budget));

            let result = MeshComponent::create(&device, &triangle(true));
            assert!(matches!(result, Err(EngineError::Gpu(_))));
            assert_eq!(device.live_objects(), 0);
        }
    }
}

use cgmath::{Matrix4, SquareMatrix};
use glow::{NativeBuffer, NativeVertexArray};
use hecs::World;

use crate::components::{ModelComponent, ShaderRef, Transform};
use crate::error::{EngineError, EngineResult};
use crate::opengl::{GraphicsDevice, Layout};
use crate::physics::{DebugLines, LineVertex};
use crate::resources::ResourceManager;
use crate::shaders::{
    split_shader_source, ShaderComponent, BASE_COLOR_UNIFORM, MODEL_UNIFORM, TEXTURE_UNIFORM,
    VIEW_PROJECTION_UNIFORM,
};

/// Draws every scene entity that has a model and a shader.
///
/// Each mesh is placed at `global * local`, where a missing global transform
/// counts as identity. Untextured materials draw with their base color only
/// and touch no texture state.
pub fn render_update(scene: &World, resources: &ResourceManager, view_projection: &Matrix4<f32>) {
    let device = resources.device();

    for (_, (model, shader_ref, transform)) in scene
        .query::<(&ModelComponent, &ShaderRef, Option<&Transform>)>()
        .iter()
    {
        let shader = resources.get_shader_from_handle(shader_ref.0);
        let global = transform.map_or_else(Matrix4::identity, Transform::matrix);

        for &handle in &model.meshes {
            let mesh = resources.get_mesh_from_handle(handle);
            let material = resources.get_material_from_handle(handle);
            let local = resources.get_local_transform_from_mesh_handle(handle);
            let texture = resources.get_texture_from_material_handle(handle);

            device.bind_vertex_array(Some(mesh.vao));
            device.use_program(Some(shader.program));

            shader.set_mat4(device, MODEL_UNIFORM, &(global * local.matrix()));
            shader.set_mat4(device, VIEW_PROJECTION_UNIFORM, view_projection);
            shader.set_vec3(device, BASE_COLOR_UNIFORM, material.base_color);

            if let Some(texture) = &texture {
                device.active_texture(glow::TEXTURE0);
                device.bind_texture(glow::TEXTURE_2D, Some(texture.texture));
                shader.set_int(device, TEXTURE_UNIFORM, 0);
            }

            mesh.draw(device);

            if texture.is_some() {
                device.bind_texture(glow::TEXTURE_2D, None);
            }
            device.use_program(None);
            device.bind_vertex_array(None);
        }
    }
}

const LINE_SHADER: &str = r#"
#vertex
#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec3 aColor;

uniform mat4 viewProjection;

out vec3 color;

void main() {
    color = aColor;
    gl_Position = viewProjection * vec4(aPos, 1.0);
}
#fragment
#version 330 core
in vec3 color;
out vec4 FragColor;

void main() {
    FragColor = vec4(color, 1.0);
}
"#;

/// Streams the physics world's debug lines into a dynamic buffer and draws
/// them as `GL_LINES`.
pub struct DebugLineRenderer {
    shader: ShaderComponent,
    vao: NativeVertexArray,
    vbo: NativeBuffer,
    capacity: usize,
}

impl DebugLineRenderer {
    pub fn new(device: &dyn GraphicsDevice) -> EngineResult<Self> {
        let (vertex, fragment) = split_shader_source(LINE_SHADER).map_err(|source| EngineError::ShaderMarker {
            path: "<debug lines>".into(),
            source,
        })?;
        let shader = ShaderComponent::compile_with_uniforms(device, vertex, fragment, &[VIEW_PROJECTION_UNIFORM])?;

        let buffers = device.create_vertex_array().and_then(|vao| match device.create_buffer() {
            Ok(vbo) => Ok((vao, vbo)),
            Err(err) => {
                device.delete_vertex_array(vao);
                Err(err)
            }
        });
        let (vao, vbo) = match buffers {
            Ok(buffers) => buffers,
            Err(err) => {
                shader.release(device);
                return Err(EngineError::Gpu(err));
            }
        };

        device.bind_vertex_array(Some(vao));
        device.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));

        let stride = std::mem::size_of::<LineVertex>() as i32;
        Layout::new(0, 3, glow::FLOAT, false, stride, 0).apply(device);
        Layout::new(1, 3, glow::FLOAT, false, stride, std::mem::size_of::<[f32; 3]>()).apply(device);

        device.bind_vertex_array(None);
        device.bind_buffer(glow::ARRAY_BUFFER, None);

        Ok(Self {
            shader,
            vao,
            vbo,
            capacity: 0,
        })
    }

    pub fn draw(&mut self, device: &dyn GraphicsDevice, lines: &DebugLines, view_projection: &Matrix4<f32>) {
        let vertices = lines.vertices();
        if vertices.is_empty() {
            return;
        }

        let bytes: &[u8] = bytemuck::cast_slice(vertices);

        device.bind_vertex_array(Some(self.vao));
        device.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
        if bytes.len() > self.capacity {
            self.capacity = bytes.len().next_power_of_two();
            device.buffer_data_size(glow::ARRAY_BUFFER, self.capacity as i32, glow::DYNAMIC_DRAW);
        }
        device.buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, 0, bytes);

        device.use_program(Some(self.shader.program));
        self.shader.set_mat4(device, VIEW_PROJECTION_UNIFORM, view_projection);
        device.draw_arrays(glow::LINES, 0, vertices.len() as i32);

        device.use_program(None);
        device.bind_buffer(glow::ARRAY_BUFFER, None);
        device.bind_vertex_array(None);
    }

    pub fn release(&self, device: &dyn GraphicsDevice) {
        self.shader.release(device);
        device.delete_vertex_array(self.vao);
        device.delete_buffer(self.vbo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{GpuCommand, HeadlessDevice};
    use cgmath::Vector3;

    #[test]
    fn debug_lines_grow_the_buffer_once() {
        let device = HeadlessDevice::new();
        let mut renderer = DebugLineRenderer::new(&device).unwrap();
        let mut lines = DebugLines::new();
        let view_projection = Matrix4::identity();

        renderer.draw(&device, &lines, &view_projection);
        assert_eq!(device.count(|c| matches!(c, GpuCommand::DrawArrays { .. })), 0);

        lines.draw_line(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        renderer.draw(&device, &lines, &view_projection);
        renderer.draw(&device, &lines, &view_projection);

        assert_eq!(
            device.count(|c| matches!(c, GpuCommand::BufferData { target: glow::ARRAY_BUFFER, .. })),
            1
        );
        assert_eq!(
            device.count(|c| *c == GpuCommand::DrawArrays { mode: glow::LINES, first: 0, count: 2 }),
            2
        );

        renderer.release(&device);
        assert_eq!(device.live_objects(), 0);
    }

    #[test]
    fn failed_setup_releases_the_shader() {
        let device = HeadlessDevice::new();
        device.limit_buffers(Some(0));

        assert!(matches!(DebugLineRenderer::new(&device), Err(EngineError::Gpu(_))));
        assert_eq!(device.live_objects(), 0);
    }
}

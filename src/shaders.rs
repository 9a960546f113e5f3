use std::collections::HashMap;

use glow::{NativeProgram, NativeShader, NativeUniformLocation};
use log::warn;
use thiserror::Error;

use crate::error::{EngineError, EngineResult};
use crate::opengl::GraphicsDevice;

pub const VERTEX_MARKER: &str = "#vertex";
pub const FRAGMENT_MARKER: &str = "#fragment";

pub const MODEL_UNIFORM: &str = "model";
pub const VIEW_PROJECTION_UNIFORM: &str = "viewProjection";
pub const BASE_COLOR_UNIFORM: &str = "fragBaseColor";
pub const TEXTURE_UNIFORM: &str = "texture0";

const STANDARD_UNIFORMS: [&str; 4] = [
    MODEL_UNIFORM,
    VIEW_PROJECTION_UNIFORM,
    BASE_COLOR_UNIFORM,
    TEXTURE_UNIFORM,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShaderMarkerError {
    #[error("missing `#vertex` marker")]
    MissingVertexMarker,
    #[error("missing `#fragment` marker")]
    MissingFragmentMarker,
    #[error("`#fragment` appears before `#vertex`")]
    MarkersOutOfOrder,
}

/// Splits a combined shader file into its vertex and fragment sources.
///
/// The vertex source is the text between the first `#vertex` and the first
/// `#fragment`; the fragment source is everything after `#fragment`.
pub fn split_shader_source(source: &str) -> Result<(&str, &str), ShaderMarkerError> {
    let vertex = source
        .find(VERTEX_MARKER)
        .ok_or(ShaderMarkerError::MissingVertexMarker)?;
    let fragment = source
        .find(FRAGMENT_MARKER)
        .ok_or(ShaderMarkerError::MissingFragmentMarker)?;

    if fragment < vertex {
        return Err(ShaderMarkerError::MarkersOutOfOrder);
    }

    let vertex_source = &source[vertex + VERTEX_MARKER.len()..fragment];
    let fragment_source = &source[fragment + FRAGMENT_MARKER.len()..];
    Ok((vertex_source, fragment_source))
}

/// A linked program plus the uniform slots found in it.
#[derive(Debug, Clone)]
pub struct ShaderComponent {
    pub program: NativeProgram,
    uniforms: HashMap<String, NativeUniformLocation>,
}

impl ShaderComponent {
    /// Compiles and links, resolving the standard model uniforms.
    pub fn compile(
        device: &dyn GraphicsDevice,
        vertex_source: &str,
        fragment_source: &str,
    ) -> EngineResult<Self> {
        Self::compile_with_uniforms(device, vertex_source, fragment_source, &STANDARD_UNIFORMS)
    }

    pub fn compile_with_uniforms(
        device: &dyn GraphicsDevice,
        vertex_source: &str,
        fragment_source: &str,
        uniform_names: &[&str],
    ) -> EngineResult<Self> {
        let vertex = compile_stage(device, glow::VERTEX_SHADER, "vertex", vertex_source)?;
        let fragment = match compile_stage(device, glow::FRAGMENT_SHADER, "fragment", fragment_source) {
            Ok(fragment) => fragment,
            Err(error) => {
                device.delete_shader(vertex);
                return Err(error);
            }
        };

        let program = device.create_program().map_err(EngineError::Gpu)?;
        device.attach_shader(program, vertex);
        device.attach_shader(program, fragment);
        device.link_program(program);

        device.delete_shader(vertex);
        device.delete_shader(fragment);

        if !device.get_program_link_status(program) {
            let log = device.get_program_info_log(program);
            device.delete_program(program);
            return Err(EngineError::ProgramLink(log));
        }

        let mut uniforms = HashMap::new();
        for &name in uniform_names {
            match device.get_uniform_location(program, name) {
                Some(location) => {
                    uniforms.insert(name.to_string(), location);
                }
                None => warn!("Shader program has no uniform {}", name),
            }
        }

        Ok(Self { program, uniforms })
    }

    pub fn uniform(&self, name: &str) -> Option<&NativeUniformLocation> {
        self.uniforms.get(name)
    }

    pub fn set_mat4(&self, device: &dyn GraphicsDevice, name: &str, value: &cgmath::Matrix4<f32>) {
        if let Some(location) = self.uniform(name) {
            let value: &[f32; 16] = value.as_ref();
            device.uniform_matrix_4_f32_slice(location, value);
        }
    }

    pub fn set_vec3(&self, device: &dyn GraphicsDevice, name: &str, value: cgmath::Vector3<f32>) {
        if let Some(location) = self.uniform(name) {
            device.uniform_3_f32(location, value.x, value.y, value.z);
        }
    }

    pub fn set_int(&self, device: &dyn GraphicsDevice, name: &str, value: i32) {
        if let Some(location) = self.uniform(name) {
            device.uniform_1_i32(location, value);
        }
    }

    pub fn release(&self, device: &dyn GraphicsDevice) {
        device.delete_program(self.program);
    }
}

fn compile_stage(
    device: &dyn GraphicsDevice,
    shader_type: u32,
    stage: &'static str,
    source: &str,
) -> EngineResult<NativeShader> {
    let shader = device.create_shader(shader_type).map_err(EngineError::Gpu)?;
    device.shader_source(shader, source);
    device.compile_shader(shader);

    if !device.get_shader_compile_status(shader) {
        let log = device.get_shader_info_log(shader);
        device.delete_shader(shader);
        return Err(EngineError::ShaderCompile { stage, log });
    }

    Ok(shader)
}

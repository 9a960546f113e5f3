//! A `GraphicsDevice` without a GL context.
//!
//! Every call is appended to a command log and every created object is tracked
//! until it is deleted, which lets tools (and tests) run the resource and render
//! passes without a window and inspect what would have been sent to the driver.

use std::{
    collections::{HashMap, HashSet},
    num::NonZeroU32,
};

use glow::{
    NativeBuffer, NativeProgram, NativeShader, NativeTexture, NativeUniformLocation,
    NativeVertexArray,
};
use parking_lot::Mutex;

use crate::opengl::GraphicsDevice;

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateVertexArray(NativeVertexArray),
    BindVertexArray(Option<NativeVertexArray>),
    DeleteVertexArray(NativeVertexArray),
    VertexAttribPointer { index: u32, size: i32, stride: i32, offset: i32 },
    EnableVertexAttribArray(u32),
    CreateBuffer(NativeBuffer),
    BindBuffer { target: u32, buffer: Option<NativeBuffer> },
    BufferData { target: u32, size: usize },
    BufferSubData { target: u32, offset: i32, size: usize },
    DeleteBuffer(NativeBuffer),
    CreateTexture(NativeTexture),
    ActiveTexture(u32),
    BindTexture(Option<NativeTexture>),
    TexParameter { parameter: u32, value: i32 },
    PixelStore { parameter: u32, value: i32 },
    TexImage2D { width: i32, height: i32, format: u32, ty: u32 },
    GenerateMipmap,
    DeleteTexture(NativeTexture),
    CreateShader(NativeShader),
    CompileShader(NativeShader),
    DeleteShader(NativeShader),
    CreateProgram(NativeProgram),
    LinkProgram(NativeProgram),
    UseProgram(Option<NativeProgram>),
    DeleteProgram(NativeProgram),
    SetUniformInt { name: String, value: i32 },
    SetUniformVec3 { name: String, value: [f32; 3] },
    SetUniformMat4 { name: String, value: [f32; 16] },
    DrawElements { mode: u32, count: i32, element_type: u32 },
    DrawArrays { mode: u32, first: i32, count: i32 },
}

#[derive(Default)]
struct State {
    next_id: u32,
    commands: Vec<GpuCommand>,
    live: HashSet<u32>,

    shader_sources: HashMap<u32, String>,
    program_shaders: HashMap<u32, Vec<u32>>,
    uniform_names: HashMap<u32, String>,

    fail_compile: bool,
    fail_link: bool,
    buffer_budget: Option<usize>,
}

impl State {
    fn allocate(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        let id = NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN);
        self.live.insert(id.get());
        id
    }
}

#[derive(Default)]
pub struct HeadlessDevice {
    state: Mutex<State>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following shader compilation report failure.
    pub fn fail_compilation(&self, fail: bool) {
        self.state.lock().fail_compile = fail;
    }

    /// Makes every following program link report failure.
    pub fn fail_linking(&self, fail: bool) {
        self.state.lock().fail_link = fail;
    }

    /// Lets `count` more buffers be created, then fails every later
    /// `create_buffer`. `None` lifts the limit.
    pub fn limit_buffers(&self, count: Option<usize>) {
        self.state.lock().buffer_budget = count;
    }

    pub fn commands(&self) -> Vec<GpuCommand> {
        self.state.lock().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.lock().commands.clear();
    }

    /// Number of created objects that have not been deleted yet.
    pub fn live_objects(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn count(&self, predicate: impl Fn(&GpuCommand) -> bool) -> usize {
        self.state.lock().commands.iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, command: GpuCommand) {
        self.state.lock().commands.push(command);
    }

    fn release(&self, id: NonZeroU32, command: GpuCommand) {
        let mut state = self.state.lock();
        if !state.live.remove(&id.get()) {
            log::warn!("headless device: released unknown object {}", id);
        }
        state.commands.push(command);
    }

    fn uniform_name(&self, location: &NativeUniformLocation) -> String {
        self.state
            .lock()
            .uniform_names
            .get(&location.0)
            .cloned()
            .unwrap_or_default()
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_vertex_array(&self) -> Result<NativeVertexArray, String> {
        let vertex_array = NativeVertexArray(self.state.lock().allocate());
        self.record(GpuCommand::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn bind_vertex_array(&self, vertex_array: Option<NativeVertexArray>) {
        self.record(GpuCommand::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: NativeVertexArray) {
        self.release(vertex_array.0, GpuCommand::DeleteVertexArray(vertex_array));
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        _data_type: u32,
        _normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.record(GpuCommand::VertexAttribPointer {
            index,
            size,
            stride,
            offset,
        });
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GpuCommand::EnableVertexAttribArray(index));
    }

    fn create_buffer(&self) -> Result<NativeBuffer, String> {
        let buffer = {
            let mut state = self.state.lock();
            match state.buffer_budget {
                Some(0) => return Err("headless device: out of buffers".to_string()),
                Some(ref mut left) => *left -= 1,
                None => {}
            }
            NativeBuffer(state.allocate())
        };
        self.record(GpuCommand::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn bind_buffer(&self, target: u32, buffer: Option<NativeBuffer>) {
        self.record(GpuCommand::BindBuffer { target, buffer });
    }

    fn buffer_data_size(&self, target: u32, size: i32, _usage: u32) {
        self.record(GpuCommand::BufferData {
            target,
            size: size.max(0) as usize,
        });
    }

    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], _usage: u32) {
        self.record(GpuCommand::BufferData {
            target,
            size: data.len(),
        });
    }

    fn buffer_sub_data_u8_slice(&self, target: u32, offset: i32, data: &[u8]) {
        self.record(GpuCommand::BufferSubData {
            target,
            offset,
            size: data.len(),
        });
    }

    fn delete_buffer(&self, buffer: NativeBuffer) {
        self.release(buffer.0, GpuCommand::DeleteBuffer(buffer));
    }

    fn create_texture(&self) -> Result<NativeTexture, String> {
        let texture = NativeTexture(self.state.lock().allocate());
        self.record(GpuCommand::CreateTexture(texture));
        Ok(texture)
    }

    fn active_texture(&self, unit: u32) {
        self.record(GpuCommand::ActiveTexture(unit));
    }

    fn bind_texture(&self, _target: u32, texture: Option<NativeTexture>) {
        self.record(GpuCommand::BindTexture(texture));
    }

    fn tex_parameter_i32(&self, _target: u32, parameter: u32, value: i32) {
        self.record(GpuCommand::TexParameter { parameter, value });
    }

    fn pixel_store_i32(&self, parameter: u32, value: i32) {
        self.record(GpuCommand::PixelStore { parameter, value });
    }

    fn tex_image_2d(
        &self,
        _target: u32,
        _level: i32,
        _internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        _pixels: Option<&[u8]>,
    ) {
        self.record(GpuCommand::TexImage2D {
            width,
            height,
            format,
            ty,
        });
    }

    fn generate_mipmap(&self, _target: u32) {
        self.record(GpuCommand::GenerateMipmap);
    }

    fn delete_texture(&self, texture: NativeTexture) {
        self.release(texture.0, GpuCommand::DeleteTexture(texture));
    }

    fn create_shader(&self, _shader_type: u32) -> Result<NativeShader, String> {
        let shader = NativeShader(self.state.lock().allocate());
        self.record(GpuCommand::CreateShader(shader));
        Ok(shader)
    }

    fn shader_source(&self, shader: NativeShader, source: &str) {
        self.state
            .lock()
            .shader_sources
            .insert(shader.0.get(), source.to_string());
    }

    fn compile_shader(&self, shader: NativeShader) {
        self.record(GpuCommand::CompileShader(shader));
    }

    fn get_shader_compile_status(&self, _shader: NativeShader) -> bool {
        !self.state.lock().fail_compile
    }

    fn get_shader_info_log(&self, _shader: NativeShader) -> String {
        if self.state.lock().fail_compile {
            "headless: compilation disabled".to_string()
        } else {
            String::new()
        }
    }

    fn delete_shader(&self, shader: NativeShader) {
        self.release(shader.0, GpuCommand::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<NativeProgram, String> {
        let program = NativeProgram(self.state.lock().allocate());
        self.record(GpuCommand::CreateProgram(program));
        Ok(program)
    }

    fn attach_shader(&self, program: NativeProgram, shader: NativeShader) {
        self.state
            .lock()
            .program_shaders
            .entry(program.0.get())
            .or_default()
            .push(shader.0.get());
    }

    fn link_program(&self, program: NativeProgram) {
        self.record(GpuCommand::LinkProgram(program));
    }

    fn get_program_link_status(&self, _program: NativeProgram) -> bool {
        !self.state.lock().fail_link
    }

    fn get_program_info_log(&self, _program: NativeProgram) -> String {
        if self.state.lock().fail_link {
            "headless: linking disabled".to_string()
        } else {
            String::new()
        }
    }

    fn use_program(&self, program: Option<NativeProgram>) {
        self.record(GpuCommand::UseProgram(program));
    }

    fn delete_program(&self, program: NativeProgram) {
        self.release(program.0, GpuCommand::DeleteProgram(program));
    }

    // A uniform exists when one of the attached sources mentions it, which is
    // close enough to a driver dropping unused uniforms.
    fn get_uniform_location(
        &self,
        program: NativeProgram,
        name: &str,
    ) -> Option<NativeUniformLocation> {
        let mut state = self.state.lock();
        let declared = state
            .program_shaders
            .get(&program.0.get())
            .into_iter()
            .flatten()
            .filter_map(|shader| state.shader_sources.get(shader))
            .any(|source| source.contains(name));
        if !declared {
            return None;
        }

        let location = state.uniform_names.len() as u32;
        state.uniform_names.insert(location, name.to_string());
        Some(NativeUniformLocation(location))
    }

    fn uniform_1_i32(&self, location: &NativeUniformLocation, value: i32) {
        let name = self.uniform_name(location);
        self.record(GpuCommand::SetUniformInt { name, value });
    }

    fn uniform_3_f32(&self, location: &NativeUniformLocation, x: f32, y: f32, z: f32) {
        let name = self.uniform_name(location);
        self.record(GpuCommand::SetUniformVec3 {
            name,
            value: [x, y, z],
        });
    }

    fn uniform_matrix_4_f32_slice(&self, location: &NativeUniformLocation, value: &[f32; 16]) {
        let name = self.uniform_name(location);
        self.record(GpuCommand::SetUniformMat4 {
            name,
            value: *value,
        });
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, _offset: i32) {
        self.record(GpuCommand::DrawElements {
            mode,
            count,
            element_type,
        });
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        self.record(GpuCommand::DrawArrays { mode, first, count });
    }
}

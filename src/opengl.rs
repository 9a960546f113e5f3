use glow::{
    HasContext, NativeBuffer, NativeProgram, NativeShader, NativeTexture, NativeUniformLocation,
    NativeVertexArray,
};

/// The subset of OpenGL the resource and render code talks to.
///
/// Handles are glow's native handle types so a `glow::Context` can be used
/// directly. Implementations for a real context require that context to be
/// current on the calling thread.
pub trait GraphicsDevice {
    fn create_vertex_array(&self) -> Result<NativeVertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<NativeVertexArray>);
    fn delete_vertex_array(&self, vertex_array: NativeVertexArray);
    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn enable_vertex_attrib_array(&self, index: u32);

    fn create_buffer(&self) -> Result<NativeBuffer, String>;
    fn bind_buffer(&self, target: u32, buffer: Option<NativeBuffer>);
    fn buffer_data_size(&self, target: u32, size: i32, usage: u32);
    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32);
    fn buffer_sub_data_u8_slice(&self, target: u32, offset: i32, data: &[u8]);
    fn delete_buffer(&self, buffer: NativeBuffer);

    fn create_texture(&self) -> Result<NativeTexture, String>;
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, target: u32, texture: Option<NativeTexture>);
    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32);
    fn pixel_store_i32(&self, parameter: u32, value: i32);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: Option<&[u8]>,
    );
    fn generate_mipmap(&self, target: u32);
    fn delete_texture(&self, texture: NativeTexture);

    fn create_shader(&self, shader_type: u32) -> Result<NativeShader, String>;
    fn shader_source(&self, shader: NativeShader, source: &str);
    fn compile_shader(&self, shader: NativeShader);
    fn get_shader_compile_status(&self, shader: NativeShader) -> bool;
    fn get_shader_info_log(&self, shader: NativeShader) -> String;
    fn delete_shader(&self, shader: NativeShader);

    fn create_program(&self) -> Result<NativeProgram, String>;
    fn attach_shader(&self, program: NativeProgram, shader: NativeShader);
    fn link_program(&self, program: NativeProgram);
    fn get_program_link_status(&self, program: NativeProgram) -> bool;
    fn get_program_info_log(&self, program: NativeProgram) -> String;
    fn use_program(&self, program: Option<NativeProgram>);
    fn delete_program(&self, program: NativeProgram);

    fn get_uniform_location(
        &self,
        program: NativeProgram,
        name: &str,
    ) -> Option<NativeUniformLocation>;
    fn uniform_1_i32(&self, location: &NativeUniformLocation, value: i32);
    fn uniform_3_f32(&self, location: &NativeUniformLocation, x: f32, y: f32, z: f32);
    fn uniform_matrix_4_f32_slice(&self, location: &NativeUniformLocation, value: &[f32; 16]);

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32);
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);
}

/// Describes one float vertex attribute inside a bound vertex buffer.
#[derive(Debug, Clone)]
pub struct Layout {
    pub index: u32,
    pub size: i32,
    pub gl_type: u32,
    pub normalized: bool,
    pub stride: i32,
    pub offset: usize,
}

impl Layout {
    pub fn new(index: u32, size: i32, gl_type: u32, normalized: bool, stride: i32, offset: usize) -> Self {
        Self {
            index,
            size,
            gl_type,
            normalized,
            stride,
            offset,
        }
    }

    /// Points the currently bound vertex array at this attribute.
    pub fn apply(&self, device: &dyn GraphicsDevice) {
        device.vertex_attrib_pointer_f32(
            self.index,
            self.size,
            self.gl_type,
            self.normalized,
            self.stride,
            self.offset as i32,
        );
        device.enable_vertex_attrib_array(self.index);
    }
}

impl GraphicsDevice for glow::Context {
    fn create_vertex_array(&self) -> Result<NativeVertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<NativeVertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: NativeVertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            HasContext::vertex_attrib_pointer_f32(self, index, size, data_type, normalized, stride, offset)
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn create_buffer(&self) -> Result<NativeBuffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<NativeBuffer>) {
        unsafe { HasContext::bind_buffer(self, target, buffer) }
    }

    fn buffer_data_size(&self, target: u32, size: i32, usage: u32) {
        unsafe { HasContext::buffer_data_size(self, target, size, usage) }
    }

    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { HasContext::buffer_data_u8_slice(self, target, data, usage) }
    }

    fn buffer_sub_data_u8_slice(&self, target: u32, offset: i32, data: &[u8]) {
        unsafe { HasContext::buffer_sub_data_u8_slice(self, target, offset, data) }
    }

    fn delete_buffer(&self, buffer: NativeBuffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn create_texture(&self) -> Result<NativeTexture, String> {
        unsafe { HasContext::create_texture(self) }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { HasContext::active_texture(self, unit) }
    }

    fn bind_texture(&self, target: u32, texture: Option<NativeTexture>) {
        unsafe { HasContext::bind_texture(self, target, texture) }
    }

    fn tex_parameter_i32(&self, target: u32, parameter: u32, value: i32) {
        unsafe { HasContext::tex_parameter_i32(self, target, parameter, value) }
    }

    fn pixel_store_i32(&self, parameter: u32, value: i32) {
        unsafe { HasContext::pixel_store_i32(self, parameter, value) }
    }

    fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: Option<&[u8]>,
    ) {
        unsafe {
            HasContext::tex_image_2d(
                self,
                target,
                level,
                internal_format,
                width,
                height,
                0,
                format,
                ty,
                glow::PixelUnpackData::Slice(pixels),
            )
        }
    }

    fn generate_mipmap(&self, target: u32) {
        unsafe { HasContext::generate_mipmap(self, target) }
    }

    fn delete_texture(&self, texture: NativeTexture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    fn create_shader(&self, shader_type: u32) -> Result<NativeShader, String> {
        unsafe { HasContext::create_shader(self, shader_type) }
    }

    fn shader_source(&self, shader: NativeShader, source: &str) {
        unsafe { HasContext::shader_source(self, shader, source) }
    }

    fn compile_shader(&self, shader: NativeShader) {
        unsafe { HasContext::compile_shader(self, shader) }
    }

    fn get_shader_compile_status(&self, shader: NativeShader) -> bool {
        unsafe { HasContext::get_shader_compile_status(self, shader) }
    }

    fn get_shader_info_log(&self, shader: NativeShader) -> String {
        unsafe { HasContext::get_shader_info_log(self, shader) }
    }

    fn delete_shader(&self, shader: NativeShader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<NativeProgram, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: NativeProgram, shader: NativeShader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn link_program(&self, program: NativeProgram) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn get_program_link_status(&self, program: NativeProgram) -> bool {
        unsafe { HasContext::get_program_link_status(self, program) }
    }

    fn get_program_info_log(&self, program: NativeProgram) -> String {
        unsafe { HasContext::get_program_info_log(self, program) }
    }

    fn use_program(&self, program: Option<NativeProgram>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn delete_program(&self, program: NativeProgram) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn get_uniform_location(
        &self,
        program: NativeProgram,
        name: &str,
    ) -> Option<NativeUniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    fn uniform_1_i32(&self, location: &NativeUniformLocation, value: i32) {
        unsafe { HasContext::uniform_1_i32(self, Some(location), value) }
    }

    fn uniform_3_f32(&self, location: &NativeUniformLocation, x: f32, y: f32, z: f32) {
        unsafe { HasContext::uniform_3_f32(self, Some(location), x, y, z) }
    }

    fn uniform_matrix_4_f32_slice(&self, location: &NativeUniformLocation, value: &[f32; 16]) {
        unsafe { HasContext::uniform_matrix_4_f32_slice(self, Some(location), false, value) }
    }

    fn draw_elements(&self, mode: u32, count: i32, element_type: u32, offset: i32) {
        unsafe { HasContext::draw_elements(self, mode, count, element_type, offset) }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { HasContext::draw_arrays(self, mode, first, count) }
    }
}

//! [`Backend`] implementation for a live `glow::Context`.
//!
//! Each method forwards to exactly one GL call. The only requirement glow
//! leaves to the caller is that the context is current on this thread and
//! that handles come from the same context, which the harness guarantees
//! by owning one context on the event-loop thread.

#![allow(unsafe_code)]

use glow::HasContext;

use super::backend::{Backend, BufferTarget, ShaderStage};

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn target_enum(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Vertex => glow::ARRAY_BUFFER,
        BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

// SAFETY (all methods): glow marks every GL entry point unsafe because it
// cannot check that the context is current or that handles belong to it.
// Handles passed in here were produced by this same context, and the
// harness only touches the context from the thread that made it current.
impl Backend for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type VertexArray = glow::VertexArray;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, stage_enum(stage)) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { HasContext::shader_source(self, shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::compile_shader(self, shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn uniform_matrix4(&self, location: Option<&Self::UniformLocation>, columns: &[f32; 16]) {
        unsafe { self.uniform_matrix_4_f32_slice(location, false, columns) }
    }

    fn uniform_f32(&self, location: Option<&Self::UniformLocation>, value: f32) {
        unsafe { self.uniform_1_f32(location, value) }
    }

    fn uniform_ivec2(&self, location: Option<&Self::UniformLocation>, x: i32, y: i32) {
        unsafe { self.uniform_2_i32(location, x, y) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target_enum(target), buffer) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        unsafe { self.buffer_data_u8_slice(target_enum(target), data, glow::STATIC_DRAW) }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn enable_vertex_attrib(&self, location: u32) {
        unsafe { self.enable_vertex_attrib_array(location) }
    }

    fn vertex_attrib_f32(&self, location: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, stride, offset)
        }
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        unsafe { HasContext::clear_color(self, r, g, b, a) }
    }

    fn clear_depth(&self, depth: f64) {
        unsafe { self.clear_depth_f64(depth) }
    }

    fn enable_depth_test(&self) {
        unsafe { self.enable(glow::DEPTH_TEST) }
    }

    fn clear(&self) {
        unsafe { HasContext::clear(self, glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    fn line_width(&self, width: f32) {
        unsafe { HasContext::line_width(self, width) }
    }

    fn draw_indexed_triangles(&self, count: i32) {
        unsafe { self.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, 0) }
    }
}

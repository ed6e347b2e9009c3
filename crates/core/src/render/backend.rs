//! The graphics-API surface used by the harness.
//!
//! [`Backend`] mirrors the handful of OpenGL 3.3 entry points the harness
//! calls, one method per call, with GL's object-handle model. The real
//! implementation is `glow::Context` (feature `render`); tests drive the same
//! code through a recording mock.
//!
//! All methods assume the backend's context is current on the calling
//! thread.

use std::fmt::Debug;

/// Programmable pipeline stage of a shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Lower-case stage name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Buffer binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Vertex attribute data (`ARRAY_BUFFER`).
    Vertex,
    /// Element indices (`ELEMENT_ARRAY_BUFFER`).
    Index,
}

/// OpenGL-shaped rendering backend.
///
/// Object creation returns `Err` with the driver's message; uploads to an
/// absent (`None`) uniform location are silently ignored, as in GL.
pub trait Backend {
    type Shader: Copy + Debug;
    type Program: Copy + PartialEq + Debug;
    type Buffer: Copy + PartialEq + Debug;
    type VertexArray: Copy + PartialEq + Debug;
    type UniformLocation: Clone + Debug;

    // Shaders and programs.
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    // Uniforms.
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    fn uniform_matrix4(&self, location: Option<&Self::UniformLocation>, columns: &[f32; 16]);
    fn uniform_f32(&self, location: Option<&Self::UniformLocation>, value: f32);
    fn uniform_ivec2(&self, location: Option<&Self::UniformLocation>, x: i32, y: i32);

    // Geometry.
    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);
    /// Uploads static data to the buffer bound at `target`.
    fn buffer_data(&self, target: BufferTarget, data: &[u8]);
    fn delete_buffer(&self, buffer: Self::Buffer);

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    fn enable_vertex_attrib(&self, location: u32);
    /// Describes a float attribute of the bound vertex buffer.
    fn vertex_attrib_f32(&self, location: u32, components: i32, stride: i32, offset: i32);

    // Fixed-function state and drawing.
    fn clear_color(&self, rgba: [f32; 4]);
    fn clear_depth(&self, depth: f64);
    fn enable_depth_test(&self);
    /// Clears both the color and depth targets.
    fn clear(&self);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn line_width(&self, width: f32);
    /// Draws `count` `u32` indices from the bound index buffer as triangles.
    fn draw_indexed_triangles(&self, count: i32);
}

//! Per-window GPU state for the animated full-screen quad.
//!
//! `RenderState` owns the shader program and the quad's vertex array and
//! buffers, and is driven by the window's lifecycle callbacks:
//!
//! ```text
//! Uninitialized --initialize--> Initialized --teardown--> Destroyed
//!                                 |     ^
//!                                 +-----+ reload (program only)
//! ```
//!
//! Every GPU call goes through the [`Backend`] passed to each method; the
//! state never holds on to the context itself.

use std::fmt;

use glam::Mat4;
use thiserror::Error;

use super::backend::{Backend, BufferTarget};
use super::shader::{ShaderError, ShaderProgram, ShaderSources};
use crate::config::HarnessConfig;
use crate::mesh::{Mesh, Vertex};

/// Name of the 4x4 transform uniform.
pub const XFORM_UNIFORM: &str = "xform";
/// Name of the elapsed-milliseconds uniform.
pub const TIME_UNIFORM: &str = "time";
/// Name of the viewport-size uniform.
pub const RESOLUTION_UNIFORM: &str = "iResolution";

const UNIFORMS: &[&str] = &[XFORM_UNIFORM, TIME_UNIFORM, RESOLUTION_UNIFORM];

/// Errors produced by render-state lifecycle operations.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The shader program could not be built.
    #[error(transparent)]
    Shader(#[from] ShaderError),
    /// `initialize` was called on an initialized state.
    #[error("render state is already initialized")]
    AlreadyInitialized,
    /// An operation needed GPU resources that have not been created yet.
    #[error("render state is not initialized")]
    NotInitialized,
    /// The state was torn down.
    #[error("render state has been destroyed")]
    Destroyed,
    /// The driver refused to create a buffer or vertex array.
    #[error("GPU resource allocation failed: {0}")]
    Resource(String),
}

/// Where a [`RenderState`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    Destroyed,
}

/// Fixed pipeline settings applied by [`RenderState::initialize`] and
/// [`RenderState::render`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub shaders: ShaderSources,
    pub clear_color: [f32; 4],
    pub line_width: Option<f32>,
    /// Resolution reported to the shader until the first `resize`.
    pub initial_size: (u32, u32),
}

impl From<&HarnessConfig> for RenderSettings {
    fn from(config: &HarnessConfig) -> Self {
        Self {
            shaders: config.shader_sources(),
            clear_color: config.clear_color,
            line_width: config.line_width,
            initial_size: (config.width, config.height),
        }
    }
}

/// The quad's vertex array and its two buffers.
pub struct QuadBuffers<B: Backend> {
    pub vertex_array: B::VertexArray,
    pub vertices: B::Buffer,
    pub indices: B::Buffer,
    pub index_count: i32,
}

// Manual impls: derives would demand the same traits of `B` itself.
impl<B: Backend> Clone for QuadBuffers<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Backend> Copy for QuadBuffers<B> {}

impl<B: Backend> PartialEq for QuadBuffers<B> {
    fn eq(&self, other: &Self) -> bool {
        self.vertex_array == other.vertex_array
            && self.vertices == other.vertices
            && self.indices == other.indices
            && self.index_count == other.index_count
    }
}

impl<B: Backend> fmt::Debug for QuadBuffers<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadBuffers")
            .field("vertex_array", &self.vertex_array)
            .field("vertices", &self.vertices)
            .field("indices", &self.indices)
            .field("index_count", &self.index_count)
            .finish()
    }
}

/// GPU state for the animated quad.
pub struct RenderState<B: Backend> {
    settings: RenderSettings,
    lifecycle: Lifecycle,
    program: Option<ShaderProgram<B>>,
    quad: Option<QuadBuffers<B>>,
    resolution: (i32, i32),
    current_time: f32,
}

impl<B: Backend> RenderState<B> {
    /// Creates a state with no GPU resources.
    pub fn new(settings: RenderSettings) -> Self {
        let (w, h) = settings.initial_size;
        Self {
            settings,
            lifecycle: Lifecycle::Uninitialized,
            program: None,
            quad: None,
            resolution: (to_gl_size(w), to_gl_size(h)),
            current_time: 0.0,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Milliseconds value uploaded by the most recent `render`.
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    /// Viewport size last passed to `resize`.
    pub fn resolution(&self) -> (i32, i32) {
        self.resolution
    }

    /// Handle of the active program, if any.
    pub fn program_handle(&self) -> Option<B::Program> {
        self.program.as_ref().map(ShaderProgram::handle)
    }

    /// Quad buffers, if allocated.
    pub fn buffer_handles(&self) -> Option<QuadBuffers<B>> {
        self.quad
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn require_initialized(&self) -> Result<(), RenderError> {
        match self.lifecycle {
            Lifecycle::Initialized => Ok(()),
            Lifecycle::Uninitialized => Err(RenderError::NotInitialized),
            Lifecycle::Destroyed => Err(RenderError::Destroyed),
        }
    }

    /// Sets the fixed pipeline state, builds the shader program and
    /// uploads the quad.
    ///
    /// # Errors
    ///
    /// `AlreadyInitialized` / `Destroyed` when called out of order, a
    /// shader error if the program cannot be built, or `Resource` if a
    /// buffer cannot be created. Nothing stays allocated after a failure.
    pub fn initialize(&mut self, gl: &B) -> Result<(), RenderError> {
        match self.lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Initialized => return Err(RenderError::AlreadyInitialized),
            Lifecycle::Destroyed => return Err(RenderError::Destroyed),
        }

        gl.clear_color(self.settings.clear_color);
        gl.clear_depth(1.0);
        gl.enable_depth_test();

        let program = ShaderProgram::from_files(gl, &self.settings.shaders, UNIFORMS)?;
        let quad = match upload_mesh(gl, &Mesh::unit_quad()) {
            Ok(quad) => quad,
            Err(e) => {
                program.destroy(gl);
                return Err(e);
            }
        };

        log::info!(
            "render state initialized (program {:?}, {} indices)",
            program.handle(),
            quad.index_count
        );
        self.program = Some(program);
        self.quad = Some(quad);
        self.lifecycle = Lifecycle::Initialized;
        Ok(())
    }

    /// Points the viewport at `(0, 0, width, height)` and records the size
    /// for the resolution uniform.
    ///
    /// # Errors
    ///
    /// `Destroyed` after teardown.
    pub fn resize(&mut self, gl: &B, width: u32, height: u32) -> Result<(), RenderError> {
        if self.lifecycle == Lifecycle::Destroyed {
            return Err(RenderError::Destroyed);
        }
        let (w, h) = (to_gl_size(width), to_gl_size(height));
        gl.viewport(0, 0, w, h);
        self.resolution = (w, h);
        log::debug!("viewport resized to {w}x{h}");
        Ok(())
    }

    /// Draws one frame with `time_ms` as the elapsed-time uniform.
    ///
    /// # Errors
    ///
    /// `NotInitialized` / `Destroyed` when called out of order.
    pub fn render(&mut self, gl: &B, time_ms: f32) -> Result<(), RenderError> {
        self.require_initialized()?;
        let (Some(program), Some(quad)) = (&self.program, &self.quad) else {
            return Err(RenderError::NotInitialized);
        };
        self.current_time = time_ms;

        gl.clear();
        gl.use_program(Some(program.handle()));

        gl.uniform_matrix4(program.uniform(XFORM_UNIFORM), &Mat4::IDENTITY.to_cols_array());
        gl.uniform_f32(program.uniform(TIME_UNIFORM), self.current_time);
        let (w, h) = self.resolution;
        gl.uniform_ivec2(program.uniform(RESOLUTION_UNIFORM), w, h);

        gl.bind_vertex_array(Some(quad.vertex_array));
        if let Some(width) = self.settings.line_width {
            gl.line_width(width);
        }
        gl.draw_indexed_triangles(quad.index_count);

        gl.bind_vertex_array(None);
        gl.use_program(None);
        Ok(())
    }

    /// Rebuilds the shader program from the source files, leaving the
    /// buffers alone. On failure the previous program stays active.
    ///
    /// # Errors
    ///
    /// `NotInitialized` / `Destroyed` when called out of order, or the
    /// shader error that prevented the rebuild.
    pub fn reload(&mut self, gl: &B) -> Result<(), RenderError> {
        self.require_initialized()?;
        let fresh = ShaderProgram::from_files(gl, &self.settings.shaders, UNIFORMS)?;
        log::info!("shader program reloaded (program {:?})", fresh.handle());
        if let Some(old) = self.program.replace(fresh) {
            old.destroy(gl);
        }
        Ok(())
    }

    /// Releases every GPU object and moves to `Destroyed`. Safe to call
    /// before `initialize` and more than once.
    pub fn teardown(&mut self, gl: &B) {
        if let Some(program) = self.program.take() {
            program.destroy(gl);
        }
        if let Some(quad) = self.quad.take() {
            gl.delete_vertex_array(quad.vertex_array);
            gl.delete_buffer(quad.vertices);
            gl.delete_buffer(quad.indices);
        }
        if self.lifecycle != Lifecycle::Destroyed {
            log::info!("render state torn down");
        }
        self.lifecycle = Lifecycle::Destroyed;
    }
}

impl<B: Backend> Drop for RenderState<B> {
    fn drop(&mut self) {
        if self.program.is_some() || self.quad.is_some() {
            log::warn!("render state dropped without teardown; GPU objects leaked");
        }
    }
}

/// Window sizes past `i32::MAX` clamp instead of wrapping negative.
fn to_gl_size(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Creates a vertex array with vertex and index buffers holding `mesh`,
/// using the [`Vertex`] attribute layout. Leaves nothing bound.
fn upload_mesh<B: Backend>(gl: &B, mesh: &Mesh) -> Result<QuadBuffers<B>, RenderError> {
    let vertex_array = gl.create_vertex_array().map_err(RenderError::Resource)?;
    let vertices = match gl.create_buffer() {
        Ok(b) => b,
        Err(e) => {
            gl.delete_vertex_array(vertex_array);
            return Err(RenderError::Resource(e));
        }
    };
    let indices = match gl.create_buffer() {
        Ok(b) => b,
        Err(e) => {
            gl.delete_buffer(vertices);
            gl.delete_vertex_array(vertex_array);
            return Err(RenderError::Resource(e));
        }
    };

    gl.bind_vertex_array(Some(vertex_array));
    gl.bind_buffer(BufferTarget::Vertex, Some(vertices));
    gl.buffer_data(BufferTarget::Vertex, mesh.vertex_bytes());
    gl.bind_buffer(BufferTarget::Index, Some(indices));
    gl.buffer_data(BufferTarget::Index, mesh.index_bytes());

    for attr in Vertex::ATTRIBUTES {
        gl.enable_vertex_attrib(attr.location);
        gl.vertex_attrib_f32(attr.location, attr.components, Vertex::STRIDE, attr.offset);
    }

    // The index buffer binding is recorded in the vertex array, so the
    // array is unbound first.
    gl.bind_vertex_array(None);
    gl.bind_buffer(BufferTarget::Vertex, None);
    gl.bind_buffer(BufferTarget::Index, None);

    Ok(QuadBuffers {
        vertex_array,
        vertices,
        indices,
        index_count: mesh.index_count(),
    })
}

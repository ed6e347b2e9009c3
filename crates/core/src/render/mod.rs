//! OpenGL rendering for the harness.
//!
//! Everything here is written against the [`Backend`] trait. Enabling the
//! `render` feature implements it for `glow::Context`.
//!
//! # Module overview
//!
//! - [`backend`] -- The graphics-API trait, shader stages and buffer targets.
//! - [`shader`] -- Shader compilation, linking, uniform lookup, `ShaderProgram`.
//! - [`state`] -- `RenderState`: quad buffers, program and lifecycle callbacks.

pub mod backend;
#[cfg(feature = "render")]
pub mod gl;
pub mod shader;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{Backend, BufferTarget, ShaderStage};
pub use shader::{
    compile_shader, compile_shader_file, format_shader_error, link_program, uniform_location,
    ShaderError, ShaderProgram, ShaderSources,
};
pub use state::{Lifecycle, QuadBuffers, RenderError, RenderSettings, RenderState};

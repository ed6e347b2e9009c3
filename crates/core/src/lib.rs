#![deny(unsafe_code)]
//! Core types for the shader harness.
//!
//! Provides the `Vertex`/`Mesh` data model, `HarnessConfig`, the
//! `FramePacer` scheduler, `.obj` discovery, and the `render` module with
//! `ShaderProgram` and `RenderState`.

pub mod config;
pub mod error;
pub mod mesh;
pub mod models;
pub mod pacing;
pub mod render;

pub use config::HarnessConfig;
pub use error::HarnessError;
pub use mesh::{Mesh, Vertex};
pub use pacing::{FramePacer, FrameTick};
pub use render::{RenderError, RenderState};

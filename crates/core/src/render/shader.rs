//! Shader compilation, linking and uniform lookup.
//!
//! The free functions wrap one pipeline step each and clean up the GPU
//! object they created on every error path. [`ShaderProgram`] strings them
//! together: read both stages from disk, compile, link, drop the
//! intermediate shader objects and cache the uniform locations the caller
//! asks for. Nothing is cached between builds, so rebuilding picks up
//! whatever is on disk at that moment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::backend::{Backend, ShaderStage};

/// Errors that can occur while building a shader program.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    /// A shader source file could not be read.
    #[error("cannot read {stage} shader {}: {message}", .path.display())]
    ReadError {
        stage: ShaderStage,
        path: PathBuf,
        message: String,
    },
    /// A shader stage failed to compile.
    #[error("shader compile error ({stage}):\n{log}")]
    CompileError {
        /// The stage that failed.
        stage: ShaderStage,
        /// Line-numbered source followed by the driver's info log.
        log: String,
    },
    /// The program failed to link.
    #[error("shader link error:\n{0}")]
    LinkError(String),
    /// The driver refused to create a shader or program object.
    #[error("cannot create {0}")]
    CreateError(String),
}

/// Vertex and fragment source files for one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

/// Formats a shader compilation error for human-readable debugging.
///
/// Prepends right-aligned line numbers to each line of `source`, then
/// appends the driver's error `log`, so the line references in the log
/// can be matched against the GLSL. Both inputs may be empty.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().max(1).to_string().len();

    let numbered = lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    match (numbered.is_empty(), log.is_empty()) {
        (true, true) => String::new(),
        (true, false) => log.to_string(),
        (false, true) => numbered,
        (false, false) => format!("{numbered}\n\n{log}"),
    }
}

/// Compiles a single shader stage from source text.
///
/// # Errors
///
/// Returns `ShaderError::CompileError` if the source fails to compile; the
/// shader object is deleted before returning.
pub fn compile_shader<B: Backend>(
    gl: &B,
    stage: ShaderStage,
    source: &str,
) -> Result<B::Shader, ShaderError> {
    let shader = gl
        .create_shader(stage)
        .map_err(|e| ShaderError::CreateError(format!("{stage} shader: {e}")))?;

    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if gl.shader_compile_status(shader) {
        Ok(shader)
    } else {
        let info_log = gl.shader_info_log(shader);
        gl.delete_shader(shader);
        Err(ShaderError::CompileError {
            stage,
            log: format_shader_error(source, &info_log),
        })
    }
}

/// Reads `path` and compiles it as the given stage.
///
/// # Errors
///
/// Returns `ShaderError::ReadError` if the file cannot be read, otherwise
/// the errors of [`compile_shader`].
pub fn compile_shader_file<B: Backend>(
    gl: &B,
    stage: ShaderStage,
    path: &Path,
) -> Result<B::Shader, ShaderError> {
    let source = std::fs::read_to_string(path).map_err(|e| ShaderError::ReadError {
        stage,
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    compile_shader(gl, stage, &source)
}

/// Links compiled shaders into a program.
///
/// The shaders are detached again after linking whatever the outcome, so
/// the caller may delete them as soon as this returns.
///
/// # Errors
///
/// Returns `ShaderError::LinkError` with the driver's log if linking
/// fails; the program object is deleted before returning.
pub fn link_program<B: Backend>(gl: &B, shaders: &[B::Shader]) -> Result<B::Program, ShaderError> {
    let program = gl
        .create_program()
        .map_err(|e| ShaderError::CreateError(format!("program: {e}")))?;

    for &shader in shaders {
        gl.attach_shader(program, shader);
    }
    gl.link_program(program);
    for &shader in shaders {
        gl.detach_shader(program, shader);
    }

    if gl.program_link_status(program) {
        Ok(program)
    } else {
        let info_log = gl.program_info_log(program);
        gl.delete_program(program);
        Err(ShaderError::LinkError(info_log))
    }
}

/// Resolves a uniform's location. `None` means the name is not an active
/// uniform of the program (absent or optimized out), which is not an
/// error: uploads to `None` are ignored.
pub fn uniform_location<B: Backend>(
    gl: &B,
    program: B::Program,
    name: &str,
) -> Option<B::UniformLocation> {
    gl.uniform_location(program, name)
}

/// A linked GPU program and its resolved uniform locations.
///
/// Owns the program object; [`ShaderProgram::destroy`] consumes the value
/// so the object is deleted exactly once.
#[derive(Debug)]
pub struct ShaderProgram<B: Backend> {
    program: B::Program,
    uniforms: HashMap<String, Option<B::UniformLocation>>,
}

impl<B: Backend> ShaderProgram<B> {
    /// Builds a program from a vertex/fragment file pair and resolves
    /// `uniform_names`.
    ///
    /// # Errors
    ///
    /// Fails on the first stage that cannot be read, compiled or linked.
    /// No GPU objects survive a failed build.
    pub fn from_files(
        gl: &B,
        sources: &ShaderSources,
        uniform_names: &[&str],
    ) -> Result<Self, ShaderError> {
        let vertex = compile_shader_file(gl, ShaderStage::Vertex, &sources.vertex)?;
        let fragment = match compile_shader_file(gl, ShaderStage::Fragment, &sources.fragment) {
            Ok(f) => f,
            Err(e) => {
                gl.delete_shader(vertex);
                return Err(e);
            }
        };
        Self::link(gl, vertex, fragment, uniform_names)
    }

    /// Builds a program from in-memory sources.
    ///
    /// # Errors
    ///
    /// As for [`ShaderProgram::from_files`], minus read errors.
    pub fn from_sources(
        gl: &B,
        vertex_src: &str,
        fragment_src: &str,
        uniform_names: &[&str],
    ) -> Result<Self, ShaderError> {
        let vertex = compile_shader(gl, ShaderStage::Vertex, vertex_src)?;
        let fragment = match compile_shader(gl, ShaderStage::Fragment, fragment_src) {
            Ok(f) => f,
            Err(e) => {
                gl.delete_shader(vertex);
                return Err(e);
            }
        };
        Self::link(gl, vertex, fragment, uniform_names)
    }

    fn link(
        gl: &B,
        vertex: B::Shader,
        fragment: B::Shader,
        uniform_names: &[&str],
    ) -> Result<Self, ShaderError> {
        let linked = link_program(gl, &[vertex, fragment]);
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);
        let program = linked?;

        let uniforms = uniform_names
            .iter()
            .map(|&name| (name.to_string(), uniform_location(gl, program, name)))
            .collect();

        Ok(Self { program, uniforms })
    }

    /// The underlying program handle.
    pub fn handle(&self) -> B::Program {
        self.program
    }

    /// Cached location of `name`. `None` both for names that were not
    /// requested at build time and for inactive uniforms.
    pub fn uniform(&self, name: &str) -> Option<&B::UniformLocation> {
        self.uniforms.get(name).and_then(Option::as_ref)
    }

    /// Resolves `name` against the program, caching the result.
    pub fn resolve(&mut self, gl: &B, name: &str) -> Option<&B::UniformLocation> {
        let program = self.program;
        self.uniforms
            .entry(name.to_string())
            .or_insert_with(|| uniform_location(gl, program, name))
            .as_ref()
    }

    /// Deletes the program object.
    pub fn destroy(self, gl: &B) {
        gl.delete_program(self.program);
    }
}

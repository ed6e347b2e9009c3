//! Recording [`Backend`] for tests.
//!
//! `MockBackend` hands out integer handles, keeps a log of state-changing
//! calls, and counts object allocations and releases. Compilation succeeds
//! when the source declares `void main()` and its braces balance; linking
//! needs one compiled shader per stage, and every fragment `in` must be
//! matched by a vertex `out` of the same name. Uniform locations are
//! assigned in declaration order from `uniform <type> <name>;` lines.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use super::backend::{Backend, BufferTarget, ShaderStage};

/// A state-changing call observed by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ClearColor([f32; 4]),
    ClearDepth(f64),
    EnableDepthTest,
    Clear,
    Viewport(i32, i32, i32, i32),
    UseProgram(Option<u32>),
    UniformMatrix4(Option<i32>, [f32; 16]),
    UniformF32(Option<i32>, f32),
    UniformIVec2(Option<i32>, i32, i32),
    BindBuffer(BufferTarget, Option<u32>),
    BufferData(BufferTarget, Vec<u8>),
    BindVertexArray(Option<u32>),
    EnableVertexAttrib(u32),
    VertexAttrib {
        location: u32,
        components: i32,
        stride: i32,
        offset: i32,
    },
    LineWidth(f32),
    DrawIndexedTriangles(i32),
}

#[derive(Debug)]
struct Shader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
}

#[derive(Debug, Default)]
struct Program {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u32,
    shaders: HashMap<u32, Shader>,
    programs: HashMap<u32, Program>,
    buffers: HashSet<u32>,
    vertex_arrays: HashSet<u32>,
    allocations: usize,
    releases: usize,
    invalid_releases: usize,
    compiles: usize,
    links: usize,
    calls: Vec<Call>,
}

impl State {
    fn handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.allocations += 1;
        self.next_handle
    }

    fn release(&mut self, existed: bool) {
        if existed {
            self.releases += 1;
        } else {
            self.invalid_releases += 1;
        }
    }
}

#[derive(Debug, Default)]
pub struct MockBackend {
    state: RefCell<State>,
    fail_buffer_creation: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `create_buffer` always fails.
    pub fn without_buffers() -> Self {
        Self {
            fail_buffer_creation: true,
            ..Self::default()
        }
    }

    /// Objects created and not yet deleted.
    pub fn live_objects(&self) -> usize {
        let s = self.state.borrow();
        s.shaders.len() + s.programs.len() + s.buffers.len() + s.vertex_arrays.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn allocations(&self) -> usize {
        self.state.borrow().allocations
    }

    pub fn releases(&self) -> usize {
        self.state.borrow().releases
    }

    /// Deletes of handles that were never created or already deleted.
    pub fn invalid_releases(&self) -> usize {
        self.state.borrow().invalid_releases
    }

    pub fn compiles(&self) -> usize {
        self.state.borrow().compiles
    }

    pub fn links(&self) -> usize {
        self.state.borrow().links
    }

    pub fn is_program_live(&self, program: u32) -> bool {
        self.state.borrow().programs.contains_key(&program)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Returns the recorded calls and clears the log.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

fn compiles(source: &str) -> bool {
    let opens = source.matches('{').count();
    let closes = source.matches('}').count();
    source.contains("void main()") && opens == closes
}

/// Names declared with `qualifier` (e.g. `"uniform "`) at line start.
fn declared<'a>(source: &'a str, qualifier: &'a str) -> impl Iterator<Item = String> + 'a {
    source.lines().filter_map(move |line| {
        let rest = line.trim().strip_prefix(qualifier)?;
        let name = rest.split_whitespace().nth(1)?;
        Some(name.trim_end_matches(';').to_string())
    })
}

fn unmatched_varying(shaders: &[&Shader]) -> Option<String> {
    let of_stage = |stage: ShaderStage, qualifier: &str| -> Vec<String> {
        shaders
            .iter()
            .filter(|sh| sh.stage == stage)
            .flat_map(|sh| declared(&sh.source, qualifier))
            .collect()
    };
    let outputs = of_stage(ShaderStage::Vertex, "out ");
    of_stage(ShaderStage::Fragment, "in ")
        .into_iter()
        .find(|name| !outputs.contains(name))
}

impl Backend for MockBackend {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type UniformLocation = i32;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let mut s = self.state.borrow_mut();
        let id = s.handle();
        s.shaders.insert(
            id,
            Shader {
                stage,
                source: String::new(),
                compiled: false,
            },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(sh) = self.state.borrow_mut().shaders.get_mut(&shader) {
            sh.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut s = self.state.borrow_mut();
        s.compiles += 1;
        if let Some(sh) = s.shaders.get_mut(&shader) {
            sh.compiled = compiles(&sh.source);
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|sh| sh.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        match self.state.borrow().shaders.get(&shader) {
            Some(sh) if !sh.compiled => "0:1(1): error: syntax error, unexpected end of file".into(),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: u32) {
        let mut s = self.state.borrow_mut();
        let existed = s.shaders.remove(&shader).is_some();
        s.release(existed);
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut s = self.state.borrow_mut();
        let id = s.handle();
        s.programs.insert(id, Program::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        if let Some(p) = self.state.borrow_mut().programs.get_mut(&program) {
            p.attached.retain(|&s| s != shader);
        }
    }

    fn link_program(&self, program: u32) {
        let mut s = self.state.borrow_mut();
        s.links += 1;
        let Some(attached) = s.programs.get(&program).map(|p| p.attached.clone()) else {
            return;
        };
        let shaders: Vec<&Shader> = attached.iter().filter_map(|id| s.shaders.get(id)).collect();
        let has = |stage| shaders.iter().any(|sh| sh.stage == stage && sh.compiled);
        let (linked, log) = if !has(ShaderStage::Vertex) {
            (false, "error: no compiled vertex shader attached".to_string())
        } else if !has(ShaderStage::Fragment) {
            (false, "error: no compiled fragment shader attached".to_string())
        } else if let Some(name) = unmatched_varying(&shaders) {
            (false, format!("error: fragment input `{name}` is not written by the vertex shader"))
        } else {
            (true, String::new())
        };
        let mut uniforms: Vec<String> = Vec::new();
        for name in shaders.iter().flat_map(|sh| declared(&sh.source, "uniform ")) {
            if !uniforms.contains(&name) {
                uniforms.push(name);
            }
        }
        if let Some(p) = s.programs.get_mut(&program) {
            p.linked = linked;
            p.log = log;
            p.uniforms = if linked { uniforms } else { Vec::new() };
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: u32) {
        let mut s = self.state.borrow_mut();
        let existed = s.programs.remove(&program).is_some();
        s.release(existed);
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(Call::UseProgram(program));
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<i32> {
        let s = self.state.borrow();
        let p = s.programs.get(&program)?;
        p.uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| i as i32)
    }

    fn uniform_matrix4(&self, location: Option<&i32>, columns: &[f32; 16]) {
        self.record(Call::UniformMatrix4(location.copied(), *columns));
    }

    fn uniform_f32(&self, location: Option<&i32>, value: f32) {
        self.record(Call::UniformF32(location.copied(), value));
    }

    fn uniform_ivec2(&self, location: Option<&i32>, x: i32, y: i32) {
        self.record(Call::UniformIVec2(location.copied(), x, y));
    }

    fn create_buffer(&self) -> Result<u32, String> {
        if self.fail_buffer_creation {
            return Err("out of memory".into());
        }
        let mut s = self.state.borrow_mut();
        let id = s.handle();
        s.buffers.insert(id);
        Ok(id)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<u32>) {
        self.record(Call::BindBuffer(target, buffer));
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        self.record(Call::BufferData(target, data.to_vec()));
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut s = self.state.borrow_mut();
        let existed = s.buffers.remove(&buffer);
        s.release(existed);
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let mut s = self.state.borrow_mut();
        let id = s.handle();
        s.vertex_arrays.insert(id);
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        self.record(Call::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut s = self.state.borrow_mut();
        let existed = s.vertex_arrays.remove(&vertex_array);
        s.release(existed);
    }

    fn enable_vertex_attrib(&self, location: u32) {
        self.record(Call::EnableVertexAttrib(location));
    }

    fn vertex_attrib_f32(&self, location: u32, components: i32, stride: i32, offset: i32) {
        self.record(Call::VertexAttrib {
            location,
            components,
            stride,
            offset,
        });
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.record(Call::ClearColor(rgba));
    }

    fn clear_depth(&self, depth: f64) {
        self.record(Call::ClearDepth(depth));
    }

    fn enable_depth_test(&self) {
        self.record(Call::EnableDepthTest);
    }

    fn clear(&self) {
        self.record(Call::Clear);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(Call::Viewport(x, y, width, height));
    }

    fn line_width(&self, width: f32) {
        self.record(Call::LineWidth(width));
    }

    fn draw_indexed_triangles(&self, count: i32) {
        self.record(Call::DrawIndexedTriangles(count));
    }
}

/// Minimal shader pair declaring the three harness uniforms.
pub const VERTEX_SRC: &str = "#version 330 core
layout(location = 0) in vec3 pos;
uniform mat4 xform;
void main() {
    gl_Position = xform * vec4(pos, 1.0);
}
";

pub const FRAGMENT_SRC: &str = "#version 330 core
uniform float time;
uniform ivec2 iResolution;
out vec4 color;
void main() {
    color = vec4(vec2(gl_FragCoord.xy) / vec2(iResolution), sin(time), 1.0);
}
";

/// Fragment source that compiles but reads `uv`, which `VERTEX_SRC` never
/// writes, so linking it against `VERTEX_SRC` fails.
pub const UNMATCHED_VARYING_SRC: &str = "#version 330 core
in vec2 uv;
out vec4 color;
void main() {
    color = vec4(uv, 0.0, 1.0);
}
";

/// Fragment source with an unterminated `main`.
pub const BROKEN_SRC: &str = "#version 330 core
out vec4 color;
void main() {
    color = vec4(1.0)
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_counted() {
        let gl = MockBackend::new();
        let a = gl.create_buffer().unwrap();
        let b = gl.create_buffer().unwrap();
        assert_ne!(a, b);
        assert_eq!(gl.allocations(), 2);
        gl.delete_buffer(a);
        gl.delete_buffer(a);
        assert_eq!(gl.releases(), 1);
        assert_eq!(gl.invalid_releases(), 1);
        assert_eq!(gl.live_objects(), 1);
    }

    #[test]
    fn declared_uniforms_parses_names() {
        let names: Vec<_> = declared(FRAGMENT_SRC, "uniform ").collect();
        assert_eq!(names, ["time", "iResolution"]);
    }

    #[test]
    fn fragment_input_without_vertex_output_fails_link() {
        let gl = MockBackend::new();
        let vs = gl.create_shader(ShaderStage::Vertex).unwrap();
        gl.shader_source(vs, VERTEX_SRC);
        gl.compile_shader(vs);
        let fs = gl.create_shader(ShaderStage::Fragment).unwrap();
        gl.shader_source(fs, UNMATCHED_VARYING_SRC);
        gl.compile_shader(fs);
        assert!(gl.shader_compile_status(fs));

        let program = gl.create_program().unwrap();
        gl.attach_shader(program, vs);
        gl.attach_shader(program, fs);
        gl.link_program(program);
        assert!(!gl.program_link_status(program));
        assert!(gl.program_info_log(program).contains("uv"));
    }

    #[test]
    fn compile_rule_rejects_broken_source() {
        assert!(compiles(VERTEX_SRC));
        assert!(!compiles(BROKEN_SRC));
    }
}

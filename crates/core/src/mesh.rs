//! Vertex layout and indexed triangle meshes.
//!
//! A [`Mesh`] is the CPU-side buffer pair uploaded once at initialization:
//! an ordered list of [`Vertex`] values and an ordered list of `u32`
//! indices, three per triangle.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::mem::{offset_of, size_of};

use crate::error::HarnessError;

/// Per-vertex attributes. Normals are part of the layout even when the
/// bound shaders ignore them.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// One float attribute of the vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader attribute location.
    pub location: u32,
    /// Number of `f32` components.
    pub components: i32,
    /// Byte offset inside a [`Vertex`].
    pub offset: i32,
}

impl Vertex {
    /// Size of one vertex in bytes.
    pub const STRIDE: i32 = size_of::<Vertex>() as i32;

    /// Attribute 0 is the position, attribute 1 the normal.
    pub const ATTRIBUTES: [VertexAttribute; 2] = [
        VertexAttribute {
            location: 0,
            components: 3,
            offset: offset_of!(Vertex, position) as i32,
        },
        VertexAttribute {
            location: 1,
            components: 3,
            offset: offset_of!(Vertex, normal) as i32,
        },
    ];

    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

/// An indexed triangle list.
///
/// Invariants, checked on construction: the index count is a multiple of
/// three and every index refers to an existing vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Creates a mesh after validating the index invariants.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::InvalidMesh` if the index count is not a
    /// multiple of three or an index is out of range.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self, HarnessError> {
        if indices.len() % 3 != 0 {
            return Err(HarnessError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(HarnessError::InvalidMesh(format!(
                "index {bad} out of range for {} vertices",
                vertices.len()
            )));
        }
        Ok(Self { vertices, indices })
    }

    /// The full-screen quad spanning [-1, 1]² at z = 0, split along the
    /// v1-v2 diagonal into two triangles.
    pub fn unit_quad() -> Self {
        const ZERO: [f32; 3] = [0.0, 0.0, 0.0];
        Self {
            vertices: vec![
                Vertex::new([-1.0, -1.0, 0.0], ZERO),
                Vertex::new([1.0, -1.0, 0.0], ZERO),
                Vertex::new([-1.0, 1.0, 0.0], ZERO),
                Vertex::new([1.0, 1.0, 0.0], ZERO),
            ],
            indices: vec![0, 1, 2, 2, 1, 3],
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of indices, as passed to an indexed draw call.
    pub fn index_count(&self) -> i32 {
        self.indices.len() as i32
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Raw vertex bytes for buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Iterates over triangle corner positions in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            let corner = |i: u32| Vec3::from(self.vertices[i as usize].position);
            [corner(tri[0]), corner(tri[1]), corner(tri[2])]
        })
    }

    /// Area of the `n`-th triangle, or `None` if there is no such triangle.
    pub fn triangle_area(&self, n: usize) -> Option<f32> {
        self.triangles().nth(n).map(area)
    }

    /// Sum of all triangle areas.
    pub fn total_area(&self) -> f32 {
        self.triangles().map(area).sum()
    }
}

fn area([a, b, c]: [Vec3; 3]) -> f32 {
    0.5 * (b - a).cross(c - a).length()
}

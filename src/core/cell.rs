//! Construction-time tetrahedron.
//!
//! During incremental insertion a tetrahedron is four plain vertex indices, four
//! optional neighbor indices and the cached inverse of its edge matrix. Face `k`
//! is the triangle opposite `vertices[k]`, and `neighbors[k]` is the cell across it.

use nalgebra::{Matrix3, Vector4};

use crate::core::algorithms::super_mesh::NUM_SUPER_MESH_VERTICES;
use crate::core::surface::SurfaceTriangle;
use crate::geometry::Vec3;
use crate::geometry::matrix::inner_barycentric_coords;

/// Vertex slots of the face opposite each vertex.
pub const FACE_VERTICES: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

/// Tetrahedron of a [`Triangulation`](crate::core::triangulation::Triangulation).
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Vertex indices.
    pub vertices: [usize; 4],
    /// Neighbor across the face opposite each vertex.
    pub neighbors: [Option<usize>; 4],
    /// Inverse of `[v1 - v0, v2 - v0, v3 - v0]`.
    pub inverse: Matrix3<f32>,
}

impl Cell {
    /// Create a cell without neighbors.
    #[must_use]
    pub const fn new(vertices: [usize; 4], inverse: Matrix3<f32>) -> Self {
        Self {
            vertices,
            neighbors: [None; 4],
            inverse,
        }
    }

    /// Vertex indices of face `face`.
    #[must_use]
    pub fn face_vertices(&self, face: usize) -> [usize; 3] {
        FACE_VERTICES[face].map(|slot| self.vertices[slot])
    }

    /// Face `face` as a surface triangle owned by cell `cell`.
    ///
    /// The vertex opposite the face becomes the unused vertex, so
    /// [`SurfaceTriangle::normalize`] orients the triangle outward.
    #[must_use]
    pub fn face(&self, face: usize, cell: usize) -> SurfaceTriangle {
        let mut triangle = SurfaceTriangle::new(self.face_vertices(face), Some(self.vertices[face]));
        triangle.tet_index = Some(cell);
        triangle.tet_face = face;
        triangle
    }

    /// Face slot through which `neighbor` is adjacent, if any.
    #[must_use]
    pub fn neighbor_face_index(&self, neighbor: usize) -> Option<usize> {
        self.neighbors.iter().position(|&n| n == Some(neighbor))
    }

    /// Replace the link to `old` by `new`. Returns whether a link was found.
    pub fn replace_neighbor(&mut self, old: usize, new: Option<usize>) -> bool {
        match self.neighbor_face_index(old) {
            Some(face) => {
                self.neighbors[face] = new;
                true
            }
            None => false,
        }
    }

    /// Return whether any vertex belongs to the super mesh.
    #[must_use]
    pub fn touches_super_mesh(&self) -> bool {
        self.vertices.iter().any(|&v| v < NUM_SUPER_MESH_VERTICES)
    }

    /// Barycentric weights of `position` given the cell's vertex positions.
    #[must_use]
    pub fn barycentric_coords(&self, vertices: &[Vec3], position: &Vec3) -> Vector4<f32> {
        inner_barycentric_coords(&self.inverse, &vertices[self.vertices[0]], position)
    }
}

//! Tetrahedra of a finished mesh.
//!
//! Inner tetrahedra have four regular vertices and cache the inverse of their edge
//! matrix. Outer tetrahedra extend a hull face to infinity: three regular vertices
//! and an apex at infinity, caching the affine map from a query position to the
//! coefficients of their extrapolation polynomial.

use nalgebra::{Matrix3, Matrix3x4};
use serde::{Deserialize, Serialize};

use crate::core::cell::{Cell, FACE_VERTICES};
use crate::core::mesh_index::MeshIndex;
use crate::geometry::matrix::embed_inverse;

/// Tetrahedron of a [`TetrahedralMesh`](crate::core::tetrahedral_mesh::TetrahedralMesh).
///
/// Slot `k` of [`vertices`](Self::vertices) is `indices[k]` for `k < 3` and the
/// apex for `k == 3`. Face `k` is opposite slot `k` and `neighbors[k]` is the
/// tetrahedron across it. For outer tetrahedra face 3 is the hull face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tetrahedron {
    /// First three vertices.
    pub indices: [usize; 3],
    /// Fourth vertex. At infinity for outer tetrahedra.
    pub apex: MeshIndex,
    /// Neighbor across the face opposite each vertex slot.
    pub neighbors: [MeshIndex; 4],
    /// Inverse edge matrix in the left 3×3 block for inner tetrahedra,
    /// polynomial matrix for outer tetrahedra.
    pub matrix: Matrix3x4<f32>,
}

impl Tetrahedron {
    /// Inner tetrahedron from a construction cell whose vertices are already
    /// renumbered. Neighbor `None` becomes [`MeshIndex::None`].
    #[must_use]
    pub fn from_cell(cell: &Cell) -> Self {
        let [a, b, c, d] = cell.vertices;
        Self {
            indices: [a, b, c],
            apex: MeshIndex::Regular(d),
            neighbors: cell.neighbors.map(MeshIndex::from),
            matrix: embed_inverse(&cell.inverse),
        }
    }

    /// Return whether this is an inner tetrahedron.
    #[inline]
    #[must_use]
    pub const fn is_inner(&self) -> bool {
        self.apex.is_regular()
    }

    /// All four vertex slots.
    #[must_use]
    pub const fn vertices(&self) -> [MeshIndex; 4] {
        [
            MeshIndex::Regular(self.indices[0]),
            MeshIndex::Regular(self.indices[1]),
            MeshIndex::Regular(self.indices[2]),
            self.apex,
        ]
    }

    /// Regular vertices with their slot.
    pub fn finite_vertices(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.vertices()
            .into_iter()
            .enumerate()
            .filter_map(|(slot, v)| v.regular().map(|v| (slot, v)))
    }

    /// Vertices of face `face`.
    #[must_use]
    pub fn face_vertices(&self, face: usize) -> [MeshIndex; 3] {
        let vertices = self.vertices();
        FACE_VERTICES[face].map(|slot| vertices[slot])
    }

    /// Cached inverse edge matrix. Only meaningful for inner tetrahedra.
    #[must_use]
    pub fn inverse_matrix(&self) -> Matrix3<f32> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Face slot through which `tetrahedron` is adjacent, if any.
    #[must_use]
    pub fn neighbor_face_index(&self, tetrahedron: usize) -> Option<usize> {
        self.neighbors.iter().position(|&n| n == MeshIndex::Regular(tetrahedron))
    }

    /// Return whether `tetrahedron` is adjacent to this one.
    #[must_use]
    pub fn has_neighbor(&self, tetrahedron: usize) -> bool {
        self.neighbor_face_index(tetrahedron).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outer() -> Tetrahedron {
        Tetrahedron {
            indices: [4, 2, 7],
            apex: MeshIndex::AtInfinityCubic,
            neighbors: [
                MeshIndex::Regular(11),
                MeshIndex::Regular(12),
                MeshIndex::Regular(13),
                MeshIndex::Regular(0),
            ],
            matrix: Matrix3x4::zeros(),
        }
    }

    #[test]
    fn inner_tetrahedron_from_cell() {
        let mut cell = Cell::new([3, 1, 0, 2], Matrix3::from_diagonal_element(2.0));
        cell.neighbors = [Some(5), None, Some(1), None];
        let tet = Tetrahedron::from_cell(&cell);

        assert!(tet.is_inner());
        assert_eq!(tet.indices, [3, 1, 0]);
        assert_eq!(tet.apex, MeshIndex::Regular(2));
        assert_eq!(
            tet.neighbors,
            [MeshIndex::Regular(5), MeshIndex::None, MeshIndex::Regular(1), MeshIndex::None]
        );
        assert_eq!(tet.inverse_matrix(), Matrix3::from_diagonal_element(2.0));
        assert_eq!(tet.finite_vertices().count(), 4);
    }

    #[test]
    fn outer_tetrahedron_faces() {
        let tet = outer();
        assert!(!tet.is_inner());
        assert_eq!(
            tet.finite_vertices().collect::<Vec<_>>(),
            vec![(0, 4), (1, 2), (2, 7)]
        );
        assert_eq!(
            tet.face_vertices(3),
            [MeshIndex::Regular(4), MeshIndex::Regular(2), MeshIndex::Regular(7)]
        );
        assert!(tet.face_vertices(0).contains(&MeshIndex::AtInfinityCubic));
        assert_eq!(tet.neighbor_face_index(0), Some(3));
        assert!(tet.has_neighbor(12));
        assert!(!tet.has_neighbor(99));
    }

    #[test]
    fn serde_roundtrip() {
        let tet = outer();
        let json = serde_json::to_string(&tet).unwrap();
        let decoded: Tetrahedron = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, tet);
    }
}

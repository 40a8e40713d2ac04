//! Triangle surfaces with edge-paired adjacency.
//!
//! A [`Surface`] describes either the boundary of an excavated cavity during
//! insertion or the convex hull of a finished mesh. Adjacency is computed by
//! sorting the directed edges of every triangle and pairing the two occurrences
//! of each undirected edge; a closed, consistently wound 2-manifold has exactly
//! two occurrences per edge, one in each direction.

use thiserror::Error;

use crate::geometry::Vec3;
use crate::geometry::predicates::{signed_plane_distance, triangle_normal};

/// Errors raised while pairing surface edges.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    /// An edge is not shared by exactly two triangles.
    #[error("Edge {edge:?} is shared by {occurrences} triangles, expected 2")]
    UnmatchedEdge {
        /// Undirected edge, smaller vertex index first.
        edge: (usize, usize),
        /// Number of triangles referencing the edge.
        occurrences: usize,
    },
    /// Both triangles sharing an edge traverse it in the same direction.
    #[error("Edge {edge:?} is traversed in the same direction by both triangles")]
    InconsistentWinding {
        /// Undirected edge, smaller vertex index first.
        edge: (usize, usize),
    },
}

/// Triangle of a [`Surface`].
///
/// Edge `k` runs from `indices[k]` to `indices[(k + 1) % 3]` and `neighbors[k]`
/// is the triangle across that edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceTriangle {
    /// Vertex indices.
    pub indices: [usize; 3],
    /// Fourth vertex of the tetrahedron this triangle bounds. It lies behind the triangle
    /// once [`normalize`](Self::normalize) has run.
    pub unused_index: Option<usize>,
    /// Adjacent triangles per edge.
    pub neighbors: [Option<usize>; 3],
    /// Tetrahedron owning this triangle.
    pub tet_index: Option<usize>,
    /// Face slot of the triangle in its owning tetrahedron.
    pub tet_face: usize,
}

impl SurfaceTriangle {
    /// Create a triangle without adjacency.
    #[must_use]
    pub const fn new(indices: [usize; 3], unused_index: Option<usize>) -> Self {
        Self {
            indices,
            unused_index,
            neighbors: [None; 3],
            tet_index: None,
            tet_face: 0,
        }
    }

    /// Directed edge `k`.
    #[inline]
    #[must_use]
    pub const fn edge(&self, k: usize) -> (usize, usize) {
        (self.indices[k % 3], self.indices[(k + 1) % 3])
    }

    /// Return whether `triangle` is adjacent to this one.
    #[must_use]
    pub fn has_neighbor(&self, triangle: usize) -> bool {
        self.neighbors.contains(&Some(triangle))
    }

    /// Unnormalized geometric normal.
    #[must_use]
    pub fn normal(&self, vertices: &[Vec3]) -> Vec3 {
        let [a, b, c] = self.indices;
        triangle_normal(&vertices[a], &vertices[b], &vertices[c])
    }

    /// Flip the winding so the normal points away from the unused vertex.
    ///
    /// Triangles without an unused vertex, or with no area, are left untouched.
    pub fn normalize(&mut self, vertices: &[Vec3]) {
        let Some(unused) = self.unused_index else {
            return;
        };
        let [a, b, c] = self.indices;
        let distance = signed_plane_distance(&vertices[a], &vertices[b], &vertices[c], &vertices[unused]);
        if distance.is_some_and(|d| d > 0.0) {
            self.indices.swap(0, 1);
            self.neighbors.swap(1, 2);
        }
    }

    /// Shape quality in `[0, 1]`: shortest side over longest side.
    ///
    /// Zero for triangles collapsed to a point.
    #[must_use]
    pub fn score(&self, vertices: &[Vec3]) -> f32 {
        let lengths = [0, 1, 2].map(|k| {
            let (a, b) = self.edge(k);
            (vertices[b] - vertices[a]).norm()
        });
        let longest = lengths.iter().copied().fold(0.0_f32, f32::max);
        if longest <= f32::MIN_POSITIVE {
            return 0.0;
        }
        let shortest = lengths.iter().copied().fold(f32::INFINITY, f32::min);
        (shortest / longest).clamp(0.0, 1.0)
    }
}

/// Directed edge of a surface triangle, sortable by its undirected endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceEdge {
    /// Smaller vertex index.
    pub low: usize,
    /// Larger vertex index.
    pub high: usize,
    /// Whether the owning triangle traverses the edge from `low` to `high`.
    pub forward: bool,
    /// Owning triangle.
    pub face: usize,
    /// Edge slot in the owning triangle.
    pub slot: usize,
}

impl SurfaceEdge {
    /// Build edge `slot` of triangle `face`.
    #[must_use]
    pub fn new(triangle: &SurfaceTriangle, face: usize, slot: usize) -> Self {
        let (a, b) = triangle.edge(slot);
        Self {
            low: a.min(b),
            high: a.max(b),
            forward: a < b,
            face,
            slot,
        }
    }

    /// Undirected key.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> (usize, usize) {
        (self.low, self.high)
    }
}

/// Set of triangles with optional adjacency.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Surface {
    /// Triangles.
    pub faces: Vec<SurfaceTriangle>,
}

impl Surface {
    /// Create an empty surface.
    #[must_use]
    pub const fn new() -> Self {
        Self { faces: Vec::new() }
    }

    /// Number of triangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Return whether the surface has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Remove all triangles.
    pub fn clear(&mut self) {
        self.faces.clear();
    }

    /// Append a triangle and return its index.
    pub fn push(&mut self, triangle: SurfaceTriangle) -> usize {
        self.faces.push(triangle);
        self.faces.len() - 1
    }

    /// Orient every triangle away from its unused vertex.
    pub fn normalize(&mut self, vertices: &[Vec3]) {
        for face in &mut self.faces {
            face.normalize(vertices);
        }
    }

    /// All directed edges, sorted by undirected key.
    #[must_use]
    pub fn sorted_edges(&self) -> Vec<SurfaceEdge> {
        let mut edges: Vec<SurfaceEdge> = self
            .faces
            .iter()
            .enumerate()
            .flat_map(|(face, triangle)| (0..3).map(move |slot| SurfaceEdge::new(triangle, face, slot)))
            .collect();
        edges.sort_unstable_by_key(|e| (e.low, e.high, e.face, e.slot));
        edges
    }

    /// Link every triangle to its three neighbors.
    ///
    /// Existing neighbor links are overwritten. On error the adjacency is incomplete
    /// and must not be used.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::UnmatchedEdge`] if an edge is not shared by exactly two
    /// triangles, or [`SurfaceError::InconsistentWinding`] if the two triangles sharing
    /// an edge do not traverse it in opposite directions.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tetra_interp::core::surface::{Surface, SurfaceTriangle};
    ///
    /// // Boundary of a tetrahedron, outward wound.
    /// let mut surface = Surface::new();
    /// for indices in [[1, 2, 3], [0, 3, 2], [0, 1, 3], [0, 2, 1]] {
    ///     surface.push(SurfaceTriangle::new(indices, None));
    /// }
    /// surface.calculate_adjacency().unwrap();
    /// assert!(surface.faces.iter().all(|f| f.neighbors.iter().all(Option::is_some)));
    /// ```
    pub fn calculate_adjacency(&mut self) -> Result<(), SurfaceError> {
        for face in &mut self.faces {
            face.neighbors = [None; 3];
        }
        let edges = self.sorted_edges();
        for group in edges.chunk_by(|a, b| a.key() == b.key()) {
            let [first, second] = pair_edges(group)?;
            self.faces[first.face].neighbors[first.slot] = Some(second.face);
            self.faces[second.face].neighbors[second.slot] = Some(first.face);
        }
        Ok(())
    }

    /// Return whether every edge is shared by exactly two oppositely wound triangles.
    #[must_use]
    pub fn is_closed_surface(&self) -> bool {
        self.sorted_edges()
            .chunk_by(|a, b| a.key() == b.key())
            .all(|group| pair_edges(group).is_ok())
    }

    /// Undirected edges that prevent the surface from being closed.
    #[must_use]
    pub fn open_edges(&self) -> Vec<(usize, usize)> {
        self.sorted_edges()
            .chunk_by(|a, b| a.key() == b.key())
            .filter(|group| pair_edges(group).is_err())
            .map(|group| group[0].key())
            .collect()
    }
}

fn pair_edges(group: &[SurfaceEdge]) -> Result<[SurfaceEdge; 2], SurfaceError> {
    match group {
        [first, second] if first.forward != second.forward => Ok([*first, *second]),
        [first, _] => Err(SurfaceError::InconsistentWinding { edge: first.key() }),
        _ => Err(SurfaceError::UnmatchedEdge {
            edge: group.first().map_or((0, 0), SurfaceEdge::key),
            occurrences: group.len(),
        }),
    }
}

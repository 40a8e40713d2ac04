//! Delaunay tetrahedral mesh used as an interpolation structure.
//!
//! A [`TetrahedralMesh`] partitions the whole space: inner tetrahedra cover the
//! convex hull of the input positions and outer tetrahedra, one per hull face,
//! extend it to infinity. Once built the mesh is read-only and every query takes
//! `&self`, so a mesh can be shared between threads.
//!
//! # Construction
//!
//! 1. The input is enclosed in a sentinel cube split into six tetrahedra.
//! 2. Each position is inserted with the Bowyer–Watson algorithm. Positions whose
//!    cavity cannot be retriangulated are skipped and reported.
//! 3. Cells touching the sentinels, disconnected debris and cells breaking the
//!    hull are removed.
//! 4. Every hull face gets an outer tetrahedron extrapolating along hull normals.
//!
//! # Examples
//!
//! ```rust
//! use tetra_interp::prelude::*;
//!
//! let positions = vec![
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//!     Vec3::new(0.0, 1.0, 0.0),
//!     Vec3::new(0.0, 0.0, 1.0),
//! ];
//! let values = [0.0_f32, 1.0, 2.0, 3.0];
//!
//! let mesh = TetrahedralMesh::new(&positions).unwrap();
//! let mut hint = 0;
//! let center: f32 = mesh.sample(&values, &Vec3::repeat(0.25), &mut hint);
//! assert!((center - 1.5).abs() < 1e-5);
//! ```

#![forbid(unsafe_code)]

use nalgebra::Vector4;
use serde::{Deserialize, Serialize};
use std::ops::Index;
use thiserror::Error;

use crate::core::algorithms::hull::build_outer_shell;
use crate::core::algorithms::incremental_insertion::insert_vertices;
use crate::core::algorithms::locate::{InterpolationFactors, directed_walk, scan_for_containing};
use crate::core::algorithms::post_process::post_process;
use crate::core::algorithms::super_mesh::initialize_super_mesh;
use crate::core::builder::{ConstructionOptions, ConstructionReport, TetrahedralMeshBuilder};
use crate::core::cell::FACE_VERTICES;
use crate::core::collections::SmallBuffer;
use crate::core::diagnostics::ConstructionDiagnostics;
use crate::core::mesh_index::MeshIndex;
use crate::core::surface::SurfaceError;
use crate::core::tetrahedron::Tetrahedron;
use crate::core::traits::Interpolate;
use crate::geometry::Vec3;
use crate::geometry::circumsphere::Circumsphere;
use crate::geometry::matrix::{inner_barycentric_coords, polynomial_coefficients};
use crate::geometry::polynomial::{cubic_real_roots, quadratic_real_roots};
use crate::geometry::predicates::{WEIGHT_TOLERANCE, is_inside, signed_plane_distance, triangle_barycentric_coords};

/// Positions closer than this fraction of the longest face edge to a hull plane count as behind it.
const HULL_PLANE_EPSILON: f64 = 1e-6;

/// Displaced-face weights below this value mark a root as spurious.
const SPURIOUS_ROOT_WEIGHT: f32 = -1.0;

/// Errors raised while building, validating or loading a mesh.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TetrahedralMeshError {
    /// Fewer than four positions were given.
    #[error("At least 4 vertices are required, got {count}")]
    InsufficientVertices {
        /// Number of given positions.
        count: usize,
    },
    /// A position has a NaN or infinite coordinate.
    #[error("Vertex {index} has a non-finite coordinate")]
    NonFiniteVertex {
        /// Offending position.
        index: usize,
    },
    /// No tetrahedron with volume could be formed, for example because all positions are coplanar.
    #[error("No inner tetrahedron could be formed")]
    NoInnerTetrahedra,
    /// Construction produced an inconsistent structure.
    #[error("Internal consistency error: {message}")]
    InternalConsistency {
        /// Description of the inconsistency.
        message: String,
    },
    /// The hull of the inner tetrahedra is not a closed surface.
    #[error("Hull is not a closed surface: {source}")]
    OpenHull {
        /// Surface error raised while pairing hull edges.
        source: SurfaceError,
    },
    /// Deserialized data does not describe a valid mesh.
    #[error("Invalid mesh data: {message}")]
    InvalidData {
        /// Description of the problem.
        message: String,
    },
    /// A vertex lies inside the circumsphere of an inner tetrahedron.
    #[error("Vertex {vertex} lies inside the circumsphere of tetrahedron {tetrahedron}")]
    DelaunayViolation {
        /// Inner tetrahedron.
        tetrahedron: usize,
        /// Offending vertex.
        vertex: usize,
    },
    /// A vertex lies outside the plane of a hull face.
    #[error("Vertex {vertex} lies outside of hull face {tetrahedron}")]
    NonConvexHull {
        /// Outer tetrahedron of the hull face.
        tetrahedron: usize,
        /// Offending vertex.
        vertex: usize,
    },
}

/// Tetrahedral interpolation mesh.
///
/// Tetrahedra `0..num_inner_tetrahedrons()` are inner, the rest are outer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTetrahedralMesh")]
pub struct TetrahedralMesh {
    vertices: Vec<Vec3>,
    tetrahedrons: Vec<Tetrahedron>,
    hull_normals: Vec<Vec3>,
    ignored_vertices: Vec<usize>,
    num_inner_tetrahedrons: usize,
}

/// Unvalidated mirror of [`TetrahedralMesh`] used for deserialization.
#[derive(Deserialize)]
struct RawTetrahedralMesh {
    vertices: Vec<Vec3>,
    tetrahedrons: Vec<Tetrahedron>,
    hull_normals: Vec<Vec3>,
    ignored_vertices: Vec<usize>,
    num_inner_tetrahedrons: usize,
}

impl TryFrom<RawTetrahedralMesh> for TetrahedralMesh {
    type Error = TetrahedralMeshError;

    fn try_from(raw: RawTetrahedralMesh) -> Result<Self, Self::Error> {
        let invalid = |message: String| TetrahedralMeshError::InvalidData { message };
        let num_vertices = raw.vertices.len();
        let num_tetrahedrons = raw.tetrahedrons.len();

        if raw.num_inner_tetrahedrons > num_tetrahedrons {
            return Err(invalid(format!(
                "{} inner tetrahedra declared but only {num_tetrahedrons} stored",
                raw.num_inner_tetrahedrons
            )));
        }
        if raw.hull_normals.len() != num_vertices {
            return Err(invalid(format!(
                "{} hull normals for {num_vertices} vertices",
                raw.hull_normals.len()
            )));
        }
        if let Some(v) = raw.ignored_vertices.iter().find(|&&v| v >= num_vertices) {
            return Err(invalid(format!("ignored vertex {v} out of range")));
        }
        for (t, tet) in raw.tetrahedrons.iter().enumerate() {
            let inner = t < raw.num_inner_tetrahedrons;
            if inner != tet.is_inner() || tet.apex.is_none() {
                return Err(invalid(format!("tetrahedron {t} has apex {} in the wrong partition", tet.apex)));
            }
            if let Some((_, v)) = tet.finite_vertices().find(|&(_, v)| v >= num_vertices) {
                return Err(invalid(format!("tetrahedron {t} references vertex {v} out of range")));
            }
            if let Some(n) = tet
                .neighbors
                .iter()
                .find(|n| n.is_at_infinity() || n.regular().is_some_and(|n| n >= num_tetrahedrons))
            {
                return Err(invalid(format!("tetrahedron {t} references neighbor {n} out of range")));
            }
        }

        Ok(Self {
            vertices: raw.vertices,
            tetrahedrons: raw.tetrahedrons,
            hull_normals: raw.hull_normals,
            ignored_vertices: raw.ignored_vertices,
            num_inner_tetrahedrons: raw.num_inner_tetrahedrons,
        })
    }
}

impl TetrahedralMesh {
    /// Build a mesh over `positions` with default options.
    ///
    /// Positions that cannot be inserted are skipped; use
    /// [`TetrahedralMeshBuilder`] to obtain the [`ConstructionReport`].
    ///
    /// # Errors
    ///
    /// Returns a [`TetrahedralMeshError`] if no valid mesh can be built.
    pub fn new(positions: &[Vec3]) -> Result<Self, TetrahedralMeshError> {
        TetrahedralMeshBuilder::new(positions).build().map(|(mesh, _)| mesh)
    }

    /// Rebuild this mesh over `positions` with default options.
    ///
    /// On error the mesh keeps its previous content.
    ///
    /// # Errors
    ///
    /// Returns a [`TetrahedralMeshError`] if no valid mesh can be built.
    pub fn define(&mut self, positions: &[Vec3]) -> Result<ConstructionReport, TetrahedralMeshError> {
        let (mesh, report) = TetrahedralMeshBuilder::new(positions).build()?;
        *self = mesh;
        Ok(report)
    }

    pub(crate) fn construct<D>(
        positions: &[Vec3],
        options: &ConstructionOptions,
        diagnostics: &mut D,
    ) -> Result<(Self, ConstructionReport), TetrahedralMeshError>
    where
        D: ConstructionDiagnostics + ?Sized,
    {
        if positions.len() < 4 {
            return Err(TetrahedralMeshError::InsufficientVertices {
                count: positions.len(),
            });
        }
        if let Some(index) = positions.iter().position(|p| p.iter().any(|c| !c.is_finite())) {
            return Err(TetrahedralMeshError::NonFiniteVertex { index });
        }

        let mut triangulation = initialize_super_mesh(positions, options.super_mesh_scale).map_err(|e| {
            TetrahedralMeshError::InternalConsistency {
                message: format!("super mesh: {e}"),
            }
        })?;
        let rejected_vertices = insert_vertices(&mut triangulation, options, diagnostics);
        let processed = post_process(triangulation)?;
        if processed.discarded_debris > 0 {
            tracing::warn!(count = processed.discarded_debris, "Discarded debris tetrahedra");
            diagnostics.on_debris_discarded(processed.discarded_debris);
        }

        let vertices = processed.triangulation.vertices;
        let mut tetrahedrons: Vec<Tetrahedron> = processed
            .triangulation
            .cells
            .iter()
            .map(Tetrahedron::from_cell)
            .collect();
        let num_inner_tetrahedrons = tetrahedrons.len();
        let hull_normals = build_outer_shell(&vertices, &mut tetrahedrons, options.infinity_epsilon)
            .map_err(|source| TetrahedralMeshError::OpenHull { source })?;

        let mesh = Self {
            vertices,
            tetrahedrons,
            hull_normals,
            ignored_vertices: processed.ignored_vertices,
            num_inner_tetrahedrons,
        };
        let report = ConstructionReport {
            rejected_vertices,
            discarded_debris: processed.discarded_debris,
            num_inner_tetrahedrons,
            num_outer_tetrahedrons: mesh.num_outer_tetrahedrons(),
        };
        tracing::debug!(
            vertices = mesh.vertices.len(),
            inner = report.num_inner_tetrahedrons,
            outer = report.num_outer_tetrahedrons,
            rejected = report.rejected_vertices.len(),
            "Built tetrahedral mesh"
        );
        Ok((mesh, report))
    }

    /// Remove all content.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Return whether the mesh has no tetrahedra.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tetrahedrons.is_empty()
    }

    /// Vertex positions, in input order.
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Inner tetrahedra followed by outer tetrahedra.
    #[must_use]
    pub fn tetrahedrons(&self) -> &[Tetrahedron] {
        &self.tetrahedrons
    }

    /// Outward unit normal per vertex, zero for vertices not on the hull.
    #[must_use]
    pub fn hull_normals(&self) -> &[Vec3] {
        &self.hull_normals
    }

    /// Vertices not referenced by any tetrahedron, such as rejected duplicates.
    #[must_use]
    pub fn ignored_vertices(&self) -> &[usize] {
        &self.ignored_vertices
    }

    /// Number of inner tetrahedra.
    #[must_use]
    pub const fn num_inner_tetrahedrons(&self) -> usize {
        self.num_inner_tetrahedrons
    }

    /// Number of outer tetrahedra.
    #[must_use]
    pub fn num_outer_tetrahedrons(&self) -> usize {
        self.tetrahedrons.len() - self.num_inner_tetrahedrons
    }

    /// Circumsphere of an inner tetrahedron, `None` for outer tetrahedra.
    #[must_use]
    pub fn circumsphere(&self, tetrahedron: usize) -> Option<Circumsphere> {
        let tet = self.tetrahedrons.get(tetrahedron)?;
        let apex = tet.apex.regular()?;
        let [a, b, c] = tet.indices.map(|v| &self.vertices[v]);
        Some(Circumsphere::from_tetrahedron(a, b, c, &self.vertices[apex]))
    }

    /// Barycentric coordinates of `position` in an inner tetrahedron.
    ///
    /// The weights always sum to one.
    #[must_use]
    pub fn inner_barycentric_coords(&self, tetrahedron: usize, position: &Vec3) -> Vector4<f32> {
        let tet = &self.tetrahedrons[tetrahedron];
        inner_barycentric_coords(&tet.inverse_matrix(), &self.vertices[tet.indices[0]], position)
    }

    /// Extrapolation weights of `position` in an outer tetrahedron.
    ///
    /// Positions behind the hull face, or on its plane, get `(0, 0, 0, -1)`, which
    /// sends a walk back into the adjacent inner tetrahedron. Otherwise the hull face
    /// is displaced along the hull normals until its plane passes through `position`,
    /// and the weights are the barycentric coordinates on the displaced face with a
    /// zero weight for the apex.
    ///
    /// The most positive displacement is used unless it puts `position` far outside
    /// the displaced face, in which case the smallest non-negative displacement with
    /// non-negative weights is taken instead.
    #[must_use]
    pub fn outer_barycentric_coords(&self, tetrahedron: usize, position: &Vec3) -> Vector4<f32> {
        let behind = Vector4::new(0.0, 0.0, 0.0, -1.0);
        let tet = &self.tetrahedrons[tetrahedron];
        let [p1, p2, p3] = tet.indices.map(|v| self.vertices[v]);
        let longest_edge = [p2 - p1, p3 - p2, p1 - p3]
            .iter()
            .map(|edge| f64::from(edge.norm()))
            .fold(0.0, f64::max);
        match signed_plane_distance(&p1, &p2, &p3, position) {
            Some(distance) if distance > HULL_PLANE_EPSILON * longest_edge => {}
            _ => return behind,
        }

        let coefficients = polynomial_coefficients(&tet.matrix, position);
        let roots: SmallBuffer<f32, 3> = match tet.apex {
            MeshIndex::AtInfinityCubic => cubic_real_roots(&coefficients),
            _ => quadratic_real_roots(&coefficients).into_iter().collect(),
        };
        let [n1, n2, n3] = tet.indices.map(|v| self.hull_normals[v]);
        let displaced = |t: f32| triangle_barycentric_coords(position, &(p1 + n1 * t), &(p2 + n2 * t), &(p3 + n3 * t));
        let coords = select_displacement(&roots, displaced);
        Vector4::new(coords.x, coords.y, coords.z, 0.0)
    }

    /// Weights of `position` in any tetrahedron.
    #[must_use]
    pub fn barycentric_coords(&self, tetrahedron: usize, position: &Vec3) -> Vector4<f32> {
        if self.tetrahedrons[tetrahedron].is_inner() {
            self.inner_barycentric_coords(tetrahedron, position)
        } else {
            self.outer_barycentric_coords(tetrahedron, position)
        }
    }

    /// Locate the tetrahedron containing `position` by walking from `hint`.
    ///
    /// The walk visits at most as many tetrahedra as the mesh holds. When it stops
    /// on an outer tetrahedron that sent it back inside, the adjacent inner
    /// tetrahedron is evaluated instead. If that does not contain `position` either,
    /// every tetrahedron is tested in turn. A result with `converged == false` is
    /// approximate. Returns `None` for an empty mesh.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tetra_interp::prelude::*;
    ///
    /// let positions = [Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::z()];
    /// let mesh = TetrahedralMesh::new(&positions).unwrap();
    ///
    /// let inside = mesh.interpolation_factors(&Vec3::repeat(0.1), 0).unwrap();
    /// assert!(inside.converged);
    /// assert!(mesh.tetrahedrons()[inside.tetrahedron].is_inner());
    ///
    /// let outside = mesh.interpolation_factors(&Vec3::new(-1.0, 0.2, 0.2), 0).unwrap();
    /// assert!(!mesh.tetrahedrons()[outside.tetrahedron].is_inner());
    /// ```
    #[must_use]
    pub fn interpolation_factors(&self, position: &Vec3, hint: usize) -> Option<InterpolationFactors> {
        if self.tetrahedrons.is_empty() {
            return None;
        }
        let len = self.tetrahedrons.len();
        let start = if hint < len { hint } else { 0 };
        let mut factors = directed_walk(
            start,
            len,
            |tet| self.barycentric_coords(tet, position),
            |tet, face| self.tetrahedrons[tet].neighbors[face].regular(),
        );
        if factors.converged {
            return Some(factors);
        }

        let last = &self.tetrahedrons[factors.tetrahedron];
        if !last.is_inner()
            && factors.weights.w < 0.0
            && let Some(inner) = last.neighbors[3].regular()
        {
            let weights = self.inner_barycentric_coords(inner, position);
            factors = InterpolationFactors {
                tetrahedron: inner,
                weights,
                converged: is_inside(&weights, WEIGHT_TOLERANCE),
            };
            if factors.converged {
                return Some(factors);
            }
        }

        if let Some(found) = scan_for_containing(0..len, |tet| self.barycentric_coords(tet, position)) {
            tracing::trace!(?position, tetrahedron = found.tetrahedron, "Point located by scanning");
            return Some(found);
        }
        tracing::trace!(?position, tetrahedron = factors.tetrahedron, "Point location did not converge");
        Some(factors)
    }

    /// Interpolate per-vertex `data` at `position`.
    ///
    /// `hint` is the tetrahedron the walk starts from and receives the tetrahedron
    /// it ended in, so consecutive nearby queries stay cheap. Returns the zero value
    /// for an empty mesh.
    ///
    /// # Panics
    ///
    /// Panics if `data` has no entry for a vertex of the located tetrahedron.
    pub fn sample<C, T>(&self, data: &C, position: &Vec3, hint: &mut usize) -> T
    where
        C: Index<usize, Output = T> + ?Sized,
        T: Interpolate,
    {
        let mut value = T::zero();
        let Some(factors) = self.interpolation_factors(position, *hint) else {
            return value;
        };
        *hint = factors.tetrahedron;
        for (slot, vertex) in self.tetrahedrons[factors.tetrahedron].finite_vertices() {
            value.add_weighted(&data[vertex], factors.weights[slot]);
        }
        value
    }

    /// All edges between vertices, each once with the smaller index first, sorted.
    #[must_use]
    pub fn collect_edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self.tetrahedrons[..self.num_inner_tetrahedrons]
            .iter()
            .flat_map(|tet| {
                let vertices: SmallBuffer<usize, 4> = tet.finite_vertices().map(|(_, v)| v).collect();
                let mut pairs: SmallBuffer<(usize, usize), 6> = SmallBuffer::new();
                for (i, &a) in vertices.iter().enumerate() {
                    for &b in &vertices[i + 1..] {
                        pairs.push((a.min(b), a.max(b)));
                    }
                }
                pairs
            })
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Check that every neighbor link is present, symmetric and crosses a shared face.
    ///
    /// # Errors
    ///
    /// Returns [`TetrahedralMeshError::InternalConsistency`] describing the first broken link.
    pub fn validate_adjacency(&self) -> Result<(), TetrahedralMeshError> {
        let fail = |message: String| Err(TetrahedralMeshError::InternalConsistency { message });
        for (t, tet) in self.tetrahedrons.iter().enumerate() {
            for face in 0..4 {
                let Some(n) = tet.neighbors[face].regular() else {
                    return fail(format!("tetrahedron {t} has no neighbor across face {face}"));
                };
                let Some(other) = self.tetrahedrons.get(n) else {
                    return fail(format!("tetrahedron {t} links to missing tetrahedron {n}"));
                };
                let Some(back) = other.neighbor_face_index(t) else {
                    return fail(format!("tetrahedron {n} does not link back to tetrahedron {t}"));
                };

                let ours = finite_face(tet, face);
                let theirs = finite_face(other, back);
                let expected = if tet.is_inner() || other.is_inner() { 3 } else { 2 };
                if ours != theirs || ours.len() != expected {
                    return fail(format!(
                        "tetrahedra {t} and {n} are linked across faces {ours:?} and {theirs:?}"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Check that no vertex lies deeper than `tolerance` inside the circumsphere of
    /// an inner tetrahedron.
    ///
    /// Runs in `O(vertices × tetrahedra)`.
    ///
    /// # Errors
    ///
    /// Returns [`TetrahedralMeshError::DelaunayViolation`] for the first violation found.
    pub fn validate_delaunay(&self, tolerance: f64) -> Result<(), TetrahedralMeshError> {
        for t in 0..self.num_inner_tetrahedrons {
            let Some(sphere) = self.circumsphere(t) else {
                continue;
            };
            let tet = &self.tetrahedrons[t];
            for (vertex, position) in self.vertices.iter().enumerate() {
                if tet.finite_vertices().any(|(_, v)| v == vertex) || self.ignored_vertices.contains(&vertex) {
                    continue;
                }
                if sphere.distance(position) < -tolerance {
                    return Err(TetrahedralMeshError::DelaunayViolation { tetrahedron: t, vertex });
                }
            }
        }
        Ok(())
    }

    /// Check that no vertex lies farther than `tolerance` outside the plane of a hull face.
    ///
    /// Point location and extrapolation assume a convex hull. Runs in
    /// `O(vertices × hull faces)`.
    ///
    /// # Errors
    ///
    /// Returns [`TetrahedralMeshError::NonConvexHull`] for the first violation found.
    pub fn validate_hull_convexity(&self, tolerance: f64) -> Result<(), TetrahedralMeshError> {
        for t in self.num_inner_tetrahedrons..self.tetrahedrons.len() {
            let [a, b, c] = self.tetrahedrons[t].indices.map(|v| self.vertices[v]);
            for (vertex, position) in self.vertices.iter().enumerate() {
                if self.ignored_vertices.contains(&vertex) {
                    continue;
                }
                if signed_plane_distance(&a, &b, &c, position).is_some_and(|d| d > tolerance) {
                    return Err(TetrahedralMeshError::NonConvexHull { tetrahedron: t, vertex });
                }
            }
        }
        Ok(())
    }
}

/// Barycentric coordinates on the hull face displaced by one of `roots`.
///
/// `roots` are ascending. An empty list stands for no displacement.
fn select_displacement<F>(roots: &[f32], displaced: F) -> Vec3
where
    F: Fn(f32) -> Vec3,
{
    let largest = roots.last().copied().unwrap_or(0.0);
    let coords = displaced(largest);
    if coords.min() >= SPURIOUS_ROOT_WEIGHT {
        return coords;
    }
    roots
        .iter()
        .filter(|&&t| t >= 0.0 && t < largest)
        .map(|&t| displaced(t))
        .find(|candidate| candidate.min() >= -WEIGHT_TOLERANCE)
        .unwrap_or(coords)
}

/// Sorted regular vertices of a face.
fn finite_face(tet: &Tetrahedron, face: usize) -> SmallBuffer<usize, 3> {
    let vertices = tet.vertices();
    let mut result: SmallBuffer<usize, 3> = FACE_VERTICES[face]
        .iter()
        .filter_map(|&slot| vertices[slot].regular())
        .collect();
    result.sort_unstable();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn octahedron() -> Vec<Vec3> {
        vec![
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.1, 0.05, -0.02),
        ]
    }

    #[test]
    fn octahedron_mesh_is_valid() {
        let mesh = TetrahedralMesh::new(&octahedron()).unwrap();

        assert_eq!(mesh.num_outer_tetrahedrons(), 8);
        assert_eq!(mesh.num_inner_tetrahedrons(), 8);
        assert!(mesh.ignored_vertices().is_empty());
        assert!(mesh.validate_adjacency().is_ok());
        assert!(mesh.validate_delaunay(1e-4).is_ok());
        assert!(mesh.circumsphere(0).is_some());
        assert!(mesh.circumsphere(mesh.num_inner_tetrahedrons()).is_none());

        // Only the interior vertex has no hull normal.
        assert_eq!(mesh.hull_normals()[6], Vec3::zeros());
        assert_relative_eq!(mesh.hull_normals()[0], Vec3::x(), epsilon = 1e-5);
    }

    #[test]
    fn collect_edges_lists_each_edge_once() {
        let mesh = TetrahedralMesh::new(&octahedron()).unwrap();
        let edges = mesh.collect_edges();

        // 12 octahedron edges plus 6 spokes to the interior vertex.
        assert_eq!(edges.len(), 18);
        assert!(edges.windows(2).all(|w| w[0] < w[1]));
        assert!(edges.iter().all(|&(a, b)| a < b));
    }

    #[test]
    fn inner_weights_sum_to_one() {
        let mesh = TetrahedralMesh::new(&octahedron()).unwrap();
        let position = Vec3::new(3.0, -2.0, 0.5);
        for t in 0..mesh.num_inner_tetrahedrons() {
            assert_relative_eq!(mesh.inner_barycentric_coords(t, &position).sum(), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn outer_weights_behind_face_fall_back_inside() {
        let mesh = TetrahedralMesh::new(&octahedron()).unwrap();
        let outer = mesh.num_inner_tetrahedrons();
        assert_eq!(
            mesh.outer_barycentric_coords(outer, &Vec3::zeros()),
            Vector4::new(0.0, 0.0, 0.0, -1.0)
        );
    }

    #[test]
    fn hull_vertices_are_never_in_front_of_a_hull_face() {
        let mesh = TetrahedralMesh::new(&octahedron()).unwrap();
        let behind = Vector4::new(0.0, 0.0, 0.0, -1.0);
        for t in mesh.num_inner_tetrahedrons()..mesh.tetrahedrons().len() {
            for position in mesh.vertices() {
                assert_eq!(mesh.outer_barycentric_coords(t, position), behind, "outer tetrahedron {t}");
            }
        }
        assert!(mesh.validate_hull_convexity(1e-6).is_ok());
    }

    #[test]
    fn spurious_largest_root_is_replaced() {
        // The largest root puts the query far outside the displaced face.
        let displaced = |t: f32| {
            if t > 10.0 {
                Vec3::new(17.8, 8.9, -25.7)
            } else if t > 0.0 {
                Vec3::new(0.2, 0.3, 0.5)
            } else {
                Vec3::new(-0.5, 0.5, 1.0)
            }
        };
        assert_eq!(select_displacement(&[-2.0, 0.5625, 19.76], displaced), Vec3::new(0.2, 0.3, 0.5));

        // Without a better candidate the largest root is kept.
        assert_eq!(select_displacement(&[-2.0, 19.76], displaced), Vec3::new(17.8, 8.9, -25.7));

        // Mildly negative weights keep the largest root.
        let mild = |t: f32| Vec3::new(1.0 + t, -0.5, -0.5 - t);
        assert_eq!(select_displacement(&[0.0, 0.25], mild), Vec3::new(1.25, -0.5, -0.75));

        // Constant polynomials use no displacement.
        assert_eq!(select_displacement(&[], mild), Vec3::new(1.0, -0.5, -0.5));
    }

    #[test]
    fn dented_hull_is_reported() {
        let mut mesh = TetrahedralMesh::new(&octahedron()).unwrap();
        mesh.vertices[6] = Vec3::new(0.0, 0.0, 5.0);
        assert!(matches!(
            mesh.validate_hull_convexity(1e-6),
            Err(TetrahedralMeshError::NonConvexHull { vertex: 6, .. })
        ));
    }

    #[test]
    fn sample_reproduces_vertex_data() {
        let positions = octahedron();
        let mesh = TetrahedralMesh::new(&positions).unwrap();
        let data: Vec<f32> = (0..positions.len()).map(|i| i as f32 * 1.5 - 2.0).collect();

        for (v, position) in positions.iter().enumerate() {
            for start in [0, mesh.tetrahedrons().len() - 1] {
                let mut hint = start;
                let value: f32 = mesh.sample(data.as_slice(), position, &mut hint);
                assert_relative_eq!(value, data[v], epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn sampling_far_away_converges_to_outer_cell() {
        let mesh = TetrahedralMesh::new(&octahedron()).unwrap();
        let factors = mesh.interpolation_factors(&Vec3::new(0.4, 0.4, 3.0), 0).unwrap();
        assert!(factors.converged);
        assert!(!mesh.tetrahedrons()[factors.tetrahedron].is_inner());
        assert_relative_eq!(factors.weights.sum(), 1.0, epsilon = 1e-4);
        assert_eq!(factors.weights.w, 0.0);
    }

    #[test]
    fn define_replaces_content_only_on_success() {
        let mut mesh = TetrahedralMesh::default();
        assert!(mesh.is_empty());
        assert!(mesh.interpolation_factors(&Vec3::zeros(), 0).is_none());
        assert_eq!(mesh.sample::<[f32], f32>(&[], &Vec3::zeros(), &mut 0), 0.0);

        let report = mesh.define(&octahedron()).unwrap();
        assert!(report.is_complete());
        let before = mesh.clone();

        let coplanar = [Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::new(1.0, 1.0, 0.0)];
        assert_eq!(mesh.define(&coplanar), Err(TetrahedralMeshError::NoInnerTetrahedra));
        assert_eq!(mesh, before);

        mesh.clear();
        assert!(mesh.is_empty());
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let positions = [Vec3::zeros(), Vec3::x(), Vec3::new(f32::NAN, 0.0, 0.0), Vec3::z()];
        assert_eq!(
            TetrahedralMesh::new(&positions),
            Err(TetrahedralMeshError::NonFiniteVertex { index: 2 })
        );
    }

    #[test]
    fn deserialization_validates_ranges() {
        let mesh = TetrahedralMesh::new(&octahedron()).unwrap();
        let mut value = serde_json::to_value(&mesh).unwrap();
        value["num_inner_tetrahedrons"] = serde_json::json!(1000);
        let result: Result<TetrahedralMesh, _> = serde_json::from_value(value);
        assert!(result.unwrap_err().to_string().contains("inner tetrahedra declared"));
    }
}

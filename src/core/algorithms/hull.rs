//! Convex hull surface, hull normals and the outer shell.
//!
//! Every hull face of the inner tetrahedralization is extended to an outer
//! tetrahedron whose apex lies at infinity. Hull vertices are pushed outward
//! along their averaged hull normal; a query position beyond the hull is
//! expressed by the scale `t` at which the displaced hull face passes through it,
//! and by its barycentric coordinates on that displaced face.

use crate::core::cell::FACE_VERTICES;
use crate::core::mesh_index::MeshIndex;
use crate::core::surface::{Surface, SurfaceError, SurfaceTriangle};
use crate::core::tetrahedron::Tetrahedron;
use crate::geometry::Vec3;
use crate::geometry::matrix::{PolynomialDegree, outer_polynomial_matrix};

/// Faces of inner tetrahedra without neighbor, oriented outward, with adjacency.
///
/// # Errors
///
/// Returns a [`SurfaceError`] if the faces do not form a closed surface.
pub fn hull_surface(vertices: &[Vec3], tetrahedrons: &[Tetrahedron]) -> Result<Surface, SurfaceError> {
    let mut hull = Surface::new();
    for (index, tet) in tetrahedrons.iter().enumerate() {
        let Some(apex) = tet.apex.regular() else {
            continue;
        };
        let [a, b, c] = tet.indices;
        let all = [a, b, c, apex];
        for face in 0..4 {
            if tet.neighbors[face].is_none() {
                let mut triangle = SurfaceTriangle::new(FACE_VERTICES[face].map(|slot| all[slot]), Some(all[face]));
                triangle.tet_index = Some(index);
                triangle.tet_face = face;
                hull.push(triangle);
            }
        }
    }
    hull.normalize(vertices);
    hull.calculate_adjacency()?;
    Ok(hull)
}

/// Outward unit normal per vertex, averaged over the unit normals of its hull faces.
///
/// Vertices not on the hull get a zero normal.
#[must_use]
pub fn hull_normals(vertices: &[Vec3], hull: &Surface) -> Vec<Vec3> {
    let mut normals = vec![Vec3::zeros(); vertices.len()];
    for face in &hull.faces {
        let Some(normal) = face.normal(vertices).try_normalize(f32::MIN_POSITIVE) else {
            continue;
        };
        for &v in &face.indices {
            normals[v] += normal;
        }
    }
    for normal in &mut normals {
        *normal = normal.try_normalize(f32::MIN_POSITIVE).unwrap_or_else(Vec3::zeros);
    }
    normals
}

/// Append one outer tetrahedron per hull face and link it to its inner tetrahedron
/// and to the outer tetrahedra of the adjacent hull faces.
///
/// # Arguments
///
/// * `vertices` - Vertex positions.
/// * `tetrahedrons` - Inner tetrahedra. Outer tetrahedra are appended.
/// * `infinity_epsilon` - Leading coefficient below which outer tetrahedra use a quadratic polynomial.
///
/// # Returns
///
/// The hull normal of every vertex.
///
/// # Errors
///
/// Returns a [`SurfaceError`] if the hull is not a closed surface. The tetrahedra are
/// left unchanged in that case.
pub fn build_outer_shell(
    vertices: &[Vec3],
    tetrahedrons: &mut Vec<Tetrahedron>,
    infinity_epsilon: f32,
) -> Result<Vec<Vec3>, SurfaceError> {
    let hull = hull_surface(vertices, tetrahedrons)?;
    let normals = hull_normals(vertices, &hull);
    let num_inner = tetrahedrons.len();
    let outer = |neighbor: Option<usize>| MeshIndex::from(neighbor.map(|n| num_inner + n));

    let mut num_cubic = 0;
    tetrahedrons.reserve(hull.len());
    for (j, face) in hull.faces.iter().enumerate() {
        let [a, b, c] = face.indices;
        let (matrix, degree) = outer_polynomial_matrix(
            [&vertices[a], &vertices[b], &vertices[c]],
            [&normals[a], &normals[b], &normals[c]],
            infinity_epsilon,
        );
        let apex = match degree {
            PolynomialDegree::Cubic => {
                num_cubic += 1;
                MeshIndex::AtInfinityCubic
            }
            PolynomialDegree::Quadratic => MeshIndex::AtInfinityQuadratic,
        };

        let inner = face.tet_index.map_or(MeshIndex::None, MeshIndex::Regular);
        if let Some(inner) = face.tet_index {
            tetrahedrons[inner].neighbors[face.tet_face] = MeshIndex::Regular(num_inner + j);
        }
        tetrahedrons.push(Tetrahedron {
            indices: face.indices,
            apex,
            neighbors: [
                outer(face.neighbors[1]),
                outer(face.neighbors[2]),
                outer(face.neighbors[0]),
                inner,
            ],
            matrix,
        });
    }

    tracing::debug!(
        hull_faces = hull.len(),
        cubic = num_cubic,
        quadratic = hull.len() - num_cubic,
        "Built outer shell"
    );
    Ok(normals)
}

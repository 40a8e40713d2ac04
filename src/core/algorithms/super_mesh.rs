//! Enclosing sentinel mesh for incremental insertion.
//!
//! The input's bounding box is inflated into a cube whose 8 corners become the
//! first vertices of the triangulation. The cube is split into the 6 Kuhn
//! tetrahedra sharing its main diagonal, so every input point has a host cell
//! from the very first insertion.

use crate::core::collections::FastHashMap;
use crate::core::triangulation::Triangulation;
use crate::geometry::Vec3;
use crate::geometry::matrix::MatrixError;

/// Number of sentinel vertices preceding the input vertices.
pub const NUM_SUPER_MESH_VERTICES: usize = 8;

/// Axis orders generating the Kuhn tetrahedra.
const AXIS_PERMUTATIONS: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

/// Internal index of input vertex `index`.
#[inline]
#[must_use]
pub const fn internal_index(index: usize) -> usize {
    index + NUM_SUPER_MESH_VERTICES
}

/// Input index of internal vertex `index`, `None` for sentinels.
#[inline]
#[must_use]
pub const fn input_index(index: usize) -> Option<usize> {
    index.checked_sub(NUM_SUPER_MESH_VERTICES)
}

/// Edge between two internal vertices in input numbering, `None` if it touches a sentinel.
#[must_use]
pub fn input_edge((a, b): (usize, usize)) -> Option<(usize, usize)> {
    Some((input_index(a)?, input_index(b)?))
}

/// Corners of the sentinel cube around `positions`.
///
/// Corner `i` sits on the positive side of axis `k` when bit `k` of `i` is set.
/// The cube is centered on the bounding box and its half size is the box's
/// largest extent times `scale`.
#[must_use]
pub fn super_mesh_vertices(positions: &[Vec3], scale: f32) -> [Vec3; NUM_SUPER_MESH_VERTICES] {
    let (min, max) = positions.iter().fold(
        (Vec3::repeat(f32::INFINITY), Vec3::repeat(f32::NEG_INFINITY)),
        |(min, max), p| (min.inf(p), max.sup(p)),
    );
    let (center, extent) = if positions.is_empty() {
        (Vec3::zeros(), 1.0)
    } else {
        let extent = (max - min).max();
        ((min + max) * 0.5, if extent > 0.0 { extent } else { 1.0 })
    };
    let half = extent * scale;

    std::array::from_fn(|corner| {
        let sign = |axis: usize| if corner & (1 << axis) == 0 { -1.0 } else { 1.0 };
        center + Vec3::new(sign(0), sign(1), sign(2)) * half
    })
}

/// Create a triangulation holding the sentinel cube followed by `positions`.
///
/// Input vertex `i` is stored at [`internal_index(i)`](internal_index).
///
/// # Errors
///
/// Returns [`MatrixError::SingularMatrix`] if the cube is degenerate, which only
/// happens for non-finite or overflowing coordinates.
pub fn initialize_super_mesh(positions: &[Vec3], scale: f32) -> Result<Triangulation, MatrixError> {
    let mut vertices = Vec::with_capacity(positions.len() + NUM_SUPER_MESH_VERTICES);
    vertices.extend(super_mesh_vertices(positions, scale));
    vertices.extend_from_slice(positions);
    let mut triangulation = Triangulation::new(vertices);

    for [a, b, _] in AXIS_PERMUTATIONS {
        let first = 1 << a;
        let second = first | (1 << b);
        let (cell, sphere) = triangulation.make_cell([0, first, second, 7])?;
        triangulation.push(cell, sphere);
    }
    connect_shared_faces(&mut triangulation);

    tracing::debug!(
        cells = triangulation.len(),
        vertices = positions.len(),
        "Initialized super mesh"
    );
    Ok(triangulation)
}

/// Link every pair of live cells sharing a face.
fn connect_shared_faces(triangulation: &mut Triangulation) {
    let mut open_faces: FastHashMap<[usize; 3], (usize, usize)> = FastHashMap::default();
    let cells: Vec<usize> = triangulation.live_cells().collect();
    for cell in cells {
        for face in 0..4 {
            let mut key = triangulation.cells[cell].face_vertices(face);
            key.sort_unstable();
            if let Some((other, other_face)) = open_faces.remove(&key) {
                triangulation.cells[cell].neighbors[face] = Some(other);
                triangulation.cells[other].neighbors[other_face] = Some(cell);
            } else {
                open_faces.insert(key, (cell, face));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_positions() -> Vec<Vec3> {
        vec![
            Vec3::new(-1.0, 0.0, 2.0),
            Vec3::new(3.0, 1.0, 2.5),
            Vec3::new(0.0, -2.0, 2.0),
        ]
    }

    #[test]
    fn cube_encloses_input_and_is_centered() {
        let positions = sample_positions();
        let corners = super_mesh_vertices(&positions, 5.0);

        // Largest extent is 4 along x; half size 20.
        assert_relative_eq!(corners[0], Vec3::new(-19.0, -20.5, -17.75), epsilon = 1e-5);
        assert_relative_eq!(corners[7], Vec3::new(21.0, 19.5, 22.25), epsilon = 1e-5);
        for p in &positions {
            assert!(p.iter().zip(corners[0].iter()).all(|(a, b)| a > b));
            assert!(p.iter().zip(corners[7].iter()).all(|(a, b)| a < b));
        }
    }

    #[test]
    fn single_point_gets_unit_extent() {
        let corners = super_mesh_vertices(&[Vec3::new(2.0, 2.0, 2.0)], 5.0);
        assert_relative_eq!(corners[0], Vec3::repeat(-3.0), epsilon = 1e-6);
        assert_relative_eq!(corners[7], Vec3::repeat(7.0), epsilon = 1e-6);
    }

    #[test]
    fn kuhn_cells_tile_the_cube() {
        let positions = sample_positions();
        let triangulation = initialize_super_mesh(&positions, 5.0).unwrap();

        assert_eq!(triangulation.len(), 6);
        assert_eq!(triangulation.vertices.len(), 11);
        assert!(triangulation.validate_adjacency().is_ok());

        // Every cell touches the main diagonal and has two interior neighbors.
        for cell in &triangulation.cells {
            assert!(cell.vertices.contains(&0) && cell.vertices.contains(&7));
            assert_eq!(cell.neighbors.iter().flatten().count(), 2);
        }

        // The hull is the cube, two triangles per side.
        let hull = triangulation.boundary_surface();
        assert_eq!(hull.len(), 12);
        assert!(hull.is_closed_surface());

        // Volumes add up to the cube.
        let volume: f32 = triangulation
            .cells
            .iter()
            .map(|c| 1.0 / c.inverse.determinant().abs() / 6.0)
            .sum();
        assert_relative_eq!(volume, 40.0_f32.powi(3), max_relative = 1e-4);
    }

    #[test]
    fn input_numbering_skips_sentinels() {
        assert_eq!(internal_index(0), 8);
        assert_eq!(input_index(8), Some(0));
        assert_eq!(input_index(3), None);
        assert_eq!(input_edge((9, 12)), Some((1, 4)));
        assert_eq!(input_edge((9, 2)), None);
    }
}

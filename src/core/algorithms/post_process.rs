//! Cleanup after all insertions.
//!
//! Cells touching the super mesh are removed, leaving the tetrahedralization of
//! the input's convex hull. Numerical noise can leave small disconnected pieces
//! or hull edges shared by more than two faces; those cells are discarded as
//! debris and counted. A hull that stays open afterwards is an internal error.

use crate::core::algorithms::super_mesh::NUM_SUPER_MESH_VERTICES;
use crate::core::collections::FastHashSet;
use crate::core::tetrahedral_mesh::TetrahedralMeshError;
use crate::core::triangulation::Triangulation;

/// Maximal number of hull repair rounds.
pub const MAX_HULL_REPAIR_ITERATIONS: usize = 16;

/// Sentinel-free cells and vertices of a finished construction.
#[derive(Clone, Debug)]
pub struct PostProcessed {
    /// Compacted triangulation over the input vertices, in input numbering.
    pub triangulation: Triangulation,
    /// Input vertices not referenced by any cell.
    pub ignored_vertices: Vec<usize>,
    /// Number of cells discarded as debris.
    pub discarded_debris: usize,
}

/// Disconnect every cell touching a sentinel vertex.
///
/// # Returns
///
/// Number of disconnected cells.
pub fn remove_super_mesh(triangulation: &mut Triangulation) -> usize {
    let cells: Vec<usize> = triangulation
        .live_cells()
        .filter(|&cell| triangulation.cells[cell].touches_super_mesh())
        .collect();
    for &cell in &cells {
        triangulation.disconnect(cell);
    }
    cells.len()
}

/// Keep only the largest connected component of live cells.
///
/// # Returns
///
/// Number of discarded cells.
pub fn discard_debris(triangulation: &mut Triangulation) -> usize {
    let mut visited = FastHashSet::default();
    let mut components: Vec<Vec<usize>> = Vec::new();
    let cells: Vec<usize> = triangulation.live_cells().collect();
    for start in cells {
        if !visited.insert(start) {
            continue;
        }
        let mut component = vec![start];
        let mut next = 0;
        while let Some(&cell) = component.get(next) {
            next += 1;
            for neighbor in triangulation.cells[cell].neighbors.into_iter().flatten() {
                if triangulation.is_live(neighbor) && visited.insert(neighbor) {
                    component.push(neighbor);
                }
            }
        }
        components.push(component);
    }

    let Some(largest) = components
        .iter()
        .enumerate()
        .max_by_key(|(_, c)| c.len())
        .map(|(i, _)| i)
    else {
        return 0;
    };

    let mut discarded = 0;
    for (i, component) in components.iter().enumerate() {
        if i == largest {
            continue;
        }
        for &cell in component {
            triangulation.disconnect(cell);
        }
        discarded += component.len();
    }
    discarded
}

/// Remove cells whose boundary faces sit on open or non-manifold hull edges
/// until the hull is a closed surface.
///
/// # Errors
///
/// Returns [`TetrahedralMeshError::OpenHull`] if the hull is still open after
/// [`MAX_HULL_REPAIR_ITERATIONS`] rounds.
pub fn repair_hull(triangulation: &mut Triangulation) -> Result<usize, TetrahedralMeshError> {
    let mut discarded = 0;
    for _ in 0..MAX_HULL_REPAIR_ITERATIONS {
        let mut hull = triangulation.boundary_surface();
        let Err(source) = hull.calculate_adjacency() else {
            return Ok(discarded);
        };
        let open: FastHashSet<(usize, usize)> = hull.open_edges().into_iter().collect();
        tracing::debug!(%source, open_edges = open.len(), "Repairing hull");

        let mut offending: Vec<usize> = hull
            .faces
            .iter()
            .filter(|face| {
                (0..3).any(|k| {
                    let (a, b) = face.edge(k);
                    open.contains(&(a.min(b), a.max(b)))
                })
            })
            .filter_map(|face| face.tet_index)
            .collect();
        offending.sort_unstable();
        offending.dedup();
        if offending.is_empty() {
            return Err(TetrahedralMeshError::OpenHull { source });
        }

        discarded += offending.len();
        for cell in offending {
            triangulation.disconnect(cell);
        }
        discarded += discard_debris(triangulation);
    }

    let mut hull = triangulation.boundary_surface();
    hull.calculate_adjacency()
        .map(|()| discarded)
        .map_err(|source| TetrahedralMeshError::OpenHull { source })
}

/// Strip the super mesh from a triangulation after all insertions.
///
/// # Errors
///
/// Returns [`TetrahedralMeshError::NoInnerTetrahedra`] if no cell remains,
/// [`TetrahedralMeshError::OpenHull`] if the hull cannot be closed and
/// [`TetrahedralMeshError::InternalConsistency`] if adjacency is broken.
pub fn post_process(mut triangulation: Triangulation) -> Result<PostProcessed, TetrahedralMeshError> {
    triangulation.compact();
    let super_cells = remove_super_mesh(&mut triangulation);
    let mut discarded_debris = discard_debris(&mut triangulation);
    discarded_debris += repair_hull(&mut triangulation)?;
    triangulation.compact();
    tracing::debug!(
        super_cells,
        discarded_debris,
        cells = triangulation.len(),
        "Removed super mesh"
    );

    if triangulation.is_empty() {
        return Err(TetrahedralMeshError::NoInnerTetrahedra);
    }
    triangulation
        .validate_adjacency()
        .map_err(|e| TetrahedralMeshError::InternalConsistency { message: e.to_string() })?;

    let sentinels = NUM_SUPER_MESH_VERTICES.min(triangulation.vertices.len());
    triangulation.vertices.drain(..sentinels);
    let mut referenced = vec![false; triangulation.vertices.len()];
    for cell in &mut triangulation.cells {
        for v in &mut cell.vertices {
            *v -= NUM_SUPER_MESH_VERTICES;
            referenced[*v] = true;
        }
    }
    let ignored_vertices = referenced
        .iter()
        .enumerate()
        .filter_map(|(v, &used)| (!used).then_some(v))
        .collect();

    Ok(PostProcessed {
        triangulation,
        ignored_vertices,
        discarded_debris,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::incremental_insertion::insert_vertices;
    use crate::core::algorithms::super_mesh::initialize_super_mesh;
    use crate::core::builder::ConstructionOptions;
    use crate::core::diagnostics::NoDiagnostics;
    use crate::geometry::Vec3;

    fn build(positions: &[Vec3]) -> Triangulation {
        let mut triangulation = initialize_super_mesh(positions, 5.0).unwrap();
        insert_vertices(&mut triangulation, &ConstructionOptions::default(), &mut NoDiagnostics);
        triangulation
    }

    #[test]
    fn single_tetrahedron_survives() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let result = post_process(build(&positions)).unwrap();

        assert_eq!(result.triangulation.len(), 1);
        assert_eq!(result.discarded_debris, 0);
        assert!(result.ignored_vertices.is_empty());
        assert_eq!(result.triangulation.vertices, positions);
        let mut vertices = result.triangulation.cells[0].vertices;
        vertices.sort_unstable();
        assert_eq!(vertices, [0, 1, 2, 3]);
        assert_eq!(result.triangulation.cells[0].neighbors, [None; 4]);
    }

    #[test]
    fn interior_vertex_is_kept_and_hull_is_closed() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.3, 0.4, 0.5),
        ];
        let result = post_process(build(&positions)).unwrap();

        assert_eq!(result.triangulation.len(), 4);
        assert!(result.ignored_vertices.is_empty());
        assert!(result.triangulation.validate_adjacency().is_ok());
        let hull = result.triangulation.boundary_surface();
        assert_eq!(hull.len(), 4);
        assert!(hull.is_closed_surface());
    }

    #[test]
    fn coplanar_input_has_no_cells() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        assert!(matches!(
            post_process(build(&positions)),
            Err(TetrahedralMeshError::NoInnerTetrahedra)
        ));
    }

    #[test]
    fn smaller_components_are_discarded() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.3, 0.3, 0.3),
        ];
        let mut triangulation = build(&positions);
        triangulation.compact();
        remove_super_mesh(&mut triangulation);
        triangulation.compact();
        assert_eq!(triangulation.len(), 4);

        // Cut one cell loose.
        triangulation.disconnect(0);
        let lone = triangulation.cells[0].clone();
        let sphere = triangulation.circumspheres[0];
        triangulation.push(lone, sphere);

        assert_eq!(discard_debris(&mut triangulation), 1);
        assert_eq!(triangulation.num_live(), 3);
    }
}

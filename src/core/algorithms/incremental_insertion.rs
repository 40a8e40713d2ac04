//! Incremental Bowyer–Watson insertion.
//!
//! Each vertex is inserted in two phases:
//!
//! 1. [`prepare_cavity`] reads the triangulation without modifying it. It finds a
//!    seed cell whose circumsphere contains the vertex, flood-fills every adjacent
//!    cell whose circumsphere also contains it, shrinks the region until the vertex
//!    sees every boundary face, pairs the boundary faces into a closed surface and
//!    precomputes the new cells.
//! 2. [`commit_cavity`] flags the excavated cells as removed and appends one new
//!    cell per boundary face, linked to each other through the surface adjacency
//!    and to the cells outside of the cavity through the old links.
//!
//! A vertex whose cavity fails validation is rejected without touching the
//! triangulation.

use thiserror::Error;

use crate::core::algorithms::super_mesh::{NUM_SUPER_MESH_VERTICES, input_edge, input_index};
use crate::core::builder::ConstructionOptions;
use crate::core::cell::Cell;
use crate::core::collections::{CavityBuffer, FastHashSet};
use crate::core::diagnostics::ConstructionDiagnostics;
use crate::core::surface::Surface;
use crate::core::triangulation::Triangulation;
use crate::geometry::circumsphere::Circumsphere;
use crate::geometry::predicates::signed_plane_distance;

/// Reasons a vertex cannot be inserted.
///
/// Vertex indices are in input numbering. The triangulation is left unchanged
/// by a failed insertion.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum InsertionError {
    /// The vertex is too close to an already inserted vertex.
    #[error("Vertex {vertex} lies {distance} away from vertex {existing}")]
    NearDuplicate {
        /// Rejected vertex.
        vertex: usize,
        /// Inserted vertex it collides with.
        existing: usize,
        /// Distance between both.
        distance: f32,
    },
    /// No circumsphere contains the vertex.
    #[error("No cell to excavate found for vertex {vertex}")]
    SeedNotFound {
        /// Rejected vertex.
        vertex: usize,
    },
    /// The vertex does not see every boundary face of its cavity, even after shrinking it.
    #[error("Cavity of vertex {vertex} cannot be made star-shaped")]
    NonStarShapedCavity {
        /// Rejected vertex.
        vertex: usize,
    },
    /// The boundary faces of the cavity do not form a closed surface.
    #[error("Cavity of vertex {vertex} is not closed, open edges: {open_edges:?}")]
    OpenCavity {
        /// Rejected vertex.
        vertex: usize,
        /// Unpaired boundary edges between input vertices.
        open_edges: Vec<(usize, usize)>,
    },
    /// A new cell would have no volume.
    #[error("Retriangulating the cavity of vertex {vertex} creates a degenerate tetrahedron")]
    DegenerateTetrahedron {
        /// Rejected vertex.
        vertex: usize,
    },
}

impl InsertionError {
    /// Rejected vertex in input numbering.
    #[must_use]
    pub const fn vertex(&self) -> usize {
        match self {
            Self::NearDuplicate { vertex, .. }
            | Self::SeedNotFound { vertex }
            | Self::NonStarShapedCavity { vertex }
            | Self::OpenCavity { vertex, .. }
            | Self::DegenerateTetrahedron { vertex } => *vertex,
        }
    }
}

/// Validated cavity ready to be committed.
#[derive(Clone, Debug)]
pub struct Cavity {
    /// Inserted vertex.
    pub vertex: usize,
    /// Excavated cells.
    pub cells: CavityBuffer,
    /// Boundary faces with adjacency, one per new cell.
    pub surface: Surface,
    /// Precomputed new cells, in surface order.
    pub new_cells: Vec<(Cell, Circumsphere)>,
}

/// Find and validate the cavity of `vertex` without modifying the triangulation.
///
/// # Arguments
///
/// * `triangulation` - Triangulation the vertex is inserted into.
/// * `vertex` - Internal index of the vertex.
/// * `hint` - Cell the seed walk starts from.
/// * `options` - Tolerances.
///
/// # Errors
///
/// Returns an [`InsertionError`] describing why the vertex cannot be inserted.
pub fn prepare_cavity(
    triangulation: &Triangulation,
    vertex: usize,
    hint: usize,
    options: &ConstructionOptions,
) -> Result<Cavity, InsertionError> {
    let input = input_index(vertex).unwrap_or(vertex);
    let position = triangulation.vertices[vertex];
    let tolerance = options.circumsphere_tolerance;

    let seed = triangulation
        .locate(&position, hint)
        .map(|walk| walk.tetrahedron)
        .filter(|&cell| triangulation.circumspheres[cell].contains(&position, tolerance))
        .or_else(|| triangulation.deepest_circumsphere(&position, tolerance))
        .ok_or(InsertionError::SeedNotFound { vertex: input })?;

    let mut region = flood_fill(triangulation, seed, |cell| {
        triangulation.circumspheres[cell].contains(&position, tolerance)
    });

    check_duplicates(triangulation, &region, vertex, options)?;

    loop {
        let hidden: Vec<usize> = region
            .iter()
            .copied()
            .filter(|&cell| !sees_boundary(triangulation, &region, cell, vertex, options.visibility_tolerance))
            .collect();
        if hidden.is_empty() {
            break;
        }
        if hidden.contains(&seed) {
            return Err(InsertionError::NonStarShapedCavity { vertex: input });
        }
        for cell in &hidden {
            region.remove(cell);
        }
        region = flood_fill(triangulation, seed, |cell| region.contains(&cell));
        tracing::trace!(vertex = input, cells = region.len(), "Shrunk cavity");
    }

    let mut cells: CavityBuffer = region.iter().copied().collect();
    cells.sort_unstable();

    let mut surface = Surface::new();
    for &cell in &cells {
        for (face, neighbor) in triangulation.cells[cell].neighbors.iter().enumerate() {
            if neighbor.is_none_or(|n| !region.contains(&n)) {
                surface.push(triangulation.cells[cell].face(face, cell));
            }
        }
    }
    surface.normalize(&triangulation.vertices);
    if surface.calculate_adjacency().is_err() {
        let open_edges: Vec<(usize, usize)> = surface.open_edges().into_iter().filter_map(input_edge).collect();
        let worst_score = surface
            .faces
            .iter()
            .map(|face| face.score(&triangulation.vertices))
            .fold(1.0, f32::min);
        tracing::debug!(vertex = input, faces = surface.len(), worst_score, "Open cavity surface");
        return Err(InsertionError::OpenCavity {
            vertex: input,
            open_edges,
        });
    }

    let new_cells = surface
        .faces
        .iter()
        .map(|triangle| {
            let [a, b, c] = triangle.indices;
            triangulation.make_cell([a, b, c, vertex])
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| InsertionError::DegenerateTetrahedron { vertex: input })?;

    Ok(Cavity {
        vertex,
        cells,
        surface,
        new_cells,
    })
}

/// Replace the cavity's cells by its star-shaped retriangulation.
///
/// # Returns
///
/// Index of the last created cell, a good hint for the next insertion.
pub fn commit_cavity(triangulation: &mut Triangulation, cavity: Cavity) -> usize {
    for &cell in &cavity.cells {
        triangulation.remove(cell);
    }

    let base = triangulation.len();
    for (triangle, (mut cell, sphere)) in cavity.surface.faces.iter().zip(cavity.new_cells) {
        for (k, neighbor) in cell.neighbors.iter_mut().take(3).enumerate() {
            *neighbor = triangle.neighbors[(k + 1) % 3].map(|n| base + n);
        }

        let new_index = triangulation.len();
        if let Some(old) = triangle.tet_index {
            let outer = triangulation.cells[old].neighbors[triangle.tet_face];
            cell.neighbors[3] = outer;
            if let Some(outer) = outer {
                triangulation.cells[outer].replace_neighbor(old, Some(new_index));
            }
        }
        triangulation.push(cell, sphere);
    }
    triangulation.len() - 1
}

/// Insert one vertex.
///
/// # Errors
///
/// Returns an [`InsertionError`] if the cavity is invalid. The triangulation is unchanged.
pub fn insert_vertex(
    triangulation: &mut Triangulation,
    vertex: usize,
    hint: usize,
    options: &ConstructionOptions,
) -> Result<usize, InsertionError> {
    let cavity = prepare_cavity(triangulation, vertex, hint, options)?;
    Ok(commit_cavity(triangulation, cavity))
}

/// Insert every non-sentinel vertex in order.
///
/// Rejected vertices are logged, reported to `diagnostics` and returned. The
/// triangulation is compacted whenever removed cells outnumber live cells by
/// `options.compaction_ratio`, and once at the end.
pub fn insert_vertices<D>(
    triangulation: &mut Triangulation,
    options: &ConstructionOptions,
    diagnostics: &mut D,
) -> Vec<InsertionError>
where
    D: ConstructionDiagnostics + ?Sized,
{
    let mut rejected = Vec::new();
    let mut hint = 0;
    for vertex in NUM_SUPER_MESH_VERTICES..triangulation.vertices.len() {
        match insert_vertex(triangulation, vertex, hint, options) {
            Ok(last) => hint = last,
            Err(error) => {
                tracing::warn!(%error, "Skipping vertex");
                if let InsertionError::OpenCavity { open_edges, .. } = &error {
                    diagnostics.on_highlight_edges(open_edges);
                }
                diagnostics.on_rejected_vertex(&error);
                rejected.push(error);
            }
        }

        if triangulation.needs_compaction(options.compaction_ratio) {
            let remap = triangulation.compact();
            hint = remap.get(hint).copied().flatten().unwrap_or(0);
        }
    }
    triangulation.compact();

    tracing::debug!(
        cells = triangulation.len(),
        rejected = rejected.len(),
        "Inserted vertices"
    );
    rejected
}

/// Cells reachable from `seed` through live neighbors accepted by `accept`.
fn flood_fill<F>(triangulation: &Triangulation, seed: usize, accept: F) -> FastHashSet<usize>
where
    F: Fn(usize) -> bool,
{
    let mut region = FastHashSet::default();
    region.insert(seed);
    let mut stack: CavityBuffer = CavityBuffer::new();
    stack.push(seed);
    while let Some(cell) = stack.pop() {
        for neighbor in triangulation.cells[cell].neighbors.into_iter().flatten() {
            if triangulation.is_live(neighbor) && !region.contains(&neighbor) && accept(neighbor) {
                region.insert(neighbor);
                stack.push(neighbor);
            }
        }
    }
    region
}

/// Reject the vertex if the region touches an inserted vertex closer than the duplicate tolerance.
fn check_duplicates(
    triangulation: &Triangulation,
    region: &FastHashSet<usize>,
    vertex: usize,
    options: &ConstructionOptions,
) -> Result<(), InsertionError> {
    let position = triangulation.vertices[vertex];
    let closest = region
        .iter()
        .flat_map(|&cell| triangulation.cells[cell].vertices)
        .filter(|&v| v >= NUM_SUPER_MESH_VERTICES && v != vertex)
        .map(|v| (v, (triangulation.vertices[v] - position).norm()))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    match closest {
        Some((existing, distance)) if distance < options.duplicate_tolerance => Err(InsertionError::NearDuplicate {
            vertex: input_index(vertex).unwrap_or(vertex),
            existing: input_index(existing).unwrap_or(existing),
            distance,
        }),
        _ => Ok(()),
    }
}

/// Return whether `vertex` sees every boundary face of `cell` from the cavity side.
fn sees_boundary(
    triangulation: &Triangulation,
    region: &FastHashSet<usize>,
    cell: usize,
    vertex: usize,
    tolerance: f64,
) -> bool {
    let data = &triangulation.cells[cell];
    let position = &triangulation.vertices[vertex];
    (0..4)
        .filter(|&face| data.neighbors[face].is_none_or(|n| !region.contains(&n)))
        .all(|face| {
            let [a, b, c] = data.face_vertices(face).map(|v| &triangulation.vertices[v]);
            let opposite = &triangulation.vertices[data.vertices[face]];
            match (
                signed_plane_distance(a, b, c, opposite),
                signed_plane_distance(a, b, c, position),
            ) {
                (Some(d_opposite), Some(d_vertex)) => d_opposite * d_vertex > 0.0 && d_vertex.abs() > tolerance,
                _ => false,
            }
        })
}

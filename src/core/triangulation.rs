//! Construction-time tetrahedralization store.
//!
//! Cells live in an arena with a liveness bitmap. Excavation only flags cells as
//! removed and retriangulation appends new cells, so every index stays stable
//! during a batch of insertions. [`Triangulation::compact`] drops the flagged
//! cells and renumbers all neighbor links afterwards.

use nalgebra::Vector4;
use thiserror::Error;

use crate::core::algorithms::locate::{InterpolationFactors, directed_walk};
use crate::core::cell::Cell;
use crate::core::surface::Surface;
use crate::geometry::Vec3;
use crate::geometry::circumsphere::Circumsphere;
use crate::geometry::matrix::{MatrixError, inverse_edge_matrix};

/// Broken neighbor link found by [`Triangulation::validate_adjacency`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AdjacencyError {
    /// A live cell links to a removed cell.
    #[error("cell {cell} links to removed cell {neighbor}")]
    RemovedNeighbor {
        /// Live cell.
        cell: usize,
        /// Removed cell it links to.
        neighbor: usize,
    },
    /// The neighbor has no link back.
    #[error("cell {neighbor} does not link back to cell {cell}")]
    MissingBackLink {
        /// Linking cell.
        cell: usize,
        /// Cell without the back link.
        neighbor: usize,
    },
    /// The two cells do not share the face they are linked across.
    #[error("cells {cell} and {neighbor} are linked across different faces {ours:?} and {theirs:?}")]
    FaceMismatch {
        /// Linking cell.
        cell: usize,
        /// Linked cell.
        neighbor: usize,
        /// Sorted face vertices on the side of `cell`.
        ours: [usize; 3],
        /// Sorted face vertices on the side of `neighbor`.
        theirs: [usize; 3],
    },
}

/// Vertex positions, cells and circumspheres of a tetrahedralization under construction.
#[derive(Clone, Debug, Default)]
pub struct Triangulation {
    /// Vertex positions.
    pub vertices: Vec<Vec3>,
    /// Cells, including removed ones until the next compaction.
    pub cells: Vec<Cell>,
    /// Circumsphere of each cell.
    pub circumspheres: Vec<Circumsphere>,
    removed: Vec<bool>,
    num_removed: usize,
}

impl Triangulation {
    /// Create a triangulation without cells.
    #[must_use]
    pub const fn new(vertices: Vec<Vec3>) -> Self {
        Self {
            vertices,
            cells: Vec::new(),
            circumspheres: Vec::new(),
            removed: Vec::new(),
            num_removed: 0,
        }
    }

    /// Number of cells, removed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Return whether no cell has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells not flagged as removed.
    #[must_use]
    pub fn num_live(&self) -> usize {
        self.cells.len() - self.num_removed
    }

    /// Number of cells flagged as removed.
    #[must_use]
    pub const fn num_removed(&self) -> usize {
        self.num_removed
    }

    /// Return whether `cell` exists and is not flagged as removed.
    #[inline]
    #[must_use]
    pub fn is_live(&self, cell: usize) -> bool {
        self.removed.get(cell).is_some_and(|removed| !removed)
    }

    /// Indices of all live cells.
    pub fn live_cells(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.cells.len()).filter(|&cell| !self.removed[cell])
    }

    /// Build a cell over `vertices` with its inverse matrix and circumsphere.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::SingularMatrix`] if the cell has no volume.
    pub fn make_cell(&self, vertices: [usize; 4]) -> Result<(Cell, Circumsphere), MatrixError> {
        let [p0, p1, p2, p3] = vertices.map(|v| &self.vertices[v]);
        let inverse = inverse_edge_matrix(p0, p1, p2, p3)?;
        let sphere = Circumsphere::from_tetrahedron(p0, p1, p2, p3);
        Ok((Cell::new(vertices, inverse), sphere))
    }

    /// Append a cell and return its index.
    pub fn push(&mut self, cell: Cell, sphere: Circumsphere) -> usize {
        self.cells.push(cell);
        self.circumspheres.push(sphere);
        self.removed.push(false);
        self.cells.len() - 1
    }

    /// Flag `cell` as removed. Its links are kept until compaction.
    pub fn remove(&mut self, cell: usize) {
        if let Some(flag) = self.removed.get_mut(cell)
            && !*flag
        {
            *flag = true;
            self.num_removed += 1;
        }
    }

    /// Flag `cell` as removed and turn every link to it into a boundary face.
    pub fn disconnect(&mut self, cell: usize) {
        let neighbors = self.cells[cell].neighbors;
        for neighbor in neighbors.into_iter().flatten() {
            self.cells[neighbor].replace_neighbor(cell, None);
        }
        self.cells[cell].neighbors = [None; 4];
        self.remove(cell);
    }

    /// Barycentric weights of `position` in `cell`.
    #[must_use]
    pub fn barycentric_coords(&self, cell: usize, position: &Vec3) -> Vector4<f32> {
        self.cells[cell].barycentric_coords(&self.vertices, position)
    }

    /// Walk from `hint` toward the cell containing `position`.
    ///
    /// A removed hint restarts the walk from the first live cell.
    #[must_use]
    pub fn locate(&self, position: &Vec3, hint: usize) -> Option<InterpolationFactors> {
        let start = if self.is_live(hint) {
            hint
        } else {
            self.live_cells().next()?
        };
        Some(directed_walk(
            start,
            self.cells.len(),
            |cell| self.barycentric_coords(cell, position),
            |cell, face| self.cells[cell].neighbors[face].filter(|&n| self.is_live(n)),
        ))
    }

    /// Live cell whose circumsphere surface is closest inside of `position`.
    ///
    /// Returns the cell with the most negative circumsphere distance, or `None`
    /// when no circumsphere contains the position within `tolerance`.
    #[must_use]
    pub fn deepest_circumsphere(&self, position: &Vec3, tolerance: f64) -> Option<usize> {
        self.live_cells()
            .map(|cell| (cell, self.circumspheres[cell].distance(position)))
            .filter(|&(_, distance)| distance < tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(cell, _)| cell)
    }

    /// Return whether compaction is due.
    #[must_use]
    pub fn needs_compaction(&self, ratio: f32) -> bool {
        let threshold = self.num_live() as f32 * ratio;
        let removed = self.num_removed as f32;
        self.num_removed > 0 && removed > threshold
    }

    /// Drop removed cells and renumber the rest.
    ///
    /// Links to removed cells become boundary faces.
    ///
    /// # Returns
    ///
    /// The new index of every old cell, `None` for removed cells.
    pub fn compact(&mut self) -> Vec<Option<usize>> {
        let mut remap = Vec::with_capacity(self.cells.len());
        let mut next = 0;
        for &removed in &self.removed {
            if removed {
                remap.push(None);
            } else {
                remap.push(Some(next));
                next += 1;
            }
        }
        if self.num_removed == 0 {
            return remap;
        }

        let cells = std::mem::take(&mut self.cells);
        let spheres = std::mem::take(&mut self.circumspheres);
        for ((mut cell, sphere), new_index) in cells.into_iter().zip(spheres).zip(&remap) {
            if new_index.is_none() {
                continue;
            }
            for neighbor in &mut cell.neighbors {
                *neighbor = neighbor.and_then(|n| remap[n]);
            }
            self.cells.push(cell);
            self.circumspheres.push(sphere);
        }
        self.removed = vec![false; self.cells.len()];
        self.num_removed = 0;
        tracing::debug!(cells = self.cells.len(), "Compacted triangulation");
        remap
    }

    /// Faces of live cells without neighbor, oriented outward.
    #[must_use]
    pub fn boundary_surface(&self) -> Surface {
        let mut surface = Surface::new();
        for cell in self.live_cells() {
            for face in 0..4 {
                if self.cells[cell].neighbors[face].is_none() {
                    surface.push(self.cells[cell].face(face, cell));
                }
            }
        }
        surface.normalize(&self.vertices);
        surface
    }

    /// Check that every link between live cells is symmetric and crosses a shared face.
    ///
    /// # Errors
    ///
    /// Returns an [`AdjacencyError`] for the first broken link.
    pub fn validate_adjacency(&self) -> Result<(), AdjacencyError> {
        for cell in self.live_cells() {
            for (face, neighbor) in self.cells[cell].neighbors.iter().enumerate() {
                let Some(neighbor) = *neighbor else {
                    continue;
                };
                if !self.is_live(neighbor) {
                    return Err(AdjacencyError::RemovedNeighbor { cell, neighbor });
                }
                let Some(back) = self.cells[neighbor].neighbor_face_index(cell) else {
                    return Err(AdjacencyError::MissingBackLink { cell, neighbor });
                };
                let mut ours = self.cells[cell].face_vertices(face);
                let mut theirs = self.cells[neighbor].face_vertices(back);
                ours.sort_unstable();
                theirs.sort_unstable();
                if ours != theirs {
                    return Err(AdjacencyError::FaceMismatch {
                        cell,
                        neighbor,
                        ours,
                        theirs,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two tetrahedra glued along the triangle (1, 2, 3).
    fn double_tetrahedron() -> Triangulation {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.8, 0.8, 0.8),
        ];
        let mut triangulation = Triangulation::new(vertices);
        let (mut a, sa) = triangulation.make_cell([0, 1, 2, 3]).unwrap();
        let (mut b, sb) = triangulation.make_cell([4, 1, 2, 3]).unwrap();
        a.neighbors[0] = Some(1);
        b.neighbors[0] = Some(0);
        triangulation.push(a, sa);
        triangulation.push(b, sb);
        triangulation
    }

    #[test]
    fn locate_walks_across_shared_face() {
        let triangulation = double_tetrahedron();
        let result = triangulation.locate(&Vec3::new(0.6, 0.6, 0.6), 0).unwrap();
        assert!(result.converged);
        assert_eq!(result.tetrahedron, 1);
        assert!(triangulation.validate_adjacency().is_ok());
    }

    #[test]
    fn boundary_surface_is_closed() {
        let triangulation = double_tetrahedron();
        let surface = triangulation.boundary_surface();
        assert_eq!(surface.len(), 6);
        assert!(surface.is_closed_surface());
    }

    #[test]
    fn compaction_renumbers_and_unlinks() {
        let mut triangulation = double_tetrahedron();
        triangulation.remove(0);
        assert_eq!(triangulation.num_live(), 1);
        assert!(triangulation.needs_compaction(0.5));

        let remap = triangulation.compact();
        assert_eq!(remap, vec![None, Some(0)]);
        assert_eq!(triangulation.len(), 1);
        assert_eq!(triangulation.cells[0].vertices, [4, 1, 2, 3]);
        assert_eq!(triangulation.cells[0].neighbors, [None; 4]);
        assert!(triangulation.validate_adjacency().is_ok());
    }

    #[test]
    fn disconnect_clears_back_links() {
        let mut triangulation = double_tetrahedron();
        triangulation.disconnect(1);
        assert!(!triangulation.is_live(1));
        assert_eq!(triangulation.cells[0].neighbors, [None; 4]);
        assert_eq!(triangulation.boundary_surface().len(), 4);
    }

    #[test]
    fn broken_link_is_reported() {
        let mut triangulation = double_tetrahedron();
        triangulation.cells[1].neighbors[0] = None;
        let error = triangulation.validate_adjacency().unwrap_err();
        assert_eq!(error, AdjacencyError::MissingBackLink { cell: 0, neighbor: 1 });
        assert_eq!(error.to_string(), "cell 1 does not link back to cell 0");

        let mut triangulation = double_tetrahedron();
        triangulation.cells[1].neighbors[0] = None;
        triangulation.cells[1].neighbors[1] = Some(0);
        assert!(matches!(
            triangulation.validate_adjacency(),
            Err(AdjacencyError::FaceMismatch { cell: 0, neighbor: 1, .. })
        ));

        let mut triangulation = double_tetrahedron();
        triangulation.remove(1);
        assert_eq!(
            triangulation.validate_adjacency(),
            Err(AdjacencyError::RemovedNeighbor { cell: 0, neighbor: 1 })
        );
    }

    #[test]
    fn deepest_circumsphere_prefers_most_negative_distance() {
        let triangulation = double_tetrahedron();
        let center = triangulation.circumspheres[1].center.cast::<f32>();
        assert_eq!(triangulation.deepest_circumsphere(&center, 0.0), Some(1));
        assert_eq!(
            triangulation.deepest_circumsphere(&Vec3::new(50.0, 50.0, 50.0), 1e-3),
            None
        );
    }
}

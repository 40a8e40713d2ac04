//! Observers for construction events.
//!
//! Construction never stores diagnostic state on the finished mesh. Callers that
//! want to visualize rejected insertions pass a [`ConstructionDiagnostics`]
//! implementation to
//! [`TetrahedralMeshBuilder::build_with_diagnostics`](crate::core::builder::TetrahedralMeshBuilder::build_with_diagnostics).
//! All vertex indices are in input numbering.

use crate::core::algorithms::incremental_insertion::InsertionError;

/// Receiver of construction events. Every method defaults to doing nothing.
pub trait ConstructionDiagnostics {
    /// A vertex could not be inserted and was skipped.
    fn on_rejected_vertex(&mut self, error: &InsertionError) {
        let _ = error;
    }

    /// Edges worth highlighting, such as the open edges of a rejected cavity.
    fn on_highlight_edges(&mut self, edges: &[(usize, usize)]) {
        let _ = edges;
    }

    /// Tetrahedra disconnected from the main mesh were discarded.
    fn on_debris_discarded(&mut self, count: usize) {
        let _ = count;
    }
}

/// Diagnostics receiver that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDiagnostics;

impl ConstructionDiagnostics for NoDiagnostics {}

/// Diagnostics receiver that records every event.
///
/// # Examples
///
/// ```rust
/// use tetra_interp::core::builder::TetrahedralMeshBuilder;
/// use tetra_interp::core::diagnostics::DiagnosticLog;
/// use tetra_interp::geometry::Vec3;
///
/// let positions = vec![
///     Vec3::new(0.0, 0.0, 0.0),
///     Vec3::new(1.0, 0.0, 0.0),
///     Vec3::new(0.0, 1.0, 0.0),
///     Vec3::new(0.0, 0.0, 1.0),
///     Vec3::new(0.0, 0.0, 1.0),
/// ];
/// let mut log = DiagnosticLog::default();
/// let (mesh, _report) = TetrahedralMeshBuilder::new(&positions)
///     .build_with_diagnostics(&mut log)
///     .unwrap();
///
/// assert_eq!(log.rejected.len(), 1);
/// assert_eq!(log.rejected[0].vertex(), 4);
/// assert_eq!(mesh.num_inner_tetrahedrons(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiagnosticLog {
    /// Rejected insertions in input order.
    pub rejected: Vec<InsertionError>,
    /// Highlighted edges.
    pub highlighted_edges: Vec<(usize, usize)>,
    /// Number of discarded debris tetrahedra.
    pub discarded_debris: usize,
}

impl ConstructionDiagnostics for DiagnosticLog {
    fn on_rejected_vertex(&mut self, error: &InsertionError) {
        self.rejected.push(error.clone());
    }

    fn on_highlight_edges(&mut self, edges: &[(usize, usize)]) {
        self.highlighted_edges.extend_from_slice(edges);
    }

    fn on_debris_discarded(&mut self, count: usize) {
        self.discarded_debris += count;
    }
}

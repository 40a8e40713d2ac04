//! Fluent builder for [`TetrahedralMesh`] with tunable tolerances.
//!
//! [`TetrahedralMesh::new`] covers the common case. The builder exposes the
//! numerical tolerances through [`ConstructionOptions`] and returns a
//! [`ConstructionReport`] describing what construction had to drop.
//!
//! # Examples
//!
//! ```rust
//! use tetra_interp::core::builder::{ConstructionOptionsBuilder, TetrahedralMeshBuilder};
//! use tetra_interp::geometry::Vec3;
//!
//! let positions = vec![
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//!     Vec3::new(0.0, 1.0, 0.0),
//!     Vec3::new(0.0, 0.0, 1.0),
//!     Vec3::new(0.2, 0.2, 0.2),
//! ];
//! let options = ConstructionOptionsBuilder::default()
//!     .super_mesh_scale(8.0)
//!     .build()
//!     .unwrap();
//!
//! let (mesh, report) = TetrahedralMeshBuilder::new(&positions)
//!     .options(options)
//!     .build()
//!     .unwrap();
//!
//! assert!(report.is_complete());
//! assert_eq!(mesh.num_inner_tetrahedrons(), 4);
//! assert_eq!(report.num_outer_tetrahedrons, 4);
//! ```

#![forbid(unsafe_code)]

use crate::core::algorithms::incremental_insertion::InsertionError;
use crate::core::diagnostics::{ConstructionDiagnostics, NoDiagnostics};
use crate::core::tetrahedral_mesh::{TetrahedralMesh, TetrahedralMeshError};
use crate::geometry::Vec3;

/// Numerical settings of mesh construction.
///
/// # Examples
///
/// ```rust
/// use tetra_interp::core::builder::{ConstructionOptions, ConstructionOptionsBuilder};
///
/// let options = ConstructionOptionsBuilder::default()
///     .duplicate_tolerance(1e-3)
///     .build()
///     .unwrap();
/// assert_eq!(options.duplicate_tolerance, 1e-3);
/// assert_eq!(options.circumsphere_tolerance, ConstructionOptions::default().circumsphere_tolerance);
///
/// // Negative tolerances are rejected.
/// assert!(ConstructionOptionsBuilder::default().visibility_tolerance(-1.0).build().is_err());
/// ```
#[derive(Builder, Clone, Copy, Debug, PartialEq)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct ConstructionOptions {
    /// A vertex excavates a cell when its distance to the circumsphere surface is below this value.
    pub circumsphere_tolerance: f64,
    /// Vertices closer than this to an inserted vertex are rejected.
    pub duplicate_tolerance: f32,
    /// Minimal distance between an inserted vertex and the plane of a cavity face.
    pub visibility_tolerance: f64,
    /// Half size of the sentinel cube relative to the largest extent of the input.
    pub super_mesh_scale: f32,
    /// Leading coefficient below which outer tetrahedra solve a quadratic instead of a cubic.
    pub infinity_epsilon: f32,
    /// Compact during insertion once removed cells exceed live cells times this ratio.
    pub compaction_ratio: f32,
}

impl Default for ConstructionOptions {
    fn default() -> Self {
        Self {
            circumsphere_tolerance: 5e-5,
            duplicate_tolerance: 5e-5,
            visibility_tolerance: 1e-7,
            super_mesh_scale: 1000.0,
            infinity_epsilon: 1e-6,
            compaction_ratio: 1.0,
        }
    }
}

impl ConstructionOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        let non_negative = [
            ("circumsphere_tolerance", self.circumsphere_tolerance),
            ("visibility_tolerance", self.visibility_tolerance),
            ("duplicate_tolerance", self.duplicate_tolerance.map(f64::from)),
            ("infinity_epsilon", self.infinity_epsilon.map(f64::from)),
        ];
        for (name, value) in non_negative {
            if let Some(value) = value
                && !(value.is_finite() && value >= 0.0)
            {
                return Err(format!("{name} must be finite and non-negative, got {value}"));
            }
        }
        if let Some(scale) = self.super_mesh_scale
            && !(scale.is_finite() && scale >= 1.0)
        {
            return Err(format!("super_mesh_scale must be at least 1, got {scale}"));
        }
        if let Some(ratio) = self.compaction_ratio
            && !(ratio.is_finite() && ratio > 0.0)
        {
            return Err(format!("compaction_ratio must be positive, got {ratio}"));
        }
        Ok(())
    }
}

/// Outcome of a successful construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstructionReport {
    /// Vertices that could not be inserted, in input order.
    pub rejected_vertices: Vec<InsertionError>,
    /// Tetrahedra discarded because they were disconnected from the mesh or broke its hull.
    pub discarded_debris: usize,
    /// Number of inner tetrahedra.
    pub num_inner_tetrahedrons: usize,
    /// Number of outer tetrahedra.
    pub num_outer_tetrahedrons: usize,
}

impl ConstructionReport {
    /// Return whether every vertex was inserted and nothing was discarded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejected_vertices.is_empty() && self.discarded_debris == 0
    }
}

/// Builder for [`TetrahedralMesh`].
#[derive(Clone, Copy, Debug)]
pub struct TetrahedralMeshBuilder<'a> {
    positions: &'a [Vec3],
    options: ConstructionOptions,
}

impl<'a> TetrahedralMeshBuilder<'a> {
    /// Start building a mesh over `positions` with default options.
    #[must_use]
    pub fn new(positions: &'a [Vec3]) -> Self {
        Self {
            positions,
            options: ConstructionOptions::default(),
        }
    }

    /// Replace the construction options.
    #[must_use]
    pub const fn options(mut self, options: ConstructionOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the mesh.
    ///
    /// # Errors
    ///
    /// Returns a [`TetrahedralMeshError`] if the input cannot be tetrahedralized.
    pub fn build(self) -> Result<(TetrahedralMesh, ConstructionReport), TetrahedralMeshError> {
        self.build_with_diagnostics(&mut NoDiagnostics)
    }

    /// Build the mesh, reporting construction events to `diagnostics`.
    ///
    /// # Errors
    ///
    /// Returns a [`TetrahedralMeshError`] if the input cannot be tetrahedralized.
    pub fn build_with_diagnostics<D>(
        self,
        diagnostics: &mut D,
    ) -> Result<(TetrahedralMesh, ConstructionReport), TetrahedralMeshError>
    where
        D: ConstructionDiagnostics + ?Sized,
    {
        TetrahedralMesh::construct(self.positions, &self.options, diagnostics)
    }
}

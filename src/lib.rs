//! # tetra_interp
//!
//! Scattered-data interpolation in 3D over an incremental Delaunay tetrahedralization.
//!
//! Given a set of positions, [`TetrahedralMesh`](core::tetrahedral_mesh::TetrahedralMesh)
//! builds a Delaunay tetrahedralization of their convex hull and extends it with one
//! unbounded "outer" tetrahedron per hull face. Any per-vertex data can then be
//! interpolated at an arbitrary position, inside or outside of the hull.
//!
//! # Features
//!
//! - Bowyer–Watson insertion with transactional cavity validation: an insertion that
//!   would corrupt the mesh is rejected and reported instead
//! - Double-precision circumsphere predicate over single-precision storage
//! - Extrapolation beyond the hull along averaged hull normals
//! - Generic sampling over any container of values supporting weighted sums
//!   (see [`Interpolate`](core::traits::Interpolate))
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use tetra_interp::prelude::*;
//!
//! let positions = vec![
//!     Vec3::new(0.0, 0.0, 0.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//!     Vec3::new(0.0, 1.0, 0.0),
//!     Vec3::new(0.0, 0.0, 1.0),
//!     Vec3::new(1.2, 1.2, 1.2),
//! ];
//! let temperatures = [10.0_f32, 20.0, 30.0, 40.0, 50.0];
//!
//! let mesh = TetrahedralMesh::new(&positions).unwrap();
//! assert_eq!(mesh.num_inner_tetrahedrons(), 2);
//!
//! // Exact at the sample positions.
//! let mut hint = 0;
//! let at_vertex: f32 = mesh.sample(&temperatures, &positions[4], &mut hint);
//! assert!((at_vertex - 50.0).abs() < 1e-4);
//!
//! // Positions outside of the hull are extrapolated from the closest hull face.
//! let outside: f32 = mesh.sample(&temperatures, &Vec3::new(-1.0, 0.3, 0.3), &mut hint);
//! assert!(outside.is_finite());
//! ```
//!
//! # Mesh Invariants
//!
//! A successfully built mesh satisfies:
//!
//! - **Delaunay property** – no vertex lies inside the circumsphere of an inner
//!   tetrahedron beyond the construction tolerance, checked by
//!   [`validate_delaunay`](core::tetrahedral_mesh::TetrahedralMesh::validate_delaunay).
//! - **Symmetric adjacency** – every tetrahedron, inner or outer, has four neighbors
//!   that link back across the same face, checked by
//!   [`validate_adjacency`](core::tetrahedral_mesh::TetrahedralMesh::validate_adjacency).
//! - **Closed hull** – the hull faces form a closed 2-manifold.
//!
//! Construction either returns a mesh satisfying these invariants or an error; a
//! partially built mesh is never exposed.
//!
//! # Numerical Limitations
//!
//! Positions closer than the duplicate tolerance to an inserted position, and
//! positions whose cavity cannot be retriangulated, are skipped. They appear in
//! the [`ConstructionReport`](core::builder::ConstructionReport) and in
//! [`ignored_vertices`](core::tetrahedral_mesh::TetrahedralMesh::ignored_vertices).
//! Point location stops after visiting as many tetrahedra as the mesh holds and
//! then falls back to testing every tetrahedron. A result that still did not
//! converge is flagged as such.

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the mesh, its construction algorithms and the query API.
///
/// Construction works on a [`Triangulation`](core::triangulation::Triangulation) of
/// plain [`Cell`](core::cell::Cell)s, which is turned into a
/// [`TetrahedralMesh`](core::tetrahedral_mesh::TetrahedralMesh) of
/// [`Tetrahedron`](core::tetrahedron::Tetrahedron)s once all positions are inserted.
pub mod core {
    /// Construction and query algorithms
    pub mod algorithms {
        /// Hull surface, hull normals and outer tetrahedra
        pub mod hull;
        /// Incremental Bowyer–Watson insertion
        pub mod incremental_insertion;
        /// Point location by directed walking
        pub mod locate;
        /// Removal of sentinels and debris after insertion
        pub mod post_process;
        /// Enclosing sentinel mesh
        pub mod super_mesh;
    }
    pub mod builder;
    pub mod cell;
    /// High-performance collection types
    pub mod collections;
    pub mod diagnostics;
    pub mod mesh_index;
    pub mod surface;
    pub mod tetrahedral_mesh;
    pub mod tetrahedron;
    pub mod triangulation;
    /// Traits for values attached to mesh vertices.
    pub mod traits {
        pub mod interpolate;
        pub use interpolate::*;
    }
    // Re-export the `core` modules.
    pub use builder::*;
    pub use diagnostics::*;
    pub use mesh_index::*;
    pub use tetrahedral_mesh::*;
    pub use tetrahedron::*;
    pub use traits::*;
}

/// Geometric primitives and numerical routines.
pub mod geometry {
    /// Double-precision circumspheres
    pub mod circumsphere;
    pub mod matrix;
    pub mod polynomial;
    pub mod predicates;

    /// Single-precision 3D vector used for positions, normals and directions.
    pub type Vec3 = nalgebra::Vector3<f32>;

    /// Double-precision 3D vector used by numerically sensitive predicates.
    pub type Vec3d = nalgebra::Vector3<f64>;

    pub use circumsphere::*;
}

/// A prelude module that re-exports commonly used types.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    pub use crate::core::{
        algorithms::{incremental_insertion::InsertionError, locate::InterpolationFactors},
        builder::*,
        diagnostics::*,
        mesh_index::*,
        tetrahedral_mesh::*,
        tetrahedron::*,
        traits::interpolate::*,
    };

    pub use crate::core::collections::{FastHashMap, FastHashSet, SmallBuffer};

    pub use crate::geometry::{Vec3, Vec3d, circumsphere::Circumsphere};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

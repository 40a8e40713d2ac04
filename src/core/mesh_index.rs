//! Tagged tetrahedron/vertex reference used by the finished mesh.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a vertex or tetrahedron of a [`TetrahedralMesh`](crate::core::tetrahedral_mesh::TetrahedralMesh).
///
/// Besides regular indices, a reference can be absent or name the conceptual
/// vertex at infinity of an outer tetrahedron. The two infinity variants carry
/// the degree of the extrapolation polynomial of that outer tetrahedron.
///
/// # Examples
///
/// ```rust
/// use tetra_interp::core::mesh_index::MeshIndex;
///
/// let index = MeshIndex::Regular(4);
/// assert_eq!(index.regular(), Some(4));
/// assert!(MeshIndex::AtInfinityCubic.is_at_infinity());
/// assert_eq!(MeshIndex::from(None), MeshIndex::None);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeshIndex {
    /// Index into a mesh array.
    Regular(usize),
    /// No reference.
    #[default]
    None,
    /// Vertex at infinity of an outer tetrahedron solved with a cubic polynomial.
    AtInfinityCubic,
    /// Vertex at infinity of an outer tetrahedron solved with a quadratic polynomial.
    AtInfinityQuadratic,
}

impl MeshIndex {
    /// Return the regular index, if any.
    #[inline]
    #[must_use]
    pub const fn regular(self) -> Option<usize> {
        match self {
            Self::Regular(index) => Some(index),
            _ => None,
        }
    }

    /// Return whether this is a regular index.
    #[inline]
    #[must_use]
    pub const fn is_regular(self) -> bool {
        matches!(self, Self::Regular(_))
    }

    /// Return whether this is [`MeshIndex::None`].
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    /// Return whether this names the vertex at infinity.
    #[inline]
    #[must_use]
    pub const fn is_at_infinity(self) -> bool {
        matches!(self, Self::AtInfinityCubic | Self::AtInfinityQuadratic)
    }
}

impl From<usize> for MeshIndex {
    fn from(index: usize) -> Self {
        Self::Regular(index)
    }
}

impl From<Option<usize>> for MeshIndex {
    fn from(index: Option<usize>) -> Self {
        index.map_or(Self::None, Self::Regular)
    }
}

impl fmt::Display for MeshIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regular(index) => write!(f, "{index}"),
            Self::None => write!(f, "none"),
            Self::AtInfinityCubic => write!(f, "∞(cubic)"),
            Self::AtInfinityQuadratic => write!(f, "∞(quadratic)"),
        }
    }
}

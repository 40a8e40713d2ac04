//! Circumsphere calculations for tetrahedra.
//!
//! Vertex positions are stored in single precision, but the Delaunay predicate is
//! evaluated against a sphere computed in double precision. Near-cospherical inputs
//! otherwise flip the containment test from one insertion to the next.

use crate::geometry::{Vec3, Vec3d};

/// Widen a single-precision position to double precision.
#[inline]
#[must_use]
pub fn to_high_precision(position: &Vec3) -> Vec3d {
    position.cast::<f64>()
}

/// Sphere with double-precision components.
///
/// # Examples
///
/// ```rust
/// use tetra_interp::geometry::Vec3;
/// use tetra_interp::geometry::circumsphere::Circumsphere;
/// use approx::assert_relative_eq;
///
/// let sphere = Circumsphere::from_tetrahedron(
///     &Vec3::new(0.0, 0.0, 0.0),
///     &Vec3::new(1.0, 0.0, 0.0),
///     &Vec3::new(0.0, 1.0, 0.0),
///     &Vec3::new(0.0, 0.0, 1.0),
/// );
/// assert_relative_eq!(sphere.radius, 3.0_f64.sqrt() / 2.0, epsilon = 1e-12);
/// assert!(sphere.distance(&Vec3::new(0.5, 0.5, 0.5)) < 0.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circumsphere {
    /// Center.
    pub center: Vec3d,
    /// Radius. Infinite for flat tetrahedra.
    pub radius: f64,
}

impl Circumsphere {
    /// Sphere that contains every finite position.
    ///
    /// Flat tetrahedra get this sphere so the next insertion that reaches them
    /// always excavates them.
    #[must_use]
    pub fn unbounded(center: Vec3d) -> Self {
        Self {
            center,
            radius: f64::INFINITY,
        }
    }

    /// Compute the circumsphere of the tetrahedron `p0 p1 p2 p3`.
    ///
    /// The center is solved relative to `p0` to keep the magnitudes small:
    ///
    /// `c - p0 = (|a|² (b × c) + |b|² (c × a) + |c|² (a × b)) / (2 a · (b × c))`
    ///
    /// where `a`, `b`, `c` are the edges leaving `p0`. Returns [`Circumsphere::unbounded`]
    /// when the tetrahedron has no volume.
    #[must_use]
    pub fn from_tetrahedron(p0: &Vec3, p1: &Vec3, p2: &Vec3, p3: &Vec3) -> Self {
        let origin = to_high_precision(p0);
        let a = to_high_precision(p1) - origin;
        let b = to_high_precision(p2) - origin;
        let c = to_high_precision(p3) - origin;

        let bc = b.cross(&c);
        let det = a.dot(&bc);
        let scale = a.norm() * b.norm() * c.norm();
        if det.abs() <= f64::EPSILON * scale || !det.is_finite() {
            let centroid = origin + (a + b + c) * 0.25;
            return Self::unbounded(centroid);
        }

        let offset =
            (bc * a.norm_squared() + c.cross(&a) * b.norm_squared() + a.cross(&b) * c.norm_squared())
                / (2.0 * det);

        Self {
            center: origin + offset,
            radius: offset.norm(),
        }
    }

    /// Return signed distance from position to the sphere surface.
    ///
    /// Negative inside, positive outside.
    #[must_use]
    pub fn distance(&self, position: &Vec3) -> f64 {
        (to_high_precision(position) - self.center).norm() - self.radius
    }

    /// Return whether the position lies inside the sphere, or within `tolerance` outside of it.
    #[inline]
    #[must_use]
    pub fn contains(&self, position: &Vec3, tolerance: f64) -> bool {
        self.distance(position) < tolerance
    }

    /// Return whether the sphere is [`unbounded`](Self::unbounded).
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.radius.is_infinite()
    }
}

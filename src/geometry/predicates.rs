//! Geometric predicates used by cavity validation and point location.

use nalgebra::Vector4;

use crate::geometry::Vec3;
use crate::geometry::circumsphere::to_high_precision;

/// Unnormalized normal `(p2 - p1) × (p3 - p1)` of a triangle.
#[inline]
#[must_use]
pub fn triangle_normal(p1: &Vec3, p2: &Vec3, p3: &Vec3) -> Vec3 {
    (p2 - p1).cross(&(p3 - p1))
}

/// Signed distance from `point` to the plane through `a`, `b`, `c`, in double precision.
///
/// The distance is positive on the side the normal `(b - a) × (c - a)` points to.
/// Returns `None` when the triangle has no area.
///
/// # Examples
///
/// ```rust
/// use tetra_interp::geometry::Vec3;
/// use tetra_interp::geometry::predicates::signed_plane_distance;
///
/// let a = Vec3::new(0.0, 0.0, 0.0);
/// let b = Vec3::new(1.0, 0.0, 0.0);
/// let c = Vec3::new(0.0, 1.0, 0.0);
/// let d = signed_plane_distance(&a, &b, &c, &Vec3::new(0.3, 0.3, -2.0)).unwrap();
/// assert!((d + 2.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn signed_plane_distance(a: &Vec3, b: &Vec3, c: &Vec3, point: &Vec3) -> Option<f64> {
    let origin = to_high_precision(a);
    let normal = (to_high_precision(b) - origin).cross(&(to_high_precision(c) - origin));
    let length = normal.norm();
    if length <= f64::MIN_POSITIVE || !length.is_finite() {
        return None;
    }
    Some(normal.dot(&(to_high_precision(point) - origin)) / length)
}

/// Barycentric coordinates of the projection of `position` onto the plane of triangle `p1 p2 p3`.
///
/// Components sum to one. A negative component means the projection falls outside of
/// the edge opposite to the corresponding corner.
#[must_use]
pub fn triangle_barycentric_coords(position: &Vec3, p1: &Vec3, p2: &Vec3, p3: &Vec3) -> Vec3 {
    let v12 = p2 - p1;
    let v13 = p3 - p1;
    let v0 = position - p1;
    let d00 = v12.dot(&v12);
    let d01 = v12.dot(&v13);
    let d11 = v13.dot(&v13);
    let d20 = v0.dot(&v12);
    let d21 = v0.dot(&v13);
    let denom = d00 * d11 - d01 * d01;
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Vec3::new(1.0 - v - w, v, w)
}

/// Weights above `-WEIGHT_TOLERANCE` count as non-negative during point location.
///
/// Barycentric weights are dimensionless, so the tolerance does not depend on the
/// scale of the input.
pub const WEIGHT_TOLERANCE: f32 = 1e-5;

/// Return whether no weight is below `-tolerance`.
#[inline]
#[must_use]
pub fn is_inside(weights: &Vector4<f32>, tolerance: f32) -> bool {
    weights.iter().all(|&w| w >= -tolerance)
}

/// Index of the most negative weight.
///
/// Ties resolve toward the later component. `NaN` weights never win, so a walk
/// driven by this choice falls through to face 3.
#[must_use]
pub fn most_negative_component(weights: &Vector4<f32>) -> usize {
    let (x, y, z, w) = (weights.x, weights.y, weights.z, weights.w);
    if x < y && x < z && x < w {
        0
    } else if y < z && y < w {
        1
    } else if z < w {
        2
    } else {
        3
    }
}

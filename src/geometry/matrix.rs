//! Matrix operations.
//!
//! Inner tetrahedra cache the inverse of their edge matrix so a query position
//! converts to barycentric coordinates with one matrix-vector product. Outer
//! tetrahedra cache an affine map from a query position to the coefficients of
//! the polynomial whose root is the extrapolation distance.

#![forbid(unsafe_code)]

use nalgebra::{Matrix3, Matrix3x4, RowVector4, Vector4};
use thiserror::Error;

use crate::geometry::circumsphere::to_high_precision;
use crate::geometry::{Vec3, Vec3d};

/// Error type for matrix operations.
///
/// # Examples
///
/// ```rust
/// use tetra_interp::geometry::matrix::MatrixError;
///
/// let err = MatrixError::SingularMatrix;
/// assert!(matches!(err, MatrixError::SingularMatrix));
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    /// Matrix is singular.
    #[error("Matrix is singular!")]
    SingularMatrix,
}

/// Degree of the polynomial solved by an outer tetrahedron.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PolynomialDegree {
    /// Normalized cubic `t³ + a t² + b t + c`.
    Cubic,
    /// Quadratic or linear `a t² + b t + c`.
    Quadratic,
}

/// Inverse of the edge matrix `[p1 - p0, p2 - p0, p3 - p0]`.
///
/// Multiplying the result by `position - p0` yields the barycentric weights of
/// `p1`, `p2` and `p3`.
///
/// # Errors
///
/// Returns [`MatrixError::SingularMatrix`] if the tetrahedron is flat or the inverse is not finite.
pub fn inverse_edge_matrix(
    p0: &Vec3,
    p1: &Vec3,
    p2: &Vec3,
    p3: &Vec3,
) -> Result<Matrix3<f32>, MatrixError> {
    let edges = Matrix3::from_columns(&[p1 - p0, p2 - p0, p3 - p0]);
    let inverse = edges.try_inverse().ok_or(MatrixError::SingularMatrix)?;
    if inverse.iter().all(|v| v.is_finite()) {
        Ok(inverse)
    } else {
        Err(MatrixError::SingularMatrix)
    }
}

/// Barycentric weights of `position` with respect to a tetrahedron whose first
/// vertex is `base` and whose inverse edge matrix is `inverse`.
///
/// The weights always sum to one.
#[inline]
#[must_use]
pub fn inner_barycentric_coords(inverse: &Matrix3<f32>, base: &Vec3, position: &Vec3) -> Vector4<f32> {
    let coords = inverse * (position - base);
    Vector4::new(1.0 - coords.x - coords.y - coords.z, coords.x, coords.y, coords.z)
}

/// Embed an inverse edge matrix into the 3×4 storage used by tetrahedra.
#[must_use]
pub fn embed_inverse(inverse: &Matrix3<f32>) -> Matrix3x4<f32> {
    let mut matrix = Matrix3x4::zeros();
    matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(inverse);
    matrix
}

/// Build the polynomial matrix of an outer tetrahedron.
///
/// Each hull vertex `pᵢ` is displaced along its hull normal `nᵢ` as `Pᵢ(t) = pᵢ + t nᵢ`.
/// A position `X` belongs to the displaced triangle's plane when
///
/// `((P₂(t) - P₁(t)) × (P₃(t) - P₁(t))) · (X - P₁(t)) = 0`
///
/// which expands to a cubic in `t` whose coefficients are affine in `X`. The returned
/// matrix maps `(X, 1)` to the three lower coefficients. When the leading coefficient
/// is below `epsilon` the polynomial is kept as quadratic (or linear), otherwise it is
/// normalized so the cubic is monic.
#[must_use]
pub fn outer_polynomial_matrix(
    positions: [&Vec3; 3],
    normals: [&Vec3; 3],
    epsilon: f32,
) -> (Matrix3x4<f32>, PolynomialDegree) {
    let [p1, p2, p3] = positions.map(to_high_precision);
    let [n1, n2, n3] = normals.map(to_high_precision);

    let a = p2 - p1;
    let b = p3 - p1;
    let da = n2 - n1;
    let db = n3 - n1;

    let normal0 = a.cross(&b);
    let normal1 = a.cross(&db) + da.cross(&b);
    let normal2 = da.cross(&db);

    let row = |normal: &Vec3d, previous: Option<&Vec3d>| {
        let offset = -normal.dot(&p1) - previous.map_or(0.0, |prev| prev.dot(&n1));
        RowVector4::new(normal.x, normal.y, normal.z, offset)
    };
    let c0 = row(&normal0, None);
    let c1 = row(&normal1, Some(&normal0));
    let c2 = row(&normal2, Some(&normal1));
    let c3 = -normal2.dot(&n1);

    if c3.abs() < f64::from(epsilon) {
        let matrix = Matrix3x4::from_rows(&[c2, c1, c0]);
        (matrix.cast::<f32>(), PolynomialDegree::Quadratic)
    } else {
        let matrix = Matrix3x4::from_rows(&[c2 / c3, c1 / c3, c0 / c3]);
        (matrix.cast::<f32>(), PolynomialDegree::Cubic)
    }
}

/// Evaluate the polynomial coefficients of an outer tetrahedron at `position`.
#[inline]
#[must_use]
pub fn polynomial_coefficients(matrix: &Matrix3x4<f32>, position: &Vec3) -> Vec3 {
    matrix * Vector4::new(position.x, position.y, position.z, 1.0)
}

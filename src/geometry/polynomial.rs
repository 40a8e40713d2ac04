//! Root solvers for the extrapolation polynomials of outer tetrahedra.
//!
//! A real root is a scale along the hull-normal field at which the displaced hull
//! face passes through the query. The most positive root is the usual choice.
//! Computation is carried out in `f64`.

use crate::core::collections::SmallBuffer;
use crate::geometry::Vec3;

const ROOT_EPSILON: f64 = 1e-12;

/// Real roots of the monic cubic `t³ + a t² + b t + c`.
///
/// Returns one or three roots depending on the discriminant.
#[must_use]
pub fn cubic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    let q = (a * a - 3.0 * b) / 9.0;
    let r = (2.0 * a * a * a - 9.0 * a * b + 27.0 * c) / 54.0;
    let q3 = q * q * q;
    let r2 = r * r;
    let shift = a / 3.0;

    if q3 > 0.0 && r2 <= q3 + ROOT_EPSILON {
        let theta = (r / q3.sqrt()).clamp(-1.0, 1.0).acos();
        let scale = -2.0 * q.sqrt();
        let tau = std::f64::consts::TAU;
        vec![
            scale * (theta / 3.0).cos() - shift,
            scale * ((theta + tau) / 3.0).cos() - shift,
            scale * ((theta - tau) / 3.0).cos() - shift,
        ]
    } else {
        let big_a = -r.signum() * (r.abs() + (r2 - q3).max(0.0).sqrt()).cbrt();
        let big_b = if big_a == 0.0 { 0.0 } else { q / big_a };
        vec![big_a + big_b - shift]
    }
}

/// Real roots of `t³ + x t² + y t + z` where `(x, y, z)` are the coefficients, ascending.
#[must_use]
pub fn cubic_real_roots(coefficients: &Vec3) -> SmallBuffer<f32, 3> {
    let [a, b, c] = [coefficients.x, coefficients.y, coefficients.z].map(f64::from);
    let mut roots: SmallBuffer<f32, 3> = cubic_roots(a, b, c).into_iter().map(|t| t as f32).collect();
    roots.sort_unstable_by(f32::total_cmp);
    roots
}

/// Most positive real root of `t³ + x t² + y t + z` where `(x, y, z)` are the coefficients.
///
/// # Examples
///
/// ```rust
/// use tetra_interp::geometry::Vec3;
/// use tetra_interp::geometry::polynomial::most_positive_cubic_root;
///
/// // (t - 1)(t - 2)(t - 3)
/// let t = most_positive_cubic_root(&Vec3::new(-6.0, 11.0, -6.0));
/// assert!((t - 3.0).abs() < 1e-4);
/// ```
#[must_use]
pub fn most_positive_cubic_root(coefficients: &Vec3) -> f32 {
    cubic_real_roots(coefficients)
        .last()
        .copied()
        .unwrap_or(f32::NEG_INFINITY)
}

/// Real roots of `x t² + y t + z` where `(x, y, z)` are the coefficients, ascending.
///
/// Falls back to the linear solution when the leading coefficient vanishes and
/// returns no root when the polynomial is constant. A negative discriminant is
/// clamped to zero, yielding the vertex of the parabola.
#[must_use]
pub fn quadratic_real_roots(coefficients: &Vec3) -> SmallBuffer<f32, 2> {
    let [a, b, c] = [coefficients.x, coefficients.y, coefficients.z].map(f64::from);

    let mut roots: SmallBuffer<f64, 2> = SmallBuffer::new();
    if a.abs() < ROOT_EPSILON {
        if b.abs() >= ROOT_EPSILON {
            roots.push(-c / b);
        }
    } else {
        let discriminant = (b * b - 4.0 * a * c).max(0.0).sqrt();
        roots.push((-b - discriminant) / (2.0 * a));
        roots.push((-b + discriminant) / (2.0 * a));
    }
    let mut roots: SmallBuffer<f32, 2> = roots.into_iter().map(|t| t as f32).collect();
    roots.sort_unstable_by(f32::total_cmp);
    roots
}

/// Most positive real root of `x t² + y t + z` where `(x, y, z)` are the coefficients.
///
/// Returns zero when the polynomial is constant.
#[must_use]
pub fn most_positive_quadratic_root(coefficients: &Vec3) -> f32 {
    quadratic_real_roots(coefficients).last().copied().unwrap_or(0.0)
}

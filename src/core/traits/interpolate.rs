//! Values that can be blended by interpolation weights.

use num_traits::Zero;
use std::ops::{AddAssign, Mul};

/// A value supporting a zero element and scalar-weighted accumulation.
///
/// Implemented for every type that is [`Zero`], can be scaled by an `f32` and
/// accumulated with `+=`, which covers `f32` and the `nalgebra` vector and matrix
/// types over `f32`.
///
/// # Examples
///
/// ```rust
/// use tetra_interp::core::traits::Interpolate;
/// use tetra_interp::geometry::Vec3;
///
/// let mut value = Vec3::zero();
/// value.add_weighted(&Vec3::new(2.0, 0.0, 4.0), 0.5);
/// value.add_weighted(&Vec3::new(0.0, 2.0, 0.0), 0.5);
/// assert_eq!(value, Vec3::new(1.0, 1.0, 2.0));
/// ```
pub trait Interpolate: Sized {
    /// Additive identity.
    fn zero() -> Self;

    /// Add `value * weight` to `self`.
    fn add_weighted(&mut self, value: &Self, weight: f32);
}

impl<T> Interpolate for T
where
    T: Zero + Clone + AddAssign + Mul<f32, Output = T>,
{
    fn zero() -> Self {
        <T as Zero>::zero()
    }

    fn add_weighted(&mut self, value: &Self, weight: f32) {
        *self += value.clone() * weight;
    }
}

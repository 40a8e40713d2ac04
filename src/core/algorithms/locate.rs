//! Point location by directed walking.
//!
//! Starting from a hint tetrahedron, the walk evaluates the barycentric (or
//! extrapolation) weights of the query position and steps across the face
//! opposite the most negative weight until every weight is non-negative.
//!
//! The same walk drives seed location during insertion and queries on the
//! finished mesh; only the weight and neighbor lookups differ.
//!
//! # References
//!
//! - O. Devillers, S. Pion, and M. Teillaud, "Walking in a Triangulation",
//!   International Journal of Foundations of Computer Science, 2001.

use nalgebra::Vector4;

use crate::geometry::predicates::{WEIGHT_TOLERANCE, is_inside, most_negative_component};

/// Result of point location.
///
/// A result with `converged == false` stopped at the step cap or at a face without
/// neighbor. Its weights belong to the last visited tetrahedron and should be
/// treated as an approximation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterpolationFactors {
    /// Tetrahedron the walk ended in.
    pub tetrahedron: usize,
    /// Weights of the tetrahedron's vertices.
    pub weights: Vector4<f32>,
    /// Whether all weights are non-negative.
    pub converged: bool,
}

/// Walk from `start` toward the tetrahedron whose weights are all non-negative.
///
/// # Arguments
///
/// * `start` - First tetrahedron visited.
/// * `max_steps` - Maximal number of tetrahedra crossed, usually the tetrahedron count.
/// * `weights` - Weights of the query position in a tetrahedron.
/// * `neighbor` - Neighbor of a tetrahedron across a face.
///
/// # Returns
///
/// The last visited tetrahedron with its weights.
pub fn directed_walk<W, N>(start: usize, max_steps: usize, mut weights: W, mut neighbor: N) -> InterpolationFactors
where
    W: FnMut(usize) -> Vector4<f32>,
    N: FnMut(usize, usize) -> Option<usize>,
{
    let mut current = start;
    let mut current_weights = weights(current);
    for _ in 0..max_steps {
        if is_inside(&current_weights, WEIGHT_TOLERANCE) {
            return InterpolationFactors {
                tetrahedron: current,
                weights: current_weights,
                converged: true,
            };
        }
        let face = most_negative_component(&current_weights);
        let Some(next) = neighbor(current, face) else {
            break;
        };
        current = next;
        current_weights = weights(current);
    }

    InterpolationFactors {
        tetrahedron: current,
        weights: current_weights,
        converged: is_inside(&current_weights, WEIGHT_TOLERANCE),
    }
}

/// First tetrahedron among `candidates` whose weights are all non-negative.
///
/// Used when a walk stops without converging, for instance after circling between
/// outer tetrahedra whose extrapolation regions overlap.
pub fn scan_for_containing<I, W>(candidates: I, mut weights: W) -> Option<InterpolationFactors>
where
    I: IntoIterator<Item = usize>,
    W: FnMut(usize) -> Vector4<f32>,
{
    candidates.into_iter().find_map(|tetrahedron| {
        let weights = weights(tetrahedron);
        is_inside(&weights, WEIGHT_TOLERANCE).then_some(InterpolationFactors {
            tetrahedron,
            weights,
            converged: true,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cells along a line: cell `i` covers `[i, i + 1]`, face 0 leads right, face 1 leads left.
    fn line_weights(position: f32) -> impl Fn(usize) -> Vector4<f32> {
        move |cell| {
            let offset = position - cell as f32;
            Vector4::new(1.0 - offset, offset, 0.5, 0.5)
        }
    }

    fn line_neighbor(len: usize) -> impl Fn(usize, usize) -> Option<usize> {
        move |cell, face| match face {
            0 if cell + 1 < len => Some(cell + 1),
            1 if cell > 0 => Some(cell - 1),
            _ => None,
        }
    }

    #[test]
    fn walk_reaches_containing_cell() {
        let result = directed_walk(0, 10, line_weights(6.5), line_neighbor(10));
        assert!(result.converged);
        assert_eq!(result.tetrahedron, 6);

        let back = directed_walk(9, 10, line_weights(2.25), line_neighbor(10));
        assert!(back.converged);
        assert_eq!(back.tetrahedron, 2);
    }

    #[test]
    fn walk_stops_at_missing_neighbor() {
        let result = directed_walk(0, 100, line_weights(12.0), line_neighbor(10));
        assert!(!result.converged);
        assert_eq!(result.tetrahedron, 9);
    }

    #[test]
    fn walk_respects_step_cap() {
        let result = directed_walk(0, 3, line_weights(8.5), line_neighbor(10));
        assert!(!result.converged);
        assert_eq!(result.tetrahedron, 3);
    }

    #[test]
    fn scan_finds_containing_cell() {
        let found = scan_for_containing(0..10, line_weights(4.75)).unwrap();
        assert_eq!(found.tetrahedron, 4);
        assert!(found.converged);
        assert!(scan_for_containing(0..10, line_weights(12.0)).is_none());
    }
}

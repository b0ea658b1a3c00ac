//! Geometry of a search direction against box bounds.
//!
//! These are free functions over explicit bound vectors. A coordinate closer
//! than `eps` to a bound is treated as sitting exactly on it.

use qnstep_core::types::{DVector, Scalar};

/// Split of coordinates into movable and pinned ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSet {
    /// Coordinates free to move along the direction
    pub active: Vec<usize>,
    /// Coordinates whose direction would immediately cross a bound
    pub inactive: Vec<usize>,
}

impl ActiveSet {
    /// Sets every inactive coordinate of `v` to zero.
    pub fn zero_inactive<T: Scalar>(&self, v: &mut DVector<T>) {
        for &i in &self.inactive {
            v[i] = T::zero();
        }
    }
}

/// Partitions coordinates and pins the ones that cannot move.
///
/// Coordinate `i` is inactive when it sits on its lower bound and
/// `direction[i] < 0`, or on its upper bound and `direction[i] > 0`.
/// Inactive entries of `direction` are set to zero.
pub fn partition_active<T: Scalar>(
    point: &DVector<T>,
    direction: &mut DVector<T>,
    lower: &DVector<T>,
    upper: &DVector<T>,
    eps: T,
) -> ActiveSet {
    let mut set = ActiveSet::default();
    for i in 0..point.len() {
        let x = point[i];
        let d = direction[i];
        if (lower[i] > x - eps && d < T::zero()) || (upper[i] < x + eps && d > T::zero()) {
            direction[i] = T::zero();
            set.inactive.push(i);
        } else {
            set.active.push(i);
        }
    }
    set
}

/// Checks that `point + step` stays inside the box on the active coordinates.
///
/// The test keeps a margin of `eps` to both bounds.
pub fn is_step_feasible<T: Scalar>(
    point: &DVector<T>,
    step: &DVector<T>,
    lower: &DVector<T>,
    upper: &DVector<T>,
    active: &[usize],
    eps: T,
) -> bool {
    active.iter().all(|&i| {
        lower[i] <= point[i] - eps + step[i] && upper[i] >= point[i] + eps + step[i]
    })
}

/// Largest `alpha` in `[0, 1]` keeping `origin + alpha * direction` in the box.
///
/// Only active coordinates with a nonzero direction component are clipped.
/// For each of them the bound ahead of the ray gives the candidate
/// `(bound - origin[i]) / direction[i]`; a ray already on or past that bound
/// yields zero.
pub fn max_feasible_step<T: Scalar>(
    origin: &DVector<T>,
    direction: &DVector<T>,
    lower: &DVector<T>,
    upper: &DVector<T>,
    active: &[usize],
) -> T {
    let mut alpha = T::one();
    for &i in active {
        let d = direction[i];
        if d == T::zero() {
            continue;
        }
        let bound = if d > T::zero() { upper[i] } else { lower[i] };
        let candidate = (bound - origin[i]) / d;
        if candidate < alpha {
            alpha = if candidate > T::zero() {
                candidate
            } else {
                T::zero()
            };
        }
    }
    alpha
}

//! Search directions from an L-BFGS history.
//!
//! Two computers share the history:
//!
//! - [`unconstrained_direction`]: the quasi-Newton direction `-H g`.
//! - [`box_constrained_direction`]: a direction that keeps `x + d` inside
//!   `[l, u]`. It tries the quasi-Newton step on the free coordinates first,
//!   falls back to the clipped Cauchy point, and otherwise bends from the
//!   Cauchy point towards the quasi-Newton step (dogleg).

use crate::{
    bounds::{is_step_feasible, max_feasible_step, partition_active},
    history::LBFGSHistory,
};
use num_traits::Float;
use qnstep_core::{
    error::{DirectionError, Result},
    types::{DVector, Scalar},
};
use tracing::debug;

/// How a search direction was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionKind {
    /// `-H g` without constraints
    Unconstrained,
    /// `-H g` restricted to the free coordinates, feasible as is
    QuasiNewton,
    /// Steepest-descent step scaled by curvature, clipped to the box
    Cauchy,
    /// Cauchy point followed by a clipped move towards the quasi-Newton step
    Dogleg,
    /// Every coordinate is pinned or the gradient vanishes
    Stationary,
}

/// A search direction together with the branch that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDirection<T: Scalar> {
    /// The direction vector
    pub direction: DVector<T>,
    /// Branch that produced it
    pub kind: DirectionKind,
}

/// Computes `-H g`.
pub fn unconstrained_direction<T: Scalar>(
    history: &LBFGSHistory<T>,
    derivative: &DVector<T>,
) -> DVector<T> {
    let mut direction = -derivative;
    history.inverse_hessian().apply_mut(&mut direction);
    direction
}

/// Computes a direction `d` with `lower <= point + d <= upper`.
///
/// `eps` is the distance below which a coordinate counts as sitting on its
/// bound. `lower <= upper` is a precondition.
///
/// # Errors
///
/// Returns `DimensionMismatch` if the vectors do not share a dimension.
pub fn box_constrained_direction<T: Scalar>(
    history: &LBFGSHistory<T>,
    point: &DVector<T>,
    derivative: &DVector<T>,
    lower: &DVector<T>,
    upper: &DVector<T>,
    eps: T,
) -> Result<SearchDirection<T>> {
    let n = point.len();
    for len in [derivative.len(), lower.len(), upper.len()] {
        if len != n {
            return Err(DirectionError::dimension_mismatch(n, len));
        }
    }

    let mut p0 = -derivative;
    let set = partition_active(point, &mut p0, lower, upper, eps);

    if p0.iter().all(|&c| c == T::zero()) {
        return Ok(SearchDirection {
            direction: DVector::zeros(n),
            kind: DirectionKind::Stationary,
        });
    }

    let mut step = history.apply_inverse(&p0);
    set.zero_inactive(&mut step);

    if is_step_feasible(point, &step, lower, upper, &set.active, eps) {
        return Ok(SearchDirection {
            direction: step,
            kind: DirectionKind::QuasiNewton,
        });
    }

    let compact = history.compact_hessian();
    let curvature = compact.curvature_along(&p0);
    let cauchy = &p0 / curvature;

    // p0^T B p0 underflows for tiny gradients; clip p0 itself instead.
    if !(curvature > T::zero()) || !cauchy.iter().all(|&c| <T as Float>::is_finite(c)) {
        debug!(
            curvature = Scalar::to_f64(curvature),
            "degenerate curvature along projected gradient, clipping it directly"
        );
        let alpha = max_feasible_step(point, &p0, lower, upper, &set.active);
        return Ok(SearchDirection {
            direction: p0 * alpha,
            kind: DirectionKind::Cauchy,
        });
    }

    let alpha = max_feasible_step(point, &cauchy, lower, upper, &set.active);
    if alpha < T::one() {
        return Ok(SearchDirection {
            direction: cauchy * alpha,
            kind: DirectionKind::Cauchy,
        });
    }

    let cauchy_point = point + &cauchy;
    let dogleg = &step - &cauchy;
    let alpha = max_feasible_step(&cauchy_point, &dogleg, lower, upper, &set.active);

    let mut direction = cauchy;
    direction.axpy(alpha, &dogleg, T::one());
    Ok(SearchDirection {
        direction,
        kind: DirectionKind::Dogleg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn v(values: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(values)
    }

    fn inside(x: &DVector<f64>, d: &DVector<f64>, l: &DVector<f64>, u: &DVector<f64>) -> bool {
        (0..x.len()).all(|i| x[i] + d[i] >= l[i] - 1e-12 && x[i] + d[i] <= u[i] + 1e-12)
    }

    #[test]
    fn test_steepest_descent_without_history() {
        let history = LBFGSHistory::<f64>::new(5);
        let d = unconstrained_direction(&history, &v(&[2.0, -3.0]));
        assert_eq!(d, v(&[-2.0, 3.0]));
    }

    #[test]
    fn test_interior_point_takes_quasi_newton_step() {
        let history = LBFGSHistory::<f64>::new(5);
        let x = v(&[0.0, 0.0]);
        let g = v(&[0.5, -0.5]);
        let lower = v(&[-1.0, -1.0]);
        let upper = v(&[1.0, 1.0]);

        let result = box_constrained_direction(&history, &x, &g, &lower, &upper, 1e-13).unwrap();
        assert_eq!(result.kind, DirectionKind::QuasiNewton);
        assert_eq!(result.direction, v(&[-0.5, 0.5]));
    }

    #[test]
    fn test_pinned_coordinate_does_not_move() {
        let history = LBFGSHistory::<f64>::new(5);
        // Coordinate 0 sits on its upper bound and the gradient pushes it up.
        let x = v(&[1.0, 0.0]);
        let g = v(&[-2.0, 0.25]);
        let lower = v(&[-1.0, -1.0]);
        let upper = v(&[1.0, 1.0]);

        let result = box_constrained_direction(&history, &x, &g, &lower, &upper, 1e-13).unwrap();
        assert_eq!(result.kind, DirectionKind::QuasiNewton);
        assert_eq!(result.direction[0], 0.0);
        assert_eq!(result.direction[1], -0.25);
    }

    #[test]
    fn test_cauchy_branch_is_clipped() {
        let history = LBFGSHistory::<f64>::new(5);
        // Identity model: cauchy = p0 / |p0|^2 = [2, 0] / 4 = [0.5, 0].
        let x = v(&[0.0, 0.0]);
        let g = v(&[-2.0, 0.0]);
        let lower = v(&[-1.0, -1.0]);
        let upper = v(&[0.25, 1.0]);

        let result = box_constrained_direction(&history, &x, &g, &lower, &upper, 1e-13).unwrap();
        assert_eq!(result.kind, DirectionKind::Cauchy);
        assert_relative_eq!(result.direction, v(&[0.25, 0.0]), epsilon = 1e-15);
    }

    #[test]
    fn test_dogleg_branch() {
        let history = LBFGSHistory::<f64>::new(5);
        // Identity model: step = [2, 0] overshoots u = 1, cauchy = [0.5, 0]
        // is feasible, so the dogleg stops on the bound.
        let x = v(&[0.0, 0.0]);
        let g = v(&[-2.0, 0.0]);
        let lower = v(&[-1.0, -1.0]);
        let upper = v(&[1.0, 1.0]);

        let result = box_constrained_direction(&history, &x, &g, &lower, &upper, 1e-13).unwrap();
        assert_eq!(result.kind, DirectionKind::Dogleg);
        assert_relative_eq!(result.direction, v(&[1.0, 0.0]), epsilon = 1e-15);
        assert!(inside(&x, &result.direction, &lower, &upper));
    }

    #[test]
    fn test_stationary_when_everything_is_pinned() {
        let mut history = LBFGSHistory::<f64>::new(5);
        history.admit(v(&[2.0, 1.0]), v(&[1.0, 1.0])).unwrap();
        let x = v(&[0.0, 1.0]);
        let g = v(&[3.0, -1.0]);
        let lower = v(&[0.0, 0.0]);
        let upper = v(&[1.0, 1.0]);

        let result = box_constrained_direction(&history, &x, &g, &lower, &upper, 1e-13).unwrap();
        assert_eq!(result.kind, DirectionKind::Stationary);
        assert_eq!(result.direction, v(&[0.0, 0.0]));
    }

    #[test]
    fn test_underflowing_curvature_at_bound() {
        let history = LBFGSHistory::<f64>::new(5);
        // p0^T p0 = 1e-340 underflows to zero; the lower bound forces a fallback.
        let x = v(&[0.0]);
        let g = v(&[-1e-170]);
        let lower = v(&[0.0]);
        let upper = v(&[1.0]);

        let result = box_constrained_direction(&history, &x, &g, &lower, &upper, 1e-13).unwrap();
        assert_eq!(result.kind, DirectionKind::Cauchy);
        assert!(result.direction.iter().all(|c| c.is_finite()));
        assert_eq!(result.direction, v(&[1e-170]));
        assert!(inside(&x, &result.direction, &lower, &upper));
    }

    #[test]
    fn test_dimension_mismatch() {
        let history = LBFGSHistory::<f64>::new(5);
        let result = box_constrained_direction(
            &history,
            &v(&[0.0, 0.0]),
            &v(&[1.0, 1.0]),
            &v(&[0.0]),
            &v(&[1.0, 1.0]),
            1e-13,
        );
        assert!(matches!(result, Err(DirectionError::DimensionMismatch { .. })));
    }
}

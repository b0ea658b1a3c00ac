//! Test utilities for quasi-Newton direction computations.
//!
//! This module provides seeded random fixtures, dense reference
//! implementations of the BFGS updates, and small objectives used by the
//! tests and benchmarks of the workspace.

#![cfg(any(test, feature = "test-utils"))]

use crate::{
    objective::{BoxConstraints, ConstraintHandler, Objective},
    types::{DMatrix, DVector},
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Creates a deterministic random number generator.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Draws a vector with entries uniform in `[-scale, scale]`.
pub fn random_vector(rng: &mut impl Rng, n: usize, scale: f64) -> DVector<f64> {
    DVector::from_fn(n, |_, _| rng.gen_range(-scale..=scale))
}

/// Draws a symmetric positive definite matrix `Q^T Q + n I`.
pub fn random_spd_matrix(rng: &mut impl Rng, n: usize) -> DMatrix<f64> {
    let q = DMatrix::from_fn(n, n, |_, _| rng.gen_range(-1.0..=1.0));
    q.transpose() * &q + DMatrix::identity(n, n) * (n as f64)
}

/// Draws `count` (step, gradient difference) pairs with `y = M s`.
///
/// With `M` positive definite every pair satisfies the curvature condition.
pub fn random_curvature_pairs(
    rng: &mut impl Rng,
    n: usize,
    count: usize,
) -> Vec<(DVector<f64>, DVector<f64>)> {
    let m = random_spd_matrix(&mut *rng, n);
    (0..count)
        .map(|_| {
            let s = random_vector(&mut *rng, n, 1.0);
            let y = &m * &s;
            (s, y)
        })
        .collect()
}

/// Dense inverse-Hessian BFGS approximation built from `pairs`.
///
/// Starts at `H0 = I / diagonal_scale` and applies
/// `H <- (I - rho s y^T) H (I - rho y s^T) + rho s s^T` oldest first.
pub fn dense_inverse_bfgs(
    pairs: &[(DVector<f64>, DVector<f64>)],
    diagonal_scale: f64,
    n: usize,
) -> DMatrix<f64> {
    let identity = DMatrix::<f64>::identity(n, n);
    let mut h = &identity / diagonal_scale;
    for (s, y) in pairs {
        let rho = 1.0 / y.dot(s);
        let left = &identity - (s * y.transpose()) * rho;
        let right = &identity - (y * s.transpose()) * rho;
        h = &left * &h * &right + (s * s.transpose()) * rho;
    }
    h
}

/// Dense direct-Hessian BFGS approximation built from `pairs`.
///
/// Starts at `B0 = diagonal_scale * I` and applies
/// `B <- B - B s s^T B / (s^T B s) + y y^T / (y^T s)` oldest first.
pub fn dense_forward_bfgs(
    pairs: &[(DVector<f64>, DVector<f64>)],
    diagonal_scale: f64,
    n: usize,
) -> DMatrix<f64> {
    let mut b = DMatrix::<f64>::identity(n, n) * diagonal_scale;
    for (s, y) in pairs {
        let bs = &b * s;
        let sbs = s.dot(&bs);
        b = &b - (&bs * bs.transpose()) / sbs + (y * y.transpose()) / y.dot(s);
    }
    b
}

/// Draws a random box together with a point inside it.
///
/// Roughly one coordinate in four is placed exactly on one of its bounds.
pub fn random_box_and_point(
    rng: &mut impl Rng,
    n: usize,
) -> (BoxConstraints<f64>, DVector<f64>) {
    let mut lower = DVector::zeros(n);
    let mut upper = DVector::zeros(n);
    let mut point = DVector::zeros(n);
    for i in 0..n {
        let l: f64 = rng.gen_range(-5.0..=0.0);
        let u = l + rng.gen_range(0.1..=5.0);
        lower[i] = l;
        upper[i] = u;
        point[i] = match rng.gen_range(0..8) {
            0 => l,
            1 => u,
            _ => rng.gen_range(l..=u),
        };
    }
    let bounds = BoxConstraints::new(lower, upper).expect("generated bounds are ordered");
    (bounds, point)
}

/// Quadratic objective `0.5 x^T A x - b^T x` without constraints.
#[derive(Debug, Clone)]
pub struct QuadraticObjective {
    /// Positive definite system matrix
    pub a: DMatrix<f64>,
    /// Linear term
    pub b: DVector<f64>,
}

impl QuadraticObjective {
    /// Creates a quadratic objective.
    pub fn new(a: DMatrix<f64>, b: DVector<f64>) -> Self {
        Self { a, b }
    }

    /// Objective value.
    pub fn value(&self, x: &DVector<f64>) -> f64 {
        0.5 * x.dot(&(&self.a * x)) - self.b.dot(x)
    }

    /// Objective gradient `A x - b`.
    pub fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        &self.a * x - &self.b
    }
}

impl Objective<f64> for QuadraticObjective {}

/// Quadratic objective restricted to a box.
#[derive(Debug, Clone)]
pub struct BoxedQuadratic {
    /// Unconstrained quadratic
    pub quadratic: QuadraticObjective,
    /// Feasible box
    pub bounds: BoxConstraints<f64>,
}

impl BoxedQuadratic {
    /// Creates a box-constrained quadratic objective.
    pub fn new(quadratic: QuadraticObjective, bounds: BoxConstraints<f64>) -> Self {
        Self { quadratic, bounds }
    }
}

impl Objective<f64> for BoxedQuadratic {
    fn constraint_handler(&self) -> Option<&dyn ConstraintHandler<f64>> {
        Some(&self.bounds)
    }
}

/// Constraint handler that is not a box (a Euclidean ball).
#[derive(Debug, Clone)]
pub struct BallConstraint {
    /// Ball radius around the origin
    pub radius: f64,
}

impl ConstraintHandler<f64> for BallConstraint {
    fn box_bounds(&self) -> Option<(&DVector<f64>, &DVector<f64>)> {
        None
    }

    fn is_feasible(&self, point: &DVector<f64>) -> bool {
        point.norm() <= self.radius
    }
}

/// Objective constrained to a ball, which the box path cannot handle.
#[derive(Debug, Clone)]
pub struct BallObjective {
    /// The ball constraint
    pub ball: BallConstraint,
}

impl Objective<f64> for BallObjective {
    fn constraint_handler(&self) -> Option<&dyn ConstraintHandler<f64>> {
        Some(&self.ball)
    }
}

/// Objective that claims to be constrained but exposes no handler.
#[derive(Debug, Clone, Copy)]
pub struct HandlerlessObjective;

impl Objective<f64> for HandlerlessObjective {
    fn is_constrained(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_references_are_inverse() {
        let mut rng = seeded_rng(7);
        let pairs = random_curvature_pairs(&mut rng, 4, 3);
        let (s, y) = pairs.last().unwrap();
        let bdiag = y.dot(y) / y.dot(s);

        let h = dense_inverse_bfgs(&pairs, bdiag, 4);
        let b = dense_forward_bfgs(&pairs, bdiag, 4);
        let product = &h * &b;
        let err = (product - DMatrix::<f64>::identity(4, 4)).norm();
        assert!(err < 1e-8, "H * B deviates from identity by {}", err);
    }

    #[test]
    fn test_random_box_contains_point() {
        let mut rng = seeded_rng(11);
        for _ in 0..20 {
            let (bounds, x) = random_box_and_point(&mut rng, 6);
            assert!(bounds.is_feasible(&x));
        }
    }

    #[test]
    fn test_quadratic_gradient() {
        let a = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 4.0]));
        let q = QuadraticObjective::new(a, DVector::from_vec(vec![2.0, 4.0]));
        let x = DVector::from_vec(vec![1.0, 1.0]);
        assert_eq!(q.gradient(&x), DVector::from_vec(vec![0.0, 0.0]));
        assert_eq!(q.value(&x), -3.0);
    }
}

//! L-BFGS search-direction engine.
//!
//! L-BFGS (Limited-memory Broyden-Fletcher-Goldfarb-Shanno) approximates the
//! inverse Hessian from a short history of steps and gradient differences.
//! This engine produces one search direction per outer iteration; the line
//! search, the stopping test and the objective evaluation belong to the
//! caller.
//!
//! # Algorithm Overview
//!
//! On every call to [`LBFGS::compute_direction`]:
//! 1. Form `s = x_k - x_{k-1}` and `y = g_k - g_{k-1}` and offer them to the
//!    history (skipped unless `<y, s>` exceeds the curvature threshold)
//! 2. Without constraints, return `-H g_k` (two-loop recursion)
//! 3. With box constraints, pin coordinates that would cross a bound, try the
//!    quasi-Newton step, then the clipped Cauchy point, then the dogleg step
//! 4. Check that `x_k + d` is feasible
//!
//! # Key Features
//!
//! - **Limited memory**: only `m` vector pairs are stored (typically 5-20)
//! - **Automatic scaling**: initial Hessian `bdiag * I` from the newest pair
//! - **Curvature safeguard**: pairs violating `<y, s> > threshold` are skipped
//! - **Box constraints**: the direction is feasible before any line search
//!
//! # References
//!
//! - Nocedal & Wright, "Numerical Optimization" (2006)
//! - Byrd, Lu, Nocedal & Zhu, "A limited memory algorithm for bound
//!   constrained optimization" (1995)

use crate::{
    direction::{box_constrained_direction, unconstrained_direction, DirectionKind},
    history::{HistorySnapshot, LBFGSHistory},
};
use qnstep_core::{
    error::{DirectionError, Result},
    objective::Objective,
    types::{constants::DEFAULT_MEMORY_SIZE, DVector, Scalar},
};
use std::collections::HashMap;
use tracing::trace;

/// Configuration for the L-BFGS engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LBFGSConfig<T: Scalar> {
    /// Number of vector pairs to store (typically 5-20)
    pub memory_size: usize,
    /// Pairs with `<y, s>` at or below this value are not stored
    pub curvature_threshold: T,
    /// Distance below which a coordinate counts as sitting on its bound
    pub bound_tolerance: T,
}

impl<T: Scalar> Default for LBFGSConfig<T> {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            curvature_threshold: T::CURVATURE_THRESHOLD,
            bound_tolerance: T::BOUND_TOLERANCE,
        }
    }
}

impl<T: Scalar> LBFGSConfig<T> {
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the memory size (number of vector pairs to store).
    pub fn with_memory_size(mut self, size: usize) -> Self {
        self.memory_size = size;
        self
    }

    /// Sets the curvature threshold for history updates.
    pub fn with_curvature_threshold(mut self, threshold: T) -> Self {
        self.curvature_threshold = threshold;
        self
    }

    /// Sets the bound tolerance of the box-constrained path.
    pub fn with_bound_tolerance(mut self, tolerance: T) -> Self {
        self.bound_tolerance = tolerance;
        self
    }

    /// Checks that the parameters are usable.
    pub fn validate(&self) -> Result<()> {
        if self.memory_size == 0 {
            return Err(DirectionError::invalid_configuration(
                "must be at least 1",
                "memory_size",
                "0",
            ));
        }
        if !(self.curvature_threshold > T::zero()) {
            return Err(DirectionError::invalid_configuration(
                "must be positive",
                "curvature_threshold",
                self.curvature_threshold.to_string(),
            ));
        }
        if !(self.bound_tolerance >= T::zero()) {
            return Err(DirectionError::invalid_configuration(
                "must be non-negative",
                "bound_tolerance",
                self.bound_tolerance.to_string(),
            ));
        }
        Ok(())
    }
}

/// L-BFGS search-direction engine.
///
/// # Examples
///
/// ```rust
/// use qnstep_optim::{LBFGS, LBFGSConfig};
/// use qnstep_core::prelude::*;
///
/// #[derive(Debug)]
/// struct Free;
/// impl Objective<f64> for Free {}
///
/// let mut lbfgs = LBFGS::new(LBFGSConfig::new().with_memory_size(5)).unwrap();
///
/// let x0 = DVector::from_vec(vec![1.0, 1.0]);
/// let g0 = DVector::from_vec(vec![2.0, -3.0]);
/// let d = lbfgs.compute_direction(&g0, &g0, &x0, &x0, &Free).unwrap();
/// assert_eq!(d, DVector::from_vec(vec![-2.0, 3.0]));
/// ```
#[derive(Debug, Clone)]
pub struct LBFGS<T: Scalar> {
    config: LBFGSConfig<T>,
    history: LBFGSHistory<T>,
    last_kind: Option<DirectionKind>,
}

impl<T: Scalar> LBFGS<T> {
    /// Creates a new engine with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the configuration does not validate.
    pub fn new(config: LBFGSConfig<T>) -> Result<Self> {
        config.validate()?;
        let history = Self::fresh_history(&config);
        Ok(Self {
            config,
            history,
            last_kind: None,
        })
    }

    /// Creates a new engine with default configuration.
    pub fn with_default_config() -> Self {
        let config = LBFGSConfig::default();
        let history = Self::fresh_history(&config);
        Self {
            config,
            history,
            last_kind: None,
        }
    }

    fn fresh_history(config: &LBFGSConfig<T>) -> LBFGSHistory<T> {
        LBFGSHistory::new(config.memory_size).with_curvature_threshold(config.curvature_threshold)
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &LBFGSConfig<T> {
        &self.config
    }

    /// Returns the engine name.
    pub fn name(&self) -> &str {
        "L-BFGS"
    }

    /// Returns the curvature history.
    pub fn history(&self) -> &LBFGSHistory<T> {
        &self.history
    }

    /// Branch taken by the most recent direction computation.
    pub fn last_direction_kind(&self) -> Option<DirectionKind> {
        self.last_kind
    }

    /// Drops all stored pairs and restores the initial diagonal scale.
    pub fn reset_history(&mut self) {
        self.history = Self::fresh_history(&self.config);
        self.last_kind = None;
    }

    /// Captures the persistent state of the engine.
    pub fn snapshot(&self) -> HistorySnapshot<T> {
        self.history.snapshot()
    }

    /// Restores state captured by [`snapshot`](Self::snapshot).
    ///
    /// The stored capacity replaces the configured memory size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSnapshot` if the snapshot is inconsistent; the engine
    /// is left unchanged in that case.
    pub fn restore(&mut self, snapshot: HistorySnapshot<T>) -> Result<()> {
        let history = LBFGSHistory::from_snapshot(snapshot, self.config.curvature_threshold)?;
        self.config.memory_size = history.capacity();
        self.history = history;
        self.last_kind = None;
        Ok(())
    }

    /// Returns a summary of the engine state as key-value pairs.
    pub fn summary(&self) -> HashMap<String, String> {
        let mut summary = self.history.summary();
        if let Some(kind) = self.last_kind {
            summary.insert("last_direction".to_string(), format!("{:?}", kind));
        }
        summary
    }

    /// Updates the history and computes the next search direction.
    ///
    /// # Arguments
    ///
    /// * `derivative` - Gradient at `best_point`
    /// * `last_derivative` - Gradient at `last_point`
    /// * `best_point` - Current iterate
    /// * `last_point` - Previous iterate
    /// * `objective` - Reports constraints and checks feasibility
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if the vectors, bounds or stored history differ
    ///   in dimension
    /// - `UnsupportedConstraint` if the objective is constrained but has no
    ///   box-shaped constraint handler
    /// - `InternalInfeasibility` if `best_point + direction` is rejected by
    ///   the objective
    pub fn compute_direction<O>(
        &mut self,
        derivative: &DVector<T>,
        last_derivative: &DVector<T>,
        best_point: &DVector<T>,
        last_point: &DVector<T>,
        objective: &O,
    ) -> Result<DVector<T>>
    where
        O: Objective<T> + ?Sized,
    {
        let n = derivative.len();
        for len in [last_derivative.len(), best_point.len(), last_point.len()] {
            if len != n {
                return Err(DirectionError::dimension_mismatch(n, len));
            }
        }

        let bounds = if objective.is_constrained() {
            let handler = objective.constraint_handler().ok_or_else(|| {
                DirectionError::unsupported_constraint(
                    "objective is constrained but has no constraint handler",
                )
            })?;
            let (lower, upper) = handler.box_bounds().ok_or_else(|| {
                DirectionError::unsupported_constraint(
                    "L-BFGS only supports box constraints via a constraint handler",
                )
            })?;
            for len in [lower.len(), upper.len()] {
                if len != n {
                    return Err(DirectionError::dimension_mismatch(n, len));
                }
            }
            Some((lower, upper))
        } else {
            None
        };

        let y = derivative - last_derivative;
        let s = best_point - last_point;
        self.history.admit(y, s)?;

        let (direction, kind) = match bounds {
            Some((lower, upper)) => {
                let result = box_constrained_direction(
                    &self.history,
                    best_point,
                    derivative,
                    lower,
                    upper,
                    self.config.bound_tolerance,
                )?;

                let candidate = best_point + &result.direction;
                if !objective.is_feasible(&candidate) {
                    return Err(DirectionError::internal_infeasibility(format!(
                        "{:?} direction leaves the feasible box",
                        result.kind
                    )));
                }
                (result.direction, result.kind)
            }
            None => (
                unconstrained_direction(&self.history, derivative),
                DirectionKind::Unconstrained,
            ),
        };

        trace!(
            kind = ?kind,
            stored_pairs = self.history.len(),
            "computed search direction"
        );
        self.last_kind = Some(kind);
        Ok(direction)
    }
}

impl<T: Scalar> Default for LBFGS<T> {
    fn default() -> Self {
        Self::with_default_config()
    }
}

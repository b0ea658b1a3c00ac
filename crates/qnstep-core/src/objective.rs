//! Objective and constraint interfaces consumed by the direction engine.
//!
//! The engine never evaluates the objective. It only asks whether the
//! objective is constrained, fetches box bounds from its constraint handler,
//! and checks feasibility of the resulting point as a post-condition.
//!
//! # Design Philosophy
//!
//! Bounds are reported through a capability (`ConstraintHandler::box_bounds`)
//! rather than through a handler hierarchy: any type that can hand out a
//! lower and an upper vector can drive the box-constrained path.

use crate::{
    error::{DirectionError, Result},
    types::{DVector, Scalar},
};
use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Constraint handler attached to an objective.
pub trait ConstraintHandler<T: Scalar>: Debug {
    /// Returns the `(lower, upper)` bounds when the constraints are a box.
    ///
    /// Handlers describing any other kind of constraint return `None`.
    fn box_bounds(&self) -> Option<(&DVector<T>, &DVector<T>)>;

    /// Returns true if the constraints are box constraints.
    fn is_box_constrained(&self) -> bool {
        self.box_bounds().is_some()
    }

    /// Checks whether a point satisfies the constraints.
    fn is_feasible(&self, point: &DVector<T>) -> bool;
}

/// Objective function as seen by the direction engine.
pub trait Objective<T: Scalar>: Debug {
    /// Returns the constraint handler, if the objective has one.
    fn constraint_handler(&self) -> Option<&dyn ConstraintHandler<T>> {
        None
    }

    /// Returns true if the search space is constrained.
    ///
    /// # Default Implementation
    ///
    /// An objective is constrained exactly when it exposes a handler.
    fn is_constrained(&self) -> bool {
        self.constraint_handler().is_some()
    }

    /// Checks whether a point lies in the feasible region.
    ///
    /// # Default Implementation
    ///
    /// Delegates to the constraint handler; unconstrained objectives accept
    /// every point.
    fn is_feasible(&self, point: &DVector<T>) -> bool {
        self.constraint_handler()
            .map_or(true, |handler| handler.is_feasible(point))
    }
}

/// Per-coordinate box constraints `lower <= x <= upper`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))
)]
pub struct BoxConstraints<T: Scalar> {
    lower: DVector<T>,
    upper: DVector<T>,
    tolerance: T,
}

impl<T: Scalar> BoxConstraints<T> {
    /// Creates box constraints from lower and upper bound vectors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBounds` if the vectors differ in length, contain NaN,
    /// or if `lower[i] > upper[i]` for some coordinate.
    pub fn new(lower: DVector<T>, upper: DVector<T>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(DirectionError::invalid_bounds(format!(
                "lower has {} coordinates but upper has {}",
                lower.len(),
                upper.len()
            )));
        }
        for (i, (l, u)) in lower.iter().zip(upper.iter()).enumerate() {
            if Float::is_nan(*l) || Float::is_nan(*u) {
                return Err(DirectionError::invalid_bounds(format!(
                    "NaN bound at index {}",
                    i
                )));
            }
            if l > u {
                return Err(DirectionError::invalid_bounds(format!(
                    "lower > upper at index {} ({} > {})",
                    i, l, u
                )));
            }
        }
        Ok(Self {
            lower,
            upper,
            tolerance: T::FEASIBILITY_TOLERANCE,
        })
    }

    /// Creates `(-inf, +inf)` bounds for an `n`-dimensional space.
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: DVector::from_element(n, <T as Float>::neg_infinity()),
            upper: DVector::from_element(n, <T as Float>::infinity()),
            tolerance: T::FEASIBILITY_TOLERANCE,
        }
    }

    /// Sets the slack used by [`ConstraintHandler::is_feasible`].
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Lower bounds.
    pub fn lower(&self) -> &DVector<T> {
        &self.lower
    }

    /// Upper bounds.
    pub fn upper(&self) -> &DVector<T> {
        &self.upper
    }

    /// Number of coordinates.
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// Projects a point onto the box.
    pub fn project(&self, point: &DVector<T>) -> DVector<T> {
        point.zip_zip_map(&self.lower, &self.upper, |x, l, u| {
            <T as Float>::min(<T as Float>::max(x, l), u)
        })
    }
}

impl<T: Scalar> ConstraintHandler<T> for BoxConstraints<T> {
    fn box_bounds(&self) -> Option<(&DVector<T>, &DVector<T>)> {
        Some((&self.lower, &self.upper))
    }

    fn is_feasible(&self, point: &DVector<T>) -> bool {
        point.len() == self.lower.len()
            && point
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&x, (&l, &u))| x >= l - self.tolerance && x <= u + self.tolerance)
    }
}

//! Type definitions and aliases for quasi-Newton direction computations.
//!
//! This module provides the scalar trait shared by every crate in the
//! workspace, the dynamic vector and matrix aliases, and the numerical
//! constants the direction engine relies on.

use nalgebra::{Dyn, OMatrix, OVector, RealField, Scalar as NalgebraScalar};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Trait for scalar types used in optimization (f32 or f64).
///
/// This trait combines all the necessary numeric traits required
/// by the history, the operators and the bound geometry.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + FromPrimitive
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Default lower limit on `<y, s>` for a history pair to be admitted.
    const CURVATURE_THRESHOLD: Self;

    /// Distance below which a coordinate is considered to sit on its bound.
    const BOUND_TOLERANCE: Self;

    /// Slack allowed when checking that a point lies inside a box.
    const FEASIBILITY_TOLERANCE: Self;

    /// Convert from f64 (for constants).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails. Use `try_from_f64` for a non-panicking version.
    fn from_f64(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).expect("Failed to convert from f64")
    }

    /// Try to convert from f64.
    ///
    /// Returns None if the conversion fails.
    fn try_from_f64(v: f64) -> Option<Self> {
        <Self as FromPrimitive>::from_f64(v)
    }

    /// Convert to f64 (for logging/display).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails. Use `try_to_f64` for a non-panicking version.
    fn to_f64(self) -> f64 {
        num_traits::cast(self).expect("Failed to convert to f64")
    }

    /// Try to convert to f64.
    fn try_to_f64(self) -> Option<f64> {
        num_traits::cast(self)
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const CURVATURE_THRESHOLD: Self = 1e-6;
    const BOUND_TOLERANCE: Self = 1e-6;
    const FEASIBILITY_TOLERANCE: Self = 1e-5;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const CURVATURE_THRESHOLD: Self = 1e-10;
    const BOUND_TOLERANCE: Self = 1e-13;
    const FEASIBILITY_TOLERANCE: Self = 1e-12;
}

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;

/// Numerical constants for optimization.
pub mod constants {
    /// Default number of (step, gradient difference) pairs kept by L-BFGS.
    pub const DEFAULT_MEMORY_SIZE: usize = 10;
}

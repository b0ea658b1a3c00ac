//! Core traits and types for limited-memory quasi-Newton search directions.
//!
//! This crate provides the foundations shared by the direction engine in
//! `qnstep-optim`: the scalar abstraction, vector aliases, the error type,
//! and the objective/constraint interfaces the engine consumes.
//!
//! # Key Concepts
//!
//! - **Objective**: reports whether it is constrained and checks feasibility
//! - **Constraint handler**: exposes box bounds when the constraints are a box
//! - **Scalar**: `f32` or `f64`, with the tolerances the engine uses
//!
//! # Modules
//!
//! - [`error`]: Error types for direction computations
//! - [`objective`]: Objective and constraint-handler traits, box constraints
//! - [`types`]: Type aliases and numerical constants

#![cfg_attr(not(feature = "std"), no_std)]

pub mod error;
pub mod objective;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used items at the crate root
pub use error::{DirectionError, Result};
pub use objective::{BoxConstraints, ConstraintHandler, Objective};
pub use types::{DMatrix, DVector, Scalar};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use qnstep_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{DirectionError, Result};
    pub use crate::objective::{BoxConstraints, ConstraintHandler, Objective};
    pub use crate::types::{constants, DMatrix, DVector, Scalar};
}

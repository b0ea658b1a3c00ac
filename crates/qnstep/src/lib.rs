//! QNStep - limited-memory quasi-Newton search directions.
//!
//! This crate re-exports the workspace crates under one name:
//!
//! - [`qnstep_core`]: scalar trait, vector aliases, errors, objective interfaces
//! - [`qnstep_optim`]: curvature history, operators and the L-BFGS direction engine
//!
//! # Example
//!
//! ```rust
//! use qnstep::prelude::*;
//!
//! #[derive(Debug)]
//! struct Free;
//! impl Objective<f64> for Free {}
//!
//! let mut lbfgs = LBFGS::<f64>::with_default_config();
//! let x_prev = DVector::from_vec(vec![0.0, 0.0]);
//! let x = DVector::from_vec(vec![1.0, 0.0]);
//! let g_prev = DVector::from_vec(vec![0.0, 0.0]);
//! let g = DVector::from_vec(vec![2.0, 0.0]);
//!
//! let d = lbfgs.compute_direction(&g, &g_prev, &x, &x_prev, &Free).unwrap();
//! assert_eq!(lbfgs.history().len(), 1);
//! assert!(g.dot(&d) < 0.0);
//! ```

pub use nalgebra;
pub use qnstep_core;
pub use qnstep_optim;

pub use qnstep_core::{
    BoxConstraints, ConstraintHandler, DMatrix, DVector, DirectionError, Objective, Result,
    Scalar,
};
pub use qnstep_optim::{
    DirectionKind, HistorySnapshot, LBFGSConfig, LBFGSHistory, SearchDirection, LBFGS,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use qnstep_core::prelude::*;
    pub use qnstep_optim::{DirectionKind, HistorySnapshot, LBFGSConfig, LBFGSHistory, LBFGS};
}

//! QNStep Optimization - L-BFGS search directions with box constraints.
//!
//! This crate turns a short history of iterates and gradients into a search
//! direction. It does not run a line search or evaluate objectives; an outer
//! optimizer calls [`LBFGS::compute_direction`] once per iteration and
//! decides how far to move along the result.
//!
//! # Components
//!
//! - [`history`]: bounded FIFO of curvature pairs and the diagonal scale
//! - [`inverse`]: two-loop recursion for `H x`
//! - [`compact`]: compact form of the forward approximation `B x`
//! - [`bounds`]: active-set partition and step clipping against a box
//! - [`direction`]: unconstrained and box-constrained directions
//! - [`lbfgs`]: the engine tying them together
//!
//! # Examples
//!
//! ```rust
//! use qnstep_optim::{LBFGS, LBFGSConfig, DirectionKind};
//! use qnstep_core::prelude::*;
//!
//! #[derive(Debug)]
//! struct UnitBox(BoxConstraints<f64>);
//!
//! impl Objective<f64> for UnitBox {
//!     fn constraint_handler(&self) -> Option<&dyn ConstraintHandler<f64>> {
//!         Some(&self.0)
//!     }
//! }
//!
//! let bounds = BoxConstraints::new(
//!     DVector::from_vec(vec![0.0, 0.0]),
//!     DVector::from_vec(vec![1.0, 1.0]),
//! ).unwrap();
//! let objective = UnitBox(bounds);
//!
//! let mut lbfgs = LBFGS::new(LBFGSConfig::new().with_memory_size(5)).unwrap();
//! let x = DVector::from_vec(vec![1.0, 0.5]);
//! let g = DVector::from_vec(vec![-1.0, 0.1]);
//!
//! let d = lbfgs.compute_direction(&g, &g, &x, &x, &objective).unwrap();
//! assert_eq!(d[0], 0.0);
//! assert_eq!(lbfgs.last_direction_kind(), Some(DirectionKind::QuasiNewton));
//! ```

pub mod bounds;
pub mod compact;
pub mod direction;
pub mod history;
pub mod inverse;
pub mod lbfgs;

// Re-export main types for convenience
pub use bounds::{is_step_feasible, max_feasible_step, partition_active, ActiveSet};
pub use compact::CompactHessian;
pub use direction::{
    box_constrained_direction, unconstrained_direction, DirectionKind, SearchDirection,
};
pub use history::{HistorySnapshot, LBFGSHistory};
pub use inverse::InverseHessian;
pub use lbfgs::{LBFGSConfig, LBFGS};

// Re-export commonly used items from core
pub use qnstep_core::{
    error::{DirectionError, Result},
    objective::{BoxConstraints, ConstraintHandler, Objective},
};

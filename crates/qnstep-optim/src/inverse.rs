//! Two-loop recursion for the L-BFGS inverse Hessian approximation.
//!
//! The inverse Hessian approximation `H` implied by the stored pairs is never
//! formed. Instead `H x` is evaluated with the classical two-loop recursion:
//!
//! ```text
//! for i = m-1, ..., 0:
//!     alpha_i = rho_i * <s_i, x>
//!     x = x - alpha_i * y_i
//!
//! x = x / bdiag
//!
//! for i = 0, ..., m-1:
//!     beta = rho_i * <y_i, x>
//!     x = x + (alpha_i - beta) * s_i
//! ```
//!
//! with `rho_i = 1 / <y_i, s_i>`. Each pass costs `O(m n)`.
//!
//! # References
//!
//! - Nocedal & Wright, "Numerical Optimization" (2006), Algorithm 7.4

use crate::history::LBFGSHistory;
use qnstep_core::types::{DVector, Scalar};

/// Implicit inverse Hessian approximation of an [`LBFGSHistory`].
#[derive(Debug, Clone, Copy)]
pub struct InverseHessian<'a, T: Scalar> {
    history: &'a LBFGSHistory<T>,
}

impl<'a, T: Scalar> InverseHessian<'a, T> {
    /// Wraps a history.
    pub fn new(history: &'a LBFGSHistory<T>) -> Self {
        Self { history }
    }

    /// Overwrites `x` with `H x`.
    pub fn apply_mut(&self, x: &mut DVector<T>) {
        let m = self.history.len();
        let rho: Vec<T> = self
            .history
            .pairs()
            .map(|(s, y)| T::one() / y.dot(s))
            .collect();
        let mut alpha = vec![T::zero(); m];

        for (i, (s, y)) in self.history.pairs().enumerate().rev() {
            alpha[i] = rho[i] * s.dot(&*x);
            x.axpy(-alpha[i], y, T::one());
        }

        *x /= self.history.diagonal_scale();

        for (i, (s, y)) in self.history.pairs().enumerate() {
            let beta = rho[i] * y.dot(&*x);
            x.axpy(alpha[i] - beta, s, T::one());
        }
    }

    /// Returns `H x`.
    pub fn apply(&self, x: &DVector<T>) -> DVector<T> {
        let mut result = x.clone();
        self.apply_mut(&mut result);
        result
    }
}

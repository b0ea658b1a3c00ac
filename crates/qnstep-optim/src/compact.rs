//! Compact representation of the forward BFGS Hessian approximation.
//!
//! The box-constrained path needs curvature along a direction, `p^T B p`,
//! which requires the direct approximation `B` rather than its inverse. With
//! `B_0 = bdiag * I` and the pairs applied oldest first, `B` can be written as
//!
//! ```text
//! B = bdiag * I + sum_i y_i y_i^T / <y_i, s_i> - A^T A
//! ```
//!
//! where row `i` of `A` is `B_i s_i / sqrt(<s_i, B_i s_i>)` and `B_i` is the
//! approximation before pair `i` was applied. Each row is built from the
//! previous ones, so the factor costs `O(m^2 n)` and must be rebuilt whenever
//! the history changes.
//!
//! # References
//!
//! - Byrd, Nocedal & Schnabel, "Representations of quasi-Newton matrices and
//!   their use in limited memory methods" (1994)

use crate::history::LBFGSHistory;
use num_traits::Float;
use qnstep_core::types::{DMatrix, DVector, Scalar};

/// Forward Hessian approximation in compact form.
#[derive(Debug, Clone)]
pub struct CompactHessian<'a, T: Scalar> {
    history: &'a LBFGSHistory<T>,
    /// One row per stored pair, oldest first
    factor: DMatrix<T>,
    /// `<y_i, s_i>` for every stored pair
    curvatures: Vec<T>,
}

impl<'a, T: Scalar> CompactHessian<'a, T> {
    /// Builds the compact factor from the pairs currently in `history`.
    pub fn from_history(history: &'a LBFGSHistory<T>) -> Self {
        let m = history.len();
        let n = history.dimension().unwrap_or(0);
        let bdiag = history.diagonal_scale();
        let gradient_differences = history.gradient_differences();

        let mut factor = DMatrix::zeros(m, n);
        let mut curvatures = Vec::with_capacity(m);

        for (i, (s_i, y_i)) in history.pairs().enumerate() {
            curvatures.push(y_i.dot(s_i));

            let mut row = s_i * bdiag;
            for j in 0..i {
                let weight = gradient_differences[j].dot(s_i) / curvatures[j];
                row.axpy(weight, &gradient_differences[j], T::one());
            }
            if i > 0 {
                let previous = factor.rows(0, i);
                row -= previous.tr_mul(&(&previous * s_i));
            }
            row /= <T as Float>::sqrt(s_i.dot(&row));

            factor.set_row(i, &row.transpose());
        }

        Self {
            history,
            factor,
            curvatures,
        }
    }

    /// Returns `B x`.
    pub fn apply(&self, x: &DVector<T>) -> DVector<T> {
        let mut result = x * self.history.diagonal_scale();
        if self.curvatures.is_empty() {
            return result;
        }

        for (y, &curvature) in self
            .history
            .gradient_differences()
            .iter()
            .zip(self.curvatures.iter())
        {
            result.axpy(y.dot(x) / curvature, y, T::one());
        }
        let ax = &self.factor * x;
        result -= self.factor.tr_mul(&ax);
        result
    }

    /// Returns the curvature `<x, B x>` along `x`.
    pub fn curvature_along(&self, x: &DVector<T>) -> T {
        x.dot(&self.apply(x))
    }

    /// The compact factor `A`, one row per stored pair.
    pub fn factor(&self) -> &DMatrix<T> {
        &self.factor
    }
}

//! Bounded history of (step, gradient difference) pairs.
//!
//! The history is a paired FIFO: a step `s_k = x_{k+1} - x_k` and its gradient
//! difference `y_k = g_{k+1} - g_k` are always admitted and evicted together.
//! A pair is only admitted when it satisfies the curvature condition
//! `<y_k, s_k> > threshold`, which keeps the implied Hessian approximation
//! positive definite.
//!
//! Alongside the pairs the history tracks the diagonal scale
//! `bdiag = <y, y> / <y, s>` of the most recently admitted pair. The initial
//! Hessian approximation is `bdiag * I`, so its inverse is `I / bdiag`.

use crate::{compact::CompactHessian, inverse::InverseHessian};
use num_traits::Float;
use qnstep_core::{
    error::{DirectionError, Result},
    types::{constants::DEFAULT_MEMORY_SIZE, DVector, Scalar},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

/// History of curvature pairs for L-BFGS.
#[derive(Debug, Clone, PartialEq)]
pub struct LBFGSHistory<T: Scalar> {
    /// Maximum number of stored pairs
    memory_size: usize,

    /// Lower limit on `<y, s>` for admission
    curvature_threshold: T,

    /// Scale of the initial Hessian approximation
    diagonal_scale: T,

    /// Stored steps, oldest first
    steps: VecDeque<DVector<T>>,

    /// Stored gradient differences, index-aligned with `steps`
    gradient_differences: VecDeque<DVector<T>>,
}

impl<T: Scalar> Default for LBFGSHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_SIZE)
    }
}

impl<T: Scalar> LBFGSHistory<T> {
    /// Creates an empty history holding at most `memory_size` pairs.
    ///
    /// The diagonal scale starts at one and the curvature threshold at
    /// [`Scalar::CURVATURE_THRESHOLD`].
    pub fn new(memory_size: usize) -> Self {
        Self {
            memory_size,
            curvature_threshold: T::CURVATURE_THRESHOLD,
            diagonal_scale: T::one(),
            steps: VecDeque::with_capacity(memory_size),
            gradient_differences: VecDeque::with_capacity(memory_size),
        }
    }

    /// Sets the curvature threshold used by [`admit`](Self::admit).
    pub fn with_curvature_threshold(mut self, threshold: T) -> Self {
        self.curvature_threshold = threshold;
        self
    }

    /// Offers a new pair to the history.
    ///
    /// Returns `Ok(true)` if the pair was stored. A pair with
    /// `<y, s> <= threshold` is skipped and leaves the history untouched;
    /// this is not an error.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `y` and `s` differ in length or do not
    /// match the dimension of the stored pairs.
    pub fn admit(&mut self, y: DVector<T>, s: DVector<T>) -> Result<bool> {
        if y.len() != s.len() {
            return Err(DirectionError::dimension_mismatch(s.len(), y.len()));
        }
        if let Some(n) = self.dimension() {
            if s.len() != n {
                return Err(DirectionError::dimension_mismatch(n, s.len()));
            }
        }

        let ys = y.dot(&s);
        // Written as a negation so that NaN curvature is rejected too.
        if !(ys > self.curvature_threshold) || self.memory_size == 0 {
            debug!(
                curvature = Scalar::to_f64(ys),
                threshold = Scalar::to_f64(self.curvature_threshold),
                "skipping history update: curvature condition not met"
            );
            return Ok(false);
        }

        if self.steps.len() >= self.memory_size {
            self.steps.pop_front();
            self.gradient_differences.pop_front();
        }
        self.diagonal_scale = y.dot(&y) / ys;
        self.steps.push_back(s);
        self.gradient_differences.push_back(y);

        trace!(
            stored_pairs = self.steps.len(),
            diagonal_scale = Scalar::to_f64(self.diagonal_scale),
            "admitted history pair"
        );
        Ok(true)
    }

    /// Clears all pairs and restores the initial scale and threshold.
    pub fn reset(&mut self) {
        self.steps.clear();
        self.gradient_differences.clear();
        self.diagonal_scale = T::one();
        self.curvature_threshold = T::CURVATURE_THRESHOLD;
    }

    /// Inverse Hessian approximation implied by the current pairs.
    pub fn inverse_hessian(&self) -> InverseHessian<'_, T> {
        InverseHessian::new(self)
    }

    /// Compact forward Hessian approximation built from the current pairs.
    ///
    /// The factor is rebuilt on every call; keep the returned value around
    /// to apply it to several vectors while the history is unchanged.
    pub fn compact_hessian(&self) -> CompactHessian<'_, T> {
        CompactHessian::from_history(self)
    }

    /// Applies the inverse Hessian approximation to `x`.
    pub fn apply_inverse(&self, x: &DVector<T>) -> DVector<T> {
        self.inverse_hessian().apply(x)
    }

    /// Applies the forward Hessian approximation to `x`.
    pub fn apply_forward(&self, x: &DVector<T>) -> DVector<T> {
        self.compact_hessian().apply(x)
    }

    /// Maximum number of stored pairs.
    pub fn capacity(&self) -> usize {
        self.memory_size
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if no pair is stored.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Dimension of the stored vectors, if any pair is stored.
    pub fn dimension(&self) -> Option<usize> {
        self.steps.front().map(|s| s.len())
    }

    /// Current diagonal scale `bdiag`.
    pub fn diagonal_scale(&self) -> T {
        self.diagonal_scale
    }

    /// Current curvature threshold.
    pub fn curvature_threshold(&self) -> T {
        self.curvature_threshold
    }

    /// Stored steps, oldest first.
    pub fn steps(&self) -> &VecDeque<DVector<T>> {
        &self.steps
    }

    /// Stored gradient differences, oldest first.
    pub fn gradient_differences(&self) -> &VecDeque<DVector<T>> {
        &self.gradient_differences
    }

    /// Iterates over `(s, y)` pairs, oldest first.
    pub fn pairs(
        &self,
    ) -> impl DoubleEndedIterator<Item = (&DVector<T>, &DVector<T>)> + ExactSizeIterator + '_ {
        self.steps.iter().zip(self.gradient_differences.iter())
    }

    /// Returns a summary of the history as key-value pairs.
    pub fn summary(&self) -> HashMap<String, String> {
        let mut summary = HashMap::new();
        summary.insert("memory_size".to_string(), self.memory_size.to_string());
        summary.insert("stored_pairs".to_string(), self.steps.len().to_string());
        summary.insert(
            "diagonal_scale".to_string(),
            self.diagonal_scale.to_string(),
        );
        summary
    }

    /// Captures the persistent part of the history.
    pub fn snapshot(&self) -> HistorySnapshot<T> {
        HistorySnapshot {
            max_history: self.memory_size,
            diagonal_scale: self.diagonal_scale,
            steps: self.steps.iter().cloned().collect(),
            gradient_differences: self.gradient_differences.iter().cloned().collect(),
        }
    }

    /// Rebuilds a history from a snapshot.
    ///
    /// The curvature threshold is not part of the snapshot and is supplied
    /// by the caller. Every restored pair must pass it, as in [`admit`](Self::admit).
    ///
    /// # Errors
    ///
    /// Returns `InvalidSnapshot` if the snapshot breaks an invariant of the
    /// history: zero capacity, more pairs than capacity, unpaired or ragged
    /// vectors, a non-positive scale, or a pair with `<y, s> <= threshold`.
    pub fn from_snapshot(snapshot: HistorySnapshot<T>, curvature_threshold: T) -> Result<Self> {
        let HistorySnapshot {
            max_history,
            diagonal_scale,
            steps,
            gradient_differences,
        } = snapshot;

        if max_history == 0 {
            return Err(DirectionError::invalid_snapshot("history capacity is zero"));
        }
        if steps.len() != gradient_differences.len() {
            return Err(DirectionError::invalid_snapshot(format!(
                "{} steps but {} gradient differences",
                steps.len(),
                gradient_differences.len()
            )));
        }
        if steps.len() > max_history {
            return Err(DirectionError::invalid_snapshot(format!(
                "{} pairs exceed capacity {}",
                steps.len(),
                max_history
            )));
        }
        if !(diagonal_scale > T::zero()) || !Float::is_finite(diagonal_scale) {
            return Err(DirectionError::invalid_snapshot(format!(
                "diagonal scale must be positive and finite, got {}",
                diagonal_scale
            )));
        }
        if let Some(n) = steps.first().map(|s| s.len()) {
            for (i, (s, y)) in steps.iter().zip(gradient_differences.iter()).enumerate() {
                if s.len() != n || y.len() != n {
                    return Err(DirectionError::invalid_snapshot(format!(
                        "pair {} has dimensions ({}, {}), expected {}",
                        i,
                        s.len(),
                        y.len(),
                        n
                    )));
                }
                if !(y.dot(s) > curvature_threshold) {
                    return Err(DirectionError::invalid_snapshot(format!(
                        "pair {} violates the curvature condition <y, s> > {}",
                        i, curvature_threshold
                    )));
                }
            }
        }

        Ok(Self {
            memory_size: max_history,
            curvature_threshold,
            diagonal_scale,
            steps: steps.into(),
            gradient_differences: gradient_differences.into(),
        })
    }
}

/// Persistent state of an [`LBFGSHistory`].
///
/// Fields are laid out in archive order: capacity, diagonal scale, then the
/// two pair sequences.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))
)]
pub struct HistorySnapshot<T: Scalar> {
    /// History capacity
    pub max_history: usize,
    /// Diagonal scale `bdiag`
    pub diagonal_scale: T,
    /// Steps, oldest first
    pub steps: Vec<DVector<T>>,
    /// Gradient differences, index-aligned with `steps`
    pub gradient_differences: Vec<DVector<T>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(values: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(values)
    }

    #[test]
    fn test_new_history() {
        let history = LBFGSHistory::<f64>::new(5);
        assert_eq!(history.capacity(), 5);
        assert!(history.is_empty());
        assert_eq!(history.diagonal_scale(), 1.0);
        assert_eq!(history.curvature_threshold(), 1e-10);
        assert_eq!(history.dimension(), None);

        let summary = history.summary();
        assert_eq!(summary.get("memory_size").unwrap(), "5");
        assert_eq!(summary.get("stored_pairs").unwrap(), "0");
    }

    #[test]
    fn test_admit_updates_scale() {
        let mut history = LBFGSHistory::<f64>::new(3);
        let admitted = history.admit(v(&[2.0, 0.0]), v(&[1.0, 0.0])).unwrap();

        assert!(admitted);
        assert_eq!(history.len(), 1);
        assert_eq!(history.diagonal_scale(), 2.0);
        assert_eq!(history.steps()[0], v(&[1.0, 0.0]));
        assert_eq!(history.gradient_differences()[0], v(&[2.0, 0.0]));
    }

    #[test]
    fn test_curvature_gate() {
        let mut history = LBFGSHistory::<f64>::new(3);
        history.admit(v(&[2.0, 0.0]), v(&[1.0, 0.0])).unwrap();
        let before = history.clone();

        // Negative, zero, threshold-level and NaN curvature are all skipped.
        assert!(!history.admit(v(&[-1.0, 0.0]), v(&[1.0, 0.0])).unwrap());
        assert!(!history.admit(v(&[0.0, 1.0]), v(&[1.0, 0.0])).unwrap());
        assert!(!history.admit(v(&[1e-10, 0.0]), v(&[1.0, 0.0])).unwrap());
        assert!(!history.admit(v(&[f64::NAN, 0.0]), v(&[1.0, 0.0])).unwrap());

        assert_eq!(history, before);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut history = LBFGSHistory::<f64>::new(2);
        history.admit(v(&[1.0, 0.0]), v(&[1.0, 0.0])).unwrap();
        history.admit(v(&[0.0, 2.0]), v(&[0.0, 1.0])).unwrap();
        history.admit(v(&[3.0, 3.0]), v(&[1.0, 1.0])).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.gradient_differences().len(), 2);
        assert_eq!(history.steps()[0], v(&[0.0, 1.0]));
        assert_eq!(history.steps()[1], v(&[1.0, 1.0]));
        assert_eq!(history.gradient_differences()[0], v(&[0.0, 2.0]));
        assert_eq!(history.gradient_differences()[1], v(&[3.0, 3.0]));
        assert_eq!(history.diagonal_scale(), 18.0 / 6.0);
    }

    #[test]
    fn test_admit_dimension_checks() {
        let mut history = LBFGSHistory::<f64>::new(2);
        assert!(matches!(
            history.admit(v(&[1.0]), v(&[1.0, 0.0])),
            Err(DirectionError::DimensionMismatch { .. })
        ));

        history.admit(v(&[1.0, 0.0]), v(&[1.0, 0.0])).unwrap();
        assert!(matches!(
            history.admit(v(&[1.0, 0.0, 0.0]), v(&[1.0, 0.0, 0.0])),
            Err(DirectionError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let mut history = LBFGSHistory::<f64>::new(0);
        assert!(!history.admit(v(&[1.0]), v(&[1.0])).unwrap());
        assert!(history.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut history = LBFGSHistory::<f64>::new(2).with_curvature_threshold(1e-3);
        history.admit(v(&[4.0]), v(&[1.0])).unwrap();
        history.reset();

        assert!(history.is_empty());
        assert_eq!(history.diagonal_scale(), 1.0);
        assert_eq!(history.curvature_threshold(), 1e-10);
        assert_eq!(history.capacity(), 2);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut history = LBFGSHistory::<f64>::new(3);
        history.admit(v(&[2.0, 1.0]), v(&[1.0, 0.5])).unwrap();
        history.admit(v(&[0.5, 3.0]), v(&[0.0, 1.0])).unwrap();

        let snapshot = history.snapshot();
        assert_eq!(snapshot.max_history, 3);
        assert_eq!(snapshot.steps.len(), 2);

        let restored = LBFGSHistory::from_snapshot(snapshot, 1e-10).unwrap();
        assert_eq!(restored, history);
    }

    #[test]
    fn test_snapshot_validation() {
        let good = HistorySnapshot {
            max_history: 2,
            diagonal_scale: 2.0,
            steps: vec![v(&[1.0, 0.0])],
            gradient_differences: vec![v(&[2.0, 0.0])],
        };
        assert!(LBFGSHistory::from_snapshot(good.clone(), 1e-10).is_ok());

        let cases = vec![
            HistorySnapshot {
                max_history: 0,
                ..good.clone()
            },
            HistorySnapshot {
                gradient_differences: vec![],
                ..good.clone()
            },
            HistorySnapshot {
                max_history: 1,
                steps: vec![v(&[1.0, 0.0]), v(&[0.0, 1.0])],
                gradient_differences: vec![v(&[1.0, 0.0]), v(&[0.0, 1.0])],
                ..good.clone()
            },
            HistorySnapshot {
                diagonal_scale: 0.0,
                ..good.clone()
            },
            HistorySnapshot {
                diagonal_scale: f64::INFINITY,
                ..good.clone()
            },
            HistorySnapshot {
                gradient_differences: vec![v(&[-2.0, 0.0])],
                ..good.clone()
            },
            HistorySnapshot {
                gradient_differences: vec![v(&[2.0, 0.0, 1.0])],
                ..good.clone()
            },
        ];

        for snapshot in cases {
            assert!(matches!(
                LBFGSHistory::from_snapshot(snapshot, 1e-10),
                Err(DirectionError::InvalidSnapshot { .. })
            ));
        }
    }

    #[test]
    fn test_snapshot_pairs_respect_threshold() {
        // <y, s> = 2: admitted under the default threshold, not under 5.
        let snapshot = HistorySnapshot {
            max_history: 2,
            diagonal_scale: 2.0,
            steps: vec![v(&[1.0, 0.0])],
            gradient_differences: vec![v(&[2.0, 0.0])],
        };

        let mut strict = LBFGSHistory::<f64>::new(2).with_curvature_threshold(5.0);
        assert!(!strict.admit(v(&[2.0, 0.0]), v(&[1.0, 0.0])).unwrap());

        assert!(matches!(
            LBFGSHistory::from_snapshot(snapshot.clone(), 5.0),
            Err(DirectionError::InvalidSnapshot { .. })
        ));
        let restored = LBFGSHistory::from_snapshot(snapshot, 1.0).unwrap();
        assert_eq!(restored.curvature_threshold(), 1.0);
        assert_eq!(restored.len(), 1);
    }
}

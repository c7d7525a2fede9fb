//! Scoring models fitted on scaled feature matrices.
//!
//! - [`StandardScaler`] — per-column standardization
//! - [`IsolationForest`] — random-partition isolation depth
//! - [`LocalOutlierFactor`] — kNN local density ratio (fit once, score many)
//! - [`RandomForestClassifier`] — bagged Gini trees on pseudo-labels

mod forest;
mod isolation;
mod lof;
mod scaler;

pub use forest::RandomForestClassifier;
pub use isolation::IsolationForest;
pub use lof::LocalOutlierFactor;
pub use scaler::StandardScaler;

use ndarray::{Array1, ArrayView2};

/// Per-sample signal where higher means more anomalous.
pub trait AnomalySignal {
    fn anomaly_signal(&self, x: ArrayView2<'_, f64>) -> Array1<f64>;
}

/// Linear-interpolated percentile (`q` in [0, 100]) of unsorted values.
pub(crate) fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

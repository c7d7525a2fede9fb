//! Min-max rescaling of raw anomaly signals onto [0, 1].

use serde::{Deserialize, Serialize};

/// Added to the denominator so a zero-width range never divides by zero
pub const NORMALIZATION_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalBounds {
    pub min: f64,
    pub max: f64,
}

impl SignalBounds {
    /// Bounds of the finite values; `None` when there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Self>, v| match acc {
                None => Some(Self { min: v, max: v }),
                Some(b) => Some(Self {
                    min: b.min.min(v),
                    max: b.max.max(v),
                }),
            })
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Zero width: every value of the signal was identical.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0
    }

    /// `(v - min) / (max - min + ε)`, clamped to [0, 1]; non-finite input maps to 0.
    pub fn normalize(&self, v: f64) -> f64 {
        if !v.is_finite() {
            return 0.0;
        }
        ((v - self.min) / (self.width() + NORMALIZATION_EPS)).clamp(0.0, 1.0)
    }
}

/// Rescale against the batch's own min and max.
pub fn normalize_batch(values: &[f64]) -> Vec<f64> {
    match SignalBounds::from_values(values) {
        Some(b) => normalize_with(values, &b),
        None => vec![0.0; values.len()],
    }
}

/// Rescale against fixed bounds.
pub fn normalize_with(values: &[f64], bounds: &SignalBounds) -> Vec<f64> {
    values.iter().map(|&v| bounds.normalize(v)).collect()
}

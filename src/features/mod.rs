//! Feature engineering: raw events → fixed-width numeric rows.

mod encoding;
mod engineer;

pub use encoding::EventTypeEncoding;
pub use engineer::FeatureEngineer;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Column order of every feature matrix produced by [`FeatureEngineer`]
pub const FEATURE_NAMES: [&str; FEATURE_DIM] = [
    "hour",
    "day_of_week",
    "is_business_hours",
    "is_weekend",
    "user_event_frequency",
    "size_bytes_log",
    "duration_log",
    "failed_attempts_log",
    "event_type_encoded",
];

pub const FEATURE_DIM: usize = 9;

pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Engineered features for a single event
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub hour: f64,
    pub day_of_week: f64,
    pub is_business_hours: f64,
    pub is_weekend: f64,
    /// Events by the same user in the engineered batch
    pub user_event_frequency: f64,
    pub size_bytes_log: f64,
    pub duration_log: f64,
    pub failed_attempts_log: f64,
    pub event_type_encoded: f64,
}

impl FeatureRow {
    /// Values in [`FEATURE_NAMES`] order, non-finite entries replaced with 0
    pub fn to_array(&self) -> [f64; FEATURE_DIM] {
        [
            self.hour,
            self.day_of_week,
            self.is_business_hours,
            self.is_weekend,
            self.user_event_frequency,
            self.size_bytes_log,
            self.duration_log,
            self.failed_attempts_log,
            self.event_type_encoded,
        ]
        .map(|v| if v.is_finite() { v } else { 0.0 })
    }
}

/// Output of one feature engineering call
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
    /// Encoding used for `event_type_encoded`
    pub encoding: EventTypeEncoding,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn feature_names(&self) -> Vec<String> {
        feature_names()
    }

    /// N × [`FEATURE_DIM`] matrix ready for the detector
    pub fn to_matrix(&self) -> Array2<f64> {
        let mut m = Array2::zeros((self.rows.len(), FEATURE_DIM));
        for (mut out, row) in m.rows_mut().into_iter().zip(&self.rows) {
            for (dst, v) in out.iter_mut().zip(row.to_array()) {
                *dst = v;
            }
        }
        m
    }
}

//! Scoring configuration. Fixed for a detector's lifetime once constructed.

use crate::error::{DetectError, Result};
use serde::{Deserialize, Serialize};

/// Tolerance used when checking that fusion weights sum to 1
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Ensemble detector parameters
    pub detector: DetectorConfig,
    /// Synthetic event generation (driver only)
    pub generator: GeneratorConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Expected fraction of anomalies, strictly inside (0, 1)
    pub contamination: f64,
    /// Neighborhood size for the local outlier model
    pub n_neighbors: usize,
    /// Fusion weights; tunable defaults, must sum to 1
    pub weights: FusionWeights,
    /// Ensemble score above this is flagged (0.0–1.0)
    pub threshold: f64,
    /// Trees in the isolation forest
    pub n_estimators_isolation: usize,
    /// Subsample size per isolation tree (capped at the sample count)
    pub max_samples_isolation: usize,
    /// Trees in the pseudo-label classifier
    pub n_estimators_forest: usize,
    /// Seed for every randomized model
    pub seed: u64,
    /// Where min/max bounds for signal rescaling come from
    pub normalization: NormalizationMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub isolation: f64,
    pub local_outlier: f64,
    pub classifier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Min-max over each predict batch
    Batch,
    /// Min-max bounds captured from training data, clamped to [0, 1]
    Training,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub num_users: usize,
    pub num_events: usize,
    /// Fraction of generated events turned into labelled anomalies
    pub anomaly_ratio: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            n_neighbors: 20,
            weights: FusionWeights::default(),
            threshold: 0.5,
            n_estimators_isolation: 100,
            max_samples_isolation: 256,
            n_estimators_forest: 100,
            seed: 42,
            normalization: NormalizationMode::Batch,
        }
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            isolation: 0.4,
            local_outlier: 0.3,
            classifier: 0.3,
        }
    }
}

impl FusionWeights {
    pub fn new(isolation: f64, local_outlier: f64, classifier: f64) -> Self {
        Self {
            isolation,
            local_outlier,
            classifier,
        }
    }

    pub fn sum(&self) -> f64 {
        self.isolation + self.local_outlier + self.classifier
    }
}

impl Default for NormalizationMode {
    fn default() -> Self {
        NormalizationMode::Batch
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_users: 50,
            num_events: 5000,
            anomaly_ratio: 0.05,
            seed: 42,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl DetectorConfig {
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_normalization(mut self, mode: NormalizationMode) -> Self {
        self.normalization = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject out-of-range parameters before any model is built.
    pub fn validate(&self) -> Result<()> {
        validate_contamination(self.contamination)?;

        let w = &self.weights;
        let parts = [w.isolation, w.local_outlier, w.classifier];
        if parts.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(DetectError::validation(format!(
                "fusion weights must be finite and non-negative, got {:?}",
                parts
            )));
        }
        if (w.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(DetectError::validation(format!(
                "fusion weights must sum to 1.0, got {}",
                w.sum()
            )));
        }
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(DetectError::validation(format!(
                "threshold must lie in [0, 1], got {}",
                self.threshold
            )));
        }
        if self.n_neighbors == 0 {
            return Err(DetectError::validation("n_neighbors must be at least 1"));
        }
        if self.n_estimators_isolation == 0 || self.n_estimators_forest == 0 {
            return Err(DetectError::validation("estimator counts must be at least 1"));
        }
        if self.max_samples_isolation < 2 {
            return Err(DetectError::validation("max_samples_isolation must be at least 2"));
        }
        Ok(())
    }
}

pub(crate) fn validate_contamination(contamination: f64) -> Result<()> {
    if contamination.is_finite() && contamination > 0.0 && contamination < 1.0 {
        Ok(())
    } else {
        Err(DetectError::validation(format!(
            "contamination must lie in (0, 1), got {}",
            contamination
        )))
    }
}

impl AppConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<AppConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }
}

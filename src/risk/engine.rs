//! Ensemble detector: scales features, fits three models, fuses their signals into one score.
//!
//! Fit order is fixed: scaler → isolation forest → pseudo-labels from its outlier calls →
//! local outlier factor → random forest on the pseudo-labels. Refitting the isolation forest
//! would change the classifier's training labels, so models are never refitted independently.

use super::normalize::{normalize_batch, normalize_with, SignalBounds};
use crate::config::{validate_contamination, DetectorConfig, NormalizationMode};
use crate::error::{DetectError, Result};
use crate::model::{AnomalySignal, IsolationForest, LocalOutlierFactor, RandomForestClassifier, StandardScaler};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainStatus {
    Trained,
}

/// Result of a successful `train` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSummary {
    pub status: TrainStatus,
    pub samples: usize,
    pub features: usize,
    /// Rows the isolation forest flagged; these become the classifier's positive labels
    pub pseudo_outliers: usize,
}

/// Normalized per-model signals, index-aligned with the scored batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub isolation: Vec<f64>,
    pub local_outlier: Vec<f64>,
    pub classifier: Vec<f64>,
}

/// Scores and decisions for one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Fused score in [0, 1]
    pub ensemble_score: Vec<f64>,
    /// 1 where `ensemble_score` exceeds the threshold, else 0
    pub is_anomaly: Vec<u8>,
    pub components: ComponentScores,
}

impl Prediction {
    pub fn len(&self) -> usize {
        self.ensemble_score.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ensemble_score.is_empty()
    }

    pub fn flagged(&self) -> usize {
        self.is_anomaly.iter().filter(|&&f| f == 1).count()
    }

    /// Indices of flagged samples
    pub fn anomalies(&self) -> Vec<usize> {
        self.is_anomaly
            .iter()
            .enumerate()
            .filter(|(_, f)| **f == 1)
            .map(|(i, _)| i)
            .collect()
    }
}

struct TrainedModels {
    feature_names: Vec<String>,
    scaler: StandardScaler,
    isolation: IsolationForest,
    local_outlier: LocalOutlierFactor,
    classifier: RandomForestClassifier,
    /// Raw signal ranges over the training set, for `NormalizationMode::Training`
    isolation_bounds: SignalBounds,
    local_outlier_bounds: SignalBounds,
}

enum DetectorState {
    Untrained,
    Trained(Box<TrainedModels>),
}

pub struct EnsembleAnomalyDetector {
    config: DetectorConfig,
    state: DetectorState,
}

impl EnsembleAnomalyDetector {
    /// Create an untrained detector; fails if the configuration is out of range.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: DetectorState::Untrained,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, DetectorState::Trained(_))
    }

    /// Feature names captured at train time.
    pub fn feature_names(&self) -> Option<&[String]> {
        match &self.state {
            DetectorState::Trained(m) => Some(&m.feature_names),
            DetectorState::Untrained => None,
        }
    }

    /// Fit scaler and all three models on `x` (N × F). Valid exactly once per detector.
    pub fn train(&mut self, x: ArrayView2<'_, f64>, feature_names: &[String]) -> Result<TrainSummary> {
        if self.is_trained() {
            return Err(DetectError::state("detector is already trained"));
        }
        validate_contamination(self.config.contamination)?;
        if x.nrows() == 0 {
            return Err(DetectError::validation("training matrix is empty"));
        }
        if x.nrows() < 2 {
            return Err(DetectError::validation("training requires at least 2 samples"));
        }
        if x.ncols() == 0 {
            return Err(DetectError::validation("training matrix has no features"));
        }
        if feature_names.len() != x.ncols() {
            return Err(DetectError::validation(format!(
                "{} feature names for {} columns",
                feature_names.len(),
                x.ncols()
            )));
        }
        ensure_finite(&x)?;

        let cfg = &self.config;
        let scaler = StandardScaler::fit(x);
        let scaled = scaler.transform(x);
        let scaled = scaled.view();

        let isolation = IsolationForest::fit(
            scaled,
            cfg.n_estimators_isolation,
            cfg.max_samples_isolation,
            cfg.contamination,
            cfg.seed,
        );
        let pseudo_labels = isolation.training_outliers();
        let pseudo_outliers = pseudo_labels.iter().filter(|&&l| l).count();
        debug!(pseudo_outliers, threshold = isolation.threshold(), "isolation forest fitted");

        let local_outlier = LocalOutlierFactor::fit(scaled, cfg.n_neighbors, cfg.contamination);
        let classifier = RandomForestClassifier::fit(scaled, &pseudo_labels, cfg.n_estimators_forest, cfg.seed);

        let isolation_bounds = SignalBounds::from_values(isolation.training_scores())
            .ok_or_else(|| DetectError::validation("isolation signal has no finite values"))?;
        let lof_signal = local_outlier.anomaly_signal(scaled).to_vec();
        let local_outlier_bounds = SignalBounds::from_values(&lof_signal)
            .ok_or_else(|| DetectError::validation("local outlier signal has no finite values"))?;

        let summary = TrainSummary {
            status: TrainStatus::Trained,
            samples: x.nrows(),
            features: x.ncols(),
            pseudo_outliers,
        };
        info!(
            samples = summary.samples,
            features = summary.features,
            pseudo_outliers,
            "ensemble trained"
        );

        self.state = DetectorState::Trained(Box::new(TrainedModels {
            feature_names: feature_names.to_vec(),
            scaler,
            isolation,
            local_outlier,
            classifier,
            isolation_bounds,
            local_outlier_bounds,
        }));
        Ok(summary)
    }

    /// Score a batch with the same column count and order as training. Never mutates the detector.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Prediction> {
        let models = match &self.state {
            DetectorState::Trained(m) => m,
            DetectorState::Untrained => {
                return Err(DetectError::state("predict called before train"));
            }
        };
        if x.nrows() == 0 {
            return Err(DetectError::validation("prediction matrix is empty"));
        }
        let width = models.feature_names.len();
        if x.ncols() != width {
            return Err(DetectError::validation(format!(
                "expected {} feature columns, got {}",
                width,
                x.ncols()
            )));
        }
        ensure_finite(&x)?;

        let scaled = models.scaler.transform(x);
        let scaled = scaled.view();
        let raw_isolation = models.isolation.anomaly_signal(scaled).to_vec();
        let raw_local = models.local_outlier.anomaly_signal(scaled).to_vec();
        let classifier = models.classifier.anomaly_signal(scaled).to_vec();

        let (isolation, local_outlier) = match self.config.normalization {
            NormalizationMode::Batch => {
                log_degenerate("isolation", &raw_isolation);
                log_degenerate("local_outlier", &raw_local);
                (normalize_batch(&raw_isolation), normalize_batch(&raw_local))
            }
            NormalizationMode::Training => (
                normalize_with(&raw_isolation, &models.isolation_bounds),
                normalize_with(&raw_local, &models.local_outlier_bounds),
            ),
        };

        let w = &self.config.weights;
        let ensemble_score: Vec<f64> = isolation
            .iter()
            .zip(&local_outlier)
            .zip(&classifier)
            .map(|((&i, &l), &c)| {
                let s = w.isolation * i + w.local_outlier * l + w.classifier * c;
                if s.is_finite() {
                    s.clamp(0.0, 1.0)
                } else {
                    0.0
                }
            })
            .collect();
        let is_anomaly: Vec<u8> = ensemble_score
            .iter()
            .map(|&s| u8::from(s > self.config.threshold))
            .collect();

        let prediction = Prediction {
            ensemble_score,
            is_anomaly,
            components: ComponentScores {
                isolation,
                local_outlier,
                classifier,
            },
        };
        debug!(samples = prediction.len(), flagged = prediction.flagged(), "batch scored");
        Ok(prediction)
    }
}

impl Default for EnsembleAnomalyDetector {
    fn default() -> Self {
        Self {
            config: DetectorConfig::default(),
            state: DetectorState::Untrained,
        }
    }
}

fn ensure_finite(x: &ArrayView2<'_, f64>) -> Result<()> {
    match x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), v)) => Err(DetectError::validation(format!(
            "non-finite value {} at row {}, column {}",
            v, row, col
        ))),
        None => Ok(()),
    }
}

fn log_degenerate(signal: &str, values: &[f64]) {
    if SignalBounds::from_values(values).map_or(false, |b| b.is_degenerate()) && values.len() > 1 {
        debug!(signal, samples = values.len(), "zero-variance signal in batch");
    }
}

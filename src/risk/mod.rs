//! Score fusion: three model signals → one bounded anomaly score and a binary decision.

mod engine;
pub mod normalize;

pub use engine::{ComponentScores, EnsembleAnomalyDetector, Prediction, TrainStatus, TrainSummary};
pub use normalize::{SignalBounds, NORMALIZATION_EPS};

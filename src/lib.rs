//! DADM UEBA — behavioral anomaly scoring for user-activity events.
//!
//! Modular structure:
//! - [`events`] — Event records and a seeded synthetic source
//! - [`features`] — Event → numeric feature row transform
//! - [`model`] — Scaler, isolation forest, local outlier factor, random forest
//! - [`risk`] — Ensemble detector and score fusion
//! - [`pipeline`] — Events-in, scores-out wrapper with a fixed type encoding
//! - [`eval`] — Precision / recall / F1 / ROC-AUC against ground truth
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod eval;
pub mod events;
pub mod features;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod risk;

pub use config::{AppConfig, DetectorConfig, FusionWeights, NormalizationMode};
pub use error::{DetectError, Result};
pub use events::{Event, EventType, SyntheticEventGenerator};
pub use features::{FeatureEngineer, FeatureTable, FEATURE_NAMES};
pub use logging::StructuredLogger;
pub use pipeline::ScoringPipeline;
pub use risk::{EnsembleAnomalyDetector, Prediction, TrainSummary};

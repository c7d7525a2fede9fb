//! Detection quality against ground-truth labels.

mod metrics;

pub use metrics::{evaluate, roc_auc, ConfusionMatrix, EvaluationReport};

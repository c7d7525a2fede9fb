//! Error taxonomy for training and scoring.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectError {
    /// Malformed or empty input, feature-width mismatch, out-of-range configuration
    #[error("validation error: {0}")]
    Validation(String),
    /// Operation not valid in the detector's current lifecycle state
    #[error("state error: {0}")]
    State(String),
}

impl DetectError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DetectError::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        DetectError::State(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DetectError::Validation(_))
    }

    pub fn is_state(&self) -> bool {
        matches!(self, DetectError::State(_))
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;

//! User-activity event records and a seeded synthetic source for them.

mod generator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use generator::{AnomalyKind, SyntheticEventGenerator};

/// One observed user activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub event_type: EventType,
    pub resource: String,
    pub size_bytes: f64,
    pub duration_sec: f64,
    pub failed_attempts: f64,
    pub source_ip: String,
    /// Ground truth; only meaningful in evaluation contexts
    #[serde(default)]
    pub anomaly: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Login,
    FileAccess,
    DataCopy,
    PermissionChange,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Login,
        EventType::FileAccess,
        EventType::DataCopy,
        EventType::PermissionChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Login => "LOGIN",
            EventType::FileAccess => "FILE_ACCESS",
            EventType::DataCopy => "DATA_COPY",
            EventType::PermissionChange => "PERMISSION_CHANGE",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    /// Baseline (non-anomalous) event with zeroed magnitudes.
    pub fn new(
        timestamp: DateTime<Utc>,
        user_id: impl Into<String>,
        event_type: EventType,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            user_id: user_id.into(),
            event_type,
            resource: resource.into(),
            size_bytes: 0.0,
            duration_sec: 0.0,
            failed_attempts: 0.0,
            source_ip: String::new(),
            anomaly: false,
        }
    }

    pub fn with_magnitudes(mut self, size_bytes: f64, duration_sec: f64, failed_attempts: f64) -> Self {
        self.size_bytes = size_bytes;
        self.duration_sec = duration_sec;
        self.failed_attempts = failed_attempts;
        self
    }

    pub fn with_source_ip(mut self, ip: impl Into<String>) -> Self {
        self.source_ip = ip.into();
        self
    }
}

/// Ground-truth labels of a batch, index-aligned with it.
pub fn labels(events: &[Event]) -> Vec<bool> {
    events.iter().map(|e| e.anomaly).collect()
}

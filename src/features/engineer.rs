//! Per-event transform: time-of-day context, batch user frequency, log magnitudes, type code.

use super::{EventTypeEncoding, FeatureRow, FeatureTable};
use crate::events::Event;
use chrono::{Datelike, Timelike};
use std::collections::HashMap;

const BUSINESS_HOURS: std::ops::Range<u32> = 9..18;

/// Stateless; every call depends only on its input batch (and encoding, if given).
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    /// Engineer a batch, deriving the event-type encoding from this batch's first-seen order.
    pub fn engineer_features(&self, events: &[Event]) -> FeatureTable {
        let encoding = EventTypeEncoding::from_events(events);
        self.engineer_features_with(events, &encoding)
    }

    /// Engineer a batch against a previously captured encoding table.
    pub fn engineer_features_with(&self, events: &[Event], encoding: &EventTypeEncoding) -> FeatureTable {
        let frequency = user_frequencies(events);
        let rows = events
            .iter()
            .map(|e| {
                let hour = e.timestamp.hour();
                let day = e.timestamp.weekday().num_days_from_monday();
                FeatureRow {
                    hour: hour as f64,
                    day_of_week: day as f64,
                    is_business_hours: flag(BUSINESS_HOURS.contains(&hour)),
                    is_weekend: flag(day >= 5),
                    user_event_frequency: frequency.get(e.user_id.as_str()).copied().unwrap_or(0) as f64,
                    size_bytes_log: log1p(e.size_bytes),
                    duration_log: log1p(e.duration_sec),
                    failed_attempts_log: log1p(e.failed_attempts),
                    event_type_encoded: encoding.encode(e.event_type) as f64,
                }
            })
            .collect();
        FeatureTable {
            rows,
            encoding: encoding.clone(),
        }
    }
}

fn user_frequencies(events: &[Event]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for e in events {
        *counts.entry(e.user_id.as_str()).or_insert(0) += 1;
    }
    counts
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// ln(1 + x); negative or non-finite magnitudes collapse to 0.
fn log1p(x: f64) -> f64 {
    if x.is_finite() && x >= 0.0 {
        x.ln_1p()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log1p_of_zero_is_zero() {
        assert_eq!(log1p(0.0), 0.0);
        assert!((log1p(std::f64::consts::E - 1.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn log1p_rejects_non_finite() {
        assert_eq!(log1p(f64::NAN), 0.0);
        assert_eq!(log1p(f64::INFINITY), 0.0);
        assert_eq!(log1p(-3.0), 0.0);
    }
}

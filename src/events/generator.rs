//! Seeded synthetic event source: baseline activity plus labelled injected anomalies.

use super::{Event, EventType};
use crate::error::{DetectError, Result};
use chrono::{DateTime, Duration, Timelike, Utc};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Exp;
use serde::{Deserialize, Serialize};
use tracing::debug;

const EVENT_TYPE_WEIGHTS: [f64; 4] = [0.40, 0.35, 0.15, 0.10];
const LOOKBACK_SECS: i64 = 86_400 * 30;
const SIZE_SCALE: f64 = 1_000_000.0;
const DURATION_SCALE: f64 = 300.0;
const FAILED_ATTEMPTS_SCALE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyKind {
    /// size_bytes multiplied by U(10, 100)
    BulkDownload,
    /// timestamp moved to 23:xx
    AfterHours,
    /// failed_attempts replaced with U(5, 20)
    PrivilegeEscalation,
}

impl AnomalyKind {
    const ALL: [AnomalyKind; 3] = [
        AnomalyKind::BulkDownload,
        AnomalyKind::AfterHours,
        AnomalyKind::PrivilegeEscalation,
    ];
}

pub struct SyntheticEventGenerator {
    user_ids: Vec<String>,
    event_types: WeightedIndex<f64>,
    size: Exp<f64>,
    duration: Exp<f64>,
    failed_attempts: Exp<f64>,
    rng: StdRng,
}

impl SyntheticEventGenerator {
    /// Fails with a validation error when `num_users` is zero.
    pub fn new(num_users: usize, seed: u64) -> Result<Self> {
        if num_users == 0 {
            return Err(DetectError::validation("generator needs at least one user"));
        }
        let user_ids = (0..num_users).map(|i| format!("USER_{:04}", i)).collect();
        let event_types = WeightedIndex::new(EVENT_TYPE_WEIGHTS)
            .map_err(|e| DetectError::validation(format!("event type weights: {}", e)))?;
        Ok(Self {
            user_ids,
            event_types,
            size: exponential(SIZE_SCALE)?,
            duration: exponential(DURATION_SCALE)?,
            failed_attempts: exponential(FAILED_ATTEMPTS_SCALE)?,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn user_ids(&self) -> &[String] {
        &self.user_ids
    }

    /// `n` baseline events with timestamps in the 30 days before `now`.
    pub fn generate_baseline(&mut self, n: usize, now: DateTime<Utc>) -> Vec<Event> {
        (0..n)
            .map(|_| {
                let offset = self.rng.gen_range(0..LOOKBACK_SECS);
                let user = self.user_ids[self.rng.gen_range(0..self.user_ids.len())].clone();
                let event_type = EventType::ALL[self.event_types.sample(&mut self.rng)];
                let resource = format!("FILE_{}", self.rng.gen_range(1..200));
                let size = self.size.sample(&mut self.rng);
                let duration = self.duration.sample(&mut self.rng);
                let failed = self.failed_attempts.sample(&mut self.rng);
                let ip = format!(
                    "192.168.{}.{}",
                    self.rng.gen_range(1..255),
                    self.rng.gen_range(1..255)
                );
                Event::new(now - Duration::seconds(offset), user, event_type, resource)
                    .with_magnitudes(size, duration, failed)
                    .with_source_ip(ip)
            })
            .collect()
    }

    /// Mark `floor(len * ratio)` distinct events anomalous, each with a random distortion.
    pub fn inject_anomalies(&mut self, mut events: Vec<Event>, ratio: f64) -> Vec<Event> {
        let count = ((events.len() as f64) * ratio.clamp(0.0, 1.0)).floor() as usize;
        let picked = rand::seq::index::sample(&mut self.rng, events.len(), count.min(events.len()));
        for idx in picked.iter() {
            let kind = AnomalyKind::ALL[self.rng.gen_range(0..AnomalyKind::ALL.len())];
            let event = &mut events[idx];
            match kind {
                AnomalyKind::BulkDownload => {
                    event.size_bytes *= self.rng.gen_range(10.0..100.0);
                }
                AnomalyKind::AfterHours => {
                    if let Some(ts) = event.timestamp.with_hour(23) {
                        event.timestamp = ts;
                    }
                }
                AnomalyKind::PrivilegeEscalation => {
                    event.failed_attempts = self.rng.gen_range(5.0..20.0);
                }
            }
            event.anomaly = true;
        }
        debug!(injected = count, total = events.len(), "injected anomalies");
        events
    }

    /// Baseline of `n` events with `ratio` of them turned into anomalies.
    pub fn generate(&mut self, n: usize, ratio: f64, now: DateTime<Utc>) -> Vec<Event> {
        let baseline = self.generate_baseline(n, now);
        self.inject_anomalies(baseline, ratio)
    }
}

/// Exponential distribution with the given mean.
fn exponential(mean: f64) -> Result<Exp<f64>> {
    Exp::new(1.0 / mean).map_err(|e| DetectError::validation(format!("exponential mean {}: {}", mean, e)))
}

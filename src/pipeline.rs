//! End-to-end scoring: events → features → ensemble, with the event-type encoding
//! captured at train time and reused for every later batch.

use crate::config::DetectorConfig;
use crate::error::{DetectError, Result};
use crate::events::Event;
use crate::features::{EventTypeEncoding, FeatureEngineer, FeatureTable};
use crate::risk::{EnsembleAnomalyDetector, Prediction, TrainSummary};
use tracing::warn;

pub struct ScoringPipeline {
    engineer: FeatureEngineer,
    detector: EnsembleAnomalyDetector,
    encoding: Option<EventTypeEncoding>,
}

impl ScoringPipeline {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        Ok(Self {
            engineer: FeatureEngineer::new(),
            detector: EnsembleAnomalyDetector::new(config)?,
            encoding: None,
        })
    }

    pub fn detector(&self) -> &EnsembleAnomalyDetector {
        &self.detector
    }

    /// Encoding table captured by `train`.
    pub fn encoding(&self) -> Option<&EventTypeEncoding> {
        self.encoding.as_ref()
    }

    pub fn train(&mut self, events: &[Event]) -> Result<TrainSummary> {
        if self.detector.is_trained() {
            return Err(DetectError::state("pipeline is already trained"));
        }
        let table = self.engineer.engineer_features(events);
        let summary = self.detector.train(table.to_matrix().view(), &table.feature_names())?;
        self.encoding = Some(table.encoding);
        Ok(summary)
    }

    /// Features for `events` under the training encoding.
    pub fn features(&self, events: &[Event]) -> Result<FeatureTable> {
        let encoding = self
            .encoding
            .as_ref()
            .ok_or_else(|| DetectError::state("predict called before train"))?;
        if let Some(unseen) = events.iter().find(|e| !encoding.contains(e.event_type)) {
            warn!(
                event_type = %unseen.event_type,
                code = encoding.len(),
                "event type not seen during training"
            );
        }
        Ok(self.engineer.engineer_features_with(events, encoding))
    }

    pub fn predict(&self, events: &[Event]) -> Result<Prediction> {
        let table = self.features(events)?;
        self.detector.predict(table.to_matrix().view())
    }
}

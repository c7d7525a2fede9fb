//! Integration test: config load, synthetic events, feature engineering, pipeline, evaluation.

use chrono::{DateTime, TimeZone, Utc};
use dadm_ueba::{
    config::{AppConfig, DetectorConfig},
    eval::evaluate,
    events::{self, Event, EventType, SyntheticEventGenerator},
    features::{EventTypeEncoding, FeatureEngineer, FEATURE_DIM, FEATURE_NAMES},
    pipeline::ScoringPipeline,
    risk::Prediction,
};
use std::io::Write;
use std::path::Path;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

fn event_at(ts: DateTime<Utc>, user: &str, event_type: EventType) -> Event {
    Event::new(ts, user, event_type, "FILE_1").with_magnitudes(1000.0, 30.0, 0.0)
}

#[test]
fn config_load_default() {
    let c = AppConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.detector.contamination, 0.05);
    assert_eq!(c.detector.n_neighbors, 20);
    assert_eq!(c.detector.threshold, 0.5);
    assert_eq!(c.generator.num_users, 50);
    assert!(c.log.json);
}

#[test]
fn config_load_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"{{"detector": {{"contamination": 0.1, "normalization": "training"}}, "log": {{"json": false}}}}"#
    )
    .unwrap();

    let c = AppConfig::load(&path);
    assert_eq!(c.detector.contamination, 0.1);
    assert_eq!(c.detector.normalization, dadm_ueba::NormalizationMode::Training);
    assert_eq!(c.detector.weights.isolation, 0.4);
    assert!(!c.log.json);
    assert_eq!(c.log.level, "info");
}

#[test]
fn config_load_malformed_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    let c = AppConfig::load(&path);
    assert_eq!(c.detector.contamination, 0.05);
}

#[test]
fn time_features() {
    // 2024-01-06 is a Saturday
    let sat_late = Utc.with_ymd_and_hms(2024, 1, 6, 23, 15, 0).unwrap();
    // 2024-01-08 is a Monday
    let mon_nine = Utc.with_ymd_and_hms(2024, 1, 8, 9, 0, 0).unwrap();
    let mon_six_pm = Utc.with_ymd_and_hms(2024, 1, 8, 18, 0, 0).unwrap();
    let batch = vec![
        event_at(sat_late, "USER_0001", EventType::Login),
        event_at(mon_nine, "USER_0001", EventType::Login),
        event_at(mon_six_pm, "USER_0002", EventType::Login),
    ];
    let rows = FeatureEngineer::new().engineer_features(&batch).rows;

    assert_eq!(rows[0].hour, 23.0);
    assert_eq!(rows[0].day_of_week, 5.0);
    assert_eq!(rows[0].is_weekend, 1.0);
    assert_eq!(rows[0].is_business_hours, 0.0);

    assert_eq!(rows[1].day_of_week, 0.0);
    assert_eq!(rows[1].is_weekend, 0.0);
    assert_eq!(rows[1].is_business_hours, 1.0);

    assert_eq!(rows[2].hour, 18.0);
    assert_eq!(rows[2].is_business_hours, 0.0);
}

#[test]
fn user_frequency_is_batch_relative() {
    let now = fixed_now();
    let batch = vec![
        event_at(now, "A", EventType::Login),
        event_at(now, "B", EventType::Login),
        event_at(now, "A", EventType::FileAccess),
        event_at(now, "A", EventType::DataCopy),
    ];
    let rows = FeatureEngineer::new().engineer_features(&batch).rows;
    assert_eq!(rows[0].user_event_frequency, 3.0);
    assert_eq!(rows[2].user_event_frequency, 3.0);
    assert_eq!(rows[3].user_event_frequency, 3.0);
    assert_eq!(rows[1].user_event_frequency, 1.0);

    let single = FeatureEngineer::new().engineer_features(&batch[..1]).rows;
    assert_eq!(single[0].user_event_frequency, 1.0);
}

#[test]
fn magnitudes_are_log1p() {
    let e = Event::new(fixed_now(), "A", EventType::DataCopy, "FILE_9").with_magnitudes(0.0, 99.0, 4.0);
    let row = FeatureEngineer::new().engineer_features(&[e]).rows[0];
    assert_eq!(row.size_bytes_log, 0.0);
    assert!((row.duration_log - 100f64.ln()).abs() < 1e-12);
    assert!((row.failed_attempts_log - 5f64.ln()).abs() < 1e-12);
}

#[test]
fn event_type_encoding_first_seen_order() {
    let now = fixed_now();
    let batch = vec![
        event_at(now, "A", EventType::DataCopy),
        event_at(now, "A", EventType::Login),
        event_at(now, "A", EventType::DataCopy),
    ];
    let table = FeatureEngineer::new().engineer_features(&batch);
    let codes: Vec<f64> = table.rows.iter().map(|r| r.event_type_encoded).collect();
    assert_eq!(codes, vec![0.0, 1.0, 0.0]);
    assert_eq!(table.encoding.types(), &[EventType::DataCopy, EventType::Login]);
}

#[test]
fn fixed_encoding_is_reused_and_unseen_types_share_a_code() {
    let now = fixed_now();
    let train = vec![
        event_at(now, "A", EventType::Login),
        event_at(now, "A", EventType::FileAccess),
    ];
    let encoding = EventTypeEncoding::from_events(&train);

    let later = vec![
        event_at(now, "B", EventType::FileAccess),
        event_at(now, "B", EventType::PermissionChange),
        event_at(now, "B", EventType::Login),
        event_at(now, "B", EventType::DataCopy),
    ];
    let rows = FeatureEngineer::new().engineer_features_with(&later, &encoding).rows;
    let codes: Vec<f64> = rows.iter().map(|r| r.event_type_encoded).collect();
    assert_eq!(codes, vec![1.0, 2.0, 0.0, 2.0]);
    assert_eq!(EventTypeEncoding::canonical().encode(EventType::PermissionChange), 3);
}

#[test]
fn matrix_shape_and_names() {
    let mut generator = SyntheticEventGenerator::new(5, 1).unwrap();
    let batch = generator.generate_baseline(12, fixed_now());
    let table = FeatureEngineer::new().engineer_features(&batch);
    let m = table.to_matrix();
    assert_eq!(m.dim(), (12, FEATURE_DIM));
    assert_eq!(table.feature_names().len(), FEATURE_DIM);
    assert_eq!(FEATURE_NAMES[4], "user_event_frequency");
    assert!(m.iter().all(|v| v.is_finite()));

    let empty = FeatureEngineer::new().engineer_features(&[]);
    assert!(empty.is_empty());
    assert_eq!(empty.to_matrix().dim(), (0, FEATURE_DIM));
}

#[test]
fn non_finite_magnitudes_become_zero() {
    let e = Event::new(fixed_now(), "A", EventType::Login, "FILE_1").with_magnitudes(f64::NAN, f64::INFINITY, -1.0);
    let table = FeatureEngineer::new().engineer_features(&[e]);
    let m = table.to_matrix();
    assert_eq!(m[[0, 5]], 0.0);
    assert_eq!(m[[0, 6]], 0.0);
    assert_eq!(m[[0, 7]], 0.0);
}

#[test]
fn generator_is_seeded() {
    let a = SyntheticEventGenerator::new(10, 7).unwrap().generate(100, 0.1, fixed_now());
    let b = SyntheticEventGenerator::new(10, 7).unwrap().generate(100, 0.1, fixed_now());
    let c = SyntheticEventGenerator::new(10, 8).unwrap().generate(100, 0.1, fixed_now());
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn generator_requires_users() {
    let err = SyntheticEventGenerator::new(0, 1).err().unwrap();
    assert!(err.is_validation());
}

#[test]
fn generator_respects_ratio_and_ranges() {
    let now = fixed_now();
    let mut generator = SyntheticEventGenerator::new(20, 3).unwrap();
    let batch = generator.generate(200, 0.05, now);
    assert_eq!(batch.len(), 200);
    assert_eq!(events::labels(&batch).iter().filter(|&&l| l).count(), 10);
    for e in &batch {
        assert!(e.size_bytes >= 0.0 && e.duration_sec >= 0.0 && e.failed_attempts >= 0.0);
        if !e.anomaly {
            assert!(e.timestamp <= now);
        }
        assert!(generator.user_ids().contains(&e.user_id));
        assert!(e.source_ip.starts_with("192.168."));
    }
}

#[test]
fn pipeline_predict_before_train_is_state_error() {
    let pipeline = ScoringPipeline::new(DetectorConfig::default()).unwrap();
    let batch = SyntheticEventGenerator::new(5, 1).unwrap().generate_baseline(10, fixed_now());
    let err = pipeline.predict(&batch).unwrap_err();
    assert!(err.is_state());
}

#[test]
fn pipeline_reuses_training_encoding() {
    let now = fixed_now();
    let mut generator = SyntheticEventGenerator::new(10, 11).unwrap();
    let batch = generator.generate(300, 0.05, now);

    let mut pipeline = ScoringPipeline::new(DetectorConfig::default()).unwrap();
    assert!(!pipeline.detector().is_trained());
    let summary = pipeline.train(&batch).unwrap();
    assert!(pipeline.detector().is_trained());
    assert_eq!(summary.samples, 300);
    assert_eq!(summary.features, FEATURE_DIM);
    let encoding = pipeline.encoding().unwrap().clone();
    assert_eq!(encoding, EventTypeEncoding::from_events(&batch));

    // A batch whose first event has a different type must keep the training codes
    let mut reordered = batch.clone();
    reordered.reverse();
    let table = pipeline.features(&reordered).unwrap();
    for (row, e) in table.rows.iter().zip(&reordered) {
        assert_eq!(row.event_type_encoded, encoding.encode(e.event_type) as f64);
    }

    let prediction = pipeline.predict(&reordered).unwrap();
    assert_eq!(prediction.len(), 300);
    assert!(pipeline.train(&batch).unwrap_err().is_state());
}

#[test]
fn end_to_end_detects_injected_anomalies() {
    let mut generator = SyntheticEventGenerator::new(50, 42).unwrap();
    let batch = generator.generate(2000, 0.05, fixed_now());
    let labels = events::labels(&batch);

    let mut pipeline = ScoringPipeline::new(DetectorConfig::default()).unwrap();
    pipeline.train(&batch).unwrap();
    let prediction = pipeline.predict(&batch).unwrap();
    let report = evaluate(&labels, &prediction).unwrap();

    assert_eq!(report.samples, 2000);
    assert_eq!(report.true_anomalies, 100);
    assert_eq!(report.detected_anomalies, prediction.flagged());
    let auc = report.auc.unwrap();
    assert!(auc > 0.5, "auc {}", auc);
}

#[test]
fn evaluate_rejects_misaligned_labels() {
    let prediction = Prediction {
        ensemble_score: vec![0.1, 0.9],
        is_anomaly: vec![0, 1],
        ..Default::default()
    };
    assert!(evaluate(&[true], &prediction).unwrap_err().is_validation());
    let report = evaluate(&[false, true], &prediction).unwrap();
    assert_eq!(report.precision, 1.0);
    assert_eq!(report.recall, 1.0);
    assert_eq!(report.auc, Some(1.0));
}

//! DADM UEBA driver: generate a labelled synthetic batch, train the ensemble,
//! score the batch and report detection quality as one JSON line on stdout.

use chrono::Utc;
use dadm_ueba::{
    config::AppConfig,
    eval::evaluate,
    events::{self, SyntheticEventGenerator},
    logging::StructuredLogger,
    pipeline::ScoringPipeline,
};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("DADM_UEBA_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = AppConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(config = %config_path.display(), "DADM UEBA starting");

    let gen_cfg = &config.generator;
    let mut generator = SyntheticEventGenerator::new(gen_cfg.num_users, gen_cfg.seed)?;
    let batch = generator.generate(gen_cfg.num_events, gen_cfg.anomaly_ratio, Utc::now());
    let labels = events::labels(&batch);
    info!(
        events = batch.len(),
        anomalies = labels.iter().filter(|&&l| l).count(),
        "generated synthetic events"
    );

    let mut pipeline = ScoringPipeline::new(config.detector.clone())?;
    let summary = pipeline.train(&batch)?;
    info!(samples = summary.samples, features = summary.features, "training complete");

    let prediction = pipeline.predict(&batch)?;
    let report = evaluate(&labels, &prediction)?;
    info!(
        detected = report.detected_anomalies,
        actual = report.true_anomalies,
        precision = report.precision,
        recall = report.recall,
        f1 = report.f1,
        auc = report.auc.unwrap_or(f64::NAN),
        "evaluation complete"
    );

    StructuredLogger::emit_json(&report, &mut std::io::stdout().lock())?;
    Ok(())
}

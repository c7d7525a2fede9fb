//! Subscriber setup and JSON lines: one JSON object per line (ndjson).

use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Global tracing setup for the driver; the library only emits events.
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber writing to stderr, level from RUST_LOG or `default_level`.
    /// Safe to call more than once; later calls are ignored.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry().with(filter).with(fmt).try_init();
        } else {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init();
        }
    }

    /// Write one serialized record as a single line (e.g. an evaluation report)
    pub fn emit_json(record: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(record).map_err(std::io::Error::from)?;
        writeln!(w, "{}", line)
    }
}

//! Structured logging for the driver binary.

mod format;

pub use format::StructuredLogger;

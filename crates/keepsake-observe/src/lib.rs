//! Observability setup for Keepsake: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;

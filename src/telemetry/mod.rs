//! Observability: tracing, metrics, and OpenTelemetry integration.

pub mod metrics;
pub mod tracing;

pub use metrics::{record_decision, MetricsState};
pub use tracing::init_telemetry;

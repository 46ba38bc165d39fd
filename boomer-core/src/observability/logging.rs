//! Subscriber wiring: env filter, OTLP span export, JSON log output.

use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::telemetry::TelemetryError;

/// Install the global tracing subscriber: an `EnvFilter` (the `RUST_LOG`
/// environment variable wins over `log_level`), an OTLP batch span exporter
/// bridged through `tracing-opentelemetry`, and a flattened JSON fmt layer.
pub(crate) fn init_subscriber(
    resource: Resource,
    log_level: &str,
    otlp_endpoint: &str,
) -> Result<(), TelemetryError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let otlp_exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(otlp_endpoint);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(otlp_exporter)
        .with_trace_config(sdktrace::config().with_resource(resource))
        .install_batch(runtime::Tokio)?;

    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry)
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init();

    Ok(())
}

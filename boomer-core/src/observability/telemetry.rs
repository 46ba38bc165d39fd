//! Explicit telemetry wiring: resource attributes, span export, trace
//! propagation, and the base logger.
//!
//! Everything here is constructed once at process start and handed into the
//! components that need it, instead of being looked up from ambient global
//! registries.

use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::TraceError;
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::Resource;
use thiserror::Error;
use tonic::metadata::MetadataMap;

use super::logging;
use super::tracelog::{self, Logger};
use crate::grpc::{MetadataExtractor, MetadataInjector};
use crate::queue::HeaderBag;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install trace pipeline: {0}")]
    Pipeline(#[from] TraceError),
}

/// Configuration for [`Telemetry::init`].
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub service_version: String,
    pub otlp_endpoint: String,
    pub log_level: String,
}

/// Serializes trace context across process boundaries in the W3C
/// `traceparent` text format.
///
/// Carrier types borrow the underlying header storage only for the duration
/// of a single inject or extract call. Cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct Propagation {
    propagator: TraceContextPropagator,
}

impl Propagation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the trace context of `cx` into an outgoing header bag.
    pub fn inject(&self, cx: &Context, headers: &mut HeaderBag) {
        self.propagator.inject_context(cx, headers);
    }

    /// Reconstruct a trace context from an incoming header bag.
    pub fn extract(&self, headers: &HeaderBag) -> Context {
        self.propagator.extract(headers)
    }

    /// Write the trace context of `cx` into outgoing gRPC metadata.
    pub fn inject_metadata(&self, cx: &Context, metadata: &mut MetadataMap) {
        self.propagator
            .inject_context(cx, &mut MetadataInjector(metadata));
    }

    /// Reconstruct a trace context from inbound gRPC metadata.
    pub fn extract_metadata(&self, metadata: &MetadataMap) -> Context {
        self.propagator.extract(&MetadataExtractor(metadata))
    }
}

/// Process-wide observability handles: trace propagation and the base
/// request logger.
pub struct Telemetry {
    propagation: Propagation,
    base_logger: Logger,
}

impl Telemetry {
    /// Set up the tracing subscriber, OTLP exporter, propagation, and the
    /// base logger. Call once from `main`, with a tokio runtime running.
    pub fn init(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let hostname = std::env::var("HOSTNAME").unwrap_or_default();

        let mut attributes = vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", config.service_version.clone()),
        ];
        if !hostname.is_empty() {
            attributes.push(KeyValue::new("host.name", hostname.clone()));
        }
        let resource = Resource::new(attributes);

        logging::init_subscriber(resource, &config.log_level, &config.otlp_endpoint)?;

        let mut base_logger = Logger::new().with("service_name", config.service_name.clone());
        if !hostname.is_empty() {
            base_logger = base_logger.with("hostname", hostname);
        }
        tracelog::set_default(base_logger.clone());

        Ok(Self {
            propagation: Propagation::new(),
            base_logger,
        })
    }

    pub fn propagation(&self) -> &Propagation {
        &self.propagation
    }

    /// The logger carrying the process-wide fields (service name, hostname).
    pub fn base_logger(&self) -> Logger {
        self.base_logger.clone()
    }

    /// Flush buffered spans. Call on shutdown.
    pub fn shutdown(&self) {
        opentelemetry::global::shutdown_tracer_provider();
    }
}

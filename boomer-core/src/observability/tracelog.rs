//! Context-scoped structured logging with trace correlation.
//!
//! The serving layer installs a base [`Logger`] once per inbound call (see
//! [`crate::grpc::logger_interceptor`]); downstream code calls [`resolve`]
//! to get a derived logger whose records carry the `trace_id` and `span_id`
//! of the active trace context. When no request-scoped logger was installed,
//! [`resolve`] degrades to the process-wide default instead of failing.

use std::fmt;
use std::sync::{Arc, OnceLock};

use opentelemetry::trace::{SpanId, TraceContextExt, TraceId};
use opentelemetry::Context;
use tracing::Level;

static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Install the process-wide fallback logger used by [`resolve`] when a
/// context has no request-scoped logger attached. Later calls are ignored.
pub fn set_default(logger: Logger) {
    let _ = DEFAULT_LOGGER.set(logger);
}

fn default_logger() -> Logger {
    DEFAULT_LOGGER.get().cloned().unwrap_or_default()
}

/// An immutable bag of fixed log fields.
///
/// Deriving a child with [`Logger::with`] never touches the parent, so a
/// base logger can be shared across calls and enriched per call. Emission
/// forwards to the `tracing` macros; this type never writes to a sink
/// itself.
#[derive(Clone, Debug, Default)]
pub struct Logger {
    fields: Arc<Vec<(&'static str, String)>>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a child logger with an extra fixed field.
    pub fn with(&self, key: &'static str, value: impl Into<String>) -> Logger {
        let mut fields = self.fields.as_ref().clone();
        fields.push((key, value.into()));
        Logger {
            fields: Arc::new(fields),
        }
    }

    /// First value recorded for `key`, if any.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn debug(&self, message: &str, extra: &[(&str, &str)]) {
        self.emit(Level::DEBUG, message, extra);
    }

    pub fn info(&self, message: &str, extra: &[(&str, &str)]) {
        self.emit(Level::INFO, message, extra);
    }

    pub fn warn(&self, message: &str, extra: &[(&str, &str)]) {
        self.emit(Level::WARN, message, extra);
    }

    pub fn error(&self, message: &str, extra: &[(&str, &str)]) {
        self.emit(Level::ERROR, message, extra);
    }

    fn emit(&self, level: Level, message: &str, extra: &[(&str, &str)]) {
        let fields = self.render(extra);
        match level {
            Level::ERROR => tracing::error!(target: "boomer", fields = %fields, "{message}"),
            Level::WARN => tracing::warn!(target: "boomer", fields = %fields, "{message}"),
            Level::DEBUG => tracing::debug!(target: "boomer", fields = %fields, "{message}"),
            _ => tracing::info!(target: "boomer", fields = %fields, "{message}"),
        }
    }

    fn render(&self, extra: &[(&str, &str)]) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .chain(extra.iter().map(|(k, v)| format!("{k}={v}")))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&[]))
    }
}

/// Returns a context carrying `logger` as the request-scoped handle.
///
/// A `None` logger is a no-op, so an already-configured logger is never
/// accidentally cleared.
pub fn attach(cx: &Context, logger: Option<Logger>) -> Context {
    match logger {
        Some(logger) => cx.with_value(logger),
        None => cx.clone(),
    }
}

/// The request-scoped logger for `cx`, falling back to the process default.
///
/// When the context carries a valid trace ID the result gains a `trace_id`
/// field; a valid span ID additionally adds `span_id`. Zero-value IDs are
/// treated as absent. Infallible and side-effect-free.
pub fn resolve(cx: &Context) -> Logger {
    let mut logger = cx.get::<Logger>().cloned().unwrap_or_else(default_logger);

    let span = cx.span();
    let span_context = span.span_context();
    if span_context.trace_id() != TraceId::INVALID {
        logger = logger.with("trace_id", span_context.trace_id().to_string());
    }
    if span_context.span_id() != SpanId::INVALID {
        logger = logger.with("span_id", span_context.span_id().to_string());
    }
    logger
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{SpanContext, TraceFlags, TraceState};

    const TRACE_ID: &str = "0af7651916cd43dd8448eb211c80319c";
    const SPAN_ID: &str = "b7ad6b7169203331";

    fn remote_context() -> Context {
        let span_context = SpanContext::new(
            TraceId::from_hex(TRACE_ID).unwrap(),
            SpanId::from_hex(SPAN_ID).unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        Context::new().with_remote_span_context(span_context)
    }

    #[test]
    fn resolve_without_logger_or_trace_uses_default() {
        let logger = resolve(&Context::new());
        assert_eq!(logger.field("trace_id"), None);
        assert_eq!(logger.field("span_id"), None);
    }

    #[test]
    fn attach_none_is_a_noop() {
        let cx = remote_context();
        let attached = attach(&cx, None);
        assert_eq!(
            resolve(&attached).to_string(),
            resolve(&cx).to_string()
        );
    }

    #[test]
    fn resolve_adds_trace_and_span_fields() {
        let base = Logger::new().with("service_name", "test");
        let cx = attach(&remote_context(), Some(base));

        let logger = resolve(&cx);
        assert_eq!(logger.field("service_name"), Some("test"));
        assert_eq!(logger.field("trace_id"), Some(TRACE_ID));
        assert_eq!(logger.field("span_id"), Some(SPAN_ID));
    }

    #[test]
    fn invalid_ids_add_no_fields() {
        let cx = Context::new().with_remote_span_context(SpanContext::empty_context());
        let logger = resolve(&cx);
        assert_eq!(logger.field("trace_id"), None);
        assert_eq!(logger.field("span_id"), None);
    }

    #[test]
    fn deriving_a_child_leaves_the_base_untouched() {
        let base = Logger::new().with("hostname", "a");
        let child = base.with("trace_id", "b");
        assert_eq!(base.field("trace_id"), None);
        assert_eq!(child.field("hostname"), Some("a"));
        assert_eq!(child.to_string(), "hostname=a trace_id=b");
    }
}

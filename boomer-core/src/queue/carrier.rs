//! Trace-context carrier over transport-native message headers.

use std::collections::HashMap;
use std::fmt;

use opentelemetry::propagation::{Extractor, Injector};
use serde::{Deserialize, Serialize};

/// Multi-valued string metadata attached to an in-flight [`Message`].
///
/// Implements the propagator carrier traits so a `TextMapPropagator` can
/// inject and extract trace context without knowing the transport. Value
/// order within a key is insertion order; key order is unspecified.
///
/// [`Message`]: crate::queue::Message
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderBag {
    entries: HashMap<String, Vec<String>>,
}

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the values recorded for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// First value for `key`. A missing key is a normal, silent outcome.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values recorded for `key`, in insertion order.
    pub fn all(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Injector for HeaderBag {
    // Overwrite, not append: the propagator expects injection to be
    // idempotent.
    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), vec![value]);
    }
}

impl Extractor for HeaderBag {
    fn get(&self, key: &str) -> Option<&str> {
        self.first(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}

/// Diagnostic rendering only, never a wire encoding. Keys are sorted so the
/// output is deterministic.
impl fmt::Display for HeaderBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        for (i, key) in keys.into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, self.entries[key].join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::propagation::TextMapPropagator;
    use opentelemetry::trace::{
        SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
    };
    use opentelemetry::Context;
    use opentelemetry_sdk::propagation::TraceContextPropagator;

    #[test]
    fn get_on_missing_key_is_absent() {
        let bag = HeaderBag::new();
        assert_eq!(bag.get("traceparent"), None);
        assert!(bag.all("traceparent").is_empty());
    }

    #[test]
    fn set_overwrites_instead_of_appending() {
        let mut bag = HeaderBag::new();
        bag.append("k", "a");
        bag.append("k", "b");
        bag.set("k", "v2".to_string());
        assert_eq!(bag.get("k"), Some("v2"));
        assert_eq!(bag.all("k"), ["v2".to_string()]);
    }

    #[test]
    fn keys_contains_a_set_key() {
        let mut bag = HeaderBag::new();
        bag.set("k", "v".to_string());
        assert!(bag.keys().contains(&"k"));
    }

    #[test]
    fn append_preserves_value_order() {
        let mut bag = HeaderBag::new();
        bag.append("k", "a");
        bag.append("k", "b");
        assert_eq!(bag.first("k"), Some("a"));
        assert_eq!(bag.all("k"), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn render_is_deterministic_and_space_joined() {
        let mut bag = HeaderBag::new();
        bag.set("traceparent", "00-abc-def-01".to_string());
        assert_eq!(bag.to_string(), "traceparent=00-abc-def-01");

        bag.append("b", "1");
        bag.append("b", "2");
        bag.append("a", "x");
        assert_eq!(bag.to_string(), "a=x b=1 2 traceparent=00-abc-def-01");
    }

    #[test]
    fn propagator_round_trip_preserves_ids() {
        let propagator = TraceContextPropagator::new();
        let span_context = SpanContext::new(
            TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").unwrap(),
            SpanId::from_hex("b7ad6b7169203331").unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        let cx = Context::new().with_remote_span_context(span_context.clone());

        let mut bag = HeaderBag::new();
        propagator.inject_context(&cx, &mut bag);
        assert!(bag.first("traceparent").is_some());

        let extracted = propagator.extract(&bag);
        let got = extracted.span().span_context().clone();
        assert_eq!(got.trace_id(), span_context.trace_id());
        assert_eq!(got.span_id(), span_context.span_id());
    }
}

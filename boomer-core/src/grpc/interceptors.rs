//! gRPC interceptors and metadata carriers.

use opentelemetry::propagation::{Extractor, Injector};
use tonic::metadata::{Ascii, KeyRef, MetadataKey, MetadataMap, MetadataValue};
use tonic::{Request, Status};

use crate::observability::tracelog::Logger;

/// Interceptor that installs `base` as the request-scoped logger, exactly
/// once per inbound unary call and before any handler logic runs.
///
/// Handlers fold the installed logger into their call context with
/// [`crate::observability::tracelog::attach`] (see [`request_logger`]).
///
/// # Example
///
/// ```ignore
/// let layer = tonic::service::interceptor(logger_interceptor(telemetry.base_logger()));
/// ```
pub fn logger_interceptor(
    base: Logger,
) -> impl FnMut(Request<()>) -> Result<Request<()>, Status> + Clone {
    move |mut request: Request<()>| {
        request.extensions_mut().insert(base.clone());
        Ok(request)
    }
}

/// The request-scoped logger installed by [`logger_interceptor`], if any.
pub fn request_logger<T>(request: &Request<T>) -> Option<Logger> {
    request.extensions().get::<Logger>().cloned()
}

/// Borrow of a tonic [`MetadataMap`] for trace-context extraction.
pub struct MetadataExtractor<'a>(pub &'a MetadataMap);

impl Extractor for MetadataExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0
            .keys()
            .filter_map(|key| match key {
                KeyRef::Ascii(key) => Some(key.as_str()),
                KeyRef::Binary(_) => None,
            })
            .collect()
    }
}

/// Borrow of a tonic [`MetadataMap`] for trace-context injection.
///
/// Keys or values that are not valid gRPC metadata are skipped; injection
/// never fails.
pub struct MetadataInjector<'a>(pub &'a mut MetadataMap);

impl Injector for MetadataInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        let key = match MetadataKey::<Ascii>::from_bytes(key.as_bytes()) {
            Ok(key) => key,
            Err(_) => return,
        };
        if let Ok(value) = value.parse::<MetadataValue<Ascii>>() {
            self.0.insert(key, value);
        }
    }
}

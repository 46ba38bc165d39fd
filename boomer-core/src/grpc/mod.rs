//! gRPC glue shared by the server and client binaries:
//! - the per-call logger interceptor
//! - metadata carriers for trace-context propagation

pub mod interceptors;

pub use interceptors::{
    logger_interceptor, request_logger, MetadataExtractor, MetadataInjector,
};

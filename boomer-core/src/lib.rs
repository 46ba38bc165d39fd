//! boomer-core: shared infrastructure for the boomer observability demo.
pub mod config;
pub mod error;
pub mod grpc;
pub mod observability;
pub mod queue;

pub use async_trait;
pub use opentelemetry;
pub use tonic;
pub use tracing;

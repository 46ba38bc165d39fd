//! boomer-server: gRPC front end and queue worker for the boomer demo.
pub mod grpc;
pub mod metrics;
pub mod startup;
pub mod worker;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("queue error: {0}")]
    Queue(#[from] crate::queue::QueueError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] crate::observability::TelemetryError),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("invalid listen address '{0}'")]
    Address(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

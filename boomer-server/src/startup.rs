//! Application startup and lifecycle: the health/metrics HTTP endpoint plus
//! either the gRPC server or the queue worker, driven until a shutdown
//! signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use boomer_core::error::AppError;
use boomer_core::grpc::logger_interceptor;
use boomer_core::observability::Telemetry;
use boomer_core::queue::Connection;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tonic::transport::Server as GrpcServer;
use tower::ServiceBuilder;

use crate::grpc::proto::boomer_server::BoomerServer;
use crate::grpc::proto::FILE_DESCRIPTOR_SET;
use crate::grpc::BoomerGrpcService;
use crate::metrics::get_metrics;
use crate::worker::Worker;

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "boomer-server",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

fn observability_router() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

fn parse_addr(address: &str) -> Result<SocketAddr, AppError> {
    address
        .parse()
        .map_err(|_| AppError::Address(address.to_string()))
}

/// The serve-mode application: gRPC plus the HTTP observability endpoint.
pub struct Application {
    grpc_addr: SocketAddr,
    http_listener: TcpListener,
    service: BoomerGrpcService,
    telemetry: Arc<Telemetry>,
}

impl Application {
    pub async fn build(
        grpc_address: &str,
        metrics_address: &str,
        conn: Arc<dyn Connection>,
        telemetry: Arc<Telemetry>,
    ) -> Result<Self, AppError> {
        let grpc_addr = parse_addr(grpc_address)?;
        let http_listener = TcpListener::bind(parse_addr(metrics_address)?).await?;
        let service = BoomerGrpcService::new(conn, telemetry.propagation().clone());

        Ok(Self {
            grpc_addr,
            http_listener,
            service,
            telemetry,
        })
    }

    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        let (mut health_reporter, grpc_health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<BoomerServer<BoomerGrpcService>>()
            .await;

        let reflection_service = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()
            .map_err(|err| {
                AppError::Internal(anyhow::anyhow!("failed to build reflection service: {err}"))
            })?;

        let layer = ServiceBuilder::new()
            .layer(tonic::service::interceptor(logger_interceptor(
                self.telemetry.base_logger(),
            )))
            .into_inner();

        tracing::info!(address = %self.grpc_addr, "gRPC server listening");
        tracing::info!(address = %self.http_listener.local_addr()?, "metrics endpoint listening");

        let grpc_server = GrpcServer::builder()
            .layer(layer)
            .add_service(grpc_health_service)
            .add_service(reflection_service)
            .add_service(BoomerServer::new(self.service))
            .serve_with_shutdown(self.grpc_addr, shutdown_signal());

        tokio::select! {
            result = axum::serve(self.http_listener, observability_router()) => {
                result.map_err(AppError::from)?;
            }
            result = grpc_server => {
                result.map_err(AppError::from)?;
            }
        }

        Ok(())
    }
}

/// Worker mode: subscribe on the boom subject and serve the HTTP
/// observability endpoint until shutdown.
pub async fn run_worker(
    metrics_address: &str,
    conn: Arc<dyn Connection>,
    telemetry: Arc<Telemetry>,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(parse_addr(metrics_address)?).await?;

    Worker::start(
        conn,
        telemetry.propagation().clone(),
        telemetry.base_logger(),
    )
    .await?;

    tracing::info!(address = %listener.local_addr()?, "metrics endpoint listening");

    tokio::select! {
        result = axum::serve(listener, observability_router()) => {
            result.map_err(AppError::from)?;
        }
        _ = shutdown_signal() => {}
    }

    Ok(())
}

//! Entry point for the boomer server and worker binaries.

use std::sync::Arc;

use anyhow::Context as _;
use boomer_core::config::ServiceConfig;
use boomer_core::observability::{Telemetry, TelemetryConfig};
use boomer_core::queue::RedisConnection;
use clap::{Args, Parser, Subcommand};

use boomer_server::metrics::init_metrics;
use boomer_server::startup::{run_worker, Application};

#[derive(Parser)]
#[command(name = "boomer-server", about = "make an explosive entrance", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct CommonFlags {
    /// Address to serve /health and /metrics on
    #[arg(long)]
    metrics_address: Option<String>,

    /// Redis URL for the message bus
    #[arg(long)]
    redis_url: Option<String>,

    /// OTLP endpoint to export spans to
    #[arg(long)]
    otlp_endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the gRPC server
    Serve {
        /// Address to listen on for gRPC
        #[arg(long)]
        grpc_address: Option<String>,

        #[command(flatten)]
        common: CommonFlags,
    },
    /// Run the queue worker
    Worker {
        #[command(flatten)]
        common: CommonFlags,
    },
}

fn apply(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn apply_common(config: &mut ServiceConfig, common: CommonFlags) {
    apply(&mut config.metrics_address, common.metrics_address);
    apply(&mut config.redis_url, common.redis_url);
    apply(&mut config.otlp_endpoint, common.otlp_endpoint);
}

fn init_telemetry(config: &ServiceConfig, service_name: &str) -> anyhow::Result<Arc<Telemetry>> {
    let telemetry = Telemetry::init(&TelemetryConfig {
        service_name: service_name.to_string(),
        service_version: env!("CARGO_PKG_VERSION").to_string(),
        otlp_endpoint: config.otlp_endpoint.clone(),
        log_level: config.log_level.clone(),
    })
    .context("failed to initialize telemetry")?;
    Ok(Arc::new(telemetry))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ServiceConfig::load().context("failed to load configuration")?;

    match cli.command {
        Command::Serve {
            grpc_address,
            common,
        } => {
            apply(&mut config.grpc_address, grpc_address);
            apply_common(&mut config, common);

            let telemetry = init_telemetry(&config, "boomer-server")?;
            init_metrics();

            let conn = Arc::new(
                RedisConnection::connect(&config.redis_url)
                    .await
                    .context("failed to connect to the message bus")?,
            );

            let app = Application::build(
                &config.grpc_address,
                &config.metrics_address,
                conn,
                Arc::clone(&telemetry),
            )
            .await?;

            let result = app.run_until_stopped().await;
            telemetry.shutdown();
            result?;
        }
        Command::Worker { common } => {
            apply_common(&mut config, common);

            let telemetry = init_telemetry(&config, "boomer-worker")?;
            init_metrics();

            let conn = Arc::new(
                RedisConnection::connect(&config.redis_url)
                    .await
                    .context("failed to connect to the message bus")?,
            );

            let result = run_worker(&config.metrics_address, conn, Arc::clone(&telemetry)).await;
            telemetry.shutdown();
            result?;
        }
    }

    Ok(())
}

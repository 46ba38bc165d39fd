//! One-shot client: dial the boomer server, fire a single Boom, print the
//! response.

use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tonic::transport::Endpoint;

pub mod proto {
    tonic::include_proto!("boomer.v1");
}

use proto::boomer_client::BoomerClient;
use proto::BoomRequest;

#[derive(Parser)]
#[command(name = "boomer-cli", about = "make something go boom", version)]
struct Cli {
    /// Server endpoint
    #[arg(long, default_value = "http://localhost:8080")]
    address: String,

    /// Name to boom
    #[arg(default_value = "old dude")]
    name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let cli = Cli::parse();

    let channel = Endpoint::from_shared(cli.address.clone())
        .context("invalid server address")?
        .connect_timeout(Duration::from_secs(5))
        .connect()
        .await
        .with_context(|| format!("failed to connect to {}", cli.address))?;

    let mut client = BoomerClient::new(channel);
    let response = client
        .boom(BoomRequest { name: cli.name })
        .await
        .context("boom request failed")?
        .into_inner();

    tracing::info!(message = %response.message, "response");
    Ok(())
}

use config::{Config as Cfg, File};
use serde::Deserialize;

use crate::error::AppError;

/// Process configuration shared by the server and worker modes.
///
/// Values come from an optional `boomer` config file and `BOOMER__`-prefixed
/// environment variables; CLI flags override on top.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_grpc_address")]
    pub grpc_address: String,
    #[serde(default = "default_metrics_address")]
    pub metrics_address: String,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_grpc_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_metrics_address() -> String {
    "0.0.0.0:2223".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_otlp_endpoint() -> String {
    "http://tempo:4317".to_string()
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl ServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("boomer").required(false))
            .add_source(config::Environment::with_prefix("BOOMER").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: ServiceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.grpc_address, "0.0.0.0:8080");
        assert_eq!(config.metrics_address, "0.0.0.0:2223");
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.log_level, "debug");
    }
}

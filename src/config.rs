use crate::api;
use anyhow::{Context, Result};
use configured::Configured;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub api: api::Config,
    pub tracing: TracingConfig,
    pub storage: StorageConfig,
}

impl Config {
    /// Load the configuration from `$CONFIG_DIR/default.yaml`, optional overlays and `APP__`
    /// prefixed environment variables.
    pub fn load() -> Result<Self> {
        <Self as Configured>::load().context("load configuration")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TracingConfig {
    pub service_name: String,
    pub otlp_exporter_endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StorageConfig {
    Memory,
    Postgres(PgConfig),
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub dbname: String,
    #[serde_as(as = "DisplayFromStr")]
    pub sslmode: PgSslMode,
    #[serde(default = "max_connections_default")]
    pub max_connections: u32,
}

impl From<&PgConfig> for PgConnectOptions {
    fn from(config: &PgConfig) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&config.host)
            .username(&config.user)
            .password(config.password.expose_secret())
            .database(&config.dbname)
            .port(config.port)
            .ssl_mode(config.sslmode)
    }
}

fn max_connections_default() -> u32 {
    10
}

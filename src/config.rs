//! Environment-driven configuration.
//!
//! Required: `ADMIN_SECRET`, and `DATABASE_URL` when the postgres backend is
//! selected. Optional: `HOST` (default 127.0.0.1), `PORT` (default 3000),
//! `STORE_BACKEND` (`postgres`, the default, or `memory`),
//! `PAYMENT_PROCESSOR_URL` + `PAYMENT_PROCESSOR_SECRET_KEY` to enable
//! payment-intent creation.

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which `Store` implementation the process runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("expected `postgres` or `memory`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentProcessorConfig {
    pub base_url: String,
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string; present whenever the postgres backend is selected.
    pub database_url: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    /// Shared secret compared literally against the admin header.
    pub admin_secret: String,
    pub store_backend: StoreBackend,
    pub payment_processor: Option<PaymentProcessorConfig>,
}

pub fn load() -> Result<Config, ConfigError> {
    let store_backend = match optional("STORE_BACKEND") {
        Some(raw) => raw
            .parse()
            .map_err(|err| ConfigError::InvalidEnvVar("STORE_BACKEND".to_string(), err))?,
        None => StoreBackend::Postgres,
    };

    let database_url = optional("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
        return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
    }

    let host = match optional("HOST") {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("HOST".to_string(), raw))?,
        None => IpAddr::V4(Ipv4Addr::LOCALHOST),
    };

    let port = match optional("PORT") {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("PORT".to_string(), raw))?,
        None => 3000,
    };

    let payment_processor = match (
        optional("PAYMENT_PROCESSOR_URL"),
        optional("PAYMENT_PROCESSOR_SECRET_KEY"),
    ) {
        (Some(base_url), Some(secret_key)) => Some(PaymentProcessorConfig {
            base_url,
            secret_key,
        }),
        _ => None,
    };

    Ok(Config {
        database_url,
        host,
        port,
        admin_secret: required("ADMIN_SECRET")?,
        store_backend,
        payment_processor,
    })
}

fn required(name: &str) -> Result<String, ConfigError> {
    optional(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

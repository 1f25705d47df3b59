use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Everything has a default; `DATABASE_URL` switches the store to Postgres.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub throttle_capacity: u32,
    pub throttle_refill: Duration,
    pub extension_timeout: Duration,
    pub extension_bridge: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            port: 8080,
            rust_log: "info".to_string(),
            throttle_capacity: 20,
            throttle_refill: Duration::from_millis(1000),
            extension_timeout: Duration::from_millis(1500),
            extension_bridge: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();

        Ok(Config {
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            port: parse_env("PORT", defaults.port)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            throttle_capacity: parse_env("THROTTLE_CAPACITY", defaults.throttle_capacity)?,
            throttle_refill: Duration::from_millis(parse_env("THROTTLE_REFILL_MS", 1000u64)?),
            extension_timeout: Duration::from_millis(parse_env("EXTENSION_TIMEOUT_MS", 1500u64)?),
            extension_bridge: parse_env("EXTENSION_BRIDGE", defaults.extension_bridge)?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

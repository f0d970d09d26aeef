//! Configuration module for billing-service.

use rust_decimal::Decimal;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub rates: RatesConfig,
    pub cron: CronConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Utility tariffs, in THB. Flat per-branch rates set at deployment time,
/// not derived from rooms or buildings.
#[derive(Debug, Clone)]
pub struct RatesConfig {
    pub electricity_per_unit: Decimal,
    pub water_per_unit: Decimal,
    pub water_fixed_default: Decimal,
}

#[derive(Debug, Clone)]
pub struct CronConfig {
    /// Shared secret presented as a bearer token by the invoice scheduler.
    pub secret: String,
}

fn decimal_env(key: &str, default: i64) -> Decimal {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| Decimal::from(default))
}

impl BillingConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "billing-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            rates: RatesConfig {
                electricity_per_unit: decimal_env("ELECTRICITY_RATE_THB", 5),
                water_per_unit: decimal_env("WATER_RATE_THB", 18),
                water_fixed_default: decimal_env("WATER_FIXED_DEFAULT_THB", 100),
            },
            cron: CronConfig {
                secret: env::var("CRON_SECRET").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("CRON_SECRET is required"))
                })?,
            },
        })
    }
}

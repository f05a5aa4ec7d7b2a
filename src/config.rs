use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError};

const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const CONFIG_DIR: &str = "config";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HEALTH_CHECK_ATTEMPTS: u32 = 2;
const DEFAULT_HEALTH_CHECK_DELAY_MS: u64 = 1_000;
/// Platform commission in basis points (5%), per business policy.
const DEFAULT_COMMISSION_RATE_BPS: u32 = 500;
/// Buyer cancellation window after order creation.
const DEFAULT_CANCELLATION_WINDOW_HOURS: i64 = 24;
/// Stand-in for the carrier pickup event; 0 disables the timer.
const DEFAULT_CARRIER_PICKUP_DELAY_SECS: u64 = 30;

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Host address to bind the server to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the server to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the external payment gateway backend
    #[validate(custom = "validate_base_url")]
    pub gateway_base_url: String,

    /// Request timeout for gateway calls, in seconds
    #[serde(default = "default_gateway_timeout")]
    pub gateway_timeout_secs: u64,

    /// Pre-flight health check attempts before giving up
    #[validate(range(min = 1, max = 10))]
    #[serde(default = "default_health_attempts")]
    pub health_check_attempts: u32,

    /// Delay between health check attempts, in milliseconds
    #[serde(default = "default_health_delay")]
    pub health_check_delay_ms: u64,

    /// Platform commission rate in basis points (500 = 5%)
    #[validate(range(min = 0, max = 10000))]
    #[serde(default = "default_commission_bps")]
    pub commission_rate_bps: u32,

    /// Hours after creation during which a buyer may cancel
    #[serde(default = "default_cancellation_window")]
    pub cancellation_window_hours: i64,

    /// Seconds between shipment and the simulated carrier pickup; 0 disables
    /// the timer and leaves the pickup endpoint as the only trigger
    #[serde(default = "default_pickup_delay")]
    pub carrier_pickup_delay_secs: u64,

    /// Runtime environment: development, staging, production
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON
    #[serde(default)]
    pub log_json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_gateway_timeout() -> u64 {
    DEFAULT_GATEWAY_TIMEOUT_SECS
}
fn default_health_attempts() -> u32 {
    DEFAULT_HEALTH_CHECK_ATTEMPTS
}
fn default_health_delay() -> u64 {
    DEFAULT_HEALTH_CHECK_DELAY_MS
}
fn default_commission_bps() -> u32 {
    DEFAULT_COMMISSION_RATE_BPS
}
fn default_cancellation_window() -> i64 {
    DEFAULT_CANCELLATION_WINDOW_HOURS
}
fn default_pickup_delay() -> u64 {
    DEFAULT_CARRIER_PICKUP_DELAY_SECS
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn validate_base_url(url: &str) -> Result<(), ValidationError> {
    url::Url::parse(url).map_err(|_| {
        let mut err = ValidationError::new("url");
        err.message = Some("gateway_base_url must be an absolute URL".into());
        err
    })?;
    Ok(())
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Commission rate as a decimal fraction (500 bps -> 0.05).
    pub fn commission_rate(&self) -> Decimal {
        Decimal::new(self.commission_rate_bps as i64, 4)
    }

    pub fn cancellation_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cancellation_window_hours)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Loads configuration from defaults, optional `config/{env}.toml` profiles,
/// and `ORDERFLOW__`-prefixed environment variables (highest precedence).
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("gateway_base_url", "http://localhost:4000")?
        .set_default("environment", run_env.clone())?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("ORDERFLOW").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

/// Initializes the global tracing subscriber. `RUST_LOG` overrides the
/// configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("orderflow_api={},tower_http=info", level);
    let directive = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init();
    }
}

//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: `http://localhost:3000`)
//! - `STOREFRONT_ALLOWED_ORIGINS` - Comma-separated CORS origins
//! - `UPLOAD_DIR` - Directory served under `/uploads` (default: ./uploads)
//! - `CATALOG_CACHE_TTL_SECS` - Active catalog cache lifetime (default: 60)
//! - `SHIPPING_FLAT_FEE` - Flat shipping fee (default: 15.00)
//! - `FREE_SHIPPING_THRESHOLD` - Subtotal that ships free (default: 200.00)
//! - `TAX_RATE` - Sales tax as a fraction (default: 0.08)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;
use tonewood_core::Price;
use tonewood_core::checkout::PricingRules;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
///
/// `Debug` is derived; the database URL is a `SecretString` and prints
/// redacted.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Origins allowed to call the API from a browser
    pub allowed_origins: Vec<String>,
    /// Local directory holding uploaded product images
    pub upload_dir: PathBuf,
    /// How long the active catalog stays cached
    pub catalog_cache_ttl: Duration,
    /// Shipping and tax rules applied at checkout
    pub pricing: PricingRules,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
    /// Error event sample rate
    pub sentry_sample_rate: f32,
    /// Performance trace sample rate
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or("STOREFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let allowed_origins = parse_origins(&get_env_or_default(
            "STOREFRONT_ALLOWED_ORIGINS",
            &base_url,
        ));
        let upload_dir = PathBuf::from(get_env_or_default("UPLOAD_DIR", "./uploads"));
        let catalog_cache_ttl =
            Duration::from_secs(parse_env_or("CATALOG_CACHE_TTL_SECS", "60")?);

        let pricing = PricingRules {
            flat_shipping: parse_price("SHIPPING_FLAT_FEE", "15.00")?,
            free_shipping_threshold: parse_price("FREE_SHIPPING_THRESHOLD", "200.00")?,
            tax_rate: parse_rate("TAX_RATE", "0.08")?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            allowed_origins,
            upload_dir,
            catalog_cache_ttl,
            pricing,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_price(key: &str, default: &str) -> Result<Price, ConfigError> {
    let amount: Decimal = parse_env_or(key, default)?;
    Price::new(amount).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_rate(key: &str, default: &str) -> Result<Decimal, ConfigError> {
    let rate: Decimal = parse_env_or(key, default)?;
    if rate.is_sign_negative() || rate > Decimal::ONE {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0 and 1 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Split a comma-separated origin list into normalized origins
/// (`scheme://host[:port]`). Entries that aren't absolute URLs are dropped.
pub(crate) fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| Url::parse(origin).ok())
        .map(|url| url.origin().ascii_serialization())
        .filter(|origin| origin != "null")
        .collect()
}

//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOP_BACKEND_URL` - Base URL of the shop backend (e.g., `https://api.example.com`)
//!
//! ## Optional
//! - `SHOP_CURRENCY_SYMBOL` - Currency symbol shown next to prices (default: `$`)
//! - `SHOP_DELIVERY_FEE` - Flat delivery fee added to non-empty carts (default: 10)
//! - `SHOP_TOKEN_PATH` - File holding the session token (default: `.cartwheel-token`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

/// Currency symbol used when none is configured.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Flat delivery fee used when none is configured.
pub const DEFAULT_DELIVERY_FEE: Decimal = Decimal::TEN;

/// Token file used when none is configured.
pub const DEFAULT_TOKEN_PATH: &str = ".cartwheel-token";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the shop backend
    pub backend_url: Url,
    /// Currency symbol for display
    pub currency_symbol: String,
    /// Flat delivery fee
    pub delivery_fee: Decimal,
    /// Where the session token is persisted
    pub token_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Configuration for `backend_url` with every optional value defaulted.
    #[must_use]
    pub fn new(backend_url: Url) -> Self {
        Self {
            backend_url,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            delivery_fee: DEFAULT_DELIVERY_FEE,
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SHOP_BACKEND_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend_url =
            parse_env::<Url>("SHOP_BACKEND_URL", &get_required_env("SHOP_BACKEND_URL")?)?;
        let currency_symbol = get_env_or_default("SHOP_CURRENCY_SYMBOL", DEFAULT_CURRENCY_SYMBOL);
        let delivery_fee = match get_optional_env("SHOP_DELIVERY_FEE") {
            Some(raw) => parse_env::<Decimal>("SHOP_DELIVERY_FEE", &raw)?,
            None => DEFAULT_DELIVERY_FEE,
        };
        if delivery_fee.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOP_DELIVERY_FEE".to_string(),
                "must not be negative".to_string(),
            ));
        }
        let token_path = PathBuf::from(get_env_or_default("SHOP_TOKEN_PATH", DEFAULT_TOKEN_PATH));

        Ok(Self {
            backend_url,
            currency_symbol,
            delivery_fee,
            token_path,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Absolute URL for a backend API path such as `/api/cart/add`.
    ///
    /// Any path on the configured base URL is kept as a prefix.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.backend_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating an empty value as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a raw environment value, naming the variable in the error.
fn parse_env<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

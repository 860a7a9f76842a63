//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// Value of `DATABASE_URL` that selects the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub identity_jwt_secret: String,
    pub identity_issuer: Option<String>,
    pub identity_audience: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub payment_currency: String,
    pub cors_origin: String,
    pub cookie_secure: bool,
    pub session_cookie_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Identity Provider Settings ---
        let identity_jwt_secret = std::env::var("IDENTITY_JWT_SECRET")
            .map_err(|_| ConfigError::MissingVar("IDENTITY_JWT_SECRET".to_string()))?;
        let identity_issuer = non_empty_var("IDENTITY_ISSUER");
        let identity_audience = non_empty_var("IDENTITY_AUDIENCE");

        // --- Load Payment Settings ---
        let stripe_secret_key = non_empty_var("STRIPE_SECRET_KEY");
        let payment_currency = std::env::var("PAYMENT_CURRENCY")
            .unwrap_or_else(|_| "usd".to_string())
            .to_lowercase();

        // --- Load HTTP Settings ---
        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let cookie_secure = parse_bool(
            "COOKIE_SECURE",
            &std::env::var("COOKIE_SECURE").unwrap_or_else(|_| "true".to_string()),
        )?;

        let days_str = std::env::var("SESSION_COOKIE_DAYS").unwrap_or_else(|_| "7".to_string());
        let session_cookie_days = days_str
            .parse::<i64>()
            .ok()
            .filter(|days| *days > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SESSION_COOKIE_DAYS".to_string(),
                    format!("'{}' is not a positive number of days", days_str),
                )
            })?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            identity_jwt_secret,
            identity_issuer,
            identity_audience,
            stripe_secret_key,
            payment_currency,
            cors_origin,
            cookie_secure,
            session_cookie_days,
        })
    }

    /// The Stripe key, required once the server wires up its payment processor.
    pub fn require_stripe_key(&self) -> Result<&str, ConfigError> {
        self.stripe_secret_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("STRIPE_SECRET_KEY".to_string()))
    }

    /// Whether the in-memory store was requested instead of postgres.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "off").unwrap());
        assert!(matches!(
            parse_bool("X", "maybe"),
            Err(ConfigError::InvalidValue(name, _)) if name == "X"
        ));
    }

    fn config_without_stripe() -> Config {
        Config {
            bind_address: "127.0.0.1:3000".parse().unwrap(),
            database_url: MEMORY_DATABASE_URL.to_string(),
            log_level: Level::INFO,
            identity_jwt_secret: "secret".to_string(),
            identity_issuer: None,
            identity_audience: None,
            stripe_secret_key: None,
            payment_currency: "usd".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            cookie_secure: true,
            session_cookie_days: 7,
        }
    }

    #[test]
    fn test_missing_stripe_key_is_a_config_error() {
        let config = config_without_stripe();
        let err = config.require_stripe_key().unwrap_err();
        assert!(matches!(&err, ConfigError::MissingVar(name) if name == "STRIPE_SECRET_KEY"));

        // Reported like every other missing variable
        let err = crate::error::ApiError::from(err);
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing the environment variable STRIPE_SECRET_KEY"
        );

        let config = Config {
            stripe_secret_key: Some("sk_test_123".to_string()),
            ..config_without_stripe()
        };
        assert_eq!(config.require_stripe_key().unwrap(), "sk_test_123");
    }
}

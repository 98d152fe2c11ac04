//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GEEKSHOP_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `GEEKSHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `GEEKSHOP_PORT` - Listen port (default: 8000)
//! - `GEEKSHOP_BASE_URL` - Public URL (default: <http://localhost:8000>)
//! - `GEEKSHOP_STATIC_DIR` - Static asset directory (default: crates/storefront/static)
//! - `GEEKSHOP_LOG_JSON` - Emit JSON log lines when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used for the secure-cookie flag and same-site redirects
    pub base_url: Url,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Emit JSON logs instead of human-readable lines
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or any variable
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("GEEKSHOP_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("GEEKSHOP_DATABASE_URL".to_string()))?;

        let host = parse_var(&lookup, "GEEKSHOP_HOST", "127.0.0.1")?;
        let port = parse_var(&lookup, "GEEKSHOP_PORT", "8000")?;
        let base_url = parse_var(&lookup, "GEEKSHOP_BASE_URL", "http://localhost:8000")?;
        let static_dir = PathBuf::from(
            lookup("GEEKSHOP_STATIC_DIR").unwrap_or_else(|| "crates/storefront/static".to_string()),
        );
        let log_json = lookup("GEEKSHOP_LOG_JSON").is_some_and(|v| !v.is_empty() && v != "0");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            static_dir,
            log_json,
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_var(&lookup, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_var(&lookup, "SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

/// Parse a variable with a default.
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            StorefrontConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x/y")]))
                .unwrap();

        assert_eq!(config.database_url.expose_secret(), "postgres://x/y");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(config.base_url.as_str(), "http://localhost:8000/");
        assert!(!config.is_secure());
        assert!(!config.log_json);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_prefixed_database_url_wins() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://generic/db"),
            ("GEEKSHOP_DATABASE_URL", "postgres://shop/db"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://shop/db");
    }

    #[test]
    fn test_missing_database_url() {
        let err = StorefrontConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_invalid_port() {
        let err = StorefrontConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x/y"),
            ("GEEKSHOP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "GEEKSHOP_PORT"));
    }

    #[test]
    fn test_https_base_url_is_secure() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x/y"),
            ("GEEKSHOP_BASE_URL", "https://shop.example.com"),
            ("GEEKSHOP_LOG_JSON", "1"),
        ]))
        .unwrap();
        assert!(config.is_secure());
        assert!(config.log_json);
    }
}

//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (`https://` enables secure cookies)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SESSION_IDLE_MINUTES` - Minutes of inactivity before a shopper's cart is dropped (default: 60)
//! - `PAYMENT_PROVIDER` - `sandbox` (default) or `widget`. In `widget` mode the
//!   browser's approval reference is not verified with the processor.
//! - `SANDBOX_DECLINE_ABOVE` - Sandbox declines any amount above this decimal limit
//! - `PAYPAL_CLIENT_ID` - Public client id handed to the browser payment widget
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use sleek_shop_core::Price;
use thiserror::Error;

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
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// How long an idle shopper session keeps its cart
    pub session_idle: Duration,
    /// Payment capture configuration
    pub payments: PaymentConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Which payment path checkout uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentProviderKind {
    /// Server-side simulated processor; approves unless over the decline limit.
    #[default]
    Sandbox,
    /// The browser widget captures payment and reports back on the callback route.
    ///
    /// The reported reference is trusted as sent. Deploy this only where
    /// orders are checked against the processor before they are fulfilled.
    Widget,
}

impl FromStr for PaymentProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "widget" => Ok(Self::Widget),
            other => Err(format!("unknown payment provider: {other}")),
        }
    }
}

/// Payment configuration.
#[derive(Debug, Clone, Default)]
pub struct PaymentConfig {
    pub provider: PaymentProviderKind,
    /// Sandbox declines amounts strictly above this.
    pub sandbox_decline_above: Option<Price>,
    /// Public widget client id (safe to expose in browser)
    pub paypal_client_id: Option<String>,
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

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let idle_minutes: u64 = parse_env("SESSION_IDLE_MINUTES", "60")?;

        Ok(Self {
            host,
            port,
            base_url,
            session_idle: Duration::from_secs(idle_minutes.saturating_mul(60)),
            payments: PaymentConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Local development configuration: sandbox payments, plain-HTTP cookies,
    /// one hour of session idle time.
    #[must_use]
    pub fn local() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_idle: Duration::from_secs(60 * 60),
            payments: PaymentConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let provider = parse_env("PAYMENT_PROVIDER", "sandbox")?;
        let sandbox_decline_above = get_optional_env("SANDBOX_DECLINE_ABOVE")
            .map(|raw| raw.parse::<Price>())
            .transpose()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SANDBOX_DECLINE_ABOVE".to_string(), e.to_string())
            })?;

        Ok(Self {
            provider,
            sandbox_decline_above,
            paypal_client_id: get_optional_env("PAYPAL_CLIENT_ID"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig::local()
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure_follows_scheme() {
        assert!(!config().is_secure());
        let https = StorefrontConfig {
            base_url: "https://shop.example".to_string(),
            ..config()
        };
        assert!(https.is_secure());
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!(
            "sandbox".parse::<PaymentProviderKind>(),
            Ok(PaymentProviderKind::Sandbox)
        );
        assert_eq!(
            " Widget ".parse::<PaymentProviderKind>(),
            Ok(PaymentProviderKind::Widget)
        );
        assert!("stripe".parse::<PaymentProviderKind>().is_err());
    }

    #[test]
    fn test_missing_required_env_var() {
        let err = get_required_env("SLEEK_SHOP_TEST_DEFINITELY_UNSET").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }
}

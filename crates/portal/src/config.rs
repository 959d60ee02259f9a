//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PORTAL_BASE_URL` - Public URL of the portal (app proxy target)
//! - `SHOPIFY_API_KEY` - Shopify app client ID
//! - `SHOPIFY_API_SECRET` - Shopify app client secret (signs app-proxy and OAuth requests)
//! - `CULTO_API_TOKEN` - Bearer token for the Culto subscription API
//!
//! ## Optional
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 3000)
//! - `SHOPIFY_SCOPES` - OAuth scopes (default: `read_customers,write_customers,read_orders`)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2024-01)
//! - `SHOPIFY_ACCESS_TOKEN` - Offline Admin API token used when no online token is in the session
//! - `CULTO_API_BASE_URL` - Culto API base (default: `https://api.culto.coffee`)
//! - `PORTAL_DEBUG_TOOLS` - Enable the status override panel (default: false)
//! - `PORTAL_HELP_URL` - Link for the "¿Te quedó alguna duda?" help card
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)
//! - `LOG_FORMAT` - `json` for JSON logs, anything else for human-readable

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the portal
    pub base_url: String,
    /// Shopify app configuration
    pub shopify: ShopifyAppConfig,
    /// Culto API configuration
    pub culto: CultoApiConfig,
    /// Whether the debug status override is exposed
    pub debug_tools: bool,
    /// Link target of the help card
    pub help_url: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON logs
    pub log_json: bool,
}

/// Shopify app credentials and Admin API settings.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// App client ID
    pub api_key: String,
    /// App client secret
    pub api_secret: SecretString,
    /// Comma-separated OAuth scopes
    pub scopes: String,
    /// Admin API version (e.g., 2024-01)
    pub api_version: String,
    /// Offline Admin API access token
    pub access_token: Option<SecretString>,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("api_version", &self.api_version)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Culto API settings.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CultoApiConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Bearer token
    pub api_token: SecretString,
}

impl std::fmt::Debug for CultoApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CultoApiConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("PORTAL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORTAL_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORTAL_PORT".to_string(), e.to_string()))?;
        let base_url = parse_base_url("PORTAL_BASE_URL", &get_required_env("PORTAL_BASE_URL")?)?;

        let shopify = ShopifyAppConfig::from_env()?;
        let culto = CultoApiConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            shopify,
            culto,
            debug_tools: parse_bool(get_optional_env("PORTAL_DEBUG_TOOLS").as_deref()),
            help_url: get_optional_env("PORTAL_HELP_URL").filter(|s| !s.is_empty()),
            sentry_dsn: get_optional_env("SENTRY_DSN").filter(|s| !s.is_empty()),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
            log_json: get_optional_env("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be `Secure` (and may be `SameSite=None`).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ShopifyAppConfig {
    /// Load the Shopify app settings alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a secret
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
            scopes: get_env_or_default("SHOPIFY_SCOPES", "read_customers,write_customers,read_orders"),
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2024-01"),
            access_token: get_optional_env("SHOPIFY_ACCESS_TOKEN")
                .filter(|s| !s.is_empty())
                .map(SecretString::from),
        })
    }
}

impl CultoApiConfig {
    /// Load the Culto API settings alone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CULTO_API_TOKEN` is missing or weak.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(
                "CULTO_API_BASE_URL",
                &get_env_or_default("CULTO_API_BASE_URL", "https://api.culto.coffee"),
            )?,
            api_token: get_validated_secret("CULTO_API_TOKEN")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// An absolute http(s) URL, without the trailing slash.
fn parse_base_url(key: &str, value: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// `true`, `1`, `yes` and `on` (any case) enable a flag.
fn parse_bool(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )
    })
}

/// Parse a sample rate in `[0, 1]`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0 and 1 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

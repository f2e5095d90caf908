//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `CHECKOUT_WHATSAPP_NUMBER` - Store's WhatsApp number, digits only with country code
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CHECKOUT_SHIPPING_FEE` - Flat shipping fee (default: 1500)
//! - `STORE_CURRENCY` - ISO currency code (default: NGN)
//! - `CLOUDINARY_CLOUD_NAME` / `CLOUDINARY_UPLOAD_PRESET` - Image hosting (both or neither)
//! - `CLOUDINARY_FOLDER` - Upload folder (default: products)
//! - `EMAILJS_SERVICE_ID` / `EMAILJS_TEMPLATE_ID` / `EMAILJS_PUBLIC_KEY` - Access code mail
//! - `STOREFRONT_TRUST_PROXY_HEADERS` - Key rate limits on proxy client-IP
//!   headers instead of the peer address (default: false). Only enable behind
//!   a proxy that overwrites them.
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use sparktizen_core::{CurrencyCode, Price, ShippingPolicy};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
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

/// Storefront application configuration.
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
    /// Session signing secret
    pub session_secret: SecretString,
    /// Whether proxy client-IP headers are trusted for rate limiting
    pub trust_proxy_headers: bool,
    /// Checkout and pricing settings
    pub checkout: CheckoutConfig,
    /// Image hosting, if configured
    pub cloudinary: Option<CloudinaryConfig>,
    /// Access code delivery, if configured
    pub emailjs: Option<EmailJsConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Checkout settings: where orders go and how they are priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// WhatsApp number orders are sent to, digits only.
    pub whatsapp_number: String,
    pub shipping: ShippingPolicy,
    pub currency: CurrencyCode,
}

impl CheckoutConfig {
    /// Checkout settings with the default shipping fee and currency.
    #[must_use]
    pub fn new(whatsapp_number: impl Into<String>) -> Self {
        Self {
            whatsapp_number: whatsapp_number.into(),
            shipping: ShippingPolicy::default(),
            currency: CurrencyCode::default(),
        }
    }
}

/// Cloudinary unsigned upload configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub folder: String,
}

/// `EmailJS` configuration.
///
/// Implements `Debug` manually to redact the public key.
#[derive(Clone)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: SecretString,
}

impl std::fmt::Debug for EmailJsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailJsConfig")
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("public_key", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
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

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;
        let trust_proxy_headers = parse_flag(
            "STOREFRONT_TRUST_PROXY_HEADERS",
            &get_env_or_default("STOREFRONT_TRUST_PROXY_HEADERS", "false"),
        )?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            trust_proxy_headers,
            checkout: CheckoutConfig::from_env()?,
            cloudinary: CloudinaryConfig::from_env()?,
            emailjs: EmailJsConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CheckoutConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let whatsapp_number = get_required_env("CHECKOUT_WHATSAPP_NUMBER")?;
        validate_whatsapp_number(&whatsapp_number, "CHECKOUT_WHATSAPP_NUMBER")?;

        let fee = get_env_or_default("CHECKOUT_SHIPPING_FEE", "1500");
        let fee = Price::parse(&fee).map_err(|e| {
            ConfigError::InvalidEnvVar("CHECKOUT_SHIPPING_FEE".to_string(), e.to_string())
        })?;

        let currency = get_env_or_default("STORE_CURRENCY", "NGN")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("STORE_CURRENCY".to_string(), e))?;

        Ok(Self {
            whatsapp_number,
            shipping: ShippingPolicy::flat(fee),
            currency,
        })
    }
}

impl CloudinaryConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cloud_name = get_optional_env("CLOUDINARY_CLOUD_NAME");
        let upload_preset = get_optional_env("CLOUDINARY_UPLOAD_PRESET");

        match (cloud_name, upload_preset) {
            (Some(cloud_name), Some(upload_preset)) => Ok(Some(Self {
                cloud_name,
                upload_preset,
                folder: get_env_or_default("CLOUDINARY_FOLDER", "products"),
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar(
                "CLOUDINARY_UPLOAD_PRESET".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(
                "CLOUDINARY_CLOUD_NAME".to_string(),
            )),
        }
    }
}

impl EmailJsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(service_id) = get_optional_env("EMAILJS_SERVICE_ID") else {
            return Ok(None);
        };

        Ok(Some(Self {
            service_id,
            template_id: get_required_env("EMAILJS_TEMPLATE_ID")?,
            public_key: get_required_secret("EMAILJS_PUBLIC_KEY")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

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

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean switch such as `true`, `1`, `yes` or `off`.
fn parse_flag(var_name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("expected true or false, got {other:?}"),
        )),
    }
}

/// `wa.me` links take the number as bare digits including the country code.
fn validate_whatsapp_number(number: &str, var_name: &str) -> Result<(), ConfigError> {
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must contain only digits, including the country code (e.g. 2348012345678)"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
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

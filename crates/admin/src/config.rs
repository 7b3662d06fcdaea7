//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the admin console
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `MEDIA_ROOT` - Local media directory (default: ./public/media)
//! - `FIXTURES_DIR` - Directory of JSON fixture files for imports (default: ./fixtures)
//! - `ABANDONED_CART_HOURS` - Inactivity window before a cart counts as abandoned (default: 24)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (blob storage - enables media upload to the cloud and sync)
//! - `BLOB_BUCKET` - Bucket name
//! - `BLOB_ACCESS_KEY` - Access key ID
//! - `BLOB_SECRET_KEY` - Secret access key
//! - `BLOB_REGION` - Region (default: us-east-1)
//! - `BLOB_ENDPOINT` - Custom S3-compatible endpoint (R2, `MinIO`, ...)
//! - `BLOB_PREFIX` - Key prefix for media objects (default: media/)
//! - `BLOB_PATH_STYLE` - Use path-style addressing (default: false)
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_ABANDONED_CART_HOURS: i32 = 24;
const DEFAULT_BLOB_PREFIX: &str = "media/";

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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin console
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Local directories used by media and import pipelines
    pub paths: PathsConfig,
    /// Blob storage (optional - media stays local-only without it)
    pub blob: Option<BlobConfig>,
    /// Hours of inactivity before a cart is considered abandoned
    pub abandoned_cart_hours: i32,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Filesystem locations.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Root of the local media library.
    pub media_root: PathBuf,
    /// Default source directory for fixture imports.
    pub fixtures_dir: PathBuf,
}

impl PathsConfig {
    /// Read `MEDIA_ROOT` and `FIXTURES_DIR`, with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            media_root: PathBuf::from(get_env_or_default("MEDIA_ROOT", "./public/media")),
            fixtures_dir: PathBuf::from(get_env_or_default("FIXTURES_DIR", "./fixtures")),
        }
    }
}

/// S3-compatible blob storage configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct BlobConfig {
    /// Bucket holding media objects.
    pub bucket: String,
    /// Region name.
    pub region: String,
    /// Custom endpoint for S3-compatible providers.
    pub endpoint: Option<String>,
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: SecretString,
    /// Prefix under which media keys live (always ends with `/` unless empty).
    pub prefix: String,
    /// Whether to use path-style bucket addressing.
    pub path_style: bool,
}

impl std::fmt::Debug for BlobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("prefix", &self.prefix)
            .field("path_style", &self.path_style)
            .finish()
    }
}

impl BlobConfig {
    /// Load blob storage configuration from environment.
    ///
    /// Returns `Ok(None)` when no blob variables are set. Bucket, access key
    /// and secret key must be set together.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if only some of the required
    /// variables are present.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let bucket = get_optional_env("BLOB_BUCKET");
        let access_key = get_optional_env("BLOB_ACCESS_KEY");
        let secret_key = get_optional_env("BLOB_SECRET_KEY");

        match (bucket, access_key, secret_key) {
            (Some(bucket), Some(access_key), Some(secret_key)) => {
                if let Err(e) = validate_secret_strength(&secret_key, "BLOB_SECRET_KEY") {
                    tracing::warn!("BLOB_SECRET_KEY validation warning: {e}");
                }
                let path_style = get_env_or_default("BLOB_PATH_STYLE", "false")
                    .parse::<bool>()
                    .map_err(|e| {
                        ConfigError::InvalidEnvVar("BLOB_PATH_STYLE".to_string(), e.to_string())
                    })?;
                Ok(Some(Self {
                    bucket,
                    region: get_env_or_default("BLOB_REGION", "us-east-1"),
                    endpoint: get_optional_env("BLOB_ENDPOINT"),
                    access_key,
                    secret_key: SecretString::from(secret_key),
                    prefix: normalize_prefix(&get_env_or_default(
                        "BLOB_PREFIX",
                        DEFAULT_BLOB_PREFIX,
                    )),
                    path_style,
                }))
            }
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "BLOB_*".to_string(),
                "BLOB_BUCKET, BLOB_ACCESS_KEY and BLOB_SECRET_KEY must be set together"
                    .to_string(),
            )),
        }
    }
}

/// Trim slashes from a key prefix and re-append a single trailing one.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
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

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_BASE_URL".to_string(), e.to_string()))?;
        let session_secret = get_validated_secret("ADMIN_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "ADMIN_SESSION_SECRET")?;

        let abandoned_cart_hours = parse_abandoned_cart_hours(
            get_optional_env("ABANDONED_CART_HOURS").as_deref(),
        )?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            paths: PathsConfig::from_env(),
            blob: BlobConfig::from_env()?,
            abandoned_cart_hours,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls: TlsConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the blob storage configuration, if configured.
    #[must_use]
    pub const fn blob(&self) -> Option<&BlobConfig> {
        self.blob.as_ref()
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn parse_abandoned_cart_hours(raw: Option<&str>) -> Result<i32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_ABANDONED_CART_HOURS);
    };
    match raw.parse::<i32>() {
        Ok(hours) if hours > 0 => Ok(hours),
        Ok(hours) => Err(ConfigError::InvalidEnvVar(
            "ABANDONED_CART_HOURS".to_string(),
            format!("must be positive (got {hours})"),
        )),
        Err(e) => Err(ConfigError::InvalidEnvVar(
            "ABANDONED_CART_HOURS".to_string(),
            e.to_string(),
        )),
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
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

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
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

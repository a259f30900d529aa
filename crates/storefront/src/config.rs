//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Backend (optional, but the shop is read-only without it)
//! - `SUPABASE_URL` / `NEXT_PUBLIC_SUPABASE_URL` - Project URL of the backend
//! - `SUPABASE_ANON_KEY` / `NEXT_PUBLIC_SUPABASE_ANON_KEY` - Public anon key
//! - `SUPABASE_ORDERS_TABLE` - Order table name (default: orders)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `STRIPE_PUBLISHABLE_KEY` - Shown on the payment page as test/live mode
//! - `PAYMENT_CONFIRMATION_DELAY_MS` - Simulated payment delay (default: 2000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Words that mark a template value (case-insensitive, whole tokens only).
///
/// Project refs and base64 keys routinely contain these as substrings, so a
/// value is only rejected when one appears between separators.
const PLACEHOLDER_TOKENS: &[&str] = &[
    "your",
    "changeme",
    "replace",
    "placeholder",
    "todo",
    "insert",
    "enter",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
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
    /// Identity provider and order store
    pub backend: BackendConfig,
    /// Payment page and simulated confirmation
    pub payments: PaymentConfig,
    /// Sentry error tracking
    pub sentry: SentryConfig,
}

/// Connection settings for the backend-as-a-service.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// URL and anon key are both present and look real.
    Configured(SupabaseConfig),
    /// Something is missing; auth and order history are disabled.
    Unconfigured {
        /// Why the backend is disabled, for the startup warning.
        reason: String,
    },
}

impl BackendConfig {
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }
}

/// Supabase project settings.
///
/// Implements `Debug` manually to redact the anon key.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub url: Url,
    /// Public anon key, sent as `apikey` on every request
    pub anon_key: SecretString,
    /// Table holding orders
    pub orders_table: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("orders_table", &self.orders_table)
            .finish()
    }
}

/// Payment page settings.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Publishable key; only its mode prefix is ever shown
    pub publishable_key: Option<String>,
    /// How long simulated confirmations take
    pub confirmation_delay: Duration,
}

impl PaymentConfig {
    /// Whether the configured key is a test-mode key.
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.publishable_key
            .as_deref()
            .is_none_or(|key| key.starts_with("pk_test_"))
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            publishable_key: None,
            confirmation_delay: Duration::from_millis(DEFAULT_PAYMENT_DELAY_MS),
        }
    }
}

/// Sentry settings.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        }
    }
}

const DEFAULT_PAYMENT_DELAY_MS: u64 = 2000;

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid. A missing
    /// or placeholder backend is not an error; see [`BackendConfig`].
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env
            .or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string()))?;
        let base_url = env.or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            host,
            port,
            base_url,
            backend: BackendConfig::from_env(&env)?,
            payments: PaymentConfig::from_env(&env)?,
            sentry: SentryConfig::from_env(&env)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let url = env.first_of(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"]);
        let key = env.first_of(&["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"]);

        let (Some((url_var, url)), Some((key_var, key))) = (url, key) else {
            return Ok(Self::Unconfigured {
                reason: "SUPABASE_URL and SUPABASE_ANON_KEY must both be set".to_string(),
            });
        };

        if let Err(ConfigError::InsecureSecret(var, why)) = reject_placeholder(&url, url_var)
            .and_then(|()| reject_placeholder(&key, key_var))
        {
            return Ok(Self::Unconfigured {
                reason: format!("{var} {why}"),
            });
        }

        let url = Url::parse(&url)
            .map_err(|e| ConfigError::InvalidEnvVar(url_var.to_string(), e.to_string()))?;

        Ok(Self::Configured(SupabaseConfig {
            url,
            anon_key: SecretString::from(key),
            orders_table: env.or_default("SUPABASE_ORDERS_TABLE", "orders"),
        }))
    }
}

impl PaymentConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let delay_ms = env
            .or_default(
                "PAYMENT_CONFIRMATION_DELAY_MS",
                &DEFAULT_PAYMENT_DELAY_MS.to_string(),
            )
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PAYMENT_CONFIRMATION_DELAY_MS".to_string(), e.to_string())
            })?;

        Ok(Self {
            publishable_key: env.optional("STRIPE_PUBLISHABLE_KEY"),
            confirmation_delay: Duration::from_millis(delay_ms),
        })
    }
}

impl SentryConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.optional("SENTRY_ENVIRONMENT"),
            sample_rate: parse_rate(env, "SENTRY_SAMPLE_RATE", 1.0)?,
            traces_sample_rate: parse_rate(env, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source; empty values count as unset.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional environment variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get an environment variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// First set variable among `keys`, with the name it was found under.
    fn first_of<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, String)> {
        keys.iter()
            .find_map(|key| self.optional(key).map(|value| (*key, value)))
    }
}

fn parse_rate(env: &Env<'_>, key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = env.optional(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Reject values that look like unedited template placeholders.
fn reject_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    let placeholder = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|token| {
            PLACEHOLDER_TOKENS.contains(token)
                || (token.len() >= 3 && token.chars().all(|c| c == 'x'))
        });
    match placeholder {
        Some(token) => Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{token}')"),
        )),
        None => Ok(()),
    }
}

/// Expose the anon key for request headers.
#[must_use]
pub fn anon_key(config: &SupabaseConfig) -> &str {
    config.anon_key.expose_secret()
}

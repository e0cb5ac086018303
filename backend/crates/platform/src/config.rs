//! Primitive Configuration
//!
//! Runtime settings for token signing.

use std::env;
use std::time::Duration;

use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::{from_base64, to_base64};
use crate::token::SignOptions;

/// Base64 (standard alphabet) HMAC secret
pub const ENV_TOKEN_SECRET: &str = "TOKEN_SECRET";
/// Default token lifetime in seconds
pub const ENV_TOKEN_TTL_SECS: &str = "TOKEN_TTL_SECS";

/// Secrets shorter than this are refused outside development
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not valid base64: {source}")]
    InvalidSecret {
        name: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("{name} must be at least {min} bytes (got {actual})")]
    SecretTooShort {
        name: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("{name} must be an integer between 0 and {max}: {value:?}", max = i64::MAX)]
    InvalidNumber { name: &'static str, value: String },
}

/// Primitive configuration
#[derive(Clone)]
pub struct PrimitivesConfig {
    /// HMAC secret for token signatures
    pub token_secret: Zeroizing<Vec<u8>>,
    /// Lifetime given to tokens when the caller does not choose one
    pub token_ttl: Duration,
}

impl Default for PrimitivesConfig {
    fn default() -> Self {
        Self {
            token_secret: Zeroizing::new(Vec::new()),
            token_ttl: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl std::fmt::Debug for PrimitivesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitivesConfig")
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl PrimitivesConfig {
    /// Create config with a random token secret (for development)
    pub fn with_random_secret() -> Self {
        let mut secret = vec![0u8; MIN_SECRET_LEN];
        rand::rng().fill_bytes(&mut secret);
        Self {
            token_secret: Zeroizing::new(secret),
            ..Default::default()
        }
    }

    /// Development config: random secret unless one is provided
    pub fn development() -> Result<Self, ConfigError> {
        let lookup = |name: &str| env::var(name).ok();
        if lookup(ENV_TOKEN_SECRET).is_some() {
            return Self::from_lookup(lookup);
        }
        tracing::warn!("{} not set, using a random development secret", ENV_TOKEN_SECRET);
        Self::with_secret(Self::with_random_secret().token_secret, lookup)
    }

    /// Load from process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_secret = lookup(ENV_TOKEN_SECRET).ok_or(ConfigError::Missing(ENV_TOKEN_SECRET))?;
        let token_secret =
            Zeroizing::new(from_base64(raw_secret.trim()).map_err(|source| {
                ConfigError::InvalidSecret {
                    name: ENV_TOKEN_SECRET,
                    source,
                }
            })?);
        if token_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                name: ENV_TOKEN_SECRET,
                min: MIN_SECRET_LEN,
                actual: token_secret.len(),
            });
        }
        Self::with_secret(token_secret, lookup)
    }

    fn with_secret<F>(token_secret: Zeroizing<Vec<u8>>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_ttl = match lookup(ENV_TOKEN_TTL_SECS) {
            Some(raw) => Duration::from_secs(parse_number(ENV_TOKEN_TTL_SECS, &raw)?),
            None => Self::default().token_ttl,
        };

        tracing::debug!(
            token_ttl_secs = token_ttl.as_secs(),
            "Loaded primitives configuration"
        );

        Ok(Self {
            token_secret,
            token_ttl,
        })
    }

    /// Secret as slice
    pub fn secret(&self) -> &[u8] {
        &self.token_secret
    }

    /// Secret in the form [`ENV_TOKEN_SECRET`] expects
    pub fn secret_base64(&self) -> String {
        to_base64(&self.token_secret)
    }

    /// Sign options carrying the configured lifetime
    ///
    /// A lifetime beyond `i64::MAX` seconds is clamped rather than wrapped.
    pub fn default_sign_options(&self) -> SignOptions {
        SignOptions::expires_in(i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX))
    }
}

/// Parse a count of seconds that also fits a signed token claim
fn parse_number(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        })
}

//! Cookie store configuration.
//!
//! Adapters take a [`CookieStoreConfig`] explicitly. The process-wide default
//! below exists because the writer of the cookie and whoever reads it on a
//! later request must agree on its name; it is meant to be set once during
//! startup (or test setup) and read afterwards. Concurrent overrides are last
//! write wins.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use configs::{
    is_valid_cookie_name, PersistenceConfig, DEFAULT_COOKIE_LENGTH_SECS, DEFAULT_COOKIE_NAME,
    MAX_COOKIE_LENGTH_SECS,
};
use once_cell::sync::Lazy;
use tracing::info;

use crate::errors::PersistenceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieStoreConfig {
    /// Name of the cookie holding the encoded mapping.
    pub cookie_name: String,
    /// Added to the adapter's construction time to compute `Expires`.
    pub cookie_length: Duration,
}

/// Longest accepted [`CookieStoreConfig::cookie_length`].
pub const MAX_COOKIE_LENGTH: Duration = Duration::from_secs(MAX_COOKIE_LENGTH_SECS);

impl Default for CookieStoreConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.into(),
            cookie_length: Duration::from_secs(DEFAULT_COOKIE_LENGTH_SECS),
        }
    }
}

impl CookieStoreConfig {
    pub fn new(cookie_name: impl Into<String>, cookie_length: Duration) -> Self {
        Self { cookie_name: cookie_name.into(), cookie_length }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_cookie_length(mut self, length: Duration) -> Self {
        self.cookie_length = length;
        self
    }

    pub fn validate(&self) -> Result<(), PersistenceError> {
        if !is_valid_cookie_name(&self.cookie_name) {
            return Err(PersistenceError::invalid_config(format!(
                "cookie name {:?} is not a valid cookie name",
                self.cookie_name
            )));
        }
        if self.cookie_length.is_zero() {
            return Err(PersistenceError::invalid_config("cookie length must be positive"));
        }
        if self.cookie_length > MAX_COOKIE_LENGTH {
            return Err(PersistenceError::invalid_config(format!(
                "cookie length must be at most {}s",
                MAX_COOKIE_LENGTH.as_secs()
            )));
        }
        Ok(())
    }
}

impl TryFrom<&PersistenceConfig> for CookieStoreConfig {
    type Error = PersistenceError;

    fn try_from(settings: &PersistenceConfig) -> Result<Self, Self::Error> {
        let cfg = Self::new(
            settings.cookie_name.trim(),
            Duration::from_secs(settings.cookie_length_secs()),
        );
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Partial update merged into the process default by [`with_config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cookie_key_name: Option<String>,
    pub cookie_length: Option<Duration>,
}

impl ConfigOverrides {
    pub fn cookie_key_name(name: impl Into<String>) -> Self {
        Self { cookie_key_name: Some(name.into()), ..Self::default() }
    }

    fn apply(self, base: &CookieStoreConfig) -> CookieStoreConfig {
        CookieStoreConfig {
            cookie_name: self.cookie_key_name.unwrap_or_else(|| base.cookie_name.clone()),
            cookie_length: self.cookie_length.unwrap_or(base.cookie_length),
        }
    }
}

static DEFAULT_CONFIG: Lazy<ArcSwap<CookieStoreConfig>> =
    Lazy::new(|| ArcSwap::from_pointee(CookieStoreConfig::default()));

/// Snapshot of the process default.
pub fn current() -> Arc<CookieStoreConfig> {
    DEFAULT_CONFIG.load_full()
}

/// Merge `overrides` into the process default. Invalid results are rejected
/// and leave the default untouched.
pub fn with_config(overrides: ConfigOverrides) -> Result<Arc<CookieStoreConfig>, PersistenceError> {
    let merged = overrides.apply(&current());
    merged.validate()?;
    let merged = Arc::new(merged);
    DEFAULT_CONFIG.store(Arc::clone(&merged));
    info!(cookie_name = %merged.cookie_name, cookie_length_secs = merged.cookie_length.as_secs(), "cookie store config updated");
    Ok(merged)
}

/// Publish settings loaded by the `configs` crate as the process default.
pub fn install(settings: &PersistenceConfig) -> Result<Arc<CookieStoreConfig>, PersistenceError> {
    let cfg = CookieStoreConfig::try_from(settings)?;
    with_config(ConfigOverrides {
        cookie_key_name: Some(cfg.cookie_name),
        cookie_length: Some(cfg.cookie_length),
    })
}

/// Restore the built-in defaults.
pub fn reset_config() {
    DEFAULT_CONFIG.store(Arc::new(CookieStoreConfig::default()));
}

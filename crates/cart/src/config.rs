//! Cart session configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_POLL_INTERVAL_MS` - Identity watcher polling interval in
//!   milliseconds (default: 1000, minimum: 10)
//! - `CART_STORE_PATH` - Path to the JSON store file; when unset the
//!   session runs against an in-memory store

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default identity polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest accepted polling interval.
///
/// The poller is a fallback for the store-change event; anything tighter
/// than this just burns cycles re-reading an unchanged record.
const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart session configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Identity watcher polling interval.
    pub poll_interval: Duration,
    /// Backing store file; `None` selects the in-memory store.
    pub store_path: Option<PathBuf>,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            store_path: None,
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but fails to parse
    /// or validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let poll_interval = match get_optional_env("CART_POLL_INTERVAL_MS") {
            Some(raw) => parse_poll_interval(&raw)?,
            None => DEFAULT_POLL_INTERVAL,
        };
        let store_path = get_optional_env("CART_STORE_PATH").map(PathBuf::from);

        Ok(Self {
            poll_interval,
            store_path,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse and validate a polling interval in milliseconds.
fn parse_poll_interval(raw: &str) -> Result<Duration, ConfigError> {
    let millis = raw.parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("CART_POLL_INTERVAL_MS".to_string(), e.to_string())
    })?;
    if millis < MIN_POLL_INTERVAL_MS {
        return Err(ConfigError::InvalidEnvVar(
            "CART_POLL_INTERVAL_MS".to_string(),
            format!("must be at least {MIN_POLL_INTERVAL_MS} ms (got {millis})"),
        ));
    }
    Ok(Duration::from_millis(millis))
}

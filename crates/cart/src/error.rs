//! Error types for the cart session manager.
//!
//! Errors surface only at construction time (bad configuration, an
//! unreadable store file). Runtime failures never reach the caller:
//! a corrupt persisted cart loads as empty, a rejected mutation is a
//! logged no-op, and a failed best-effort write is a logged warning.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while setting up a cart session.
#[derive(Debug, Error)]
pub enum CartError {
    /// Configuration could not be loaded or validated.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The backing store file could not be opened.
    #[error("store error: {0}")]
    Store(#[from] std::io::Error),
}

/// Result type alias for [`CartError`].
pub type Result<T> = std::result::Result<T, CartError>;

//! Eventide admin — error types.

use eventide_event_store::ConfigError;
use thiserror::Error;

/// Errors reported by the admin tool.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required setting is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection or statement error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

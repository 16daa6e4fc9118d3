//! Connection settings for the relational event store.

use thiserror::Error;

/// Environment variable holding the `PostgreSQL` connection string.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Environment variable holding the pool size.
pub const MAX_CONNECTIONS_VAR: &str = "EVENTIDE_MAX_CONNECTIONS";

/// Pool size used when none is configured.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Invalid or missing event store settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    /// An environment variable holds a value that cannot be used.
    #[error("{name} is invalid: {reason}")]
    Invalid {
        /// The offending variable.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Settings used by [`crate::PgEventStore::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStoreConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl EventStoreConfig {
    /// Creates a config with the default pool size.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Overrides the pool size.
    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Creates a config, rejecting a blank URL or an empty pool.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for a blank URL and
    /// `ConfigError::Invalid` when `max_connections` is zero.
    pub fn validated(database_url: impl Into<String>, max_connections: u32) -> Result<Self, ConfigError> {
        let database_url = database_url.into();
        if database_url.trim().is_empty() {
            return Err(ConfigError::Missing(DATABASE_URL_VAR));
        }
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: MAX_CONNECTIONS_VAR,
                reason: "must be greater than zero".to_owned(),
            });
        }
        Ok(Self::new(database_url).with_max_connections(max_connections))
    }

    /// Reads `DATABASE_URL` and `EVENTIDE_MAX_CONNECTIONS` from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is missing or the pool size is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup(DATABASE_URL_VAR).unwrap_or_default();
        let max_connections = match lookup(MAX_CONNECTIONS_VAR) {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| ConfigError::Invalid {
                name: MAX_CONNECTIONS_VAR,
                reason: e.to_string(),
            })?,
        };
        Self::validated(database_url, max_connections)
    }
}

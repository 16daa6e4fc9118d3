//! Command line arguments for the admin tool.

use clap::{Parser, Subcommand};
use eventide_event_store::config::{DATABASE_URL_VAR, DEFAULT_MAX_CONNECTIONS, MAX_CONNECTIONS_VAR};
use eventide_event_store::{ConfigError, EventStoreConfig};

/// Administers the Eventide relational event store.
#[derive(Debug, Parser)]
#[command(name = "eventide-admin", version, about)]
pub struct Cli {
    /// PostgreSQL connection string.
    #[arg(long, env = DATABASE_URL_VAR)]
    pub database_url: String,

    /// Upper bound on pooled connections.
    #[arg(long, env = MAX_CONNECTIONS_VAR, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    #[command(subcommand)]
    pub command: AdminCommand,
}

/// Maintenance operations on the `event_store` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum AdminCommand {
    /// Create the event store table and indexes if they do not exist.
    CreateStore,
    /// Delete every stored event.
    TruncateStore,
}

impl Cli {
    /// Connection settings for the event store pool.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is blank or the pool size is zero.
    pub fn store_config(&self) -> Result<EventStoreConfig, ConfigError> {
        EventStoreConfig::validated(&self.database_url, self.max_connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_create_store_with_explicit_url() {
        // Arrange
        let args = [
            "eventide-admin",
            "--database-url",
            "postgres://localhost/eventide",
            "create-store",
        ];

        // Act
        let cli = Cli::try_parse_from(args).unwrap();

        // Assert
        assert_eq!(cli.command, AdminCommand::CreateStore);
        assert_eq!(cli.database_url, "postgres://localhost/eventide");
        assert_eq!(cli.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_parses_truncate_store_with_pool_size() {
        let cli = Cli::try_parse_from([
            "eventide-admin",
            "--database-url",
            "postgres://localhost/eventide",
            "--max-connections",
            "12",
            "truncate-store",
        ])
        .unwrap();

        assert_eq!(cli.command, AdminCommand::TruncateStore);
        let config = cli.store_config().unwrap();
        assert_eq!(config.database_url, "postgres://localhost/eventide");
        assert_eq!(config.max_connections, 12);
    }

    #[test]
    fn test_zero_pool_size_is_a_config_error() {
        let cli = Cli::try_parse_from([
            "eventide-admin",
            "--database-url",
            "postgres://localhost/eventide",
            "--max-connections",
            "0",
            "create-store",
        ])
        .unwrap();

        let err = cli.store_config().unwrap_err();

        assert_eq!(
            err.to_string(),
            "EVENTIDE_MAX_CONNECTIONS is invalid: must be greater than zero"
        );
    }

    #[test]
    fn test_blank_url_is_a_config_error() {
        let cli = Cli::try_parse_from(["eventide-admin", "--database-url", " ", "truncate-store"]).unwrap();

        assert!(matches!(cli.store_config(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_rejects_missing_subcommand_and_bad_pool_size() {
        assert!(Cli::try_parse_from(["eventide-admin", "--database-url", "postgres://x"]).is_err());
        assert!(
            Cli::try_parse_from([
                "eventide-admin",
                "--database-url",
                "postgres://x",
                "--max-connections",
                "many",
                "create-store",
            ])
            .is_err()
        );
    }
}

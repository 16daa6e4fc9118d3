//! Event store database schema.

use sqlx::PgPool;

/// Name of the table holding every stored event.
pub const EVENT_STORE_TABLE: &str = "event_store";

/// DDL creating the event store table and its indexes. Every statement is
/// idempotent.
pub const CREATE_EVENT_STORE: [&str; 2] = [
    r"
CREATE TABLE IF NOT EXISTS event_store (
    domain_event_id   CHAR(36) PRIMARY KEY,
    aggregate_root_id CHAR(36) NOT NULL,
    version           INTEGER NOT NULL,
    domain_event_name VARCHAR(255) NOT NULL,
    domain_event_body JSONB NOT NULL,
    store_date        VARCHAR(50) NOT NULL,
    event_date        VARCHAR(50) NOT NULL,
    correlation_id    CHAR(36) NOT NULL,
    causation_id      CHAR(36) NOT NULL,
    event_metadata    JSONB NOT NULL,
    UNIQUE (aggregate_root_id, version)
)",
    r"
CREATE INDEX IF NOT EXISTS idx_event_store_correlation_id
    ON event_store (correlation_id)",
];

/// Removes every stored event while keeping the table.
pub const TRUNCATE_EVENT_STORE: &str = "TRUNCATE TABLE event_store";

/// Creates the event store table if it does not exist.
///
/// # Errors
///
/// Returns a `sqlx::Error` if any DDL statement fails.
#[tracing::instrument(skip(pool))]
pub async fn create_event_store(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in CREATE_EVENT_STORE {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!(table = EVENT_STORE_TABLE, "event store ready");
    Ok(())
}

/// Deletes every stored event.
///
/// # Errors
///
/// Returns a `sqlx::Error` if the table does not exist or cannot be
/// truncated.
#[tracing::instrument(skip(pool))]
pub async fn truncate_event_store(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(TRUNCATE_EVENT_STORE).execute(pool).await?;
    tracing::warn!(table = EVENT_STORE_TABLE, "event store truncated");
    Ok(())
}

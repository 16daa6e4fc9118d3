//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level error type for the event-sourcing core.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The store holds no events for the requested aggregate root.
    #[error("aggregate root id does not exist: {0}")]
    AggregateRootIdNotFound(Uuid),

    /// Optimistic concurrency conflict: the persisted stream advanced past
    /// the version the in-memory aggregate was built from.
    #[error(
        "aggregate root {aggregate_root_id} is out of sync: expected stored version {expected}, found {actual} (reload and retry)"
    )]
    AggregateRootOutOfSync {
        /// The aggregate that had the conflict.
        aggregate_root_id: Uuid,
        /// The stored version the pending events were built on.
        expected: i64,
        /// The version actually found in the store.
        actual: i64,
    },

    /// Illegal action on a domain event (set-once field, metadata).
    #[error("{0}")]
    DomainEvent(String),

    /// The repository was assembled with missing or wrong collaborators.
    #[error("repository error: {0}")]
    Repository(String),

    /// Invalid subscription change or listener failure on an event bus.
    #[error("event bus error: {0}")]
    EventBus(String),

    /// An unknown versioning strategy was requested.
    #[error("{0}")]
    SchemaMapper(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An event payload could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

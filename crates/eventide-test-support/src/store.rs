//! Test stores — `EventStore` implementations for error paths.

use async_trait::async_trait;
use eventide_core::error::DomainError;
use eventide_core::event::{DomainEvent, Event};
use eventide_core::store::EventStore;
use uuid::Uuid;

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEventStore;

#[async_trait]
impl<E: DomainEvent> EventStore<E> for FailingEventStore {
    async fn load(&self, _aggregate_root_id: Uuid) -> Result<Vec<Event<E>>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn save(&self, _events: &mut [Event<E>], _aggregate_root_id: Uuid) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

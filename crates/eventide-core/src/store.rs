//! Append-only event store abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::{DomainEvent, Event};

/// Per-aggregate, append-only event log.
#[async_trait]
pub trait EventStore<E: DomainEvent>: Send + Sync {
    /// Load all events for an aggregate, ordered by version.
    ///
    /// Fails with `DomainError::AggregateRootIdNotFound` if the aggregate has
    /// no events.
    async fn load(&self, aggregate_root_id: Uuid) -> Result<Vec<Event<E>>, DomainError>;

    /// Append versioned events to an aggregate stream.
    ///
    /// Identity fields left unset on the events are assigned in place (see
    /// [`assign_identities`]). A batch whose versions do not extend the stored
    /// stream fails with `DomainError::AggregateRootOutOfSync` and nothing is
    /// appended.
    async fn save(&self, events: &mut [Event<E>], aggregate_root_id: Uuid) -> Result<(), DomainError>;
}

/// Stamps identity fields on a batch about to be persisted.
///
/// Every event without an id gets a fresh one. An event without a causation
/// id is caused by the previous event of the batch; the first event of a
/// batch is its own cause unless a causation id was carried over explicitly.
/// Correlation ids default to the aggregate root id.
///
/// # Errors
///
/// Never fails in practice: only unset fields are written.
pub fn assign_identities<E>(events: &mut [Event<E>], aggregate_root_id: Uuid) -> Result<(), DomainError> {
    let mut previous: Option<Uuid> = None;
    for event in events.iter_mut() {
        let event_id = if let Some(id) = event.event_id() {
            id
        } else {
            let id = Uuid::new_v4();
            event.set_event_id(id)?;
            id
        };
        if event.causation_id().is_none() {
            event.set_causation_id(previous.unwrap_or(event_id))?;
        }
        if event.correlation_id().is_none() {
            event.set_correlation_id(aggregate_root_id)?;
        }
        previous = Some(event_id);
    }
    Ok(())
}

/// Checks that a non-empty batch carries consecutive versions and returns the
/// stored version it was built on.
///
/// # Errors
///
/// Returns `DomainError::DomainEvent` if an event is unversioned, a version
/// is not positive, or the versions have gaps.
pub fn batch_base_version<E>(events: &[Event<E>]) -> Result<i64, DomainError> {
    let mut base = None;
    for (offset, event) in (0_i64..).zip(events) {
        let version = event.version().ok_or_else(|| {
            DomainError::DomainEvent("Event must be versioned before it is stored".to_owned())
        })?;
        if version < 1 {
            return Err(DomainError::DomainEvent(format!(
                "Event version must be positive, found {version}"
            )));
        }
        let first = *base.get_or_insert(version - offset - 1);
        if first.checked_add(offset + 1) != Some(version) {
            return Err(DomainError::DomainEvent(format!(
                "Event versions in a batch must be consecutive, found {version} at position {offset}"
            )));
        }
    }
    base.ok_or_else(|| DomainError::DomainEvent("Cannot store an empty batch".to_owned()))
}

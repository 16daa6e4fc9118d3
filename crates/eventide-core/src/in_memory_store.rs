//! In-memory `EventStore` implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::{DomainEvent, Event};
use crate::store::{EventStore, assign_identities, batch_base_version};

/// Event store that keeps one event list per aggregate root in a map.
///
/// Appends are serialized by an internal mutex, and a batch must extend the
/// stored stream exactly, so two writers can never occupy the same version.
#[derive(Debug)]
pub struct InMemoryEventStore<E> {
    streams: Mutex<HashMap<Uuid, Vec<Event<E>>>>,
}

impl<E> InMemoryEventStore<E> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
        }
    }

    fn streams(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Vec<Event<E>>>>, DomainError> {
        self.streams
            .lock()
            .map_err(|_| DomainError::Infrastructure("in-memory store lock poisoned".to_owned()))
    }

    /// Ids of every aggregate with at least one stored event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the internal lock is poisoned.
    pub fn aggregate_ids(&self) -> Result<Vec<Uuid>, DomainError> {
        Ok(self.streams()?.keys().copied().collect())
    }

    /// Number of events stored for `aggregate_root_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the internal lock is poisoned.
    pub fn event_count(&self, aggregate_root_id: Uuid) -> Result<usize, DomainError> {
        Ok(self.streams()?.get(&aggregate_root_id).map_or(0, Vec::len))
    }
}

impl<E> Default for InMemoryEventStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for InMemoryEventStore<E> {
    #[tracing::instrument(skip(self))]
    async fn load(&self, aggregate_root_id: Uuid) -> Result<Vec<Event<E>>, DomainError> {
        let streams = self.streams()?;
        let events = streams
            .get(&aggregate_root_id)
            .cloned()
            .ok_or(DomainError::AggregateRootIdNotFound(aggregate_root_id))?;
        tracing::trace!(event_count = events.len(), "loaded stream");
        Ok(events)
    }

    #[tracing::instrument(skip(self, events), fields(event_count = events.len()))]
    async fn save(&self, events: &mut [Event<E>], aggregate_root_id: Uuid) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }
        let base = batch_base_version(events)?;

        let mut streams = self.streams()?;
        #[allow(clippy::cast_possible_wrap)]
        let stored_version = streams.get(&aggregate_root_id).map_or(0, |s| s.len() as i64);
        if base != stored_version {
            tracing::warn!(expected = base, actual = stored_version, "rejected stale batch");
            return Err(DomainError::AggregateRootOutOfSync {
                aggregate_root_id,
                expected: base,
                actual: stored_version,
            });
        }

        assign_identities(events, aggregate_root_id)?;
        streams
            .entry(aggregate_root_id)
            .or_default()
            .extend(events.iter().cloned());
        drop(streams);

        tracing::debug!(events_appended = events.len(), "events appended to stream");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{CounterEvent, versioned};

    fn batch(versions: std::ops::RangeInclusive<i64>) -> Vec<Event<CounterEvent>> {
        versions
            .map(|v| versioned(CounterEvent::Incremented { by: v }, v))
            .collect()
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip_preserves_order() {
        // Arrange
        let store = InMemoryEventStore::new();
        let aggregate_root_id = Uuid::new_v4();
        let mut events = batch(1..=3);

        // Act
        store.save(&mut events, aggregate_root_id).await.unwrap();
        let loaded = store.load(aggregate_root_id).await.unwrap();

        // Assert
        assert_eq!(loaded.len(), 3);
        let versions: Vec<Option<i64>> = loaded.iter().map(Event::version).collect();
        assert_eq!(versions, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(
            loaded.iter().map(Event::event_id).collect::<Vec<_>>(),
            events.iter().map(Event::event_id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_load_unknown_id_fails_with_not_found() {
        let store: InMemoryEventStore<CounterEvent> = InMemoryEventStore::new();
        let unknown = Uuid::new_v4();

        let result = store.load(unknown).await;

        match result {
            Err(DomainError::AggregateRootIdNotFound(id)) => assert_eq!(id, unknown),
            other => panic!("expected AggregateRootIdNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_save_appends_to_existing_stream() {
        let store = InMemoryEventStore::new();
        let aggregate_root_id = Uuid::new_v4();

        store.save(&mut batch(1..=2), aggregate_root_id).await.unwrap();
        store.save(&mut batch(3..=4), aggregate_root_id).await.unwrap();

        assert_eq!(store.event_count(aggregate_root_id).unwrap(), 4);
        let loaded = store.load(aggregate_root_id).await.unwrap();
        assert_eq!(loaded[3].version(), Some(4));
    }

    #[tokio::test]
    async fn test_streams_are_isolated_per_aggregate() {
        let store = InMemoryEventStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.save(&mut batch(1..=3), a).await.unwrap();
        store.save(&mut batch(1..=2), b).await.unwrap();

        assert_eq!(store.load(a).await.unwrap().len(), 3);
        assert_eq!(store.load(b).await.unwrap().len(), 2);
        let mut ids = store.aggregate_ids().unwrap();
        ids.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_save_rejects_occupied_versions_without_appending() {
        let store = InMemoryEventStore::new();
        let aggregate_root_id = Uuid::new_v4();
        store.save(&mut batch(1..=2), aggregate_root_id).await.unwrap();

        let result = store.save(&mut batch(2..=3), aggregate_root_id).await;

        match result {
            Err(DomainError::AggregateRootOutOfSync {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected AggregateRootOutOfSync, got {other:?}"),
        }
        assert_eq!(store.event_count(aggregate_root_id).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_save_stamps_identities_on_callers_events() {
        let store = InMemoryEventStore::new();
        let aggregate_root_id = Uuid::new_v4();
        let mut events = batch(1..=2);

        store.save(&mut events, aggregate_root_id).await.unwrap();

        assert!(events.iter().all(|e| e.event_id().is_some()));
        assert_eq!(events[1].causation_id(), events[0].event_id());
        assert_eq!(events[0].correlation_id(), Some(aggregate_root_id));
    }

    #[tokio::test]
    async fn test_empty_save_is_noop() {
        let store: InMemoryEventStore<CounterEvent> = InMemoryEventStore::new();
        let aggregate_root_id = Uuid::new_v4();

        store.save(&mut [], aggregate_root_id).await.unwrap();

        assert!(store.load(aggregate_root_id).await.is_err());
    }
}

//! Load/replay/save coordination for aggregate roots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::bus::{BasicBus, EventBus};
use crate::error::DomainError;
use crate::event::Event;
use crate::store::EventStore;

type AggregateLock = Arc<tokio::sync::Mutex<()>>;

/// Rebuilds aggregates from their stream and persists their pending events
/// with optimistic concurrency control.
///
/// Saves for the same aggregate id are serialized on a per-aggregate lock
/// held for the whole check-append-emit sequence. The store's own version
/// check still rejects writers from other processes.
pub struct Repository<A: AggregateRoot> {
    store: Arc<dyn EventStore<A::Event>>,
    event_bus: Arc<dyn EventBus<A::Event>>,
    locks: Mutex<HashMap<Uuid, AggregateLock>>,
}

impl<A: AggregateRoot> Repository<A> {
    /// Creates a repository over `store`, emitting committed events on
    /// `event_bus`.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore<A::Event>>, event_bus: Arc<dyn EventBus<A::Event>>) -> Self {
        Self {
            store,
            event_bus,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a [`RepositoryBuilder`].
    #[must_use]
    pub fn builder() -> RepositoryBuilder<A> {
        RepositoryBuilder::default()
    }

    /// The bus committed events are emitted on.
    #[must_use]
    pub fn event_bus(&self) -> &Arc<dyn EventBus<A::Event>> {
        &self.event_bus
    }

    /// Rebuilds the aggregate by replaying its stored stream.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateRootIdNotFound` if nothing is stored
    /// for `aggregate_root_id`, or any store error.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, aggregate_root_id: Uuid) -> Result<A, DomainError> {
        let events = self.store.load(aggregate_root_id).await?;
        let mut aggregate = A::new(aggregate_root_id);
        aggregate.initialize_state(&events);
        tracing::debug!(version = aggregate.version(), "aggregate loaded");
        Ok(aggregate)
    }

    /// Persists the aggregate's uncommitted events and emits them on the bus.
    ///
    /// The uncommitted queue is empty afterwards whether or not the save
    /// succeeded. Nothing is persisted or emitted when the stored stream has
    /// moved past the version the pending events were built on.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateRootOutOfSync` on a version conflict,
    /// the first listener error if emission fails after a successful append,
    /// or any store error.
    #[tracing::instrument(skip_all, fields(aggregate_root_id = %aggregate.aggregate_root_id()))]
    pub async fn save(&self, aggregate: &mut A) -> Result<(), DomainError> {
        let mut events = aggregate.take_uncommitted_events();
        let Some(first_version) = events.first().and_then(Event::version) else {
            return Ok(());
        };
        let aggregate_root_id = aggregate.aggregate_root_id();

        let lock = self.lock_for(aggregate_root_id)?;
        let result = {
            let _guard = lock.lock().await;
            self.commit(aggregate_root_id, first_version, &mut events).await
        };
        self.release_lock(aggregate_root_id, &lock);
        result
    }

    async fn commit(
        &self,
        aggregate_root_id: Uuid,
        first_version: i64,
        events: &mut [Event<A::Event>],
    ) -> Result<(), DomainError> {
        match self.load(aggregate_root_id).await {
            Ok(persisted) => {
                let expected = first_version - 1;
                if persisted.version() != expected {
                    tracing::warn!(
                        expected,
                        actual = persisted.version(),
                        "aggregate out of sync, nothing persisted"
                    );
                    return Err(DomainError::AggregateRootOutOfSync {
                        aggregate_root_id,
                        expected,
                        actual: persisted.version(),
                    });
                }
            }
            Err(DomainError::AggregateRootIdNotFound(_)) => {
                tracing::debug!("first save for aggregate");
            }
            Err(e) => return Err(e),
        }

        self.store.save(events, aggregate_root_id).await?;
        tracing::info!(event_count = events.len(), "events committed");

        self.event_bus.emit(events)
    }

    fn lock_for(&self, aggregate_root_id: Uuid) -> Result<AggregateLock, DomainError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| DomainError::Repository("aggregate lock table poisoned".to_owned()))?;
        Ok(Arc::clone(locks.entry(aggregate_root_id).or_default()))
    }

    /// Drops the table entry once no other save holds or awaits it.
    fn release_lock(&self, aggregate_root_id: Uuid, lock: &AggregateLock) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        // One reference in the table, one held by the caller.
        if Arc::strong_count(lock) == 2 {
            locks.remove(&aggregate_root_id);
        }
    }
}

impl<A: AggregateRoot> std::fmt::Debug for Repository<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("listeners", &self.event_bus.listener_count())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Repository`] from its collaborators.
pub struct RepositoryBuilder<A: AggregateRoot> {
    store: Option<Arc<dyn EventStore<A::Event>>>,
    event_bus: Option<Arc<dyn EventBus<A::Event>>>,
}

impl<A: AggregateRoot> Default for RepositoryBuilder<A> {
    fn default() -> Self {
        Self {
            store: None,
            event_bus: None,
        }
    }
}

impl<A: AggregateRoot> RepositoryBuilder<A> {
    /// Sets the event store. Required.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn EventStore<A::Event>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the event bus. Defaults to an empty [`BasicBus`].
    #[must_use]
    pub fn event_bus(mut self, event_bus: Arc<dyn EventBus<A::Event>>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Builds the repository.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Repository` if no store was configured.
    pub fn build(self) -> Result<Repository<A>, DomainError> {
        let store = self
            .store
            .ok_or_else(|| DomainError::Repository("Store is not configured".to_owned()))?;
        let event_bus = self
            .event_bus
            .unwrap_or_else(|| Arc::new(BasicBus::<A::Event>::new()));
        Ok(Repository::new(store, event_bus))
    }
}

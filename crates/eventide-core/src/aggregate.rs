//! Aggregate root abstraction.

use uuid::Uuid;

use crate::error::DomainError;
use crate::event::{DomainEvent, Event};

/// Replay and pending-event bookkeeping shared by every aggregate root.
#[derive(Debug)]
pub struct AggregateState<E> {
    loaded_version: i64,
    uncommitted_events: Vec<Event<E>>,
}

impl<E> AggregateState<E> {
    /// Creates bookkeeping for a brand-new aggregate (version 0).
    #[must_use]
    pub fn new() -> Self {
        Self {
            loaded_version: 0,
            uncommitted_events: Vec::new(),
        }
    }

    /// Number of events folded during replay.
    #[must_use]
    pub fn loaded_version(&self) -> i64 {
        self.loaded_version
    }

    /// Events applied since construction or load.
    #[must_use]
    pub fn uncommitted_events(&self) -> &[Event<E>] {
        &self.uncommitted_events
    }

    /// Returns the version the next applied event receives.
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn next_version(&self) -> i64 {
        self.loaded_version + self.uncommitted_events.len() as i64 + 1
    }
}

impl<E> Default for AggregateState<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for aggregate roots that reconstitute from event history.
///
/// Implementors provide identity, access to their [`AggregateState`] and a
/// fold handler; `apply`, `initialize_state` and the uncommitted-event
/// accessors are provided.
pub trait AggregateRoot: Send + Sync + Sized {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Creates an empty aggregate with the given identity.
    fn new(aggregate_root_id: Uuid) -> Self;

    /// Returns the aggregate identifier.
    fn aggregate_root_id(&self) -> Uuid;

    /// Shared bookkeeping.
    fn state(&self) -> &AggregateState<Self::Event>;

    /// Shared bookkeeping, mutably.
    fn state_mut(&mut self) -> &mut AggregateState<Self::Event>;

    /// Folds one event into the aggregate's state.
    ///
    /// Must be a pure function of current state and event so that replay is
    /// deterministic.
    fn apply_event(&mut self, event: &Event<Self::Event>);

    /// Applies a new event: assigns the next version, folds it into state and
    /// queues it as uncommitted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DomainEvent` if the event already carries a
    /// version; nothing is folded or queued in that case.
    fn apply(&mut self, mut event: Event<Self::Event>) -> Result<(), DomainError> {
        event.set_version(self.state().next_version())?;
        self.apply_event(&event);
        self.state_mut().uncommitted_events.push(event);
        Ok(())
    }

    /// Replays persisted events without queuing them, incrementing the loaded
    /// version once per event.
    fn initialize_state(&mut self, events: &[Event<Self::Event>]) {
        for event in events {
            self.apply_event(event);
            self.state_mut().loaded_version += 1;
        }
    }

    /// Returns the loaded (persisted) version.
    fn version(&self) -> i64 {
        self.state().loaded_version
    }

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Event<Self::Event>] {
        &self.state().uncommitted_events
    }

    /// Takes uncommitted events out of the queue, leaving it empty.
    fn take_uncommitted_events(&mut self) -> Vec<Event<Self::Event>> {
        std::mem::take(&mut self.state_mut().uncommitted_events)
    }

    /// Clears uncommitted events after a save attempt.
    fn clear_uncommitted_events(&mut self) {
        self.state_mut().uncommitted_events.clear();
    }
}

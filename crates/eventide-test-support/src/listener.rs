//! Test listeners — `EventListener` implementations for bus tests.

use std::sync::Mutex;

use eventide_core::bus::EventListener;
use eventide_core::error::DomainError;
use eventide_core::event::Event;

/// A listener that records every event it receives.
#[derive(Debug)]
pub struct RecordingListener<E> {
    received: Mutex<Vec<Event<E>>>,
}

impl<E> RecordingListener<E> {
    /// Creates a listener that has received nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            received: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Clone> RecordingListener<E> {
    /// Returns a snapshot of the received events, in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<Event<E>> {
        self.received.lock().unwrap().clone()
    }

    /// Returns the payloads of the received events, in delivery order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn payloads(&self) -> Vec<E> {
        self.events().into_iter().map(|e| e.payload().clone()).collect()
    }
}

impl<E> Default for RecordingListener<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send + Sync> EventListener<E> for RecordingListener<E> {
    fn receive(&self, event: &Event<E>) -> Result<(), DomainError> {
        self.received.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// A listener that rejects every event with an event bus error.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingListener;

impl<E> EventListener<E> for FailingListener {
    fn receive(&self, _event: &Event<E>) -> Result<(), DomainError> {
        Err(DomainError::EventBus("listener rejected event".into()))
    }
}

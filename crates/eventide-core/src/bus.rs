//! In-process, synchronous fan-out of committed events.

use std::sync::{Arc, RwLock};

use crate::error::DomainError;
use crate::event::{DomainEvent, Event};

/// Receives committed events from an [`EventBus`].
pub trait EventListener<E>: Send + Sync {
    /// Handles one committed event.
    ///
    /// # Errors
    ///
    /// Any error aborts the current `emit` call and is returned to its caller.
    fn receive(&self, event: &Event<E>) -> Result<(), DomainError>;
}

/// Publishes committed events to subscribed listeners.
pub trait EventBus<E: DomainEvent>: Send + Sync {
    /// Adds a listener at the end of the delivery order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventBus` if the listener cannot be registered.
    fn subscribe(&self, listener: Arc<dyn EventListener<E>>) -> Result<(), DomainError>;

    /// Removes a previously subscribed listener.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventBus` if the listener is not subscribed.
    fn unsubscribe(&self, listener: &Arc<dyn EventListener<E>>) -> Result<(), DomainError>;

    /// Delivers each event, in order, to every listener in subscription order.
    ///
    /// # Errors
    ///
    /// Returns the first listener error; later listeners and events are not
    /// delivered.
    fn emit(&self, events: &[Event<E>]) -> Result<(), DomainError>;

    /// Number of subscribed listeners.
    fn listener_count(&self) -> usize;
}

/// A very simple bus: one ordered listener list, synchronous delivery.
pub struct BasicBus<E> {
    listeners: RwLock<Vec<Arc<dyn EventListener<E>>>>,
}

impl<E> BasicBus<E> {
    /// Creates a bus without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    fn snapshot(&self) -> Result<Vec<Arc<dyn EventListener<E>>>, DomainError> {
        self.listeners
            .read()
            .map(|listeners| listeners.clone())
            .map_err(|_| poisoned())
    }
}

impl<E> Default for BasicBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for BasicBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.listeners.read().map_or(0, |l| l.len());
        f.debug_struct("BasicBus").field("listeners", &count).finish()
    }
}

fn poisoned() -> DomainError {
    DomainError::EventBus("listener list lock poisoned".to_owned())
}

impl<E: DomainEvent> EventBus<E> for BasicBus<E> {
    fn subscribe(&self, listener: Arc<dyn EventListener<E>>) -> Result<(), DomainError> {
        self.listeners.write().map_err(|_| poisoned())?.push(listener);
        tracing::debug!(listeners = self.listener_count(), "listener subscribed");
        Ok(())
    }

    fn unsubscribe(&self, listener: &Arc<dyn EventListener<E>>) -> Result<(), DomainError> {
        let mut listeners = self.listeners.write().map_err(|_| poisoned())?;
        let position = listeners
            .iter()
            .position(|l| Arc::ptr_eq(l, listener))
            .ok_or_else(|| {
                DomainError::EventBus("Cannot unsubscribe non existing listener from list".to_owned())
            })?;
        listeners.remove(position);
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(event_count = events.len()))]
    fn emit(&self, events: &[Event<E>]) -> Result<(), DomainError> {
        let listeners = self.snapshot()?;
        for event in events {
            for listener in &listeners {
                listener.receive(event).inspect_err(|e| {
                    tracing::error!(event_type = event.event_type(), error = %e, "listener failed");
                })?;
            }
        }
        Ok(())
    }

    fn listener_count(&self) -> usize {
        self.listeners.read().map_or(0, |l| l.len())
    }
}

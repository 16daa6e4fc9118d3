//! Domain event abstractions.

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::metadata::{Metadata, MetadataValue};

/// Trait that all domain event payloads implement.
///
/// Aggregates usually model their events as one closed enum; `event_type`
/// returns the stable tag each variant is persisted and resolved under.
pub trait DomainEvent: Send + Sync + std::fmt::Debug + Clone + 'static {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the variant's fields to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if a field cannot be represented as JSON.
    fn to_payload(&self) -> serde_json::Result<serde_json::Value>;
}

/// Domain event envelope: identity fields, creation date, metadata and the
/// domain payload.
///
/// Identity fields start out unset and can each be set exactly once.
#[derive(Debug, Clone)]
pub struct Event<E> {
    event_id: Option<Uuid>,
    aggregate_version: Option<i64>,
    causation_id: Option<Uuid>,
    correlation_id: Option<Uuid>,
    event_date: DateTime<Utc>,
    metadata: Metadata,
    payload: E,
}

impl<E> Event<E> {
    /// Wraps `payload` in a fresh envelope created at `event_date`.
    ///
    /// The date is truncated to microseconds, the precision stores keep.
    #[must_use]
    pub fn new(payload: E, event_date: DateTime<Utc>) -> Self {
        Self {
            event_id: None,
            aggregate_version: None,
            causation_id: None,
            correlation_id: None,
            event_date: event_date.trunc_subsecs(6),
            metadata: Metadata::new(),
            payload,
        }
    }

    /// Replaces the metadata list (used when rehydrating stored events).
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Store-assigned unique identifier.
    pub fn event_id(&self) -> Option<Uuid> {
        self.event_id
    }

    /// Sets the event id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DomainEvent` if the id was already set.
    pub fn set_event_id(&mut self, event_id: Uuid) -> Result<(), DomainError> {
        set_once(&mut self.event_id, event_id, "Event id")
    }

    /// Position of this event within its aggregate's stream.
    pub fn version(&self) -> Option<i64> {
        self.aggregate_version
    }

    /// Sets the aggregate version.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DomainEvent` if the version was already set.
    pub fn set_version(&mut self, version: i64) -> Result<(), DomainError> {
        set_once(&mut self.aggregate_version, version, "Version")
    }

    /// Id of the event that caused this one.
    pub fn causation_id(&self) -> Option<Uuid> {
        self.causation_id
    }

    /// Sets the causation id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DomainEvent` if the causation id was already set.
    pub fn set_causation_id(&mut self, causation_id: Uuid) -> Result<(), DomainError> {
        set_once(&mut self.causation_id, causation_id, "Causation id")
    }

    /// Id grouping events of the same business transaction.
    pub fn correlation_id(&self) -> Option<Uuid> {
        self.correlation_id
    }

    /// Sets the correlation id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DomainEvent` if the correlation id was already set.
    pub fn set_correlation_id(&mut self, correlation_id: Uuid) -> Result<(), DomainError> {
        set_once(&mut self.correlation_id, correlation_id, "Correlation id")
    }

    /// Creation timestamp.
    pub fn event_date(&self) -> DateTime<Utc> {
        self.event_date
    }

    /// Metadata entries in insertion order.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Adds a `{key: value}` metadata entry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DomainEvent` if the identical entry exists.
    pub fn add_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Result<(), DomainError> {
        self.metadata.add(key, value)
    }

    /// Removes the metadata entry exactly matching `{key: value}`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DomainEvent` if no such entry exists.
    pub fn remove_metadata(&mut self, key: &str, value: &MetadataValue) -> Result<(), DomainError> {
        self.metadata.remove(key, value)
    }

    /// The domain payload.
    pub fn payload(&self) -> &E {
        &self.payload
    }
}

impl<E: DomainEvent> Event<E> {
    /// Event type name of the payload.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    /// Serialized payload body.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the payload cannot be encoded.
    pub fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        Ok(self.payload.to_payload()?)
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &str) -> Result<(), DomainError> {
    if slot.is_some() {
        return Err(DomainError::DomainEvent(format!(
            "{field} can only be set once!"
        )));
    }
    *slot = Some(value);
    Ok(())
}

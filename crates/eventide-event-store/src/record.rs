//! Row representation of a stored event.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

use eventide_core::error::DomainError;
use eventide_core::event::{DomainEvent, Event};
use eventide_core::metadata::Metadata;
use eventide_core::registry::EventRegistry;

/// One row of the `event_store` table.
///
/// Ids are stored as hyphenated strings and dates as RFC 3339 text.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EventRecord {
    /// Primary key.
    pub domain_event_id: String,
    pub aggregate_root_id: String,
    /// Position in the aggregate stream, unique per aggregate.
    pub version: i32,
    /// Registry tag the body is decoded under.
    pub domain_event_name: String,
    pub domain_event_body: Json<Value>,
    /// When the row was written.
    pub store_date: String,
    /// When the event was created.
    pub event_date: String,
    pub correlation_id: String,
    pub causation_id: String,
    /// Metadata as a list of single-key objects.
    pub event_metadata: Json<Value>,
}

impl EventRecord {
    /// Builds the row for an event whose identities have been assigned.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DomainEvent` if an identity field or the version
    /// is missing, and `DomainError::Serialization` if the payload or
    /// metadata cannot be serialized.
    pub fn from_event<E: DomainEvent>(
        event: &Event<E>,
        aggregate_root_id: Uuid,
        store_date: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let missing = |field: &str| DomainError::DomainEvent(format!("{field} must be set before an event is stored"));

        let version = event.version().ok_or_else(|| missing("Version"))?;
        let version = i32::try_from(version)
            .map_err(|_| DomainError::DomainEvent(format!("Version {version} does not fit the event store")))?;

        Ok(Self {
            domain_event_id: event.event_id().ok_or_else(|| missing("Event id"))?.to_string(),
            aggregate_root_id: aggregate_root_id.to_string(),
            version,
            domain_event_name: event.event_type().to_owned(),
            domain_event_body: Json(event.to_payload()?),
            store_date: format_date(store_date),
            event_date: format_date(event.event_date()),
            correlation_id: event
                .correlation_id()
                .ok_or_else(|| missing("Correlation id"))?
                .to_string(),
            causation_id: event
                .causation_id()
                .ok_or_else(|| missing("Causation id"))?
                .to_string(),
            event_metadata: Json(serde_json::to_value(event.metadata())?),
        })
    }

    /// Rebuilds the event, decoding the body through `registry`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the body, metadata, an id or a
    /// date cannot be decoded.
    pub fn into_event<E: DomainEvent>(self, registry: &EventRegistry<E>) -> Result<Event<E>, DomainError> {
        let payload = registry.decode(&self.domain_event_name, self.domain_event_body.0)?;
        let metadata: Metadata = serde_json::from_value(self.event_metadata.0)?;

        let mut event = Event::new(payload, parse_date(&self.event_date)?).with_metadata(metadata);
        event.set_event_id(parse_id(&self.domain_event_id)?)?;
        event.set_version(i64::from(self.version))?;
        event.set_correlation_id(parse_id(&self.correlation_id)?)?;
        event.set_causation_id(parse_id(&self.causation_id)?)?;
        Ok(event)
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| DomainError::Serialization(format!("invalid stored date {raw}: {e}")))
}

fn parse_id(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim()).map_err(|e| DomainError::Serialization(format!("invalid stored id {raw}: {e}")))
}

//! Event type registry used to deserialize stored events by name.
//!
//! Every event type an aggregate can persist is registered once at startup
//! under the stable tag its [`DomainEvent::event_type`] returns. Types with a
//! versioning strategy have their stored body reconciled with a target shape
//! before decoding.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::schema::{SchemaMapper, SchemaMapperFactory};

type Decoder<E> = Box<dyn Fn(Value) -> serde_json::Result<E> + Send + Sync>;

struct Versioning {
    strategy: String,
    mapper: Box<dyn SchemaMapper>,
    shape: Map<String, Value>,
}

struct Registration<E> {
    decoder: Decoder<E>,
    versioning: Option<Versioning>,
}

/// Maps stable event names to decoders for the payload type `E`.
pub struct EventRegistry<E> {
    registrations: HashMap<String, Registration<E>>,
}

impl<E: DomainEvent> EventRegistry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
        }
    }

    /// Registers `name`, decoding the raw stored body as `T` and wrapping it
    /// into the payload type.
    #[must_use]
    pub fn register<T, F>(mut self, name: &str, wrap: F) -> Self
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) -> E + Send + Sync + 'static,
    {
        self.registrations.insert(
            name.to_owned(),
            Registration {
                decoder: Self::decoder(wrap),
                versioning: None,
            },
        );
        self
    }

    /// Registers `name` with a versioning strategy: the stored body is mapped
    /// onto `shape` (a JSON object of field defaults) before decoding.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SchemaMapper` if the strategy is unknown or the
    /// shape is not a JSON object.
    pub fn register_versioned<T, F>(
        mut self,
        name: &str,
        strategy: &str,
        shape: Value,
        wrap: F,
    ) -> Result<Self, DomainError>
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) -> E + Send + Sync + 'static,
    {
        let mapper = SchemaMapperFactory::factory(strategy)?;
        let Value::Object(shape) = shape else {
            return Err(DomainError::SchemaMapper(format!(
                "target shape for {name} must be a JSON object"
            )));
        };
        self.registrations.insert(
            name.to_owned(),
            Registration {
                decoder: Self::decoder(wrap),
                versioning: Some(Versioning {
                    strategy: strategy.to_owned(),
                    mapper,
                    shape,
                }),
            },
        );
        Ok(self)
    }

    fn decoder<T, F>(wrap: F) -> Decoder<E>
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) -> E + Send + Sync + 'static,
    {
        Box::new(move |body| serde_json::from_value::<T>(body).map(&wrap))
    }

    /// Decodes a stored body persisted under `name`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if `name` is not registered, a
    /// versioned body is not a JSON object, or decoding fails.
    pub fn decode(&self, name: &str, body: Value) -> Result<E, DomainError> {
        let registration = self.registrations.get(name).ok_or_else(|| {
            DomainError::Serialization(format!("no event type registered under {name}"))
        })?;

        let body = match (&registration.versioning, body) {
            (None, body) => body,
            (Some(versioning), Value::Object(stored)) => {
                Value::Object(versioning.mapper.map(&stored, &versioning.shape, true))
            }
            (Some(_), other) => {
                return Err(DomainError::Serialization(format!(
                    "versioned event {name} must be stored as a JSON object, found {other}"
                )));
            }
        };

        (registration.decoder)(body)
            .map_err(|e| DomainError::Serialization(format!("cannot decode {name}: {e}")))
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.registrations.contains_key(name)
    }

    /// Versioning strategy registered for `name`, if any.
    #[must_use]
    pub fn strategy(&self, name: &str) -> Option<&str> {
        self.registrations
            .get(name)
            .and_then(|r| r.versioning.as_ref())
            .map(|v| v.strategy.as_str())
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.registrations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<E: DomainEvent> Default for EventRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("event_names", &self.registrations.keys().collect::<Vec<_>>())
            .finish()
    }
}

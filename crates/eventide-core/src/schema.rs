//! Weak-schema evolution of stored event payloads.
//!
//! A stored payload is reconciled with the current shape of its event type
//! at deserialization time: fields the shape no longer declares are dropped,
//! fields it newly declares are filled with their defaults, and nested
//! objects are reconciled recursively.

use serde_json::{Map, Value};

use crate::error::DomainError;

/// Strategy tag for [`WeakSchemaMapper`].
pub const WEAK_SCHEMA: &str = "weak-schema";

/// Prefix marking shape entries that are annotations rather than event
/// properties.
const ANNOTATION_PREFIX: char = '$';

/// Reconciles a stored payload with a target shape.
pub trait SchemaMapper: Send + Sync + std::fmt::Debug {
    /// Maps `stored` onto `target_shape`. With `cleaning` the shape is first
    /// reduced to its declared default fields.
    fn map(&self, stored: &Map<String, Value>, target_shape: &Map<String, Value>, cleaning: bool) -> Map<String, Value>;
}

/// Best-effort mapper: prune obsolete fields, default missing ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeakSchemaMapper;

impl WeakSchemaMapper {
    fn event_properties(shape: &Map<String, Value>) -> Map<String, Value> {
        shape
            .iter()
            .filter(|(key, _)| !key.starts_with(ANNOTATION_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl SchemaMapper for WeakSchemaMapper {
    fn map(&self, stored: &Map<String, Value>, target_shape: &Map<String, Value>, cleaning: bool) -> Map<String, Value> {
        let cleaned;
        let shape = if cleaning {
            cleaned = Self::event_properties(target_shape);
            &cleaned
        } else {
            target_shape
        };

        let mut mapped = stored.clone();
        mapped.retain(|key, _| shape.contains_key(key));

        for (key, default) in shape {
            if let Some(existing) = mapped.get_mut(key) {
                if let (Value::Object(existing), Value::Object(nested_shape)) = (existing, default) {
                    *existing = self.map(existing, nested_shape, false);
                }
            } else {
                mapped.insert(key.clone(), default.clone());
            }
        }

        mapped
    }
}

/// Resolves versioning strategy tags to mappers.
#[derive(Debug)]
pub struct SchemaMapperFactory;

impl SchemaMapperFactory {
    /// Returns the mapper registered under `strategy`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SchemaMapper` for unknown strategies.
    pub fn factory(strategy: &str) -> Result<Box<dyn SchemaMapper>, DomainError> {
        match strategy {
            WEAK_SCHEMA => Ok(Box::new(WeakSchemaMapper)),
            _ => Err(DomainError::SchemaMapper(
                "Versioning type does not exist".to_owned(),
            )),
        }
    }
}

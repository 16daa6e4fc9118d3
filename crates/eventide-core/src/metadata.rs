//! Event metadata: an ordered list of single-key entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A simple metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// A boolean flag.
    Bool(bool),
    /// An integer or floating point number.
    Number(serde_json::Number),
    /// A string.
    String(String),
    /// An ordered list of values.
    List(Vec<MetadataValue>),
    /// A string-keyed mapping of values.
    Map(BTreeMap<String, MetadataValue>),
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, MetadataValue>> for MetadataValue {
    fn from(map: BTreeMap<String, MetadataValue>) -> Self {
        Self::Map(map)
    }
}

impl TryFrom<serde_json::Value> for MetadataValue {
    type Error = DomainError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::Number(n) => Ok(Self::Number(n)),
            serde_json::Value::String(s) => Ok(Self::String(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| Self::try_from(v).map(|v| (k, v)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Self::Map),
            serde_json::Value::Null => Err(DomainError::DomainEvent(
                "Can only set metadata with simple data types (bool, dict, int, list, string)"
                    .to_owned(),
            )),
        }
    }
}

/// One `{key: value}` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    /// Entry key.
    pub key: String,
    /// Entry value.
    pub value: MetadataValue,
}

/// Ordered metadata entries attached to an event.
///
/// Serializes as a JSON array of single-key objects, e.g.
/// `[{"user": "alice"}, {"replayed": false}]`. The same key may appear more
/// than once with different values; an identical `{key: value}` pair may not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<BTreeMap<String, MetadataValue>>",
    into = "Vec<BTreeMap<String, MetadataValue>>"
)]
pub struct Metadata {
    entries: Vec<MetadataEntry>,
}

impl Metadata {
    /// Creates an empty metadata list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `{key: value}` entry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DomainEvent` if the identical entry is already
    /// present.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Result<(), DomainError> {
        let entry = MetadataEntry {
            key: key.into(),
            value: value.into(),
        };
        if self.entries.contains(&entry) {
            return Err(DomainError::DomainEvent("Metadata is already set!".to_owned()));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Removes the entry exactly matching `{key: value}`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DomainEvent` if no such entry exists.
    pub fn remove(&mut self, key: &str, value: &MetadataValue) -> Result<(), DomainError> {
        let position = self
            .entries
            .iter()
            .position(|e| e.key == key && &e.value == value)
            .ok_or_else(|| {
                DomainError::DomainEvent("Can't remove non existent metadata!".to_owned())
            })?;
        self.entries.remove(position);
        Ok(())
    }

    /// Returns the first value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &MetadataEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Metadata> for Vec<BTreeMap<String, MetadataValue>> {
    fn from(metadata: Metadata) -> Self {
        metadata
            .entries
            .into_iter()
            .map(|e| BTreeMap::from([(e.key, e.value)]))
            .collect()
    }
}

impl TryFrom<Vec<BTreeMap<String, MetadataValue>>> for Metadata {
    type Error = DomainError;

    fn try_from(raw: Vec<BTreeMap<String, MetadataValue>>) -> Result<Self, Self::Error> {
        let mut metadata = Self::new();
        for map in raw {
            if map.len() != 1 {
                return Err(DomainError::DomainEvent(format!(
                    "metadata entries must hold exactly one key, found {}",
                    map.len()
                )));
            }
            for (key, value) in map {
                metadata.add(key, value)?;
            }
        }
        Ok(metadata)
    }
}

//! Eventide Event Store — `PostgreSQL` persistence for event streams.

pub mod config;
pub mod pg_event_store;
pub mod record;
pub mod schema;

pub use config::{ConfigError, EventStoreConfig};
pub use pg_event_store::{PgEventStore, connect_pool};
pub use record::EventRecord;

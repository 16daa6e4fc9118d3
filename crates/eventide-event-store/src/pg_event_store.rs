//! `PostgreSQL` implementation of the `EventStore` trait.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use eventide_core::clock::{Clock, SystemClock};
use eventide_core::error::DomainError;
use eventide_core::event::{DomainEvent, Event};
use eventide_core::registry::EventRegistry;
use eventide_core::store::{EventStore, assign_identities, batch_base_version};

use crate::config::EventStoreConfig;
use crate::record::EventRecord;
use crate::schema::{create_event_store, truncate_event_store};

/// PostgreSQL-backed event store.
///
/// Each event is one row of the `event_store` table. A batch is written in a
/// single transaction, so a conflicting batch leaves no rows behind.
pub struct PgEventStore<E> {
    pool: PgPool,
    registry: Arc<EventRegistry<E>>,
    clock: Arc<dyn Clock>,
}

impl<E: DomainEvent> PgEventStore<E> {
    /// Creates a store over an existing pool, stamping store dates from the
    /// system clock.
    #[must_use]
    pub fn new(pool: PgPool, registry: Arc<EventRegistry<E>>) -> Self {
        Self {
            pool,
            registry,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for store dates.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Opens a pool from `config` and creates a store over it.
    ///
    /// # Errors
    ///
    /// Returns a `sqlx::Error` if the database cannot be reached.
    pub async fn connect(config: &EventStoreConfig, registry: Arc<EventRegistry<E>>) -> Result<Self, sqlx::Error> {
        Ok(Self::new(connect_pool(config).await?, registry))
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl<E> PgEventStore<E> {
    /// Creates the `event_store` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a `sqlx::Error` if any DDL statement fails.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        create_event_store(&self.pool).await
    }

    /// Deletes every stored event.
    ///
    /// # Errors
    ///
    /// Returns a `sqlx::Error` if the table does not exist or cannot be
    /// truncated.
    pub async fn truncate(&self) -> Result<(), sqlx::Error> {
        truncate_event_store(&self.pool).await
    }
}

impl<E> std::fmt::Debug for PgEventStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgEventStore")
            .field("pool", &self.pool)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Opens a connection pool sized by `config`.
///
/// # Errors
///
/// Returns a `sqlx::Error` if the database cannot be reached.
#[tracing::instrument(skip_all, fields(max_connections = config.max_connections))]
pub async fn connect_pool(config: &EventStoreConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!("connected to event store database");
    Ok(pool)
}

fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for PgEventStore<E> {
    #[tracing::instrument(skip(self))]
    async fn load(&self, aggregate_root_id: Uuid) -> Result<Vec<Event<E>>, DomainError> {
        let records: Vec<EventRecord> = sqlx::query_as(
            r"
            SELECT domain_event_id, aggregate_root_id, version, domain_event_name,
                   domain_event_body, store_date, event_date, correlation_id,
                   causation_id, event_metadata
            FROM event_store
            WHERE aggregate_root_id = $1
            ORDER BY version ASC
            ",
        )
        .bind(aggregate_root_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        if records.is_empty() {
            return Err(DomainError::AggregateRootIdNotFound(aggregate_root_id));
        }
        tracing::trace!(event_count = records.len(), "loaded stream");

        records
            .into_iter()
            .map(|record| record.into_event(&self.registry))
            .collect()
    }

    #[tracing::instrument(skip(self, events), fields(event_count = events.len()))]
    async fn save(&self, events: &mut [Event<E>], aggregate_root_id: Uuid) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }
        let base = batch_base_version(events)?;

        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        let stored_version: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), 0) FROM event_store WHERE aggregate_root_id = $1",
        )
        .bind(aggregate_root_id.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(infrastructure)?;
        let stored_version = i64::from(stored_version);

        let out_of_sync = |actual: i64| {
            tracing::warn!(expected = base, actual, "rejected stale batch");
            DomainError::AggregateRootOutOfSync {
                aggregate_root_id,
                expected: base,
                actual,
            }
        };

        if stored_version != base {
            return Err(out_of_sync(stored_version));
        }

        // The caller's events are stamped only once the batch has committed.
        let mut stamped = events.to_vec();
        assign_identities(&mut stamped, aggregate_root_id)?;
        let store_date = self.clock.now();
        let records = stamped
            .iter()
            .map(|event| EventRecord::from_event(event, aggregate_root_id, store_date))
            .collect::<Result<Vec<_>, _>>()?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO event_store (domain_event_id, aggregate_root_id, version, \
             domain_event_name, domain_event_body, store_date, event_date, correlation_id, \
             causation_id, event_metadata) ",
        );
        qb.push_values(records, |mut b, record| {
            b.push_bind(record.domain_event_id);
            b.push_bind(record.aggregate_root_id);
            b.push_bind(record.version);
            b.push_bind(record.domain_event_name);
            b.push_bind(record.domain_event_body);
            b.push_bind(record.store_date);
            b.push_bind(record.event_date);
            b.push_bind(record.correlation_id);
            b.push_bind(record.causation_id);
            b.push_bind(record.event_metadata);
        });

        if let Err(err) = qb.build().execute(&mut *tx).await {
            if is_unique_violation(&err) {
                // A concurrent writer committed between our version read and insert.
                return Err(out_of_sync(base + 1));
            }
            return Err(infrastructure(err));
        }

        tx.commit().await.map_err(|err| {
            if is_unique_violation(&err) {
                out_of_sync(base + 1)
            } else {
                infrastructure(err)
            }
        })?;
        events.clone_from_slice(&stamped);

        tracing::debug!(events_appended = events.len(), "events appended to stream");
        Ok(())
    }
}

//! Integration tests for `PgEventStore`.

use std::sync::Arc;

use eventide_core::aggregate::AggregateRoot;
use eventide_core::error::DomainError;
use eventide_core::event::Event;
use eventide_core::repository::Repository;
use eventide_core::store::EventStore;
use eventide_event_store::PgEventStore;
use eventide_hangman::domain::aggregates::Game;
use eventide_hangman::domain::events::{
    DEFAULT_TRIES, GAME_STARTED_EVENT_TYPE, GameEvent, GameStarted, LetterGuessed,
    LetterNotGuessed,
};
use eventide_hangman::hangman_registry;
use eventide_test_support::FixedClock;
use sqlx::PgPool;
use uuid::Uuid;

fn store(pool: PgPool) -> PgEventStore<GameEvent> {
    PgEventStore::new(pool, Arc::new(hangman_registry().unwrap())).with_clock(Arc::new(FixedClock::epoch()))
}

fn versioned(payload: GameEvent, version: i64) -> Event<GameEvent> {
    let mut event = Event::new(payload, FixedClock::epoch().0);
    event.set_version(version).unwrap();
    event
}

fn started(id: Uuid) -> GameEvent {
    GameEvent::GameStarted(GameStarted {
        aggregate_root_id: id,
        tries: 3,
        word: "word".into(),
    })
}

fn guessed(letter: &str) -> GameEvent {
    GameEvent::LetterGuessed(LetterGuessed {
        letter: letter.into(),
    })
}

// --- load ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_load_unknown_aggregate_is_not_found(pool: PgPool) {
    let store = store(pool);
    let id = Uuid::new_v4();

    let result = store.load(id).await;

    match result {
        Err(err @ DomainError::AggregateRootIdNotFound(_)) => {
            assert!(err.to_string().contains(&id.to_string()));
        }
        other => panic!("expected AggregateRootIdNotFound, got {other:?}"),
    }
}

// --- save + load round-trip ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_save_and_load_round_trip(pool: PgPool) {
    // Arrange
    let store = store(pool);
    let id = Uuid::new_v4();
    let mut events = vec![versioned(started(id), 1), versioned(guessed("w"), 2)];
    events[1].add_metadata("player", "ada").unwrap();

    // Act
    store.save(&mut events, id).await.unwrap();
    let loaded = store.load(id).await.unwrap();

    // Assert
    assert_eq!(loaded.len(), 2);
    for (stored, original) in loaded.iter().zip(&events) {
        assert_eq!(stored.event_id(), original.event_id());
        assert_eq!(stored.version(), original.version());
        assert_eq!(stored.causation_id(), original.causation_id());
        assert_eq!(stored.correlation_id(), Some(id));
        assert_eq!(stored.event_date(), original.event_date());
        assert_eq!(stored.metadata(), original.metadata());
        assert_eq!(stored.payload(), original.payload());
    }
    assert_eq!(loaded[0].causation_id(), loaded[0].event_id());
    assert_eq!(loaded[1].causation_id(), loaded[0].event_id());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_rows_follow_table_format(pool: PgPool) {
    let store = store(pool.clone());
    let id = Uuid::new_v4();
    store
        .save(&mut [versioned(started(id), 1)], id)
        .await
        .unwrap();

    let (aggregate_root_id, name, store_date, metadata): (String, String, String, serde_json::Value) =
        sqlx::query_as(
            "SELECT aggregate_root_id, domain_event_name, store_date, event_metadata FROM event_store",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(aggregate_root_id, id.to_string());
    assert_eq!(name, GAME_STARTED_EVENT_TYPE);
    assert_eq!(store_date, "2024-01-01T00:00:00.000000Z");
    assert_eq!(metadata, serde_json::json!([]));
}

// --- ordering and isolation ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_appends_preserve_version_order_per_aggregate(pool: PgPool) {
    let store = store(pool);
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    store.save(&mut [versioned(started(a), 1)], a).await.unwrap();
    store.save(&mut [versioned(started(b), 1)], b).await.unwrap();
    store
        .save(&mut [versioned(guessed("w"), 2), versioned(guessed("o"), 3)], a)
        .await
        .unwrap();

    let versions: Vec<Option<i64>> = store
        .load(a)
        .await
        .unwrap()
        .iter()
        .map(Event::version)
        .collect();
    assert_eq!(versions, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(store.load(b).await.unwrap().len(), 1);
}

// --- concurrency ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_conflicting_batch_is_rejected_atomically(pool: PgPool) {
    let store = store(pool);
    let id = Uuid::new_v4();
    store
        .save(&mut [versioned(started(id), 1), versioned(guessed("w"), 2)], id)
        .await
        .unwrap();

    // Version 3 would be new, but version 2 is already taken.
    let mut stale = vec![versioned(guessed("o"), 2), versioned(guessed("r"), 3)];
    let result = store.save(&mut stale, id).await;

    match result {
        Err(DomainError::AggregateRootOutOfSync {
            aggregate_root_id,
            expected,
            actual,
        }) => {
            assert_eq!(aggregate_root_id, id);
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected AggregateRootOutOfSync, got {other:?}"),
    }
    assert_eq!(store.load(id).await.unwrap().len(), 2);
    assert!(
        stale
            .iter()
            .all(|e| e.event_id().is_none() && e.causation_id().is_none() && e.correlation_id().is_none())
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_repository_over_pg_detects_stale_aggregate(pool: PgPool) {
    let store: Arc<PgEventStore<GameEvent>> = Arc::new(store(pool));
    let repository = Repository::<Game>::builder().store(store.clone()).build().unwrap();
    let id = Uuid::new_v4();
    store.save(&mut [versioned(started(id), 1)], id).await.unwrap();

    let mut first = repository.load(id).await.unwrap();
    let mut second = repository.load(id).await.unwrap();
    first
        .apply(Event::new(guessed("w"), FixedClock::epoch().0))
        .unwrap();
    second
        .apply(Event::new(
            GameEvent::LetterNotGuessed(LetterNotGuessed { letter: "x".into() }),
            FixedClock::epoch().0,
        ))
        .unwrap();

    repository.save(&mut first).await.unwrap();
    let result = repository.save(&mut second).await;

    assert!(matches!(
        result,
        Err(DomainError::AggregateRootOutOfSync { .. })
    ));
    assert!(second.uncommitted_events().is_empty());
    assert_eq!(store.load(id).await.unwrap().len(), 2);
}

// --- schema evolution ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_old_start_event_loads_with_default_tries(pool: PgPool) {
    let store = store(pool.clone());
    let id = Uuid::new_v4();
    let event_id = Uuid::new_v4();
    sqlx::query(
        r"
        INSERT INTO event_store (domain_event_id, aggregate_root_id, version, domain_event_name,
            domain_event_body, store_date, event_date, correlation_id, causation_id, event_metadata)
        VALUES ($1, $2, 1, $3, $4, '2019-05-01T10:00:00Z', '2019-05-01T10:00:00Z', $2, $1, '[]')
        ",
    )
    .bind(event_id.to_string())
    .bind(id.to_string())
    .bind(GAME_STARTED_EVENT_TYPE)
    .bind(sqlx::types::Json(
        serde_json::json!({"aggregate_root_id": id.to_string(), "word": "word"}),
    ))
    .execute(&pool)
    .await
    .unwrap();

    let loaded = store.load(id).await.unwrap();

    assert_eq!(
        loaded[0].payload(),
        &GameEvent::GameStarted(GameStarted {
            aggregate_root_id: id,
            tries: DEFAULT_TRIES,
            word: "word".into(),
        })
    );
    assert_eq!(loaded[0].event_id(), Some(event_id));
}

// --- maintenance ---

#[sqlx::test(migrations = "../../migrations")]
async fn test_migrate_is_idempotent_and_truncate_empties_store(pool: PgPool) {
    let store = store(pool);
    let id = Uuid::new_v4();
    store.migrate().await.unwrap();
    store.save(&mut [versioned(started(id), 1)], id).await.unwrap();

    store.truncate().await.unwrap();

    assert!(matches!(
        store.load(id).await,
        Err(DomainError::AggregateRootIdNotFound(_))
    ));
}

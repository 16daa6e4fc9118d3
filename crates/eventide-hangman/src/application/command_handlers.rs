//! Command handlers for the hangman context.
//!
//! Each handler loads the game through the repository, runs the domain
//! method and saves the resulting events.

use eventide_core::aggregate::AggregateRoot;
use eventide_core::clock::Clock;
use eventide_core::command::Command;
use eventide_core::error::DomainError;
use eventide_core::repository::Repository;
use uuid::Uuid;

use crate::domain::aggregates::Game;
use crate::domain::commands::{GuessLetter, GuessWord, StartGame};
use crate::domain::events::GameEvent;

/// Result of a successfully handled command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCommandResult {
    /// The game affected by the command.
    pub aggregate_root_id: Uuid,
    /// The events produced and persisted, in order.
    pub events: Vec<GameEvent>,
}

async fn commit(game: &mut Game, repository: &Repository<Game>) -> Result<GameCommandResult, DomainError> {
    let events = game
        .uncommitted_events()
        .iter()
        .map(|e| e.payload().clone())
        .collect();
    repository.save(game).await?;
    Ok(GameCommandResult {
        aggregate_root_id: game.aggregate_root_id(),
        events,
    })
}

/// Handles the `StartGame` command: starts a new game stream.
///
/// # Errors
///
/// Returns `DomainError::AggregateRootOutOfSync` if a game with this id was
/// already started, or any store error.
#[tracing::instrument(skip_all, fields(command_type = command.command_type(), aggregate_root_id = %command.aggregate_root_id()))]
pub async fn handle_start_game(
    command: &StartGame,
    clock: &dyn Clock,
    repository: &Repository<Game>,
) -> Result<GameCommandResult, DomainError> {
    let mut game = Game::new(command.aggregate_root_id());
    game.start(command, clock)?;
    commit(&mut game, repository).await
}

/// Handles the `GuessLetter` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateRootIdNotFound` for unknown games,
/// `DomainError::Validation` if the game cannot be played, or any store error.
#[tracing::instrument(skip_all, fields(command_type = command.command_type(), aggregate_root_id = %command.aggregate_root_id()))]
pub async fn handle_guess_letter(
    command: &GuessLetter,
    clock: &dyn Clock,
    repository: &Repository<Game>,
) -> Result<GameCommandResult, DomainError> {
    let mut game = repository.load(command.aggregate_root_id()).await?;
    game.guess_letter(command, clock)?;
    commit(&mut game, repository).await
}

/// Handles the `GuessWord` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateRootIdNotFound` for unknown games,
/// `DomainError::Validation` if the game cannot be played, or any store error.
#[tracing::instrument(skip_all, fields(command_type = command.command_type(), aggregate_root_id = %command.aggregate_root_id()))]
pub async fn handle_guess_word(
    command: &GuessWord,
    clock: &dyn Clock,
    repository: &Repository<Game>,
) -> Result<GameCommandResult, DomainError> {
    let mut game = repository.load(command.aggregate_root_id()).await?;
    game.guess_word(command, clock)?;
    commit(&mut game, repository).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use eventide_core::bus::{BasicBus, EventBus};
    use eventide_core::in_memory_store::InMemoryEventStore;
    use eventide_core::store::EventStore;
    use eventide_test_support::{FailingEventStore, FailingListener, FixedClock, RecordingListener};

    use super::*;
    use crate::domain::events::{GameLost, GameStarted, GameWon, LetterGuessed, WordGuessed};

    struct Harness {
        repository: Repository<Game>,
        store: Arc<InMemoryEventStore<GameEvent>>,
        listener: Arc<RecordingListener<GameEvent>>,
        clock: FixedClock,
    }

    fn harness() -> Harness {
        let store: Arc<InMemoryEventStore<GameEvent>> = Arc::new(InMemoryEventStore::new());
        let bus: Arc<BasicBus<GameEvent>> = Arc::new(BasicBus::new());
        let listener: Arc<RecordingListener<GameEvent>> = Arc::new(RecordingListener::new());
        bus.subscribe(listener.clone()).unwrap();
        let repository = Repository::<Game>::builder()
            .store(store.clone())
            .event_bus(bus)
            .build()
            .unwrap();
        Harness {
            repository,
            store,
            listener,
            clock: FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_handle_start_game_persists_game_started_event() {
        // Arrange
        let h = harness();
        let id = Uuid::new_v4();
        let command = StartGame::new(id, "word", 3).unwrap();

        // Act
        let result = handle_start_game(&command, &h.clock, &h.repository)
            .await
            .unwrap();

        // Assert
        let expected = GameEvent::GameStarted(GameStarted {
            aggregate_root_id: id,
            tries: 3,
            word: "word".into(),
        });
        assert_eq!(result.aggregate_root_id, id);
        assert_eq!(result.events, vec![expected.clone()]);
        assert_eq!(h.store.event_count(id).unwrap(), 1);
        assert_eq!(h.listener.payloads(), vec![expected]);
    }

    #[tokio::test]
    async fn test_handle_start_game_twice_conflicts() {
        let h = harness();
        let id = Uuid::new_v4();
        let command = StartGame::new(id, "word", 3).unwrap();
        handle_start_game(&command, &h.clock, &h.repository)
            .await
            .unwrap();

        let result = handle_start_game(&command, &h.clock, &h.repository).await;

        assert!(matches!(
            result,
            Err(DomainError::AggregateRootOutOfSync { .. })
        ));
        assert_eq!(h.store.event_count(id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_full_game_is_won_by_guessing_letters() {
        let h = harness();
        let id = Uuid::new_v4();
        handle_start_game(&StartGame::new(id, "wow", 3).unwrap(), &h.clock, &h.repository)
            .await
            .unwrap();

        handle_guess_letter(&GuessLetter::new(id, "w").unwrap(), &h.clock, &h.repository)
            .await
            .unwrap();
        let result = handle_guess_letter(&GuessLetter::new(id, "o").unwrap(), &h.clock, &h.repository)
            .await
            .unwrap();

        assert_eq!(
            result.events,
            vec![
                GameEvent::LetterGuessed(LetterGuessed { letter: "o".into() }),
                GameEvent::GameWon(GameWon {}),
            ]
        );
        let game = h.repository.load(id).await.unwrap();
        assert!(!game.is_active());
        assert_eq!(game.version(), 4);

        let events = h.store.load(id).await.unwrap();
        let versions: Vec<Option<i64>> = events.iter().map(|e| e.version()).collect();
        assert_eq!(versions, vec![Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(events[3].causation_id(), events[2].event_id());
        assert_eq!(h.listener.events().len(), 4);
    }

    #[tokio::test]
    async fn test_wrong_word_loses_and_further_guesses_fail() {
        let h = harness();
        let id = Uuid::new_v4();
        handle_start_game(&StartGame::new(id, "word", 3).unwrap(), &h.clock, &h.repository)
            .await
            .unwrap();

        let result = handle_guess_word(&GuessWord::new(id, "ward").unwrap(), &h.clock, &h.repository)
            .await
            .unwrap();
        assert_eq!(
            result.events,
            vec![
                GameEvent::WordGuessed(WordGuessed { word: "ward".into() }),
                GameEvent::GameLost(GameLost {}),
            ]
        );

        let again = handle_guess_letter(&GuessLetter::new(id, "w").unwrap(), &h.clock, &h.repository).await;
        assert!(matches!(again, Err(DomainError::Validation(_))));
        assert_eq!(h.store.event_count(id).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_guess_on_unknown_game_is_not_found() {
        let h = harness();
        let id = Uuid::new_v4();

        let result = handle_guess_word(&GuessWord::new(id, "word").unwrap(), &h.clock, &h.repository).await;

        match result {
            Err(DomainError::AggregateRootIdNotFound(missing)) => assert_eq!(missing, id),
            other => panic!("expected AggregateRootIdNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_correlation_id_flows_from_command_to_stored_events() {
        let h = harness();
        let id = Uuid::new_v4();
        let correlation = Uuid::new_v4();
        let command = StartGame::new(id, "word", 3)
            .unwrap()
            .with_correlation_id(correlation);

        handle_start_game(&command, &h.clock, &h.repository)
            .await
            .unwrap();

        let stored = h.store.load(id).await.unwrap();
        assert_eq!(stored[0].correlation_id(), Some(correlation));
        assert_eq!(stored[0].event_date(), h.clock.0);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let repository = Repository::<Game>::builder()
            .store(Arc::new(FailingEventStore))
            .build()
            .unwrap();
        let command = StartGame::new(Uuid::new_v4(), "word", 3).unwrap();

        let result = handle_start_game(&command, &FixedClock::epoch(), &repository).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn test_listener_failure_after_commit_keeps_events_and_clears_queue() {
        // Arrange
        let store: Arc<InMemoryEventStore<GameEvent>> = Arc::new(InMemoryEventStore::new());
        let bus: Arc<BasicBus<GameEvent>> = Arc::new(BasicBus::new());
        bus.subscribe(Arc::new(FailingListener)).unwrap();
        let repository = Repository::<Game>::builder()
            .store(store.clone())
            .event_bus(bus)
            .build()
            .unwrap();
        let id = Uuid::new_v4();
        let mut game = Game::new(id);
        game.start(&StartGame::new(id, "word", 3).unwrap(), &FixedClock::epoch())
            .unwrap();

        // Act
        let result = repository.save(&mut game).await;

        // Assert
        match result {
            Err(DomainError::EventBus(message)) => assert_eq!(message, "listener rejected event"),
            other => panic!("expected EventBus error, got {other:?}"),
        }
        assert_eq!(store.event_count(id).unwrap(), 1);
        assert!(game.uncommitted_events().is_empty());
        assert!(repository.load(id).await.unwrap().is_active());
    }

    #[tokio::test]
    async fn test_handler_reports_listener_failure_after_commit() {
        let store: Arc<InMemoryEventStore<GameEvent>> = Arc::new(InMemoryEventStore::new());
        let bus: Arc<BasicBus<GameEvent>> = Arc::new(BasicBus::new());
        bus.subscribe(Arc::new(FailingListener)).unwrap();
        let repository = Repository::<Game>::builder()
            .store(store.clone())
            .event_bus(bus)
            .build()
            .unwrap();
        let id = Uuid::new_v4();

        let result = handle_start_game(&StartGame::new(id, "word", 3).unwrap(), &FixedClock::epoch(), &repository).await;

        assert!(matches!(result, Err(DomainError::EventBus(_))));
        assert_eq!(store.event_count(id).unwrap(), 1);
    }
}

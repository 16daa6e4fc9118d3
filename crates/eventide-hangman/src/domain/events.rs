//! Domain events for the hangman context.

use eventide_core::error::DomainError;
use eventide_core::event::DomainEvent;
use eventide_core::registry::EventRegistry;
use eventide_core::schema::WEAK_SCHEMA;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tries granted to games whose start event predates the `tries` field.
pub const DEFAULT_TRIES: u32 = 10;

/// Emitted when a game is started (or restarted) with a word to guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStarted {
    /// The game identifier.
    pub aggregate_root_id: Uuid,
    /// Wrong guesses allowed before the game is lost.
    pub tries: u32,
    /// The word to guess.
    pub word: String,
}

/// Emitted when a guessed letter occurs in the word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterGuessed {
    /// The guessed letter.
    pub letter: String,
}

/// Emitted when a guessed letter does not occur in the word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterNotGuessed {
    /// The guessed letter.
    pub letter: String,
}

/// Emitted when the player guesses the whole word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordGuessed {
    /// The guessed word.
    pub word: String,
}

/// Emitted when the game is won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameWon {}

/// Emitted when the game is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLost {}

/// Event type identifier for [`GameStarted`].
pub const GAME_STARTED_EVENT_TYPE: &str = "hangman.game_started";

/// Event type identifier for [`LetterGuessed`].
pub const LETTER_GUESSED_EVENT_TYPE: &str = "hangman.letter_guessed";

/// Event type identifier for [`LetterNotGuessed`].
pub const LETTER_NOT_GUESSED_EVENT_TYPE: &str = "hangman.letter_not_guessed";

/// Event type identifier for [`WordGuessed`].
pub const WORD_GUESSED_EVENT_TYPE: &str = "hangman.word_guessed";

/// Event type identifier for [`GameWon`].
pub const GAME_WON_EVENT_TYPE: &str = "hangman.game_won";

/// Event type identifier for [`GameLost`].
pub const GAME_LOST_EVENT_TYPE: &str = "hangman.game_lost";

/// Event payload variants for the hangman context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A game has started.
    GameStarted(GameStarted),
    /// A letter was guessed correctly.
    LetterGuessed(LetterGuessed),
    /// A letter was guessed wrongly.
    LetterNotGuessed(LetterNotGuessed),
    /// The whole word was guessed.
    WordGuessed(WordGuessed),
    /// The game was won.
    GameWon(GameWon),
    /// The game was lost.
    GameLost(GameLost),
}

impl DomainEvent for GameEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::GameStarted(_) => GAME_STARTED_EVENT_TYPE,
            Self::LetterGuessed(_) => LETTER_GUESSED_EVENT_TYPE,
            Self::LetterNotGuessed(_) => LETTER_NOT_GUESSED_EVENT_TYPE,
            Self::WordGuessed(_) => WORD_GUESSED_EVENT_TYPE,
            Self::GameWon(_) => GAME_WON_EVENT_TYPE,
            Self::GameLost(_) => GAME_LOST_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::GameStarted(e) => serde_json::to_value(e),
            Self::LetterGuessed(e) => serde_json::to_value(e),
            Self::LetterNotGuessed(e) => serde_json::to_value(e),
            Self::WordGuessed(e) => serde_json::to_value(e),
            Self::GameWon(e) => serde_json::to_value(e),
            Self::GameLost(e) => serde_json::to_value(e),
        }
    }
}

/// Registry resolving every hangman event name.
///
/// `hangman.game_started` is read through the weak schema so start events
/// stored without `tries` load with [`DEFAULT_TRIES`].
///
/// # Errors
///
/// Returns `DomainError::SchemaMapper` if the versioning strategy cannot be
/// resolved.
pub fn hangman_registry() -> Result<EventRegistry<GameEvent>, DomainError> {
    EventRegistry::new()
        .register(LETTER_GUESSED_EVENT_TYPE, GameEvent::LetterGuessed)
        .register(LETTER_NOT_GUESSED_EVENT_TYPE, GameEvent::LetterNotGuessed)
        .register(WORD_GUESSED_EVENT_TYPE, GameEvent::WordGuessed)
        .register(GAME_WON_EVENT_TYPE, GameEvent::GameWon)
        .register(GAME_LOST_EVENT_TYPE, GameEvent::GameLost)
        .register_versioned(
            GAME_STARTED_EVENT_TYPE,
            WEAK_SCHEMA,
            serde_json::json!({
                "$comment": "tries was added after the first release",
                "aggregate_root_id": null,
                "tries": DEFAULT_TRIES,
                "word": null
            }),
            GameEvent::GameStarted,
        )
}

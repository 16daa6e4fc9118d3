//! Commands for the hangman context.
//!
//! Commands validate their own shape on construction; game rules are
//! checked by the `Game` aggregate.

use eventide_core::command::Command;
use eventide_core::error::DomainError;
use uuid::Uuid;

fn missing(field: &str) -> DomainError {
    DomainError::Validation(format!("Cannot construct command: {field} is missing!"))
}

/// Command to start (or restart) a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartGame {
    aggregate_root_id: Uuid,
    correlation_id: Uuid,
    word: String,
    tries: u32,
}

impl StartGame {
    /// Creates the command. The word is stored lowercase.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the word is blank or `tries` is
    /// zero.
    pub fn new(aggregate_root_id: Uuid, word: &str, tries: u32) -> Result<Self, DomainError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(missing("word"));
        }
        if tries == 0 {
            return Err(missing("tries"));
        }
        Ok(Self {
            aggregate_root_id,
            correlation_id: aggregate_root_id,
            word: word.to_lowercase(),
            tries,
        })
    }

    /// Overrides the correlation id, which defaults to the game id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// The word to guess.
    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Wrong guesses allowed.
    #[must_use]
    pub fn tries(&self) -> u32 {
        self.tries
    }
}

impl Command for StartGame {
    fn command_type(&self) -> &'static str {
        "hangman.start_game"
    }

    fn aggregate_root_id(&self) -> Uuid {
        self.aggregate_root_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to guess a single letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessLetter {
    aggregate_root_id: Uuid,
    correlation_id: Uuid,
    letter: char,
}

impl GuessLetter {
    /// Creates the command. The letter is stored lowercase.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless `letter` is exactly one
    /// character.
    pub fn new(aggregate_root_id: Uuid, letter: &str) -> Result<Self, DomainError> {
        let mut chars = letter.trim().chars();
        let (Some(letter), None) = (chars.next(), chars.next()) else {
            return Err(missing("letter"));
        };
        Ok(Self {
            aggregate_root_id,
            correlation_id: aggregate_root_id,
            letter: letter.to_lowercase().next().unwrap_or(letter),
        })
    }

    /// Overrides the correlation id, which defaults to the game id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// The guessed letter.
    #[must_use]
    pub fn letter(&self) -> char {
        self.letter
    }
}

impl Command for GuessLetter {
    fn command_type(&self) -> &'static str {
        "hangman.guess_letter"
    }

    fn aggregate_root_id(&self) -> Uuid {
        self.aggregate_root_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to guess the whole word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessWord {
    aggregate_root_id: Uuid,
    correlation_id: Uuid,
    word: String,
}

impl GuessWord {
    /// Creates the command. The word is stored lowercase.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the word is blank.
    pub fn new(aggregate_root_id: Uuid, word: &str) -> Result<Self, DomainError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(missing("word"));
        }
        Ok(Self {
            aggregate_root_id,
            correlation_id: aggregate_root_id,
            word: word.to_lowercase(),
        })
    }

    /// Overrides the correlation id, which defaults to the game id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// The guessed word.
    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }
}

impl Command for GuessWord {
    fn command_type(&self) -> &'static str {
        "hangman.guess_word"
    }

    fn aggregate_root_id(&self) -> Uuid {
        self.aggregate_root_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

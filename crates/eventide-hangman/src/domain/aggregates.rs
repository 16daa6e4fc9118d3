//! Aggregate roots for the hangman context.

use eventide_core::aggregate::{AggregateRoot, AggregateState};
use eventide_core::clock::Clock;
use eventide_core::command::Command;
use eventide_core::error::DomainError;
use eventide_core::event::Event;
use uuid::Uuid;

use super::commands::{GuessLetter, GuessWord, StartGame};
use super::events::{
    GameEvent, GameLost, GameStarted, GameWon, LetterGuessed, LetterNotGuessed, WordGuessed,
};

/// A game of hangman.
#[derive(Debug)]
pub struct Game {
    id: Uuid,
    active: bool,
    tries: u32,
    word: String,
    letters_guessed: Vec<char>,
    letters_not_guessed: Vec<char>,
    word_guessed: Option<String>,
    state: AggregateState<GameEvent>,
}

impl Game {
    /// Whether the game is still being played.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Wrong guesses left.
    #[must_use]
    pub fn tries_left(&self) -> u32 {
        self.tries
    }

    /// The word to guess.
    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Correct letters, in guessing order.
    #[must_use]
    pub fn letters_guessed(&self) -> &[char] {
        &self.letters_guessed
    }

    /// Wrong letters, in guessing order.
    #[must_use]
    pub fn letters_not_guessed(&self) -> &[char] {
        &self.letters_not_guessed
    }

    /// The last whole-word guess, if any.
    #[must_use]
    pub fn word_guessed(&self) -> Option<&str> {
        self.word_guessed.as_deref()
    }

    /// The word with every letter not yet guessed replaced by `_`.
    #[must_use]
    pub fn masked_word(&self) -> String {
        self.word
            .chars()
            .map(|c| if self.letters_guessed.contains(&c) { c } else { '_' })
            .collect()
    }

    /// Starts the game, discarding any previous round.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` if the event cannot be recorded.
    pub fn start(&mut self, command: &StartGame, clock: &dyn Clock) -> Result<(), DomainError> {
        self.record(
            GameEvent::GameStarted(GameStarted {
                aggregate_root_id: self.id,
                tries: command.tries(),
                word: command.word().to_owned(),
            }),
            command,
            clock,
        )
    }

    /// Guesses a letter, ending the game when it completes the word or uses
    /// up the last try.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the game is over or out of tries.
    pub fn guess_letter(&mut self, command: &GuessLetter, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_playable()?;
        let letter = command.letter();

        if self.word.contains(letter) {
            self.record(
                GameEvent::LetterGuessed(LetterGuessed {
                    letter: letter.to_string(),
                }),
                command,
                clock,
            )?;
            if self.word.chars().all(|c| self.letters_guessed.contains(&c)) {
                self.record(GameEvent::GameWon(GameWon {}), command, clock)?;
            }
        } else {
            self.record(
                GameEvent::LetterNotGuessed(LetterNotGuessed {
                    letter: letter.to_string(),
                }),
                command,
                clock,
            )?;
            if self.tries == 0 {
                self.record(GameEvent::GameLost(GameLost {}), command, clock)?;
            }
        }
        Ok(())
    }

    /// Guesses the whole word; the game is won or lost on the spot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the game is over or out of tries.
    pub fn guess_word(&mut self, command: &GuessWord, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_playable()?;
        self.record(
            GameEvent::WordGuessed(WordGuessed {
                word: command.word().to_owned(),
            }),
            command,
            clock,
        )?;

        let outcome = if command.word() == self.word {
            GameEvent::GameWon(GameWon {})
        } else {
            GameEvent::GameLost(GameLost {})
        };
        self.record(outcome, command, clock)
    }

    fn ensure_playable(&self) -> Result<(), DomainError> {
        if !self.active {
            return Err(DomainError::Validation("You are game over!".into()));
        }
        if self.tries == 0 {
            return Err(DomainError::Validation(
                "Game doesn't have any tries left.".into(),
            ));
        }
        Ok(())
    }

    fn record(&mut self, payload: GameEvent, command: &dyn Command, clock: &dyn Clock) -> Result<(), DomainError> {
        let mut event = Event::new(payload, clock.now());
        event.set_correlation_id(command.correlation_id())?;
        self.apply(event)
    }
}

impl AggregateRoot for Game {
    type Event = GameEvent;

    fn new(aggregate_root_id: Uuid) -> Self {
        Self {
            id: aggregate_root_id,
            active: false,
            tries: 0,
            word: String::new(),
            letters_guessed: Vec::new(),
            letters_not_guessed: Vec::new(),
            word_guessed: None,
            state: AggregateState::new(),
        }
    }

    fn aggregate_root_id(&self) -> Uuid {
        self.id
    }

    fn state(&self) -> &AggregateState<GameEvent> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AggregateState<GameEvent> {
        &mut self.state
    }

    fn apply_event(&mut self, event: &Event<GameEvent>) {
        match event.payload() {
            GameEvent::GameStarted(e) => {
                self.active = true;
                self.tries = e.tries;
                self.word.clone_from(&e.word);
                self.letters_guessed.clear();
                self.letters_not_guessed.clear();
                self.word_guessed = None;
            }
            GameEvent::LetterGuessed(e) => {
                self.letters_guessed.extend(e.letter.chars());
            }
            GameEvent::LetterNotGuessed(e) => {
                self.letters_not_guessed.extend(e.letter.chars());
                self.tries = self.tries.saturating_sub(1);
            }
            GameEvent::WordGuessed(e) => {
                self.word_guessed = Some(e.word.clone());
            }
            GameEvent::GameWon(_) | GameEvent::GameLost(_) => {
                self.active = false;
            }
        }
    }
}

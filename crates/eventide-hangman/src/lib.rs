//! Eventide — hangman game bounded context.
//!
//! A worked example of an event-sourced aggregate: games are started,
//! guessed at letter by letter or as a whole word, and end won or lost.

pub mod application;
pub mod domain;

pub use domain::events::hangman_registry;

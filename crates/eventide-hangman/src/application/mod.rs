//! Application layer for the hangman context.

pub mod command_handlers;

//! Domain layer: the `Game` aggregate, its events and commands.

pub mod aggregates;
pub mod commands;
pub mod events;

//! Eventide Core — event-sourcing building blocks.
//!
//! Domain events travel in an [`event::Event`] envelope, aggregates rebuild
//! themselves from their stream through [`aggregate::AggregateRoot`], and the
//! [`repository::Repository`] persists pending events through an
//! [`store::EventStore`] before fanning them out on an [`bus::EventBus`].
//! Relational storage lives in `eventide-event-store`; this crate only ships
//! the in-memory store.

pub mod aggregate;
pub mod bus;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod in_memory_store;
pub mod metadata;
pub mod registry;
pub mod repository;
pub mod schema;
pub mod store;

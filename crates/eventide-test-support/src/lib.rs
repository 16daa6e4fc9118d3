//! Shared test mocks and utilities for Eventide.

mod clock;
mod listener;
mod scenario;
mod store;

pub use clock::FixedClock;
pub use listener::{FailingListener, RecordingListener};
pub use scenario::{AggregateScenario, ScenarioOutcome};
pub use store::FailingEventStore;

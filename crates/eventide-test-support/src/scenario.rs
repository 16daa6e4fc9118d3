//! Given/when/then harness for aggregate behavior.

use eventide_core::aggregate::AggregateRoot;
use eventide_core::clock::Clock;
use eventide_core::error::DomainError;
use eventide_core::event::Event;
use uuid::Uuid;

use crate::clock::FixedClock;

/// Builds an aggregate from a history of payloads, runs one command against
/// it and checks the events it produced.
///
/// ```ignore
/// AggregateScenario::<Game>::given(id, vec![started])
///     .when(|game| game.guess_letter('w'))
///     .then_expect_events(&[GameEvent::LetterGuessed(..)]);
/// ```
#[derive(Debug)]
pub struct AggregateScenario<A> {
    aggregate: A,
}

impl<A: AggregateRoot> AggregateScenario<A> {
    /// Replays `history` as persisted events with versions `1..=n`.
    ///
    /// # Panics
    ///
    /// Panics if a history event cannot take its version.
    #[must_use]
    pub fn given(aggregate_root_id: Uuid, history: Vec<A::Event>) -> Self {
        let clock = FixedClock::epoch();
        let events: Vec<Event<A::Event>> = (1_i64..)
            .zip(history)
            .map(|(version, payload)| {
                let mut event = Event::new(payload, clock.now());
                event.set_version(version).unwrap();
                event
            })
            .collect();

        let mut aggregate = A::new(aggregate_root_id);
        aggregate.initialize_state(&events);
        Self { aggregate }
    }

    /// Starts from an aggregate with no history.
    #[must_use]
    pub fn given_no_history(aggregate_root_id: Uuid) -> Self {
        Self {
            aggregate: A::new(aggregate_root_id),
        }
    }

    /// Runs `command` against the aggregate.
    pub fn when<F>(mut self, command: F) -> ScenarioOutcome<A>
    where
        F: FnOnce(&mut A) -> Result<(), DomainError>,
    {
        let result = command(&mut self.aggregate);
        ScenarioOutcome {
            aggregate: self.aggregate,
            result,
        }
    }
}

/// What a scenario's command did.
#[derive(Debug)]
pub struct ScenarioOutcome<A> {
    aggregate: A,
    result: Result<(), DomainError>,
}

impl<A: AggregateRoot> ScenarioOutcome<A>
where
    A::Event: PartialEq,
{
    /// Asserts the command succeeded and produced exactly `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the command failed or produced other events.
    pub fn then_expect_events(&self, expected: &[A::Event]) -> &A {
        if let Err(err) = &self.result {
            panic!("expected events, command failed with {err}");
        }
        let produced: Vec<&A::Event> = self
            .aggregate
            .uncommitted_events()
            .iter()
            .map(Event::payload)
            .collect();
        let expected: Vec<&A::Event> = expected.iter().collect();
        assert_eq!(produced, expected);
        &self.aggregate
    }

    /// Asserts the command failed without producing events and returns the
    /// error.
    ///
    /// # Panics
    ///
    /// Panics if the command succeeded or left uncommitted events.
    pub fn then_expect_error(&self) -> &DomainError {
        assert!(
            self.aggregate.uncommitted_events().is_empty(),
            "a failed command must not produce events"
        );
        match &self.result {
            Err(err) => err,
            Ok(()) => panic!("expected the command to fail"),
        }
    }

    /// The aggregate after the command ran.
    pub fn aggregate(&self) -> &A {
        &self.aggregate
    }
}

//! Test clock — deterministic `Clock` implementation for tests.

use chrono::{DateTime, TimeZone, Utc};
use eventide_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// 2024-01-01T00:00:00Z, whole seconds so it survives RFC 3339 storage.
    #[must_use]
    pub fn epoch() -> Self {
        Self(Utc.timestamp_opt(1_704_067_200, 0).single().unwrap_or_default())
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::epoch()
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

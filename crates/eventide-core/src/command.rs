//! Application-layer commands.

use uuid::Uuid;

/// An intent addressed to one aggregate root.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable command name, used in log fields.
    fn command_type(&self) -> &'static str;

    /// Aggregate root the command targets.
    fn aggregate_root_id(&self) -> Uuid;

    /// Correlation id carried onto the events the command produces.
    fn correlation_id(&self) -> Uuid;
}

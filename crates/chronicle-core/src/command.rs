//! Command abstractions.

use uuid::Uuid;

/// An intent to change one aggregate, handled by an application service.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID stamped on every event the command records.
    fn correlation_id(&self) -> Uuid;
}

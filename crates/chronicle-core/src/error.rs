//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate name was registered twice.
    #[error("aggregate class for {0} already defined")]
    DuplicateAggregateType(String),

    /// An event type name was registered twice.
    #[error("event class for {0} already defined")]
    DuplicateEventType(String),

    /// The same aggregate state type was registered under a second name.
    #[error("aggregate state {state} is already registered as {existing}")]
    AggregateStateAlreadyRegistered {
        /// Rust type name of the state.
        state: &'static str,
        /// Name the state is already registered under.
        existing: String,
    },

    /// An aggregate declared two handlers for one event type.
    #[error("duplicate handler for {event_type} in {aggregate_type} aggregate")]
    DuplicateHandler {
        /// The aggregate declaring the handlers.
        aggregate_type: String,
        /// The event type handled twice.
        event_type: String,
    },

    /// An aggregate state type was used without being registered.
    #[error("aggregate {0} must be registered before use")]
    UnregisteredAggregate(&'static str),

    /// An event type was recorded or decoded without being registered.
    #[error("event {0} must be registered before use")]
    UnregisteredEventType(String),

    /// A missing-handler pattern failed to compile.
    #[error("invalid missing-handler pattern: {0}")]
    InvalidPattern(String),

    /// The subject of an event was read before binding.
    #[error("event not bound to an aggregate")]
    EventNotBound,

    /// An already bound event was bound again.
    #[error("event {0} is already bound to an aggregate")]
    EventAlreadyBound(Uuid),

    /// No handler exists and the missing-handler policy does not ignore it.
    #[error("missing handler for {event_type} in {aggregate_type} aggregate")]
    MissingHandler {
        /// The event type without a handler.
        event_type: String,
        /// The aggregate that recorded or replayed it.
        aggregate_type: String,
    },

    /// A handler received a payload of a different kind than it was declared for.
    #[error("handler for {expected} received a {found} payload")]
    PayloadMismatch {
        /// Event type the handler was declared for.
        expected: &'static str,
        /// Event type reported by the payload.
        found: &'static str,
    },

    /// Replayed events are not contiguous ascending versions.
    #[error("events are not replayed in correct order: expected version {expected}, found {found}")]
    OutOfOrder {
        /// The version the aggregate expected next.
        expected: u64,
        /// The version carried by the event.
        found: u64,
    },

    /// A replayed event belongs to a different aggregate.
    #[error("event for {found} replayed into {expected}")]
    SubjectMismatch {
        /// The aggregate being replayed.
        expected: String,
        /// The subject declared by the event.
        found: String,
    },

    /// The declared aggregate type of an event has no registered constructor.
    #[error("{0} is not a registered aggregate")]
    NotAnAggregate(String),

    /// The registered aggregate name resolves to another state type.
    #[error("aggregate {name} is not registered for {requested}")]
    AggregateTypeMismatch {
        /// The aggregate name that was resolved.
        name: String,
        /// Rust type name of the requested state.
        requested: &'static str,
    },

    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

//! Chronicle Core: aggregate/event lifecycle engine.
//!
//! Aggregates change state only by recording versioned events, and are
//! rebuilt by replaying those events in order. This crate holds the runtime
//! (events, registries, handler dispatch, missing-handler policy, replay) and
//! the single seam it needs from storage. It performs no I/O itself.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod handler;
pub mod policy;
pub mod registry;
pub mod replay;
pub mod repository;

pub use aggregate::{AggregateEvent, AggregateRoot, AggregateState};
pub use error::DomainError;
pub use event::{AggregateId, Event, EventKind, EventPayload, Subject};
pub use handler::HandlerMap;
pub use policy::{AggregateOptions, MissingHandlerPolicy};
pub use registry::{AggregateType, Registry};
pub use replay::reconstruct;
pub use repository::{EventStore, HistoryLoader, StoredEvent};

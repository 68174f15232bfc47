//! Aggregate root abstraction.
//!
//! User code supplies the state (`S: AggregateState`) and its handlers;
//! [`AggregateRoot`] wraps that state with the identity, version counter and
//! pending-event buffer, and owns the record/pop/replay protocol. Recording
//! and replay share one dispatch step so they cannot diverge.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::clock::Clock;
use crate::error::DomainError;
use crate::event::{AggregateId, Event, EventPayload};
use crate::handler::HandlerMap;
use crate::registry::{AggregateType, Registry};

/// Event envelope recorded and replayed by aggregate state `S`.
pub type AggregateEvent<S> = Event<<S as AggregateState>::Event, <S as AggregateState>::Id>;

/// Domain state of an aggregate, mutated only by its handlers.
pub trait AggregateState: Default + Send + Sync + 'static {
    /// Identity type of the aggregate.
    type Id: AggregateId;

    /// Payload enum of the event kinds this aggregate records.
    type Event: EventPayload;

    /// Declares the transition applying each event kind. Called once, when
    /// the aggregate type is registered.
    fn handlers(handlers: &mut HandlerMap<Self>);
}

/// A versioned aggregate instance.
pub struct AggregateRoot<S: AggregateState> {
    id: S::Id,
    version: u64,
    state: S,
    pending_events: Vec<AggregateEvent<S>>,
    kind: Arc<AggregateType<S>>,
    registry: Arc<Registry>,
}

impl<S: AggregateState> AggregateRoot<S> {
    /// Creates a fresh aggregate: version 0, default state, nothing pending.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnregisteredAggregate` if `S` was never
    /// registered in `registry`.
    pub fn new(registry: &Arc<Registry>, id: S::Id) -> Result<Self, DomainError> {
        let kind = registry.aggregate_type::<S>()?;
        Ok(Self::instantiate(Arc::clone(registry), kind, id))
    }

    pub(crate) fn instantiate(
        registry: Arc<Registry>,
        kind: Arc<AggregateType<S>>,
        id: S::Id,
    ) -> Self {
        Self {
            id,
            version: 0,
            state: S::default(),
            pending_events: Vec::new(),
            kind,
            registry,
        }
    }

    /// Returns the aggregate identifier.
    pub fn aggregate_id(&self) -> &S::Id {
        &self.id
    }

    /// Returns the registered aggregate type name.
    pub fn aggregate_type(&self) -> &str {
        self.kind.name()
    }

    /// Returns the current version (number of events applied).
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the domain state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Returns events recorded since the last [`pop_events`](Self::pop_events).
    pub fn pending_events(&self) -> &[AggregateEvent<S>] {
        &self.pending_events
    }

    /// Records `event`: binds it at the next version, applies it to the
    /// state and buffers it.
    ///
    /// On error the version and the buffer are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnregisteredEventType` for an unregistered event
    /// type, `DomainError::EventAlreadyBound` if `event` was bound before, and
    /// `DomainError::MissingHandler` if no handler exists and the policy does
    /// not ignore the event.
    pub fn record_that(&mut self, mut event: AggregateEvent<S>) -> Result<(), DomainError> {
        let next_version = self.version + 1;
        event.bind_to_subject(self.kind.name(), &self.id, next_version)?;
        self.apply(&event)?;
        self.version = next_version;
        debug!(
            aggregate_type = self.kind.name(),
            aggregate_id = ?self.id,
            event_type = event.event_type(),
            version = next_version,
            "recorded event"
        );
        self.pending_events.push(event);
        Ok(())
    }

    /// Records a fresh event wrapping `payload`, stamped with `clock`.
    ///
    /// # Errors
    ///
    /// See [`record_that`](Self::record_that).
    pub fn record(
        &mut self,
        payload: impl Into<S::Event>,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.record_that(Event::with_clock(payload.into(), clock))
    }

    /// Drains the pending buffer. A second call without recording in between
    /// returns an empty vector.
    pub fn pop_events(&mut self) -> Vec<AggregateEvent<S>> {
        std::mem::take(&mut self.pending_events)
    }

    /// Applies historical events in strict version order. Replayed events
    /// are not buffered.
    ///
    /// Nothing is rolled back on failure; an aggregate whose replay failed
    /// must be discarded.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OutOfOrder` unless each event's version is
    /// exactly one above the current version, `DomainError::SubjectMismatch`
    /// if an event belongs to another aggregate, `DomainError::EventNotBound`
    /// for unbound events, and any dispatch error of
    /// [`record_that`](Self::record_that).
    pub fn replay(&mut self, events: &[AggregateEvent<S>]) -> Result<(), DomainError> {
        for event in events {
            let expected = self.version + 1;
            if event.version() != expected {
                return Err(DomainError::OutOfOrder {
                    expected,
                    found: event.version(),
                });
            }
            self.check_subject(event)?;
            self.version = event.version();
            self.apply(event)?;
        }
        debug!(
            aggregate_type = self.kind.name(),
            aggregate_id = ?self.id,
            replayed = events.len(),
            version = self.version,
            "replayed events"
        );
        Ok(())
    }

    fn check_subject(&self, event: &AggregateEvent<S>) -> Result<(), DomainError> {
        let aggregate_type = event.aggregate_type()?;
        let aggregate_id = event.aggregate_id()?;
        if aggregate_type != self.kind.name() || aggregate_id != &self.id {
            return Err(DomainError::SubjectMismatch {
                expected: format!("{} {:?}", self.kind.name(), self.id),
                found: format!("{aggregate_type} {aggregate_id:?}"),
            });
        }
        Ok(())
    }

    fn apply(&mut self, event: &AggregateEvent<S>) -> Result<(), DomainError> {
        let event_type = event.event_type();
        if !self.registry.events().contains(event_type) {
            return Err(DomainError::UnregisteredEventType(event_type.to_owned()));
        }
        self.kind.dispatch(&mut self.state, event)
    }
}

impl<S> fmt::Debug for AggregateRoot<S>
where
    S: AggregateState + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateRoot")
            .field("aggregate_type", &self.kind.name())
            .field("id", &self.id)
            .field("version", &self.version)
            .field("state", &self.state)
            .field("pending_events", &self.pending_events.len())
            .finish()
    }
}

//! Domain event abstractions.
//!
//! An [`Event`] is an immutable fact wrapping a payload. It starts out
//! unbound and is bound exactly once to the aggregate that records it, at the
//! version it occupies in that aggregate's history. Historical events loaded
//! from storage are constructed already bound.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::DomainError;

/// Identity of an aggregate. Opaque to the runtime.
pub trait AggregateId: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {}

impl<T> AggregateId for T where T: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {}

/// The event kinds one aggregate records, typically an enum with one variant
/// per kind.
pub trait EventPayload: Clone + fmt::Debug + Send + Sync + 'static {
    /// Returns the registered type name of the wrapped kind.
    fn event_type(&self) -> &'static str;

    /// Serializes the wrapped kind, without any enum tag, to JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the kind cannot be represented as JSON.
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error>;
}

/// One event kind carried by the payload enum `P`.
pub trait EventKind<P: EventPayload>: Into<P> + Sized + 'static {
    /// Type name, fixed for every instance of this kind.
    const TYPE: &'static str;

    /// Borrows this kind out of a payload, if the payload carries it.
    fn from_payload(payload: &P) -> Option<&Self>;
}

/// The aggregate an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject<I> {
    /// Registered aggregate type name.
    pub aggregate_type: String,
    /// Aggregate identifier.
    pub aggregate_id: I,
}

/// An immutable, versioned record of a state change.
#[derive(Debug, Clone)]
pub struct Event<P, I> {
    id: Uuid,
    occurred_at: DateTime<Utc>,
    correlation_id: Option<Uuid>,
    payload: P,
    subject: Option<Subject<I>>,
    version: u64,
}

impl<P: EventPayload, I: AggregateId> Event<P, I> {
    /// Creates an unbound event stamped with the system clock.
    #[must_use]
    pub fn new(payload: P) -> Self {
        Self::with_clock(payload, &SystemClock)
    }

    /// Creates an unbound event stamped with `clock`.
    #[must_use]
    pub fn with_clock(payload: P, clock: &dyn Clock) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: clock.now(),
            correlation_id: None,
            payload,
            subject: None,
            version: 0,
        }
    }

    /// Creates an event already bound to an aggregate, as found in history.
    #[must_use]
    pub fn historical(
        payload: P,
        aggregate_type: impl Into<String>,
        aggregate_id: I,
        version: u64,
    ) -> Self {
        let mut event = Self::new(payload);
        event.subject = Some(Subject {
            aggregate_type: aggregate_type.into(),
            aggregate_id,
        });
        event.version = version;
        event
    }

    /// Rebuilds an event with its full stored identity.
    #[must_use]
    pub fn restore(
        id: Uuid,
        occurred_at: DateTime<Utc>,
        payload: P,
        subject: Option<Subject<I>>,
        version: u64,
    ) -> Self {
        Self {
            id,
            occurred_at,
            correlation_id: None,
            payload,
            subject,
            version,
        }
    }

    /// Attaches a correlation ID for tracing.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Unique event identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Creation timestamp.
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Correlation ID, if one was attached.
    #[must_use]
    pub fn correlation_id(&self) -> Option<Uuid> {
        self.correlation_id
    }

    /// The event payload.
    #[must_use]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Type name of the payload kind.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    /// Position in the aggregate's history, 1-based. Zero while unbound.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the subject, or `None` while unbound.
    #[must_use]
    pub fn subject(&self) -> Option<&Subject<I>> {
        self.subject.as_ref()
    }

    /// Identifier of the aggregate this event belongs to.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotBound` if the event was never bound.
    pub fn aggregate_id(&self) -> Result<&I, DomainError> {
        self.subject
            .as_ref()
            .map(|subject| &subject.aggregate_id)
            .ok_or(DomainError::EventNotBound)
    }

    /// Type name of the aggregate this event belongs to.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotBound` if the event was never bound.
    pub fn aggregate_type(&self) -> Result<&str, DomainError> {
        self.subject
            .as_ref()
            .map(|subject| subject.aggregate_type.as_str())
            .ok_or(DomainError::EventNotBound)
    }

    /// Binds this event to an aggregate at `version`. Only the recording path
    /// calls this, after computing the aggregate's next version.
    pub(crate) fn bind_to_subject(
        &mut self,
        aggregate_type: &str,
        aggregate_id: &I,
        version: u64,
    ) -> Result<(), DomainError> {
        if self.subject.is_some() {
            return Err(DomainError::EventAlreadyBound(self.id));
        }
        self.subject = Some(Subject {
            aggregate_type: aggregate_type.to_owned(),
            aggregate_id: aggregate_id.clone(),
        });
        self.version = version;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub(crate) struct Pinged {
        pub(crate) note: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub(crate) struct Ponged;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum PingEvent {
        Pinged(Pinged),
        Ponged(Ponged),
    }

    impl EventPayload for PingEvent {
        fn event_type(&self) -> &'static str {
            match self {
                PingEvent::Pinged(_) => Pinged::TYPE,
                PingEvent::Ponged(_) => Ponged::TYPE,
            }
        }

        fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
            match self {
                PingEvent::Pinged(inner) => serde_json::to_value(inner),
                PingEvent::Ponged(inner) => serde_json::to_value(inner),
            }
        }
    }

    impl From<Pinged> for PingEvent {
        fn from(value: Pinged) -> Self {
            PingEvent::Pinged(value)
        }
    }

    impl From<Ponged> for PingEvent {
        fn from(value: Ponged) -> Self {
            PingEvent::Ponged(value)
        }
    }

    impl EventKind<PingEvent> for Pinged {
        const TYPE: &'static str = "test.pinged";

        fn from_payload(payload: &PingEvent) -> Option<&Self> {
            match payload {
                PingEvent::Pinged(inner) => Some(inner),
                PingEvent::Ponged(_) => None,
            }
        }
    }

    impl EventKind<PingEvent> for Ponged {
        const TYPE: &'static str = "test.ponged";

        fn from_payload(payload: &PingEvent) -> Option<&Self> {
            match payload {
                PingEvent::Ponged(inner) => Some(inner),
                PingEvent::Pinged(_) => None,
            }
        }
    }

    pub(crate) fn pinged(note: &str) -> PingEvent {
        PingEvent::Pinged(Pinged {
            note: note.to_owned(),
        })
    }

    #[derive(Debug)]
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_new_event_is_unbound() {
        // Arrange
        let event: Event<PingEvent, String> = Event::new(pinged("hello"));

        // Act
        let id_result = event.aggregate_id();
        let type_result = event.aggregate_type();

        // Assert
        assert!(matches!(id_result, Err(DomainError::EventNotBound)));
        assert!(matches!(type_result, Err(DomainError::EventNotBound)));
        assert_eq!(event.version(), 0);
        assert!(event.subject().is_none());
    }

    #[test]
    fn test_historical_event_is_bound_at_given_version() {
        // Arrange & Act
        let event = Event::historical(pinged("past"), "Pinger", "#42".to_owned(), 3);

        // Assert
        assert_eq!(event.aggregate_id().unwrap(), "#42");
        assert_eq!(event.aggregate_type().unwrap(), "Pinger");
        assert_eq!(event.version(), 3);
    }

    #[test]
    fn test_with_clock_stamps_occurred_at() {
        // Arrange
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = FixedClock(fixed_now);

        // Act
        let event: Event<PingEvent, u32> = Event::with_clock(pinged("tick"), &clock);

        // Assert
        assert_eq!(event.occurred_at(), fixed_now);
    }

    #[test]
    fn test_event_type_is_fixed_per_kind() {
        // Arrange
        let first: Event<PingEvent, u32> = Event::new(pinged("a"));
        let second: Event<PingEvent, u32> = Event::new(pinged("b"));
        let other: Event<PingEvent, u32> = Event::new(PingEvent::Ponged(Ponged));

        // Assert
        assert_eq!(first.event_type(), Pinged::TYPE);
        assert_eq!(first.event_type(), second.event_type());
        assert_eq!(other.event_type(), Ponged::TYPE);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_bind_to_subject_sets_subject_once() {
        // Arrange
        let mut event: Event<PingEvent, u32> = Event::new(pinged("bind me"));

        // Act
        event.bind_to_subject("Pinger", &7, 1).unwrap();
        let rebind = event.bind_to_subject("Pinger", &8, 2);

        // Assert
        assert_eq!(*event.aggregate_id().unwrap(), 7);
        assert_eq!(event.version(), 1);
        match rebind {
            Err(DomainError::EventAlreadyBound(id)) => assert_eq!(id, event.id()),
            other => panic!("expected EventAlreadyBound, got {other:?}"),
        }
    }

    #[test]
    fn test_with_correlation_id_is_kept() {
        // Arrange
        let correlation_id = Uuid::new_v4();

        // Act
        let event: Event<PingEvent, u32> =
            Event::new(pinged("traced")).with_correlation_id(correlation_id);

        // Assert
        assert_eq!(event.correlation_id(), Some(correlation_id));
    }
}

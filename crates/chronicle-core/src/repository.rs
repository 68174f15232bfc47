//! History loading seam.
//!
//! Storage is an outside collaborator. The runtime only ever asks it for the
//! history of one aggregate; it never writes. Events drained with
//! [`AggregateRoot::pop_events`] are handed back to the caller, who persists
//! them (typically as [`StoredEvent`]s) and owns id/version uniqueness.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::aggregate::{AggregateEvent, AggregateRoot, AggregateState};
use crate::error::DomainError;
use crate::event::{AggregateId, Event, EventPayload, Subject};
use crate::registry::Registry;
use crate::replay::reconstruct;

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent<I> {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate type name.
    pub aggregate_type: String,
    /// Aggregate this event belongs to.
    pub aggregate_id: I,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Position within the aggregate stream, 1-based.
    pub version: u64,
    /// Correlation ID for tracing.
    pub correlation_id: Option<Uuid>,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

impl<I: AggregateId> StoredEvent<I> {
    /// Converts a recorded (bound) event into its stored form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotBound` for an unbound event and
    /// `DomainError::Infrastructure` if the payload fails to serialize.
    pub fn from_event<P: EventPayload>(event: &Event<P, I>) -> Result<Self, DomainError> {
        let payload = event
            .payload()
            .to_payload()
            .map_err(|e| DomainError::Infrastructure(format!("event serialization failed: {e}")))?;
        Ok(Self {
            event_id: event.id(),
            aggregate_type: event.aggregate_type()?.to_owned(),
            aggregate_id: event.aggregate_id()?.clone(),
            event_type: event.event_type().to_owned(),
            payload,
            version: event.version(),
            correlation_id: event.correlation_id(),
            occurred_at: event.occurred_at(),
        })
    }

    /// Rebuilds the event through the event type registry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnregisteredEventType` if the event type is
    /// unknown and `DomainError::Infrastructure` if the payload does not decode.
    pub fn decode<P: EventPayload>(&self, registry: &Registry) -> Result<Event<P, I>, DomainError> {
        let payload = registry
            .events()
            .decode::<P>(&self.event_type, self.payload.clone())?;
        let event = Event::restore(
            self.event_id,
            self.occurred_at,
            payload,
            Some(Subject {
                aggregate_type: self.aggregate_type.clone(),
                aggregate_id: self.aggregate_id.clone(),
            }),
            self.version,
        );
        Ok(match self.correlation_id {
            Some(correlation_id) => event.with_correlation_id(correlation_id),
            None => event,
        })
    }
}

/// The one capability required from storage.
#[async_trait]
pub trait HistoryLoader<I: AggregateId>: Send + Sync {
    /// Load all events recorded for `aggregate_id`.
    ///
    /// Reconstruction is only correct if the result is version-contiguous
    /// from 1; returning it sorted by version is the loader's job.
    async fn load_by_aggregate_id(
        &self,
        aggregate_id: &I,
    ) -> Result<Vec<StoredEvent<I>>, DomainError>;
}

#[async_trait]
impl<I, L> HistoryLoader<I> for Arc<L>
where
    I: AggregateId,
    L: HistoryLoader<I> + ?Sized,
{
    async fn load_by_aggregate_id(
        &self,
        aggregate_id: &I,
    ) -> Result<Vec<StoredEvent<I>>, DomainError> {
        (**self).load_by_aggregate_id(aggregate_id).await
    }
}

/// Loads aggregates through a [`HistoryLoader`].
#[derive(Debug)]
pub struct EventStore<L> {
    loader: L,
    registry: Arc<Registry>,
}

impl<L> EventStore<L> {
    /// Creates an event store reading through `loader`.
    #[must_use]
    pub fn new(loader: L, registry: Arc<Registry>) -> Self {
        Self { loader, registry }
    }

    /// The underlying loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// The registry used for decoding and reconstruction.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Loads, decodes and reconstructs aggregate `aggregate_id`.
    ///
    /// Returns `Ok(None)` when no history exists.
    ///
    /// # Errors
    ///
    /// Returns loader errors unchanged, decoding errors from
    /// [`StoredEvent::decode`] and reconstruction errors from
    /// [`reconstruct`].
    pub async fn load_aggregate<S>(
        &self,
        aggregate_id: &S::Id,
    ) -> Result<Option<AggregateRoot<S>>, DomainError>
    where
        S: AggregateState,
        L: HistoryLoader<S::Id>,
    {
        let stored = self.loader.load_by_aggregate_id(aggregate_id).await?;
        debug!(?aggregate_id, events = stored.len(), "loaded history");
        let events = stored
            .iter()
            .map(|event| event.decode::<S::Event>(&self.registry))
            .collect::<Result<Vec<AggregateEvent<S>>, DomainError>>()?;
        reconstruct(&self.registry, &events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::{PingEvent, Pinged, pinged};
    use crate::event::EventKind;

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.register_event::<Pinged, PingEvent>().unwrap();
        registry
    }

    #[test]
    fn test_from_event_and_decode_keep_identity() {
        // Arrange
        let registry = registry();
        let correlation_id = Uuid::new_v4();
        let event = Event::historical(pinged("kept"), "Echo", 9_u32, 4)
            .with_correlation_id(correlation_id);

        // Act
        let stored = StoredEvent::from_event(&event).unwrap();
        let decoded: Event<PingEvent, u32> = stored.decode(&registry).unwrap();

        // Assert
        assert_eq!(stored.event_type, Pinged::TYPE);
        assert_eq!(stored.payload, serde_json::json!({ "note": "kept" }));
        assert_eq!(stored.version, 4);
        assert_eq!(decoded.id(), event.id());
        assert_eq!(decoded.occurred_at(), event.occurred_at());
        assert_eq!(decoded.payload(), event.payload());
        assert_eq!(decoded.subject(), event.subject());
        assert_eq!(decoded.version(), 4);
        assert_eq!(decoded.correlation_id(), Some(correlation_id));
    }

    #[test]
    fn test_from_unbound_event_fails() {
        let event: Event<PingEvent, u32> = Event::new(pinged("loose"));

        let result = StoredEvent::from_event(&event);

        assert!(matches!(result, Err(DomainError::EventNotBound)));
    }
}

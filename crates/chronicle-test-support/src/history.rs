//! Test histories: mock `HistoryLoader` implementations for tests.

use async_trait::async_trait;
use chronicle_core::error::DomainError;
use chronicle_core::event::{AggregateId, Event, EventPayload};
use chronicle_core::repository::{HistoryLoader, StoredEvent};
use parking_lot::Mutex;

/// An in-memory event log shared by many aggregates.
///
/// Loads return the events of one aggregate sorted by version, like a real
/// store would. Every loaded id is recorded for later assertions.
#[derive(Debug)]
pub struct InMemoryHistory<I> {
    events: Mutex<Vec<StoredEvent<I>>>,
    loaded: Mutex<Vec<I>>,
}

impl<I: AggregateId> InMemoryHistory<I> {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::with_events(Vec::new())
    }

    /// Create a history pre-populated with `events`, in any order.
    #[must_use]
    pub fn with_events(events: Vec<StoredEvent<I>>) -> Self {
        Self {
            events: Mutex::new(events),
            loaded: Mutex::new(Vec::new()),
        }
    }

    /// Append already-stored events.
    pub fn append(&self, events: &[StoredEvent<I>]) {
        self.events.lock().extend_from_slice(events);
    }

    /// Persist events drained from an aggregate.
    ///
    /// # Errors
    ///
    /// Returns the conversion error of [`StoredEvent::from_event`].
    pub fn append_recorded<P: EventPayload>(&self, events: &[Event<P, I>]) -> Result<(), DomainError> {
        let stored = events
            .iter()
            .map(StoredEvent::from_event)
            .collect::<Result<Vec<_>, _>>()?;
        self.append(&stored);
        Ok(())
    }

    /// Returns a snapshot of every stored event, in insertion order.
    pub fn events(&self) -> Vec<StoredEvent<I>> {
        self.events.lock().clone()
    }

    /// Returns the ids passed to `load_by_aggregate_id`, in call order.
    pub fn loaded_ids(&self) -> Vec<I> {
        self.loaded.lock().clone()
    }
}

impl<I: AggregateId> Default for InMemoryHistory<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<I: AggregateId> HistoryLoader<I> for InMemoryHistory<I> {
    async fn load_by_aggregate_id(
        &self,
        aggregate_id: &I,
    ) -> Result<Vec<StoredEvent<I>>, DomainError> {
        self.loaded.lock().push(aggregate_id.clone());
        let mut events: Vec<StoredEvent<I>> = self
            .events
            .lock()
            .iter()
            .filter(|event| &event.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.version);
        Ok(events)
    }
}

/// A history that never has any events. Useful for testing "aggregate not
/// found" scenarios.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyHistory;

#[async_trait]
impl<I: AggregateId> HistoryLoader<I> for EmptyHistory {
    async fn load_by_aggregate_id(
        &self,
        _aggregate_id: &I,
    ) -> Result<Vec<StoredEvent<I>>, DomainError> {
        Ok(vec![])
    }
}

/// A history that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingHistory;

#[async_trait]
impl<I: AggregateId> HistoryLoader<I> for FailingHistory {
    async fn load_by_aggregate_id(
        &self,
        _aggregate_id: &I,
    ) -> Result<Vec<StoredEvent<I>>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

//! Event handler maps.
//!
//! Each aggregate state type declares, once at registration, which function
//! applies which event kind. Dispatch is a single hash lookup by event type
//! name; there is no runtime reflection.

use std::collections::HashMap;
use std::fmt;

use crate::aggregate::{AggregateEvent, AggregateState};
use crate::error::DomainError;
use crate::event::EventKind;

pub(crate) type HandlerFn<S> =
    Box<dyn Fn(&mut S, &AggregateEvent<S>) -> Result<(), DomainError> + Send + Sync>;

/// Maps event type names to the state transition applying them to `S`.
pub struct HandlerMap<S: AggregateState> {
    handlers: HashMap<&'static str, HandlerFn<S>>,
    duplicates: Vec<&'static str>,
}

impl<S: AggregateState> HandlerMap<S> {
    pub(crate) fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            duplicates: Vec::new(),
        }
    }

    /// Declares `handler` as the transition for event kind `K`.
    ///
    /// ```ignore
    /// fn handlers(handlers: &mut HandlerMap<Self>) {
    ///     handlers
    ///         .on(AccountState::add_to_total)
    ///         .on(AccountState::subtract_from_total);
    /// }
    /// ```
    pub fn on<K, F>(&mut self, handler: F) -> &mut Self
    where
        K: EventKind<S::Event>,
        F: Fn(&mut S, &K) + Send + Sync + 'static,
    {
        self.insert(
            K::TYPE,
            Box::new(move |state, event| {
                let kind =
                    K::from_payload(event.payload()).ok_or(DomainError::PayloadMismatch {
                        expected: K::TYPE,
                        found: event.event_type(),
                    })?;
                handler(state, kind);
                Ok(())
            }),
        )
    }

    /// Declares a transition that receives the whole event envelope.
    pub fn on_event<F>(&mut self, event_type: &'static str, handler: F) -> &mut Self
    where
        F: Fn(&mut S, &AggregateEvent<S>) + Send + Sync + 'static,
    {
        self.insert(
            event_type,
            Box::new(move |state, event| {
                handler(state, event);
                Ok(())
            }),
        )
    }

    /// Returns true if a transition is declared for `event_type`.
    #[must_use]
    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Number of declared transitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no transition is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn get(&self, event_type: &str) -> Option<&HandlerFn<S>> {
        self.handlers.get(event_type)
    }

    pub(crate) fn first_duplicate(&self) -> Option<&'static str> {
        self.duplicates.first().copied()
    }

    fn insert(&mut self, event_type: &'static str, handler: HandlerFn<S>) -> &mut Self {
        if self.handlers.contains_key(event_type) {
            self.duplicates.push(event_type);
        } else {
            self.handlers.insert(event_type, handler);
        }
        self
    }
}

impl<S: AggregateState> fmt::Debug for HandlerMap<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut event_types: Vec<&str> = self.handlers.keys().copied().collect();
        event_types.sort_unstable();
        f.debug_struct("HandlerMap")
            .field("event_types", &event_types)
            .finish_non_exhaustive()
    }
}

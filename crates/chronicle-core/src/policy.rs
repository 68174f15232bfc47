//! Missing-handler policy and aggregate registration options.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

use crate::aggregate::{AggregateEvent, AggregateState};
use crate::error::DomainError;
use crate::event::EventKind;

type IgnorePredicate<S> = Box<dyn Fn(&AggregateEvent<S>) -> bool + Send + Sync>;

/// Decides what happens when an event has no declared handler.
///
/// Evaluated for every such event; nothing is cached.
pub enum MissingHandlerPolicy<S: AggregateState> {
    /// Every event must have a handler.
    Fail,
    /// No event requires a handler.
    Ignore,
    /// Ignore only the listed event types.
    IgnoreTypes(HashSet<String>),
    /// Ignore event types matching the pattern.
    IgnoreMatching(Regex),
    /// Ignore events for which the predicate returns true.
    IgnoreWhen(IgnorePredicate<S>),
}

impl<S: AggregateState> MissingHandlerPolicy<S> {
    /// Ignores the given event type names.
    pub fn ignore_types<T>(event_types: impl IntoIterator<Item = T>) -> Self
    where
        T: Into<String>,
    {
        Self::IgnoreTypes(event_types.into_iter().map(Into::into).collect())
    }

    /// Ignores the single event kind `K`.
    #[must_use]
    pub fn ignore_kind<K: EventKind<S::Event>>() -> Self {
        Self::ignore_types([K::TYPE])
    }

    /// Ignores event types matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPattern` if `pattern` does not compile.
    pub fn ignore_matching(pattern: &str) -> Result<Self, DomainError> {
        Regex::new(pattern)
            .map(Self::IgnoreMatching)
            .map_err(|e| DomainError::InvalidPattern(e.to_string()))
    }

    /// Ignores events accepted by `predicate`.
    pub fn ignore_when<F>(predicate: F) -> Self
    where
        F: Fn(&AggregateEvent<S>) -> bool + Send + Sync + 'static,
    {
        Self::IgnoreWhen(Box::new(predicate))
    }

    /// Returns true if a missing handler for `event` should be skipped.
    pub fn ignores(&self, event: &AggregateEvent<S>) -> bool {
        match self {
            Self::Fail => false,
            Self::Ignore => true,
            Self::IgnoreTypes(types) => types.contains(event.event_type()),
            Self::IgnoreMatching(pattern) => pattern.is_match(event.event_type()),
            Self::IgnoreWhen(predicate) => predicate(event),
        }
    }
}

impl<S: AggregateState> Default for MissingHandlerPolicy<S> {
    fn default() -> Self {
        Self::Fail
    }
}

impl<S: AggregateState> From<bool> for MissingHandlerPolicy<S> {
    fn from(ignore: bool) -> Self {
        if ignore { Self::Ignore } else { Self::Fail }
    }
}

impl<S: AggregateState> fmt::Debug for MissingHandlerPolicy<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => f.write_str("Fail"),
            Self::Ignore => f.write_str("Ignore"),
            Self::IgnoreTypes(types) => f.debug_tuple("IgnoreTypes").field(types).finish(),
            Self::IgnoreMatching(pattern) => f
                .debug_tuple("IgnoreMatching")
                .field(&pattern.as_str())
                .finish(),
            Self::IgnoreWhen(_) => f.write_str("IgnoreWhen(..)"),
        }
    }
}

/// Options given when registering an aggregate type.
#[derive(Debug)]
pub struct AggregateOptions<S: AggregateState> {
    /// Policy for events without a declared handler.
    pub ignore_missing_handlers: MissingHandlerPolicy<S>,
}

impl<S: AggregateState> AggregateOptions<S> {
    /// Options with the default (failing) missing-handler policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ignore_missing_handlers: MissingHandlerPolicy::Fail,
        }
    }

    /// Replaces the missing-handler policy.
    #[must_use]
    pub fn ignore_missing_handlers(mut self, policy: impl Into<MissingHandlerPolicy<S>>) -> Self {
        self.ignore_missing_handlers = policy.into();
        self
    }
}

impl<S: AggregateState> Default for AggregateOptions<S> {
    fn default() -> Self {
        Self::new()
    }
}

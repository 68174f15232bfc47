//! Aggregate and event type registries.
//!
//! Two independent, append-only name maps. The aggregate registry maps a name
//! to the registered [`AggregateType`] (state type, handlers, missing-handler
//! policy) and is also indexed by the state's `TypeId`, so handler lookup is
//! keyed by type identity rather than by name. The event registry maps an
//! event type name to the decoder rebuilding its payload from stored JSON.
//!
//! Registries are meant to be populated once at startup, before any
//! aggregate is instantiated. Each check-then-insert runs under a single
//! write lock: of two concurrent registrations of one name, the first wins.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::aggregate::{AggregateEvent, AggregateState};
use crate::error::DomainError;
use crate::event::{EventKind, EventPayload};
use crate::handler::HandlerMap;
use crate::policy::{AggregateOptions, MissingHandlerPolicy};

static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::new()));

/// A registered aggregate type: its name, handlers and missing-handler policy.
pub struct AggregateType<S: AggregateState> {
    name: String,
    handlers: HandlerMap<S>,
    missing_handlers: MissingHandlerPolicy<S>,
}

impl<S: AggregateState> AggregateType<S> {
    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if a handler is declared for `event_type`.
    #[must_use]
    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.handles(event_type)
    }

    /// Applies `event` to `state` through its handler, or through the
    /// missing-handler policy when none is declared.
    pub(crate) fn dispatch(
        &self,
        state: &mut S,
        event: &AggregateEvent<S>,
    ) -> Result<(), DomainError> {
        if let Some(handler) = self.handlers.get(event.event_type()) {
            return handler(state, event);
        }
        if self.missing_handlers.ignores(event) {
            trace!(
                aggregate_type = %self.name,
                event_type = event.event_type(),
                "no handler, ignored by policy"
            );
            return Ok(());
        }
        Err(DomainError::MissingHandler {
            event_type: event.event_type().to_owned(),
            aggregate_type: self.name.clone(),
        })
    }
}

impl<S: AggregateState> fmt::Debug for AggregateType<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateType")
            .field("name", &self.name)
            .field("handlers", &self.handlers)
            .field("missing_handlers", &self.missing_handlers)
            .finish()
    }
}

struct AggregateEntry {
    state_type: TypeId,
    kind: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct AggregateTable {
    by_name: HashMap<String, AggregateEntry>,
    by_state: HashMap<TypeId, String>,
}

/// Name -> aggregate type map, write-once per name.
#[derive(Default)]
pub struct AggregateTypeRegistry {
    table: RwLock<AggregateTable>,
}

impl AggregateTypeRegistry {
    /// Registers state type `S` under `name`, collecting its handlers.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateAggregateType` if `name` is taken,
    /// `DomainError::AggregateStateAlreadyRegistered` if `S` is registered
    /// under another name, and `DomainError::DuplicateHandler` if `S`
    /// declares two handlers for one event type.
    pub fn register<S: AggregateState>(
        &self,
        name: &str,
        options: AggregateOptions<S>,
    ) -> Result<Arc<AggregateType<S>>, DomainError> {
        let mut handlers = HandlerMap::new();
        S::handlers(&mut handlers);
        if let Some(event_type) = handlers.first_duplicate() {
            return Err(DomainError::DuplicateHandler {
                aggregate_type: name.to_owned(),
                event_type: event_type.to_owned(),
            });
        }

        let mut table = self.table.write();
        if table.by_name.contains_key(name) {
            return Err(DomainError::DuplicateAggregateType(name.to_owned()));
        }
        let state_type = TypeId::of::<S>();
        if let Some(existing) = table.by_state.get(&state_type) {
            return Err(DomainError::AggregateStateAlreadyRegistered {
                state: type_name::<S>(),
                existing: existing.clone(),
            });
        }

        let kind = Arc::new(AggregateType {
            name: name.to_owned(),
            handlers,
            missing_handlers: options.ignore_missing_handlers,
        });
        table.by_name.insert(
            name.to_owned(),
            AggregateEntry {
                state_type,
                kind: Arc::clone(&kind) as Arc<dyn Any + Send + Sync>,
            },
        );
        table.by_state.insert(state_type, name.to_owned());

        debug!(
            aggregate_type = name,
            handlers = kind.handlers.len(),
            "registered aggregate type"
        );
        Ok(kind)
    }

    /// Returns the registration of state type `S`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnregisteredAggregate` if `S` was never registered.
    pub fn get<S: AggregateState>(&self) -> Result<Arc<AggregateType<S>>, DomainError> {
        let table = self.table.read();
        let name = table
            .by_state
            .get(&TypeId::of::<S>())
            .ok_or(DomainError::UnregisteredAggregate(type_name::<S>()))?;
        table
            .by_name
            .get(name)
            .and_then(|entry| Arc::clone(&entry.kind).downcast::<AggregateType<S>>().ok())
            .ok_or(DomainError::UnregisteredAggregate(type_name::<S>()))
    }

    /// Resolves `name` to the registration of state type `S`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotAnAggregate` if `name` is unknown and
    /// `DomainError::AggregateTypeMismatch` if it belongs to another state type.
    pub fn resolve<S: AggregateState>(
        &self,
        name: &str,
    ) -> Result<Arc<AggregateType<S>>, DomainError> {
        let table = self.table.read();
        let entry = table
            .by_name
            .get(name)
            .ok_or_else(|| DomainError::NotAnAggregate(name.to_owned()))?;
        let mismatch = || DomainError::AggregateTypeMismatch {
            name: name.to_owned(),
            requested: type_name::<S>(),
        };
        if entry.state_type != TypeId::of::<S>() {
            return Err(mismatch());
        }
        Arc::clone(&entry.kind)
            .downcast::<AggregateType<S>>()
            .map_err(|_| mismatch())
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.table.read().by_name.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.table.read().by_name.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for AggregateTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateTypeRegistry")
            .field("names", &self.names())
            .finish()
    }
}

type Decoder<P> = fn(serde_json::Value) -> Result<P, serde_json::Error>;

fn decode_kind<K, P>(value: serde_json::Value) -> Result<P, serde_json::Error>
where
    P: EventPayload,
    K: EventKind<P> + DeserializeOwned,
{
    serde_json::from_value::<K>(value).map(Into::into)
}

struct EventEntry {
    payload_type: &'static str,
    decoder: Box<dyn Any + Send + Sync>,
}

/// Name -> event payload decoder map, write-once per name.
#[derive(Default)]
pub struct EventTypeRegistry {
    entries: RwLock<HashMap<String, EventEntry>>,
}

impl EventTypeRegistry {
    /// Registers event kind `K` under `K::TYPE`, decoding into payload `P`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateEventType` if the name is taken.
    pub fn register<K, P>(&self) -> Result<(), DomainError>
    where
        P: EventPayload,
        K: EventKind<P> + DeserializeOwned,
    {
        let mut entries = self.entries.write();
        if entries.contains_key(K::TYPE) {
            return Err(DomainError::DuplicateEventType(K::TYPE.to_owned()));
        }
        let decoder: Decoder<P> = decode_kind::<K, P>;
        entries.insert(
            K::TYPE.to_owned(),
            EventEntry {
                payload_type: type_name::<P>(),
                decoder: Box::new(decoder),
            },
        );
        debug!(event_type = K::TYPE, "registered event type");
        Ok(())
    }

    /// Returns true if `event_type` is registered.
    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.entries.read().contains_key(event_type)
    }

    /// Rebuilds the payload of a stored `event_type` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnregisteredEventType` for an unknown name and
    /// `DomainError::Infrastructure` if the name decodes into another payload
    /// type or the JSON does not match the kind.
    pub fn decode<P: EventPayload>(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<P, DomainError> {
        let entries = self.entries.read();
        let entry = entries
            .get(event_type)
            .ok_or_else(|| DomainError::UnregisteredEventType(event_type.to_owned()))?;
        let decoder = entry.decoder.downcast_ref::<Decoder<P>>().ok_or_else(|| {
            DomainError::Infrastructure(format!(
                "event {event_type} decodes into {}, not {}",
                entry.payload_type,
                type_name::<P>()
            ))
        })?;
        decoder(payload)
            .map_err(|e| DomainError::Infrastructure(format!("event deserialization failed: {e}")))
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for EventTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTypeRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// The aggregate and event registries used together.
///
/// Build one with [`Registry::new`] and pass it by `Arc` where needed, or
/// use the process-wide [`Registry::global`].
#[derive(Debug, Default)]
pub struct Registry {
    aggregates: AggregateTypeRegistry,
    events: EventTypeRegistry,
}

impl Registry {
    /// Creates an empty, independent registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    #[must_use]
    pub fn global() -> Arc<Registry> {
        Arc::clone(&GLOBAL)
    }

    /// The aggregate type registry.
    #[must_use]
    pub fn aggregates(&self) -> &AggregateTypeRegistry {
        &self.aggregates
    }

    /// The event type registry.
    #[must_use]
    pub fn events(&self) -> &EventTypeRegistry {
        &self.events
    }

    /// See [`AggregateTypeRegistry::register`].
    ///
    /// # Errors
    ///
    /// See [`AggregateTypeRegistry::register`].
    pub fn register_aggregate<S: AggregateState>(
        &self,
        name: &str,
        options: AggregateOptions<S>,
    ) -> Result<Arc<AggregateType<S>>, DomainError> {
        self.aggregates.register(name, options)
    }

    /// See [`EventTypeRegistry::register`].
    ///
    /// # Errors
    ///
    /// See [`EventTypeRegistry::register`].
    pub fn register_event<K, P>(&self) -> Result<(), DomainError>
    where
        P: EventPayload,
        K: EventKind<P> + DeserializeOwned,
    {
        self.events.register::<K, P>()
    }

    /// See [`AggregateTypeRegistry::get`].
    ///
    /// # Errors
    ///
    /// See [`AggregateTypeRegistry::get`].
    pub fn aggregate_type<S: AggregateState>(&self) -> Result<Arc<AggregateType<S>>, DomainError> {
        self.aggregates.get::<S>()
    }

    /// See [`AggregateTypeRegistry::resolve`].
    ///
    /// # Errors
    ///
    /// See [`AggregateTypeRegistry::resolve`].
    pub fn resolve<S: AggregateState>(
        &self,
        name: &str,
    ) -> Result<Arc<AggregateType<S>>, DomainError> {
        self.aggregates.resolve::<S>(name)
    }
}

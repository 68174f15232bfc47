//! Reconstruction of aggregates from their event history.

use std::sync::Arc;

use tracing::debug;

use crate::aggregate::{AggregateEvent, AggregateRoot, AggregateState};
use crate::error::DomainError;
use crate::registry::Registry;

/// Rebuilds an aggregate by replaying `events` into a fresh instance.
///
/// The aggregate type is resolved from the first event's subject and the
/// instance takes that event's aggregate id. Events must already be in
/// ascending, contiguous version order starting at 1; the order is validated,
/// never repaired.
///
/// Returns `Ok(None)` for an empty history.
///
/// # Errors
///
/// Returns `DomainError::EventNotBound` if the first event has no subject,
/// `DomainError::NotAnAggregate` or `DomainError::AggregateTypeMismatch` if
/// its aggregate type does not resolve to `S`, and any error of
/// [`AggregateRoot::replay`].
pub fn reconstruct<S: AggregateState>(
    registry: &Arc<Registry>,
    events: &[AggregateEvent<S>],
) -> Result<Option<AggregateRoot<S>>, DomainError> {
    let Some(first) = events.first() else {
        debug!("empty history, nothing to reconstruct");
        return Ok(None);
    };

    let aggregate_type = first.aggregate_type()?;
    let aggregate_id = first.aggregate_id()?.clone();
    let kind = registry.resolve::<S>(aggregate_type)?;

    let mut aggregate = AggregateRoot::instantiate(Arc::clone(registry), kind, aggregate_id);
    aggregate.replay(events)?;

    debug!(
        aggregate_type,
        aggregate_id = ?aggregate.aggregate_id(),
        version = aggregate.version(),
        "reconstructed aggregate"
    );
    Ok(Some(aggregate))
}

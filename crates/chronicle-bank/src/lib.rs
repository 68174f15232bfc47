//! Chronicle sample: bank account bounded context.
//!
//! Accounts accept deposits and withdrawals; the balance is derived purely
//! from the recorded events.

pub mod application;
pub mod domain;

use std::sync::Arc;

use chronicle_core::error::DomainError;
use chronicle_core::registry::{AggregateType, Registry};

use crate::domain::aggregates::{self, AccountState};
use crate::domain::events;

/// Registers the account event types and the account aggregate.
///
/// # Errors
///
/// Returns `DomainError` if any of the names is already registered.
pub fn register(registry: &Registry) -> Result<Arc<AggregateType<AccountState>>, DomainError> {
    events::register_event_types(registry)?;
    aggregates::register_account(registry)
}

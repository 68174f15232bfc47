//! Query handlers for the bank account context.
//!
//! This module contains query handlers that reconstitute accounts
//! from their history and return read-only view DTOs.

use chronicle_core::error::DomainError;
use chronicle_core::repository::{EventStore, HistoryLoader};
use serde::Serialize;

use crate::domain::aggregates::AccountState;

/// Read-only view of an account aggregate.
#[derive(Debug, Serialize)]
pub struct AccountView {
    /// The account identifier.
    pub account_id: String,
    /// Current balance.
    pub total: i64,
    /// Current version (event count).
    pub version: u64,
}

/// Retrieves an account by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID,
/// or any loading, decoding or replay error.
pub async fn get_account_by_id<L>(
    account_id: &str,
    store: &EventStore<L>,
) -> Result<AccountView, DomainError>
where
    L: HistoryLoader<String>,
{
    let account = store
        .load_aggregate::<AccountState>(&account_id.to_owned())
        .await?
        .ok_or_else(|| DomainError::AggregateNotFound(account_id.to_owned()))?;
    Ok(AccountView {
        account_id: account_id.to_owned(),
        total: account.state().total(),
        version: account.version(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use chronicle_core::error::DomainError;
    use chronicle_core::registry::Registry;
    use chronicle_core::repository::{EventStore, StoredEvent};
    use chronicle_test_support::{EmptyHistory, InMemoryHistory};
    use uuid::Uuid;

    use crate::application::query_handlers::get_account_by_id;
    use crate::domain::aggregates::ACCOUNT_AGGREGATE_TYPE;
    use crate::domain::events::MONEY_DEPOSITED_EVENT_TYPE;

    fn registry() -> Arc<Registry> {
        let registry = Registry::new();
        crate::register(&registry).unwrap();
        Arc::new(registry)
    }

    fn deposited(account_id: &str, amount: i64, version: u64) -> StoredEvent<String> {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_type: ACCOUNT_AGGREGATE_TYPE.to_owned(),
            aggregate_id: account_id.to_owned(),
            event_type: MONEY_DEPOSITED_EVENT_TYPE.to_owned(),
            payload: serde_json::json!({ "amount": amount }),
            version,
            correlation_id: None,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_get_account_by_id_returns_view() {
        // Arrange
        let history = InMemoryHistory::with_events(vec![
            deposited("A", 10, 1),
            deposited("A", 5, 2),
        ]);
        let store = EventStore::new(history, registry());

        // Act
        let view = get_account_by_id("A", &store).await.unwrap();

        // Assert
        assert_eq!(view.account_id, "A");
        assert_eq!(view.total, 15);
        assert_eq!(view.version, 2);
    }

    #[tokio::test]
    async fn test_get_account_by_id_returns_not_found_for_empty_history() {
        // Arrange
        let store = EventStore::new(EmptyHistory, registry());

        // Act
        let result = get_account_by_id("missing", &store).await;

        // Assert
        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, "missing"),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }
}

//! End-to-end tests for the account aggregate: record, drain, persist,
//! reload.

use std::sync::Arc;

use chronicle_bank::application::command_handlers::{handle_deposit, handle_withdraw};
use chronicle_bank::application::query_handlers::get_account_by_id;
use chronicle_bank::domain::aggregates::{ACCOUNT_AGGREGATE_TYPE, Account, AccountState};
use chronicle_bank::domain::commands::{DepositMoney, WithdrawMoney};
use chronicle_bank::domain::events::{AccountEvent, MoneyDeposited, MoneyWithdrawn};
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::registry::Registry;
use chronicle_core::replay::reconstruct;
use chronicle_core::repository::{EventStore, StoredEvent};
use chronicle_test_support::{FixedClock, InMemoryHistory, init_tracing};
use uuid::Uuid;

fn registry() -> Arc<Registry> {
    init_tracing();
    let registry = Registry::new();
    chronicle_bank::register(&registry).unwrap();
    Arc::new(registry)
}

/// Builds a history from signed amounts: positive deposits, negative
/// withdrawals, versions numbered per account.
fn history_of(entries: &[(&str, i64)]) -> InMemoryHistory<String> {
    let history = InMemoryHistory::new();
    let mut versions = std::collections::HashMap::<&str, u64>::new();
    for (account_id, amount) in entries {
        let version = versions.entry(*account_id).or_insert(0);
        *version += 1;
        let payload: AccountEvent = if *amount >= 0 {
            MoneyDeposited { amount: *amount }.into()
        } else {
            MoneyWithdrawn { amount: -amount }.into()
        };
        let event = Event::historical(
            payload,
            ACCOUNT_AGGREGATE_TYPE,
            (*account_id).to_owned(),
            *version,
        );
        history.append(&[StoredEvent::from_event(&event).unwrap()]);
    }
    history
}

#[test]
fn test_two_deposits_record_drain_and_reconstruct() {
    // Arrange
    let registry = registry();
    let clock = FixedClock::default();
    let mut account = Account::open(&registry, "A").unwrap();
    assert_eq!(account.version(), 0);

    // Act
    account.deposit(10, Uuid::new_v4(), &clock).unwrap();
    account.deposit(5, Uuid::new_v4(), &clock).unwrap();

    // Assert
    assert_eq!(account.version(), 2);
    assert_eq!(account.total(), 15);
    let pending: Vec<u64> = account.pending_events().iter().map(Event::version).collect();
    assert_eq!(pending, vec![1, 2]);

    let drained = account.pop_events();
    assert_eq!(drained.len(), 2);
    assert!(account.pending_events().is_empty());
    assert!(account.pop_events().is_empty());

    let rebuilt = reconstruct::<AccountState>(&registry, &drained)
        .unwrap()
        .unwrap();
    assert_eq!(rebuilt.aggregate_id(), "A");
    assert_eq!(rebuilt.version(), 2);
    assert_eq!(rebuilt.state().total(), 15);
}

#[test]
fn test_failed_withdrawal_leaves_version_unchanged() {
    // Arrange
    let registry = registry();
    let clock = FixedClock::default();
    let mut account = Account::open(&registry, "A").unwrap();
    account.deposit(10, Uuid::new_v4(), &clock).unwrap();

    // Act
    let result = account.withdraw(11, Uuid::new_v4(), &clock);

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(account.version(), 1);
    assert_eq!(account.total(), 10);
}

#[tokio::test]
async fn test_event_store_loads_account_from_interleaved_history() {
    // Arrange
    let history = history_of(&[("A", 10), ("B", 10), ("C", 10), ("A", 10), ("A", -8)]);
    let store = EventStore::new(history, registry());

    // Act
    let account = store
        .load_aggregate::<AccountState>(&"A".to_owned())
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert_eq!(account.state().total(), 12);
    assert_eq!(account.version(), 3);
}

#[tokio::test]
async fn test_event_store_returns_none_for_unknown_account() {
    let store = EventStore::new(history_of(&[("A", 10)]), registry());

    let account = store
        .load_aggregate::<AccountState>(&"Z".to_owned())
        .await
        .unwrap();

    assert!(account.is_none());
}

#[tokio::test]
async fn test_round_trip_through_persisted_history() {
    // Arrange
    let registry = registry();
    let clock = FixedClock::default();
    let history = Arc::new(InMemoryHistory::new());
    let store = EventStore::new(Arc::clone(&history), Arc::clone(&registry));

    let mut account = Account::open(&registry, "A").unwrap();
    account.deposit(100, Uuid::new_v4(), &clock).unwrap();
    account.withdraw(30, Uuid::new_v4(), &clock).unwrap();
    account.deposit(7, Uuid::new_v4(), &clock).unwrap();
    let (total_before, version_before) = (account.total(), account.version());

    // Act
    history.append_recorded(&account.pop_events()).unwrap();
    let reloaded = store
        .load_aggregate::<AccountState>(&"A".to_owned())
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert_eq!(reloaded.state().total(), total_before);
    assert_eq!(reloaded.version(), version_before);
}

#[tokio::test]
async fn test_command_handlers_and_query_agree() {
    // Arrange
    let clock = FixedClock::default();
    let history = Arc::new(InMemoryHistory::new());
    let store = EventStore::new(Arc::clone(&history), registry());

    // Act
    for amount in [50, 25] {
        let deposit = DepositMoney {
            correlation_id: Uuid::new_v4(),
            account_id: "acc-1".to_owned(),
            amount,
        };
        let result = handle_deposit(&deposit, &clock, &store).await.unwrap();
        history.append(&result.stored_events);
    }
    let withdraw = WithdrawMoney {
        correlation_id: Uuid::new_v4(),
        account_id: "acc-1".to_owned(),
        amount: 60,
    };
    let result = handle_withdraw(&withdraw, &clock, &store).await.unwrap();
    history.append(&result.stored_events);

    // Assert
    let view = get_account_by_id("acc-1", &store).await.unwrap();
    assert_eq!(view.total, 15);
    assert_eq!(view.version, 3);
    let versions: Vec<u64> = history.events().iter().map(|event| event.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_gap_in_stored_history_fails_reconstruction() {
    // Arrange
    let history = history_of(&[("A", 10), ("A", 10), ("A", 10)]);
    let mut events = history.events();
    events.remove(1);
    let store = EventStore::new(InMemoryHistory::with_events(events), registry());

    // Act
    let result = store.load_aggregate::<AccountState>(&"A".to_owned()).await;

    // Assert
    assert!(matches!(
        result,
        Err(DomainError::OutOfOrder {
            expected: 2,
            found: 3
        })
    ));
}

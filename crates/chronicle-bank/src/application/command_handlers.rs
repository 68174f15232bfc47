//! Command handlers for the bank account context.
//!
//! Each handler loads the account through the event store, executes the
//! command, and hands the drained events back as `StoredEvent`s. Persisting
//! them is the caller's job.

use chronicle_core::clock::Clock;
use chronicle_core::command::Command;
use chronicle_core::error::DomainError;
use chronicle_core::repository::{EventStore, HistoryLoader, StoredEvent};
use tracing::{debug, instrument};

use crate::domain::aggregates::{Account, AccountState};
use crate::domain::commands::{DepositMoney, WithdrawMoney};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct AccountCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: String,
    /// The account version after the command.
    pub version: u64,
    /// The events produced, ready to be persisted.
    pub stored_events: Vec<StoredEvent<String>>,
}

/// Loads an account from its history, or opens a fresh one when the
/// history is empty.
///
/// # Errors
///
/// Returns `DomainError` if loading, decoding or replaying fails.
pub(crate) async fn load_or_open<L>(
    account_id: &str,
    store: &EventStore<L>,
) -> Result<Account, DomainError>
where
    L: HistoryLoader<String>,
{
    let account_id = account_id.to_owned();
    match store.load_aggregate::<AccountState>(&account_id).await? {
        Some(root) => Ok(root.into()),
        None => {
            debug!(%account_id, "no history, opening account");
            Account::open(store.registry(), account_id)
        }
    }
}

fn drain(account: &mut Account) -> Result<AccountCommandResult, DomainError> {
    let stored_events = account
        .pop_events()
        .iter()
        .map(StoredEvent::from_event)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AccountCommandResult {
        aggregate_id: account.id().to_owned(),
        version: account.version(),
        stored_events,
    })
}

/// Handles the `DepositMoney` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a non-positive amount, or any
/// loading error.
#[instrument(skip_all, fields(command_type = command.command_type(), account_id = %command.account_id))]
pub async fn handle_deposit<L>(
    command: &DepositMoney,
    clock: &dyn Clock,
    store: &EventStore<L>,
) -> Result<AccountCommandResult, DomainError>
where
    L: HistoryLoader<String>,
{
    let mut account = load_or_open(&command.account_id, store).await?;
    account.deposit(command.amount, command.correlation_id(), clock)?;
    drain(&mut account)
}

/// Handles the `WithdrawMoney` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a non-positive amount or
/// insufficient funds, or any loading error.
#[instrument(skip_all, fields(command_type = command.command_type(), account_id = %command.account_id))]
pub async fn handle_withdraw<L>(
    command: &WithdrawMoney,
    clock: &dyn Clock,
    store: &EventStore<L>,
) -> Result<AccountCommandResult, DomainError>
where
    L: HistoryLoader<String>,
{
    let mut account = load_or_open(&command.account_id, store).await?;
    account.withdraw(command.amount, command.correlation_id(), clock)?;
    drain(&mut account)
}

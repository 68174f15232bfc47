//! Aggregate roots for the bank account context.

use std::sync::Arc;

use chronicle_core::aggregate::{AggregateEvent, AggregateRoot, AggregateState};
use chronicle_core::clock::Clock;
use chronicle_core::error::DomainError;
use chronicle_core::event::Event;
use chronicle_core::handler::HandlerMap;
use chronicle_core::policy::AggregateOptions;
use chronicle_core::registry::{AggregateType, Registry};
use uuid::Uuid;

use super::events::{AccountEvent, MoneyDeposited, MoneyWithdrawn};

/// Registered aggregate type name for accounts.
pub const ACCOUNT_AGGREGATE_TYPE: &str = "BankAccount";

/// Account balance, derived from deposits and withdrawals.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AccountState {
    total: i64,
}

impl AccountState {
    /// Current balance.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.total
    }

    // Saturating: a stored history may carry amounts the commands reject.
    fn add_to_total(&mut self, event: &MoneyDeposited) {
        self.total = self.total.saturating_add(event.amount);
    }

    fn subtract_from_total(&mut self, event: &MoneyWithdrawn) {
        self.total = self.total.saturating_sub(event.amount);
    }
}

impl AggregateState for AccountState {
    type Id = String;
    type Event = AccountEvent;

    fn handlers(handlers: &mut HandlerMap<Self>) {
        handlers
            .on(AccountState::add_to_total)
            .on(AccountState::subtract_from_total);
    }
}

/// Registers the account aggregate under [`ACCOUNT_AGGREGATE_TYPE`].
///
/// # Errors
///
/// Returns `DomainError` if the name or the state type is already registered.
pub fn register_account(registry: &Registry) -> Result<Arc<AggregateType<AccountState>>, DomainError> {
    registry.register_aggregate::<AccountState>(ACCOUNT_AGGREGATE_TYPE, AggregateOptions::default())
}

/// The aggregate root for a bank account.
#[derive(Debug)]
pub struct Account {
    root: AggregateRoot<AccountState>,
}

impl Account {
    /// Opens a fresh account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnregisteredAggregate` if accounts were not
    /// registered in `registry`.
    pub fn open(registry: &Arc<Registry>, id: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            root: AggregateRoot::new(registry, id.into())?,
        })
    }

    /// Account identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.root.aggregate_id()
    }

    /// Current balance.
    #[must_use]
    pub fn total(&self) -> i64 {
        self.root.state().total()
    }

    /// Current version (event count).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.root.version()
    }

    /// Events recorded since the last drain.
    #[must_use]
    pub fn pending_events(&self) -> &[AggregateEvent<AccountState>] {
        self.root.pending_events()
    }

    /// Drains recorded events for persistence.
    pub fn pop_events(&mut self) -> Vec<AggregateEvent<AccountState>> {
        self.root.pop_events()
    }

    /// Deposits `amount`, producing a `MoneyDeposited` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `amount` is not positive or the
    /// balance would overflow. Nothing is recorded in that case.
    pub fn deposit(
        &mut self,
        amount: i64,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        ensure_positive(amount)?;
        if self.total().checked_add(amount).is_none() {
            return Err(DomainError::Validation(format!(
                "deposit of {amount} would overflow the balance of account {}",
                self.id()
            )));
        }
        self.record(MoneyDeposited { amount }.into(), correlation_id, clock)
    }

    /// Withdraws `amount`, producing a `MoneyWithdrawn` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `amount` is not positive or
    /// exceeds the balance. Nothing is recorded in that case.
    pub fn withdraw(
        &mut self,
        amount: i64,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        ensure_positive(amount)?;
        if self.total().checked_sub(amount).is_none_or(|balance| balance < 0) {
            return Err(DomainError::Validation(format!(
                "insufficient funds in account {}: balance {}, requested {amount}",
                self.id(),
                self.total()
            )));
        }
        self.record(MoneyWithdrawn { amount }.into(), correlation_id, clock)
    }

    fn record(
        &mut self,
        payload: AccountEvent,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.root
            .record_that(Event::with_clock(payload, clock).with_correlation_id(correlation_id))
    }
}

impl From<AggregateRoot<AccountState>> for Account {
    fn from(root: AggregateRoot<AccountState>) -> Self {
        Self { root }
    }
}

fn ensure_positive(amount: i64) -> Result<(), DomainError> {
    if amount <= 0 {
        return Err(DomainError::Validation(format!(
            "amount must be greater than 0, got {amount}"
        )));
    }
    Ok(())
}

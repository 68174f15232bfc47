//! Commands for the bank account context.

use chronicle_core::command::Command;
use uuid::Uuid;

/// Command to deposit money into an account.
#[derive(Debug, Clone)]
pub struct DepositMoney {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The account identifier.
    pub account_id: String,
    /// The amount to deposit.
    pub amount: i64,
}

impl Command for DepositMoney {
    fn command_type(&self) -> &'static str {
        "account.deposit_money"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to withdraw money from an account.
#[derive(Debug, Clone)]
pub struct WithdrawMoney {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The account identifier.
    pub account_id: String,
    /// The amount to withdraw.
    pub amount: i64,
}

impl Command for WithdrawMoney {
    fn command_type(&self) -> &'static str {
        "account.withdraw_money"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

//! Domain events for the bank account context.

use chronicle_core::error::DomainError;
use chronicle_core::event::{EventKind, EventPayload};
use chronicle_core::registry::Registry;
use serde::{Deserialize, Serialize};

/// Event type name for [`MoneyDeposited`].
pub const MONEY_DEPOSITED_EVENT_TYPE: &str = "account.money_deposited";

/// Event type name for [`MoneyWithdrawn`].
pub const MONEY_WITHDRAWN_EVENT_TYPE: &str = "account.money_withdrawn";

/// Emitted when money is deposited into an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyDeposited {
    /// The deposited amount, always positive.
    pub amount: i64,
}

/// Emitted when money is withdrawn from an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyWithdrawn {
    /// The withdrawn amount, always positive.
    pub amount: i64,
}

/// Event payload variants for the bank account context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    /// Money has been deposited.
    MoneyDeposited(MoneyDeposited),
    /// Money has been withdrawn.
    MoneyWithdrawn(MoneyWithdrawn),
}

impl EventPayload for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::MoneyDeposited(_) => MONEY_DEPOSITED_EVENT_TYPE,
            AccountEvent::MoneyWithdrawn(_) => MONEY_WITHDRAWN_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            AccountEvent::MoneyDeposited(payload) => serde_json::to_value(payload),
            AccountEvent::MoneyWithdrawn(payload) => serde_json::to_value(payload),
        }
    }
}

impl From<MoneyDeposited> for AccountEvent {
    fn from(value: MoneyDeposited) -> Self {
        AccountEvent::MoneyDeposited(value)
    }
}

impl From<MoneyWithdrawn> for AccountEvent {
    fn from(value: MoneyWithdrawn) -> Self {
        AccountEvent::MoneyWithdrawn(value)
    }
}

impl EventKind<AccountEvent> for MoneyDeposited {
    const TYPE: &'static str = MONEY_DEPOSITED_EVENT_TYPE;

    fn from_payload(payload: &AccountEvent) -> Option<&Self> {
        match payload {
            AccountEvent::MoneyDeposited(inner) => Some(inner),
            AccountEvent::MoneyWithdrawn(_) => None,
        }
    }
}

impl EventKind<AccountEvent> for MoneyWithdrawn {
    const TYPE: &'static str = MONEY_WITHDRAWN_EVENT_TYPE;

    fn from_payload(payload: &AccountEvent) -> Option<&Self> {
        match payload {
            AccountEvent::MoneyWithdrawn(inner) => Some(inner),
            AccountEvent::MoneyDeposited(_) => None,
        }
    }
}

/// Registers both account event types.
///
/// # Errors
///
/// Returns `DomainError::DuplicateEventType` if either name is taken.
pub fn register_event_types(registry: &Registry) -> Result<(), DomainError> {
    registry.register_event::<MoneyDeposited, AccountEvent>()?;
    registry.register_event::<MoneyWithdrawn, AccountEvent>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serializes_without_variant_tag() {
        let event = AccountEvent::from(MoneyDeposited { amount: 10 });

        let payload = event.to_payload().unwrap();

        assert_eq!(payload, serde_json::json!({ "amount": 10 }));
        assert_eq!(event.event_type(), MONEY_DEPOSITED_EVENT_TYPE);
    }

    #[test]
    fn test_registered_types_decode_stored_payloads() {
        // Arrange
        let registry = Registry::new();
        register_event_types(&registry).unwrap();

        // Act
        let decoded: AccountEvent = registry
            .events()
            .decode(MONEY_WITHDRAWN_EVENT_TYPE, serde_json::json!({ "amount": 8 }))
            .unwrap();

        // Assert
        assert_eq!(decoded, AccountEvent::MoneyWithdrawn(MoneyWithdrawn { amount: 8 }));
    }

    #[test]
    fn test_registering_twice_fails() {
        let registry = Registry::new();
        register_event_types(&registry).unwrap();

        let result = register_event_types(&registry);

        assert!(matches!(result, Err(DomainError::DuplicateEventType(_))));
    }
}

//! Core domain types for the ledger.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::Amount;

/// Account identifier.
pub type AccountId = u32;

/// Transaction identifier, assigned by the store.
pub type TxId = u64;

/// Event timestamp used to order ledger entries.
pub type EventTime = DateTime<Utc>;

/// Nature of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// Single-instalment purchase (debit).
    Purchase,
    /// Purchase paid in instalments (debit).
    InstallmentPurchase,
    /// Cash withdrawal (debit).
    Withdrawal,
    /// Payment towards the account (credit).
    Payment,
}

impl OperationType {
    /// Inverse of [`OperationType::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "purchase" => Some(OperationType::Purchase),
            "installment_purchase" => Some(OperationType::InstallmentPurchase),
            "withdrawal" => Some(OperationType::Withdrawal),
            "payment" => Some(OperationType::Payment),
            _ => None,
        }
    }

    pub fn is_debit(self) -> bool {
        !matches!(self, OperationType::Payment)
    }

    /// Apply the sign this operation is recorded with to a magnitude.
    pub fn signed(self, magnitude: Amount) -> Amount {
        if self.is_debit() {
            -magnitude.abs()
        } else {
            magnitude.abs()
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Purchase => "purchase",
            OperationType::InstallmentPurchase => "installment_purchase",
            OperationType::Withdrawal => "withdrawal",
            OperationType::Payment => "payment",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger entry, as handed to the store before it has an id.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account: AccountId,
    pub operation: OperationType,
    /// Signed amount.
    pub amount: Amount,
    pub event_time: EventTime,
}

/// A persisted ledger entry.
///
/// `amount` never changes after creation. For debits, `balance` is the part
/// still unsettled: it starts at `amount` and moves towards zero as payments
/// are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TxId,
    pub account: AccountId,
    pub operation: OperationType,
    pub amount: Amount,
    pub balance: Amount,
    pub event_time: EventTime,
}

impl Transaction {
    pub fn is_outstanding_debit(&self) -> bool {
        self.operation.is_debit() && self.balance.is_negative()
    }
}

/// An outstanding debit as seen by the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debt {
    pub id: TxId,
    pub balance: Amount,
    pub event_time: EventTime,
}

impl From<&Transaction> for Debt {
    fn from(tx: &Transaction) -> Self {
        Debt {
            id: tx.id,
            balance: tx.balance,
            event_time: tx.event_time,
        }
    }
}

/// New balance for one debit, together with the balance it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub id: TxId,
    pub previous: Amount,
    pub balance: Amount,
}

impl BalanceUpdate {
    /// Portion of the payment applied to this debit.
    pub fn applied(&self) -> Amount {
        self.balance - self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_round_trip() {
        for op in [
            OperationType::Purchase,
            OperationType::InstallmentPurchase,
            OperationType::Withdrawal,
            OperationType::Payment,
        ] {
            assert_eq!(OperationType::from_name(op.as_str()), Some(op));
        }
        assert_eq!(OperationType::from_name("refund"), None);
        assert_eq!(OperationType::from_name("Purchase"), None);
    }

    #[test]
    fn debits_are_recorded_negative() {
        let hundred = Amount::from_units(100);
        assert_eq!(OperationType::Purchase.signed(hundred), -hundred);
        assert_eq!(OperationType::Withdrawal.signed(-hundred), -hundred);
        assert_eq!(OperationType::Payment.signed(hundred), hundred);
        assert!(!OperationType::Payment.is_debit());
    }

    #[test]
    fn balance_update_applied() {
        let update = BalanceUpdate {
            id: 1,
            previous: Amount::from_units(-100),
            balance: Amount::from_units(-30),
        };
        assert_eq!(update.applied(), Amount::from_units(70));
    }
}

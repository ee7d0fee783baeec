//! Error types for debt settlement.

use std::time::Duration;

use thiserror::Error;

use crate::Amount;
use crate::model::{AccountId, TxId};
use crate::store::StoreError;

/// Coarse classification callers use to decide between retrying and rejecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Storage could not be reached. Nothing was applied; retry is allowed.
    StorageUnavailable,
    /// The atomic write was refused. Retry the whole settlement from a fresh load.
    WriteConflict,
    /// The request itself is malformed. Do not retry.
    InvalidInput,
}

/// Rejected allocator input. No work is performed when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("payment amount {0} is negative")]
    NegativePayment(Amount),

    #[error("transaction {0} is not an outstanding debit (balance {1})")]
    NotADebt(TxId, Amount),
}

/// Error returned by [`Settler::settle`](super::Settler::settle).
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] AllocationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("persisting settlement for account {account} timed out after {after:?}")]
    TimedOut { account: AccountId, after: Duration },
}

impl SettlementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettlementError::InvalidInput(_) => ErrorKind::InvalidInput,
            SettlementError::Store(e) => e.kind(),
            SettlementError::TimedOut { .. } => ErrorKind::StorageUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        let invalid = SettlementError::from(AllocationError::NegativePayment(Amount::from_units(-1)));
        assert_eq!(invalid.kind(), ErrorKind::InvalidInput);

        let unavailable = SettlementError::from(StoreError::Unavailable("down".into()));
        assert_eq!(unavailable.kind(), ErrorKind::StorageUnavailable);

        let conflict = SettlementError::from(StoreError::Conflict {
            tx: 7,
            reason: "balance changed".into(),
        });
        assert_eq!(conflict.kind(), ErrorKind::WriteConflict);

        let timed_out = SettlementError::TimedOut {
            account: 1,
            after: Duration::from_millis(10),
        };
        assert_eq!(timed_out.kind(), ErrorKind::StorageUnavailable);
    }

    #[test]
    fn store_errors_display_unchanged() {
        let err = SettlementError::from(StoreError::Unavailable("connection refused".into()));
        assert_eq!(err.to_string(), "storage unavailable: connection refused");
    }
}

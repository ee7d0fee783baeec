//! Storage capabilities the settlement engine depends on.

use std::future::Future;

use thiserror::Error;

use crate::model::{AccountId, BalanceUpdate, Debt, NewTransaction, OperationType, Transaction, TxId};
use crate::settlement::ErrorKind;

mod memory;
pub use memory::MemoryLedger;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("write conflict on transaction {tx}: {reason}")]
    Conflict { tx: TxId, reason: String },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unavailable(_) => ErrorKind::StorageUnavailable,
            StoreError::Conflict { .. } => ErrorKind::WriteConflict,
        }
    }
}

/// Durable owner of every ledger entry.
pub trait LedgerStore: Send + Sync {
    /// Insert a new entry, assigning its id. A debit starts with `balance == amount`.
    fn record_transaction(
        &self,
        tx: NewTransaction,
    ) -> impl Future<Output = Result<Transaction, StoreError>> + Send;

    /// Debits of `category` on `account` with a negative balance, oldest first.
    ///
    /// Entries sharing an event time are ordered by id. An empty queue means
    /// the account owes nothing in this category.
    fn load_outstanding_debits(
        &self,
        account: AccountId,
        category: OperationType,
    ) -> impl Future<Output = Result<Vec<Debt>, StoreError>> + Send;

    /// Write every update or none of them.
    fn persist_balances(
        &self,
        updates: &[BalanceUpdate],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

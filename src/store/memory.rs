use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::{LedgerStore, StoreError};
use crate::Amount;
use crate::model::{AccountId, BalanceUpdate, Debt, NewTransaction, OperationType, Transaction, TxId};

/// In-process ledger store.
///
/// A single mutex guards the table, which makes each call atomic. Balance
/// writes are compare-and-swap on the balance the update was computed from.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<Table>,
}

#[derive(Debug, Default)]
struct Table {
    transactions: BTreeMap<TxId, Transaction>,
    last_id: TxId,
}

impl Table {
    fn check(&self, update: &BalanceUpdate) -> Result<(), StoreError> {
        let conflict = |reason: String| StoreError::Conflict {
            tx: update.id,
            reason,
        };

        let tx = self
            .transactions
            .get(&update.id)
            .ok_or_else(|| conflict("unknown transaction".to_string()))?;

        if !tx.operation.is_debit() {
            return Err(conflict(format!("{} is not a debit", tx.operation)));
        }
        if tx.balance != update.previous {
            return Err(conflict(format!(
                "balance is {}, expected {}",
                tx.balance, update.previous
            )));
        }
        if update.balance < tx.amount || update.balance > Amount::ZERO {
            return Err(conflict(format!(
                "balance {} outside [{}, 0]",
                update.balance, tx.amount
            )));
        }
        Ok(())
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, Table>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("ledger table lock poisoned".to_string()))
    }

    /// Snapshot of every entry, ordered by id.
    pub fn transactions(&self) -> Result<Vec<Transaction>, StoreError> {
        Ok(self.table()?.transactions.values().cloned().collect())
    }

    pub fn get(&self, id: TxId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.table()?.transactions.get(&id).cloned())
    }
}

impl LedgerStore for MemoryLedger {
    async fn record_transaction(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let mut table = self.table()?;
        table.last_id += 1;

        let tx = Transaction {
            id: table.last_id,
            account: new.account,
            operation: new.operation,
            amount: new.amount,
            balance: new.amount,
            event_time: new.event_time,
        };
        table.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn load_outstanding_debits(
        &self,
        account: AccountId,
        category: OperationType,
    ) -> Result<Vec<Debt>, StoreError> {
        let table = self.table()?;
        let mut queue: Vec<Debt> = table
            .transactions
            .values()
            .filter(|tx| {
                tx.account == account && tx.operation == category && tx.is_outstanding_debit()
            })
            .map(Debt::from)
            .collect();

        queue.sort_by_key(|d| (d.event_time, d.id));
        Ok(queue)
    }

    async fn persist_balances(&self, updates: &[BalanceUpdate]) -> Result<(), StoreError> {
        let mut table = self.table()?;

        let mut seen = HashSet::with_capacity(updates.len());
        for update in updates {
            if !seen.insert(update.id) {
                return Err(StoreError::Conflict {
                    tx: update.id,
                    reason: "updated twice in one batch".to_string(),
                });
            }
            table.check(update)?;
        }

        for update in updates {
            if let Some(tx) = table.transactions.get_mut(&update.id) {
                debug!(tx = %update.id, from = %tx.balance, to = %update.balance, "balance written");
                tx.balance = update.balance;
            }
        }
        Ok(())
    }
}

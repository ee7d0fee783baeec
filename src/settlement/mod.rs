//! Debt settlement.
//!
//! A payment is settled in three steps: the account's outstanding debits are
//! loaded oldest first, the payment is distributed over them by the pure
//! [`allocate`] function, and the resulting balances are written back in one
//! atomic batch. Load and write happen under a per-account lock, so two
//! payments on the same account never settle against the same snapshot.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::Amount;
use crate::model::{AccountId, BalanceUpdate, Debt, EventTime};
use crate::store::LedgerStore;

mod allocator;
pub use allocator::{Allocation, allocate};

mod config;
pub use config::{ConfigError, SettlementConfig};

mod error;
pub use error::{AllocationError, ErrorKind, SettlementError};

mod locks;
use locks::AccountLocks;

/// Outcome of a successful settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub account: AccountId,
    /// Balances written, in settlement order.
    pub updates: Vec<BalanceUpdate>,
    /// Part of the payment no outstanding debt could absorb.
    /// What happens to it is up to the caller.
    pub remainder: Amount,
}

impl Settlement {
    pub fn applied(&self) -> Amount {
        self.updates.iter().map(BalanceUpdate::applied).sum()
    }
}

/// Settles payments against a [`LedgerStore`].
pub struct Settler<S> {
    store: Arc<S>,
    locks: AccountLocks,
    config: SettlementConfig,
}

impl<S: LedgerStore> Settler<S> {
    pub fn new(store: Arc<S>, config: SettlementConfig) -> Self {
        Self {
            store,
            locks: AccountLocks::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Apply `payment`, received at `at`, to the outstanding debits of `account`.
    ///
    /// Debits of every configured category are settled oldest first, as one
    /// queue. Debits recorded after `at` are left alone. On error nothing
    /// has been written.
    pub async fn settle(
        &self,
        account: AccountId,
        payment: Amount,
        at: EventTime,
    ) -> Result<Settlement, SettlementError> {
        if payment.is_negative() {
            return Err(AllocationError::NegativePayment(payment).into());
        }
        if payment.is_zero() {
            return Ok(Settlement {
                account,
                updates: Vec::new(),
                remainder: payment,
            });
        }

        let _guard = self.locks.acquire(account).await;

        let queue = self.load_queue(account, at).await?;
        let allocation = allocate(&queue, payment)?;
        debug!(
            account = %account,
            queued = queue.len(),
            applied = %allocation.applied(),
            "payment allocated"
        );

        if !allocation.updates.is_empty() {
            self.persist(account, &allocation.updates).await?;
        }

        let settlement = Settlement {
            account,
            updates: allocation.updates,
            remainder: allocation.remainder,
        };
        info!(
            account = %account,
            payment = %payment,
            applied = %settlement.applied(),
            debits = settlement.updates.len(),
            remainder = %settlement.remainder,
            "payment settled"
        );
        Ok(settlement)
    }
}

/// Private API
impl<S: LedgerStore> Settler<S> {
    /// Outstanding debits of the configured categories due at `at`, oldest first.
    async fn load_queue(
        &self,
        account: AccountId,
        at: EventTime,
    ) -> Result<Vec<Debt>, SettlementError> {
        let mut queue = Vec::new();
        for &category in &self.config.categories {
            queue.extend(self.store.load_outstanding_debits(account, category).await?);
        }
        if self.config.categories.len() > 1 {
            queue.sort_by_key(|d| (d.event_time, d.id));
        }

        let due = queue.iter().take_while(|d| d.event_time <= at).count();
        queue.truncate(due);
        Ok(queue)
    }

    async fn persist(
        &self,
        account: AccountId,
        updates: &[BalanceUpdate],
    ) -> Result<(), SettlementError> {
        let after = self.config.persist_timeout;
        match tokio::time::timeout(after, self.store.persist_balances(updates)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(account = %account, reason = %e, "settlement not persisted");
                Err(e.into())
            }
            Err(_) => {
                warn!(account = %account, timeout = ?after, "settlement persist timed out");
                Err(SettlementError::TimedOut { account, after })
            }
        }
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::model::AccountId;

/// One async mutex per account, so that settlements of the same account run
/// one at a time while different accounts proceed in parallel.
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>,
}

/// Exclusive settlement scope for one account, released on drop.
#[derive(Debug)]
pub struct AccountGuard {
    _guard: OwnedMutexGuard<()>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other settlement holds `account`.
    pub async fn acquire(&self, account: AccountId) -> AccountGuard {
        let lock = {
            // the map is never left half-updated, so a poisoned lock is still usable
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // drop idle entries: only the map itself references them
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(account).or_default())
        };

        AccountGuard {
            _guard: lock.lock_owned().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn same_account_waits() {
        let locks = AccountLocks::new();
        let guard = locks.acquire(1).await;

        let second = timeout(Duration::from_millis(20), locks.acquire(1)).await;
        assert!(second.is_err());

        drop(guard);
        let second = timeout(Duration::from_millis(20), locks.acquire(1)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn different_accounts_do_not_block() {
        let locks = AccountLocks::new();
        let _first = locks.acquire(1).await;

        let other = timeout(Duration::from_millis(20), locks.acquire(2)).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn idle_locks_are_pruned() {
        let locks = AccountLocks::new();
        {
            let _a = locks.acquire(1).await;
            let _b = locks.acquire(2).await;
            assert_eq!(locks.locks.lock().unwrap().len(), 2);
        }

        let _c = locks.acquire(3).await;
        let held: Vec<AccountId> = locks.locks.lock().unwrap().keys().copied().collect();
        assert_eq!(held, vec![3]);
    }
}

//! Event replay on top of the settlement engine.
//!
//! Debit events are recorded as-is. A payment first settles the account's
//! outstanding debits and is recorded only once that settlement is durable.

use std::sync::Arc;

use thiserror::Error;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::Amount;
use crate::model::{AccountId, EventTime, NewTransaction, OperationType, Transaction};
use crate::settlement::{Settlement, SettlementConfig, SettlementError, Settler};
use crate::store::{LedgerStore, StoreError};

/// An incoming ledger event. `amount` is the unsigned magnitude supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEvent {
    pub account: AccountId,
    pub operation: OperationType,
    pub amount: Amount,
    pub event_time: EventTime,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{operation} amount must be positive, got {amount}")]
    NonPositiveAmount {
        operation: OperationType,
        amount: Amount,
    },

    #[error("settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    #[error("recording failed: {0}")]
    Store(#[from] StoreError),
}

/// What [`Ledger::apply`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Recorded(Transaction),
    Settled {
        payment: Transaction,
        settlement: Settlement,
    },
}

/// Counters for a [`Ledger::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub skipped: usize,
    /// Sum of payment remainders no debt could absorb.
    pub unapplied: Amount,
}

pub struct Ledger<S> {
    settler: Settler<S>,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: Arc<S>, config: SettlementConfig) -> Self {
        Self {
            settler: Settler::new(store, config),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        self.settler.store()
    }

    /// Apply every event of `stream`. Failed events are logged and skipped.
    pub async fn run(&self, mut stream: impl Stream<Item = LedgerEvent> + Unpin) -> RunSummary {
        let mut summary = RunSummary::default();
        while let Some(event) = stream.next().await {
            match self.apply(event).await {
                Ok(Applied::Settled { settlement, .. }) => {
                    summary.applied += 1;
                    summary.unapplied += settlement.remainder;
                }
                Ok(Applied::Recorded(_)) => summary.applied += 1,
                Err(_) => summary.skipped += 1,
            }
        }
        summary
    }

    /// Apply a single event.
    pub async fn apply(&self, event: LedgerEvent) -> Result<Applied, LedgerError> {
        let account = event.account;
        let operation = event.operation;
        let amount = event.amount;

        let result = if operation.is_debit() {
            self.record_debit(event).await
        } else {
            self.settle_payment(event).await
        };

        match &result {
            Ok(_) => info!(
                account = %account,
                amount = %amount,
                "{operation} applied"
            ),
            Err(e) => warn!(
                account = %account,
                amount = %amount,
                reason = %e,
                "{operation} skipped"
            ),
        }
        result
    }
}

/// Private API
impl<S: LedgerStore> Ledger<S> {
    async fn record_debit(&self, event: LedgerEvent) -> Result<Applied, LedgerError> {
        if !event.amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount {
                operation: event.operation,
                amount: event.amount,
            });
        }

        let tx = self
            .store()
            .record_transaction(NewTransaction {
                account: event.account,
                operation: event.operation,
                amount: event.operation.signed(event.amount),
                event_time: event.event_time,
            })
            .await?;
        Ok(Applied::Recorded(tx))
    }

    async fn settle_payment(&self, event: LedgerEvent) -> Result<Applied, LedgerError> {
        let settlement = self
            .settler
            .settle(event.account, event.amount, event.event_time)
            .await?;

        if settlement.remainder.is_positive() {
            info!(
                account = %event.account,
                remainder = %settlement.remainder,
                "payment exceeds outstanding debt"
            );
        }

        let payment = self
            .store()
            .record_transaction(NewTransaction {
                account: event.account,
                operation: event.operation,
                amount: event.amount,
                event_time: event.event_time,
            })
            .await?;

        Ok(Applied::Settled {
            payment,
            settlement,
        })
    }
}

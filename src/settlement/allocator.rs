//! Distribution of a payment over an ordered queue of outstanding debits.

use crate::Amount;
use crate::model::{BalanceUpdate, Debt};

use super::AllocationError;

/// Result of allocating one payment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Allocation {
    /// New balances, in queue order. Untouched debts are absent.
    pub updates: Vec<BalanceUpdate>,
    /// Part of the payment left once every debt in the queue is settled.
    pub remainder: Amount,
}

impl Allocation {
    /// Total amount of the payment consumed by the queue.
    pub fn applied(&self) -> Amount {
        self.updates.iter().map(BalanceUpdate::applied).sum()
    }
}

/// Settle `queue` oldest-first with `payment`.
///
/// The queue is consumed in the order given: each debt is fully settled before
/// the next one is touched, and the walk stops at the first debt the payment
/// can only partially cover. Debts already at zero are skipped.
pub fn allocate(queue: &[Debt], payment: Amount) -> Result<Allocation, AllocationError> {
    if payment.is_negative() {
        return Err(AllocationError::NegativePayment(payment));
    }
    if let Some(debt) = queue.iter().find(|d| d.balance.is_positive()) {
        return Err(AllocationError::NotADebt(debt.id, debt.balance));
    }

    let mut available = payment;
    let mut updates = Vec::new();

    for debt in queue {
        if available.is_zero() {
            break;
        }
        if debt.balance.is_zero() {
            continue;
        }

        let left = available + debt.balance;
        if left.is_negative() {
            // partially settled, nothing left for later debts
            updates.push(BalanceUpdate {
                id: debt.id,
                previous: debt.balance,
                balance: left,
            });
            available = Amount::ZERO;
            break;
        }

        updates.push(BalanceUpdate {
            id: debt.id,
            previous: debt.balance,
            balance: Amount::ZERO,
        });
        available = left;
    }

    Ok(Allocation {
        updates,
        remainder: available,
    })
}

pub mod amount;
pub mod csv;
pub mod ledger;
pub mod model;
pub mod settlement;
pub mod store;

pub use amount::Amount;
pub use ledger::{Ledger, LedgerEvent};
pub use model::{AccountId, BalanceUpdate, Debt, OperationType, Transaction, TxId};
pub use settlement::{Settlement, SettlementConfig, SettlementError, Settler};
pub use store::{LedgerStore, MemoryLedger};

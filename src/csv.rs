use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Amount;
use crate::ledger::LedgerEvent;
use crate::model::{AccountId, EventTime, OperationType, Transaction, TxId};

/// Errors that can occur when reading event rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized event type '{event_type}'")]
    UnrecognizedType { line: usize, event_type: String },

    #[error("line {line}: {event_type} missing amount")]
    MissingAmount { line: usize, event_type: String },

    #[error("line {line}: invalid amount {value}")]
    InvalidAmount { line: usize, value: f64 },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    r#type: String,
    account: AccountId,
    amount: Option<f64>,
    event_time: EventTime,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    tx: TxId,
    account: AccountId,
    operation: &'static str,
    amount: String,
    balance: String,
}

/// Read ledger events from a csv file with header `type,account,amount,event_time`
pub fn read_events(
    path: &Path,
) -> Result<impl Iterator<Item = Result<LedgerEvent, CsvError>> + use<>, CsvError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| CsvError::Open {
            path: path.display().to_string(),
            source,
        })?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            let operation = OperationType::from_name(&row.r#type).ok_or_else(|| {
                CsvError::UnrecognizedType {
                    line,
                    event_type: row.r#type.clone(),
                }
            })?;
            let amount = row.amount.ok_or_else(|| CsvError::MissingAmount {
                line,
                event_type: row.r#type.clone(),
            })?;
            let amount = Amount::from_float(amount).ok_or(CsvError::InvalidAmount {
                line,
                value: amount,
            })?;
            Ok(LedgerEvent {
                account: row.account,
                operation,
                amount,
                event_time: row.event_time,
            })
        }))
}

/// Write ledger entries in csv format
pub fn write_transactions<'a, W: io::Write>(
    writer: W,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for tx in transactions {
        writer.serialize(OutputRow {
            tx: tx.id,
            account: tx.account,
            operation: tx.operation.as_str(),
            amount: tx.amount.to_string(),
            balance: tx.balance.to_string(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

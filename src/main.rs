use std::env;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use ledger_settle::csv::{read_events, write_transactions};
use ledger_settle::{Ledger, MemoryLedger, SettlementConfig};
use tokio_stream::wrappers::ReceiverStream;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let Some(path) = env::args().nth(1) else {
        error!("usage: ledger-settle <events.csv>");
        return ExitCode::FAILURE;
    };

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let config = match SettlementConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let events = match read_events(Path::new(&path)) {
        Ok(events) => events,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let store = Arc::new(MemoryLedger::new());
    let ledger = Ledger::new(Arc::clone(&store), config);
    let (event_sender, event_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in events {
            match result {
                Ok(event) => {
                    if event_sender.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    let summary = ledger.run(ReceiverStream::new(event_receiver)).await;
    info!(
        applied = summary.applied,
        skipped = summary.skipped,
        unapplied = %summary.unapplied,
        "replay finished"
    );

    let written = store
        .transactions()
        .map_err(|e| e.to_string())
        .and_then(|txs| write_transactions(io::stdout().lock(), &txs).map_err(|e| e.to_string()));

    match written {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("failed to write ledger: {e}");
            ExitCode::FAILURE
        }
    }
}

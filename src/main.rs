use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use payrouter::application::reporting::ReportingService;
use payrouter::application::router::RoutingEngine;
use payrouter::domain::ports::{QuotaLedger, QuotaLedgerRef, TransactionStore, TransactionStoreRef};
use payrouter::infrastructure::in_memory::InMemoryLedger;
use payrouter::interfaces::catalog_file::CatalogFile;
use payrouter::interfaces::csv::quota_writer::QuotaWriter;
use payrouter::interfaces::csv::request_reader::{RequestLine, RequestReader};
use payrouter::interfaces::csv::transaction_writer::TransactionWriter;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gateway and biller catalog (JSON)
    #[arg(long, env = "PAYROUTER_CATALOG")]
    catalog: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "PAYROUTER_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Evaluate availability and quotas at this local time instead of now (YYYY-MM-DDTHH:MM:SS)
    #[arg(long)]
    at: Option<NaiveDateTime>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Route and charge every request in a CSV file, printing committed transactions
    Route {
        /// Requests CSV with columns biller, amount, urgency[, gateway]
        input: PathBuf,
    },
    /// Print the biller's quota usage per gateway for a day
    Quotas {
        biller: String,
        /// Defaults to the evaluation day
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print a JSON transaction summary for the biller over an inclusive date range
    Summary {
        biller: String,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

fn shared<L>(ledger: L) -> (QuotaLedgerRef, TransactionStoreRef)
where
    L: QuotaLedger + TransactionStore + Clone + 'static,
{
    let quotas: QuotaLedgerRef = Arc::new(ledger.clone());
    let transactions: TransactionStoreRef = Arc::new(ledger);
    (quotas, transactions)
}

fn open_ledger(db_path: Option<PathBuf>) -> Result<(QuotaLedgerRef, TransactionStoreRef)> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let ledger = payrouter::infrastructure::rocksdb::RocksDBLedger::open(path)
                .into_diagnostic()?;
            Ok(shared(ledger))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(shared(InMemoryLedger::new()))
        }
        None => Ok(shared(InMemoryLedger::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let now = cli
        .at
        .unwrap_or_else(|| chrono::Local::now().naive_local());

    let catalog_file = File::open(&cli.catalog).into_diagnostic()?;
    let catalog = Arc::new(
        CatalogFile::from_reader(catalog_file)
            .into_diagnostic()?
            .into_catalog()
            .await
            .into_diagnostic()?,
    );
    let (ledger, transactions) = open_ledger(cli.db_path)?;

    match cli.command {
        Command::Route { input } => {
            let engine = RoutingEngine::new(catalog.clone(), catalog, ledger);

            let file = File::open(input).into_diagnostic()?;
            let reader = RequestReader::new(file);
            let stdout = io::stdout();
            let mut writer = TransactionWriter::new(stdout.lock());

            for line in reader.requests() {
                let outcome = match line {
                    Ok(RequestLine::Recommend(request)) => engine
                        .recommend(&request, now)
                        .await
                        .map(|r| r.transaction),
                    Ok(RequestLine::Charge(request)) => {
                        engine.recorder().charge(&request, now).await
                    }
                    Err(e) => {
                        eprintln!("Error reading request: {}", e);
                        continue;
                    }
                };
                match outcome {
                    Ok(record) => writer.write(&record).into_diagnostic()?,
                    Err(e) if e.is_rejection() => eprintln!("Error processing request: {}", e),
                    Err(e) => return Err(e).into_diagnostic(),
                }
            }
            writer.flush().into_diagnostic()?;
        }
        Command::Quotas { biller, date } => {
            let reporting = ReportingService::new(catalog.clone(), catalog, ledger, transactions);
            let report = reporting
                .quota_report(&biller, date.unwrap_or(now.date()))
                .await
                .into_diagnostic()?;
            let stdout = io::stdout();
            QuotaWriter::new(stdout.lock())
                .write_report(&report)
                .into_diagnostic()?;
        }
        Command::Summary { biller, from, to } => {
            let reporting = ReportingService::new(catalog.clone(), catalog, ledger, transactions);
            let start = from.unwrap_or(now.date());
            let end = to.unwrap_or(now.date());
            let summary = reporting
                .summary(&biller, start, end)
                .await
                .into_diagnostic()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).into_diagnostic()?
            );
        }
    }

    Ok(())
}

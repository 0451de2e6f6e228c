//! Loader Service - Loads AcquiSuite log exports into the measurements table
//!
//! Responsibilities:
//! - Discover `*.log.csv` exports under the log root (sorted, recursive)
//! - Parse each wide table and classify its column headers into channels
//! - Flatten rows into (time, source, metric) facts
//! - Upsert each file's facts in one transaction, first writer wins
//! - Report per-file failures and header diagnostics without stopping the run
//!
//! Usage:
//!   # Whole log root:
//!   cargo run --bin loader -- --root /data/acquisuite
//!
//!   # Specific files:
//!   cargo run --bin loader -- --file mb-001.log.csv --file mb-002.log.csv
//!
//!   # Parse only, nothing written:
//!   cargo run --bin loader -- --dry-run --summary-json run.json

mod config;
mod error;
mod fact;
mod ingest;
mod sink;
mod summary;
mod table;

use anyhow::{Context, Result};
use channels::discovery::discover_files;
use clap::Parser;
use config::Config;
use ingest::run_files;
use sink::{MemorySink, PgSink};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use summary::RunSummary;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "loader", about = "Loads AcquiSuite log exports into the measurements table")]
struct Args {
    /// Root folder scanned for exports (overrides LOG_ROOT)
    #[arg(long)]
    root: Option<PathBuf>,

    /// File name suffix to load (overrides LOG_SUFFIX)
    #[arg(long)]
    suffix: Option<String>,

    /// Load only these files instead of scanning the root (repeatable)
    #[arg(long = "file")]
    files: Vec<PathBuf>,

    /// Dry run - parse everything, write nothing to the database
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// Also write the run summary as JSON to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::from_env()?;

    let root = args.root.unwrap_or(config.log_root.clone());
    let suffix = args.suffix.unwrap_or(config.log_suffix.clone());

    println!("=== AcquiSuite Loader ===");
    println!("Vocabulary version: {}", channels::VOCABULARY_VERSION);

    let files = if args.files.is_empty() {
        println!("Scanning {} for *{}", root.display(), suffix);
        discover_files(&root, &suffix)
    } else {
        args.files
    };
    println!("Files to load: {}", files.len());

    let run_id = Uuid::new_v4();
    info!(%run_id, files = files.len(), dry_run = args.dry_run, "run started");

    let mut summary = RunSummary::new(run_id, files.len());
    summary.dry_run = args.dry_run;

    if args.dry_run {
        let mut sink = MemorySink::default();
        run_files(&files, &mut sink, &mut summary).await;
        if sink.is_empty() {
            println!("\nDry run - no facts built, nothing saved to database");
        } else {
            println!("\nDry run - {} distinct facts kept in memory, nothing saved to database", sink.len());
        }
    } else {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(config.require_db_url()?)
            .await
            .context("Failed to connect to database")?;
        println!("Target table: {}", config.measurements_table);

        let mut sink = PgSink::new(pool.clone(), &config.measurements_table, config.upsert_page_size);
        run_files(&files, &mut sink, &mut summary).await;
        pool.close().await;
    }

    summary.print();
    if let Some(path) = &args.summary_json {
        summary.write_json(path)?;
        println!("\nSummary written to {}", path.display());
    }

    info!(%run_id, failed = summary.files_failed, "run finished");
    Ok(())
}

//! Ingestion Coordinator - wide log table -> narrow facts -> sink
//!
//! Responsibilities:
//! - Resolve each distinct header once (cached for the file)
//! - Skip missing and non-numeric cells
//! - Hand all facts of one file to the sink as a single batch
//! - Convert per-file errors into failure records; the run always continues

use crate::error::IngestError;
use crate::fact::Fact;
use crate::sink::FactSink;
use crate::summary::RunSummary;
use crate::table::{parse_cell, CellValue, LogTable};
use channels::{parse_header, ChannelIdentity, SourceSystem};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, info_span, warn, Instrument};

/// How many unparsed headers a file warning lists.
const UNPARSED_LOG_LIMIT: usize = 20;

/// Facts and diagnostics built from one table, before anything is written.
#[derive(Debug, Default)]
pub struct FileBatch {
    pub facts: Vec<Fact>,
    /// Headers that produced no channel; their columns were dropped.
    pub unparsed_headers: BTreeSet<String>,
    /// Headers that parsed but fell through to `unknown`.
    pub unclassified_headers: BTreeSet<String>,
    pub missing_cells: usize,
    pub non_numeric_cells: usize,
}

/// Outcome of one successfully loaded file.
#[derive(Debug)]
pub struct FileReport {
    pub rows: usize,
    pub facts: usize,
    /// Facts the sink did not already hold.
    pub inserted: u64,
    pub unparsed_headers: BTreeSet<String>,
    pub unclassified_headers: BTreeSet<String>,
    pub missing_cells: usize,
    pub non_numeric_cells: usize,
}

/// Turns a parsed table into facts.
///
/// Fails only on timestamp problems, in which case no fact is produced.
pub fn build_batch(table: &LogTable) -> Result<FileBatch, IngestError> {
    let timestamps = table.timestamps()?;
    let flags = table.row_flags();
    let mut batch = FileBatch::default();

    let mut identities: HashMap<&str, Option<ChannelIdentity>> = HashMap::new();
    for header in table.channel_headers() {
        if identities.contains_key(header) {
            continue;
        }
        let identity = parse_header(header);
        match &identity {
            None => {
                batch.unparsed_headers.insert(header.to_string());
            }
            Some(id) if id.source == SourceSystem::Unknown => {
                batch.unclassified_headers.insert(header.to_string());
            }
            Some(_) => {}
        }
        identities.insert(header, identity);
    }

    for cell in table.cells(&timestamps) {
        let Some(Some(identity)) = identities.get(cell.column) else {
            continue;
        };
        let value = match parse_cell(cell.raw) {
            CellValue::Number(value) => value,
            CellValue::Missing => {
                batch.missing_cells += 1;
                continue;
            }
            CellValue::NonNumeric => {
                batch.non_numeric_cells += 1;
                continue;
            }
        };
        let row_flags = flags[cell.row];
        batch.facts.push(Fact {
            timestamp: cell.timestamp,
            source: identity.source,
            metric: identity.metric.clone(),
            value,
            unit: identity.unit.clone(),
            error_flag: row_flags.error,
            low_alarm: row_flags.low_alarm,
            high_alarm: row_flags.high_alarm,
        });
    }

    Ok(batch)
}

/// Loads one file into `sink`.
///
/// Any error leaves the sink untouched for this file: parsing finishes before
/// the sink is called, and the sink writes the batch atomically.
pub async fn ingest_file<S: FactSink>(path: &Path, sink: &mut S) -> Result<FileReport, IngestError> {
    let bytes = fs::read(path).await.map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let table = LogTable::from_bytes(&bytes)?;
    let batch = build_batch(&table)?;

    if !batch.unparsed_headers.is_empty() {
        let listed: Vec<&String> = batch.unparsed_headers.iter().take(UNPARSED_LOG_LIMIT).collect();
        warn!("unparsed headers ({}): {:?}", batch.unparsed_headers.len(), listed);
    }

    let inserted = if batch.facts.is_empty() {
        0
    } else {
        sink.upsert(&batch.facts).await?
    };

    Ok(FileReport {
        rows: table.row_count(),
        facts: batch.facts.len(),
        inserted,
        unparsed_headers: batch.unparsed_headers,
        unclassified_headers: batch.unclassified_headers,
        missing_cells: batch.missing_cells,
        non_numeric_cells: batch.non_numeric_cells,
    })
}

/// Loads `files` one after another, recording every outcome in `summary`.
pub async fn run_files<S: FactSink>(files: &[PathBuf], sink: &mut S, summary: &mut RunSummary) {
    let total = files.len();
    for (i, path) in files.iter().enumerate() {
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        let span = info_span!("file", index = i + 1, path = %path.display());
        match ingest_file(path, sink).instrument(span).await {
            Ok(report) => {
                info!(
                    "[{}/{}] OK {}: {} facts, {} new rows",
                    i + 1,
                    total,
                    name,
                    report.facts,
                    report.inserted
                );
                summary.record_success(report);
            }
            Err(e) => {
                error!("[{}/{}] FAIL {}: {}", i + 1, total, name, e);
                summary.record_failure(path, &e);
            }
        }
    }
}

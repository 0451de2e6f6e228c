//! Run summary: per-run counters, failure records and header diagnostics.

use crate::error::IngestError;
use crate::ingest::FileReport;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One file that did not load.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file: PathBuf,
    /// Stable machine-readable error kind, e.g. `timestamp_parse`.
    pub kind: &'static str,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub files_total: usize,
    pub files_succeeded: usize,
    pub files_failed: usize,
    pub rows_read: usize,
    pub facts_built: usize,
    pub rows_inserted: u64,
    pub missing_cells: usize,
    pub non_numeric_cells: usize,
    pub failures: Vec<FileFailure>,
    pub unparsed_headers: BTreeSet<String>,
    pub unclassified_headers: BTreeSet<String>,
}

impl RunSummary {
    pub fn new(run_id: Uuid, files_total: usize) -> Self {
        Self {
            run_id,
            dry_run: false,
            files_total,
            files_succeeded: 0,
            files_failed: 0,
            rows_read: 0,
            facts_built: 0,
            rows_inserted: 0,
            missing_cells: 0,
            non_numeric_cells: 0,
            failures: Vec::new(),
            unparsed_headers: BTreeSet::new(),
            unclassified_headers: BTreeSet::new(),
        }
    }

    pub fn record_success(&mut self, report: FileReport) {
        self.files_succeeded += 1;
        self.rows_read += report.rows;
        self.facts_built += report.facts;
        self.rows_inserted += report.inserted;
        self.missing_cells += report.missing_cells;
        self.non_numeric_cells += report.non_numeric_cells;
        self.unparsed_headers.extend(report.unparsed_headers);
        self.unclassified_headers.extend(report.unclassified_headers);
    }

    pub fn record_failure(&mut self, path: &Path, err: &IngestError) {
        self.files_failed += 1;
        self.failures.push(FileFailure {
            file: path.to_path_buf(),
            kind: err.kind(),
            reason: err.to_string(),
        });
    }

    pub fn print(&self) {
        println!("\n=== Load Complete ===");
        println!("Run: {}{}", self.run_id, if self.dry_run { " (dry run)" } else { "" });
        println!(
            "Files: {} total, {} succeeded, {} failed",
            self.files_total, self.files_succeeded, self.files_failed
        );
        println!("Rows read: {}", self.rows_read);
        println!("Facts built: {}", self.facts_built);
        println!("Rows inserted: {}", self.rows_inserted);
        println!(
            "Cells skipped: {} missing, {} non-numeric",
            self.missing_cells, self.non_numeric_cells
        );

        if !self.failures.is_empty() {
            println!("\nFailed files:");
            for failure in &self.failures {
                println!("  ✗ {} [{}] {}", failure.file.display(), failure.kind, failure.reason);
            }
        }

        if !self.unparsed_headers.is_empty() {
            println!("\nUnparsed headers ({}):", self.unparsed_headers.len());
            for header in &self.unparsed_headers {
                println!("  {:?}", header);
            }
        }

        if !self.unclassified_headers.is_empty() {
            println!("\nHeaders classified as unknown ({}):", self.unclassified_headers.len());
            for header in &self.unclassified_headers {
                println!("  {}", header);
            }
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run summary")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary to {}", path.display()))
    }
}

//! Headers Service - Audits the header formats of AcquiSuite log exports
//!
//! Responsibilities:
//! - Read only the header row of every export under the log root
//! - Group files by header format (ordered column list fingerprint)
//! - Count how many files carry each column
//! - Classify every column with the loader's header cascade
//! - Write the summary text plus the formats and column frequency CSVs
//!
//! Usage:
//!   cargo run --bin headers -- --root /data/acquisuite --out-dir ./log_files_headers

use anyhow::{Context, Result};
use channels::discovery::{discover_files, DEFAULT_SUFFIX};
use channels::parse_header;
use channels::reserved::is_reserved;
use clap::Parser;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SUMMARY_FILE: &str = "header_formats_summary.txt";
const FORMATS_FILE: &str = "header_formats.csv";
const COLUMNS_FILE: &str = "column_frequency.csv";

/// Example files listed per format in the summary.
const EXAMPLE_FILES: usize = 5;
/// Unreadable files listed in the summary.
const UNREADABLE_LISTED: usize = 50;
const PROGRESS_EVERY: usize = 500;

#[derive(Parser, Debug)]
#[command(name = "headers", about = "Audits header formats of AcquiSuite log exports")]
struct Args {
    /// Root folder scanned for exports (overrides LOG_ROOT)
    #[arg(long)]
    root: Option<PathBuf>,

    /// File name suffix to scan (overrides LOG_SUFFIX)
    #[arg(long)]
    suffix: Option<String>,

    /// Output folder for the reports (overrides HEADERS_OUT_DIR)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(Debug)]
struct Config {
    log_root: PathBuf,
    log_suffix: String,
    out_dir: PathBuf,
    /// Lower-cased column names left out of fingerprints and counts.
    ignore_cols: HashSet<String>,
}

impl Config {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            log_root: PathBuf::from(lookup("LOG_ROOT").unwrap_or_else(|| ".".to_string())),
            log_suffix: lookup("LOG_SUFFIX").unwrap_or_else(|| DEFAULT_SUFFIX.to_string()),
            out_dir: PathBuf::from(
                lookup("HEADERS_OUT_DIR").unwrap_or_else(|| "./log_files_headers".to_string()),
            ),
            ignore_cols: lookup("HEADERS_IGNORE_COLS")
                .map(|raw| parse_ignore_cols(&raw))
                .unwrap_or_default(),
        }
    }
}

fn parse_ignore_cols(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|col| norm_col(col).to_lowercase())
        .filter(|col| !col.is_empty())
        .collect()
}

// =============================================================================
// Header Reading
// =============================================================================

/// Trims a column name and collapses inner whitespace.
fn norm_col(col: &str) -> String {
    col.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable id of a header format: first 12 hex chars of SHA-256 over the
/// newline-joined columns. Column order matters.
fn schema_fingerprint(cols: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cols.join("\n").as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

/// Reads the first CSV record of `path` as normalized column names.
fn read_header(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut record = csv::ByteRecord::new();
    if !reader.read_byte_record(&mut record)? {
        anyhow::bail!("no header row");
    }

    let header: Vec<String> = record
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let text = String::from_utf8_lossy(field);
            let text: &str = if i == 0 { text.trim_start_matches('\u{feff}') } else { &text };
            norm_col(text)
        })
        .collect();

    if header.iter().all(String::is_empty) {
        anyhow::bail!("empty header row");
    }
    Ok(header)
}

// =============================================================================
// Census
// =============================================================================

#[derive(Debug)]
struct HeaderFormat {
    fingerprint: String,
    /// Columns as first seen for this fingerprint.
    columns: Vec<String>,
    files: Vec<PathBuf>,
}

/// Formats and column counts in first-seen order.
#[derive(Debug, Default)]
struct HeaderCensus {
    formats: Vec<HeaderFormat>,
    format_index: HashMap<String, usize>,
    columns: Vec<(String, usize)>,
    column_index: HashMap<String, usize>,
    unreadable: Vec<PathBuf>,
    files_scanned: usize,
}

impl HeaderCensus {
    fn record(&mut self, path: &Path, header: Vec<String>, ignore: &HashSet<String>) {
        self.files_scanned += 1;
        let filtered: Vec<String> = header
            .into_iter()
            .filter(|col| !ignore.contains(&col.to_lowercase()))
            .collect();

        // every occurrence counts, so a column repeated in one header counts twice
        for col in &filtered {
            match self.column_index.get(col) {
                Some(&i) => self.columns[i].1 += 1,
                None => {
                    self.column_index.insert(col.clone(), self.columns.len());
                    self.columns.push((col.clone(), 1));
                }
            }
        }

        let fingerprint = schema_fingerprint(&filtered);
        match self.format_index.get(&fingerprint) {
            Some(&i) => self.formats[i].files.push(path.to_path_buf()),
            None => {
                self.format_index.insert(fingerprint.clone(), self.formats.len());
                self.formats.push(HeaderFormat {
                    fingerprint,
                    columns: filtered,
                    files: vec![path.to_path_buf()],
                });
            }
        }
    }

    fn record_unreadable(&mut self, path: &Path) {
        self.files_scanned += 1;
        self.unreadable.push(path.to_path_buf());
    }

    /// Formats by file count, most common first; ties keep first-seen order.
    fn ranked_formats(&self) -> Vec<&HeaderFormat> {
        let mut ranked: Vec<&HeaderFormat> = self.formats.iter().collect();
        ranked.sort_by(|a, b| b.files.len().cmp(&a.files.len()));
        ranked
    }

    /// Columns by file count, most common first; ties keep first-seen order.
    fn ranked_columns(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> =
            self.columns.iter().map(|(col, n)| (col.as_str(), *n)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

fn scan(files: &[PathBuf], ignore: &HashSet<String>) -> HeaderCensus {
    let mut census = HeaderCensus::default();
    for (i, path) in files.iter().enumerate() {
        match read_header(path) {
            Ok(header) => census.record(path, header, ignore),
            Err(e) => {
                warn!("unreadable {}: {:#}", path.display(), e);
                census.record_unreadable(path);
            }
        }
        if (i + 1) % PROGRESS_EVERY == 0 {
            info!("processed {}/{}...", i + 1, files.len());
        }
    }
    census
}

// =============================================================================
// Reports
// =============================================================================

fn write_summary(census: &HeaderCensus, root: &Path, suffix: &str, path: &Path) -> Result<()> {
    let mut out = String::new();
    out.push_str(&format!("Root: {}\n", root.display()));
    out.push_str(&format!("Pattern: *{}\n", suffix));
    out.push_str(&format!("Vocabulary version: {}\n", channels::VOCABULARY_VERSION));
    out.push_str(&format!("Total files scanned: {}\n", census.files_scanned));
    out.push_str(&format!("Unreadable files: {}\n", census.unreadable.len()));
    out.push_str(&format!("Distinct header formats: {}\n\n", census.formats.len()));

    for (rank, format) in census.ranked_formats().into_iter().enumerate() {
        out.push_str(&format!(
            "=== Format #{} | fingerprint={} | files={} | cols={} ===\n",
            rank + 1,
            format.fingerprint,
            format.files.len(),
            format.columns.len()
        ));
        for example in format.files.iter().take(EXAMPLE_FILES) {
            out.push_str(&format!("  {}\n", example.display()));
        }
        if format.files.len() > EXAMPLE_FILES {
            out.push_str(&format!("  ... ({} more)\n", format.files.len() - EXAMPLE_FILES));
        }
        out.push_str("Columns:\n");
        for col in &format.columns {
            out.push_str(&format!("  {}\n", col));
        }
        out.push('\n');
    }

    if !census.unreadable.is_empty() {
        out.push_str(&format!("=== Unreadable files (first {}) ===\n", UNREADABLE_LISTED));
        for example in census.unreadable.iter().take(UNREADABLE_LISTED) {
            out.push_str(&format!("  {}\n", example.display()));
        }
        if census.unreadable.len() > UNREADABLE_LISTED {
            out.push_str(&format!("  ... ({} more)\n", census.unreadable.len() - UNREADABLE_LISTED));
        }
    }

    let mut file = fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(out.as_bytes())?;
    Ok(())
}

fn write_formats_csv(census: &HeaderCensus, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["format_rank", "fingerprint", "file_count", "col_count", "example_file", "columns_joined"])?;
    for (rank, format) in census.ranked_formats().into_iter().enumerate() {
        let example = format.files.first().map(|f| f.display().to_string()).unwrap_or_default();
        writer.write_record([
            (rank + 1).to_string(),
            format.fingerprint.clone(),
            format.files.len().to_string(),
            format.columns.len().to_string(),
            example,
            format.columns.join(" | "),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Column counts plus the identity the loader would give each column.
/// Reserved and unparseable columns get blank identity fields.
fn write_column_frequency_csv(census: &HeaderCensus, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["column_name", "file_count_containing_column_estimate", "source", "metric", "unit"])?;
    for (col, count) in census.ranked_columns() {
        let identity = if is_reserved(col) { None } else { parse_header(col) };
        let (source, metric, unit) = match identity {
            Some(id) => (id.source.to_string(), id.metric, id.unit.unwrap_or_default()),
            None => Default::default(),
        };
        writer.write_record([col.to_string(), count.to_string(), source, metric, unit])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_reports(census: &HeaderCensus, root: &Path, suffix: &str, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let summary = out_dir.join(SUMMARY_FILE);
    let formats = out_dir.join(FORMATS_FILE);
    let columns = out_dir.join(COLUMNS_FILE);
    write_summary(census, root, suffix, &summary)?;
    write_formats_csv(census, &formats)?;
    write_column_frequency_csv(census, &columns)?;
    Ok(vec![summary, formats, columns])
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = Config::from_env();

    let root = args.root.unwrap_or(config.log_root);
    let suffix = args.suffix.unwrap_or(config.log_suffix);
    let out_dir = args.out_dir.unwrap_or(config.out_dir);

    println!("=== AcquiSuite Header Audit ===");
    println!("Scanning: {}", root.display());
    let files = discover_files(&root, &suffix);
    println!("Found {} files matching *{}", files.len(), suffix);

    let census = scan(&files, &config.ignore_cols);
    let written = write_reports(&census, &root, &suffix, &out_dir)?;

    println!("\n=== Audit Complete ===");
    println!("Distinct header formats: {}", census.formats.len());
    println!("Unreadable files: {}", census.unreadable.len());
    println!("Wrote:");
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

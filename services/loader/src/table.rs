//! Wide log table: one timestamp column, one column per channel.
//!
//! Responsibilities:
//! - Decode file bytes (UTF-8, BOM stripped, invalid bytes replaced)
//! - Split reserved columns from channel columns
//! - Parse timestamps, flags and numeric cells
//! - Flatten rows x channel columns into a lazy sequence of cells

use crate::error::IngestError;
use channels::reserved::{
    is_reserved, ERROR_COLUMN, HIGH_ALARM_COLUMN, LOW_ALARM_COLUMN, TIME_COLUMN,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;
use tracing::warn;

/// Tokens treated as an absent value rather than a non-numeric one.
const MISSING_TOKENS: &[&str] = &[
    "", "nan", "NaN", "-nan", "NA", "N/A", "#N/A", "null", "NULL", "None",
];

/// Timestamp layouts carrying an explicit offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y-%m-%dT%H:%M%#z",
];

/// Timestamp layouts without offset; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// How many offending timestamp values a parse failure reports.
const TIMESTAMP_SAMPLES: usize = 3;

/// Parses a UTC timestamp cell.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Classification of one value cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    Missing,
    NonNumeric,
    Number(f64),
}

/// Parses a value cell. NaN and infinities count as non-numeric.
pub fn parse_cell(raw: &str) -> CellValue {
    let raw = raw.trim();
    if MISSING_TOKENS.contains(&raw) {
        return CellValue::Missing;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => CellValue::Number(value),
        _ => CellValue::NonNumeric,
    }
}

/// Flag cells: any non-zero number is set; absent or non-numeric is clear.
fn parse_flag(raw: Option<&str>) -> bool {
    matches!(raw.map(parse_cell), Some(CellValue::Number(v)) if v != 0.0)
}

/// Per-row alarm and error flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowFlags {
    pub error: bool,
    pub low_alarm: bool,
    pub high_alarm: bool,
}

/// One (row, channel column) position of the wide table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell<'t> {
    pub row: usize,
    pub timestamp: DateTime<Utc>,
    pub column: &'t str,
    pub raw: &'t str,
}

#[derive(Debug)]
pub struct LogTable {
    headers: Vec<String>,
    records: Vec<StringRecord>,
    /// Indexes of non-reserved columns, in header order.
    channel_columns: Vec<usize>,
}

impl LogTable {
    /// Decodes raw file bytes and parses them as CSV.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IngestError> {
        let (content, _, lossy) = encoding_rs::UTF_8.decode(bytes);
        if lossy {
            warn!("invalid UTF-8 replaced while decoding");
        }
        Self::parse(&content)
    }

    /// Parses CSV text with a header row. Short rows are allowed.
    pub fn parse(content: &str) -> Result<Self, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        let channel_columns = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !is_reserved(header))
            .map(|(index, _)| index)
            .collect();

        Ok(Self {
            headers,
            records,
            channel_columns,
        })
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Headers of the channel (non-reserved) columns, in file order.
    pub fn channel_headers(&self) -> impl Iterator<Item = &str> + '_ {
        self.channel_columns.iter().map(|&index| self.headers[index].as_str())
    }

    /// Parses every row's timestamp; one bad value fails the whole table.
    pub fn timestamps(&self) -> Result<Vec<DateTime<Utc>>, IngestError> {
        let index = self
            .column_index(TIME_COLUMN)
            .ok_or(IngestError::MissingTimestampColumn)?;

        let mut timestamps = Vec::with_capacity(self.records.len());
        let mut samples = Vec::new();
        for record in &self.records {
            let raw = record.get(index).unwrap_or("");
            match parse_timestamp(raw) {
                Some(ts) => timestamps.push(ts),
                None => {
                    if samples.len() < TIMESTAMP_SAMPLES {
                        samples.push(raw.to_string());
                    }
                }
            }
        }

        if samples.is_empty() {
            Ok(timestamps)
        } else {
            Err(IngestError::TimestampParse { samples })
        }
    }

    /// Flags for every row; columns that are absent read as clear.
    pub fn row_flags(&self) -> Vec<RowFlags> {
        let error = self.column_index(ERROR_COLUMN);
        let low = self.column_index(LOW_ALARM_COLUMN);
        let high = self.column_index(HIGH_ALARM_COLUMN);
        self.records
            .iter()
            .map(|record| RowFlags {
                error: parse_flag(error.and_then(|i| record.get(i))),
                low_alarm: parse_flag(low.and_then(|i| record.get(i))),
                high_alarm: parse_flag(high.and_then(|i| record.get(i))),
            })
            .collect()
    }

    /// Lazily flattens rows x channel columns, row-major.
    ///
    /// `timestamps` must come from [`LogTable::timestamps`]; cells of short
    /// rows read as empty.
    pub fn cells<'a>(
        &'a self,
        timestamps: &'a [DateTime<Utc>],
    ) -> impl Iterator<Item = Cell<'a>> + 'a {
        self.records
            .iter()
            .zip(timestamps)
            .enumerate()
            .flat_map(move |(row, (record, &timestamp))| {
                self.channel_columns.iter().map(move |&index| Cell {
                    row,
                    timestamp,
                    column: self.headers[index].as_str(),
                    raw: record.get(index).unwrap_or(""),
                })
            })
    }
}

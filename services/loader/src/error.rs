//! Error taxonomy for loading one file.
//!
//! Every variant aborts the current file only. Header and cell problems are
//! not errors; they are counted in the file report instead.

use std::path::PathBuf;
use thiserror::Error;

/// Failure writing a batch to the sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink write failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Reasons a file contributes no rows.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing time(UTC) column")]
    MissingTimestampColumn,

    #[error("timestamp parse failed, examples: {samples:?}")]
    TimestampParse { samples: Vec<String> },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl IngestError {
    /// Stable short name used in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::MissingTimestampColumn => "missing_timestamp_column",
            IngestError::TimestampParse { .. } => "timestamp_parse",
            IngestError::Read { .. } => "read",
            IngestError::Csv(_) => "csv",
            IngestError::Sink(_) => "sink_write",
        }
    }
}

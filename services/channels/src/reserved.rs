//! Non-channel columns of an AcquiSuite log export.

/// Required timestamp column, values in UTC.
pub const TIME_COLUMN: &str = "time(UTC)";
pub const ERROR_COLUMN: &str = "error";
pub const LOW_ALARM_COLUMN: &str = "lowalarm";
pub const HIGH_ALARM_COLUMN: &str = "highalarm";

/// Columns never treated as telemetry channels.
pub const RESERVED_COLUMNS: &[&str] = &[
    TIME_COLUMN,
    "time",
    ERROR_COLUMN,
    LOW_ALARM_COLUMN,
    HIGH_ALARM_COLUMN,
    "error_flag",
    "low_alarm",
    "high_alarm",
];

/// Exact, case-sensitive match against [`RESERVED_COLUMNS`].
pub fn is_reserved(column: &str) -> bool {
    RESERVED_COLUMNS.contains(&column)
}

//! Time-series fact: one observation of one channel at one instant.

use channels::SourceSystem;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Natural key of a fact. At most one fact per key is ever stored.
pub type NaturalKey = (DateTime<Utc>, SourceSystem, String);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fact {
    pub timestamp: DateTime<Utc>,
    pub source: SourceSystem,
    pub metric: String,
    pub value: f64,
    pub unit: Option<String>,
    pub error_flag: bool,
    pub low_alarm: bool,
    pub high_alarm: bool,
}

impl Fact {
    pub fn key(&self) -> NaturalKey {
        (self.timestamp, self.source, self.metric.clone())
    }
}

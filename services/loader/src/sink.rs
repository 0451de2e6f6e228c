//! Idempotent fact sinks.
//!
//! The contract: a batch is written atomically, keyed on
//! (time, source, metric), and a key that already exists is left alone.
//! Replaying a file therefore never duplicates or overwrites anything.
//!
//! Expected PostgreSQL table:
//!
//! ```sql
//! CREATE TABLE measurements (
//!     time        TIMESTAMPTZ      NOT NULL,
//!     source      TEXT             NOT NULL,
//!     metric      TEXT             NOT NULL,
//!     value       DOUBLE PRECISION NOT NULL,
//!     unit        TEXT,
//!     error_flag  BOOLEAN          NOT NULL DEFAULT false,
//!     low_alarm   BOOLEAN          NOT NULL DEFAULT false,
//!     high_alarm  BOOLEAN          NOT NULL DEFAULT false,
//!     UNIQUE (time, source, metric)
//! );
//! ```

use crate::error::SinkError;
use crate::fact::{Fact, NaturalKey};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// Bind parameters per fact row.
const BINDS_PER_ROW: usize = 8;

/// PostgreSQL accepts at most this many bind parameters per statement.
pub const MAX_PAGE_SIZE: usize = u16::MAX as usize / BINDS_PER_ROW;

#[allow(async_fn_in_trait)]
pub trait FactSink {
    /// Writes `facts` as one atomic batch and returns how many were new.
    async fn upsert(&mut self, facts: &[Fact]) -> Result<u64, SinkError>;
}

/// Writes into a PostgreSQL table with `ON CONFLICT DO NOTHING`.
pub struct PgSink {
    pool: PgPool,
    table: String,
    page_size: usize,
}

impl PgSink {
    /// `table` must already be a validated identifier; it is interpolated.
    pub fn new(pool: PgPool, table: &str, page_size: usize) -> Self {
        Self {
            pool,
            table: table.to_string(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    fn insert_page<'f>(&self, page: &'f [Fact]) -> QueryBuilder<'f, Postgres> {
        let mut builder = QueryBuilder::new(format!(
            "INSERT INTO {} (time, source, metric, value, unit, error_flag, low_alarm, high_alarm) ",
            self.table
        ));
        builder.push_values(page, |mut row, fact| {
            row.push_bind(fact.timestamp)
                .push_bind(fact.source.as_str())
                .push_bind(fact.metric.as_str())
                .push_bind(fact.value)
                .push_bind(fact.unit.as_deref())
                .push_bind(fact.error_flag)
                .push_bind(fact.low_alarm)
                .push_bind(fact.high_alarm);
        });
        builder.push(" ON CONFLICT (time, source, metric) DO NOTHING");
        builder
    }
}

impl FactSink for PgSink {
    async fn upsert(&mut self, facts: &[Fact]) -> Result<u64, SinkError> {
        // Dropping the transaction on an early return rolls it back and
        // hands the connection back to the pool.
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for page in facts.chunks(self.page_size) {
            let result = self.insert_page(page).build().execute(&mut *tx).await?;
            debug!("page of {} facts, {} new", page.len(), result.rows_affected());
            inserted += result.rows_affected();
        }
        tx.commit().await?;
        Ok(inserted)
    }
}

/// First-writer-wins store kept in memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: BTreeMap<NaturalKey, Fact>,
}

impl MemorySink {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &NaturalKey) -> Option<&Fact> {
        self.rows.get(key)
    }
}

impl FactSink for MemorySink {
    async fn upsert(&mut self, facts: &[Fact]) -> Result<u64, SinkError> {
        let mut inserted = 0;
        for fact in facts {
            if let Entry::Vacant(slot) = self.rows.entry(fact.key()) {
                slot.insert(fact.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channels::SourceSystem;
    use chrono::{TimeZone, Utc};

    fn fact(minute: u32, metric: &str, value: f64) -> Fact {
        Fact {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, minute, 0).unwrap(),
            source: SourceSystem::Hydro,
            metric: metric.to_string(),
            value,
            unit: Some("kW".to_string()),
            error_flag: false,
            low_alarm: false,
            high_alarm: false,
        }
    }

    #[tokio::test]
    async fn test_replaying_a_batch_adds_nothing() {
        let batch = vec![fact(0, "power_avg", 1.0), fact(15, "power_avg", 2.0), fact(0, "power_max", 3.0)];
        let mut sink = MemorySink::default();
        assert!(sink.is_empty());

        assert_eq!(sink.upsert(&batch).await.unwrap(), 3);
        assert_eq!(sink.len(), 3);
        assert!(!sink.is_empty());

        assert_eq!(sink.upsert(&batch).await.unwrap(), 0);
        assert_eq!(sink.len(), 3);
    }

    #[tokio::test]
    async fn test_first_writer_wins() {
        let mut sink = MemorySink::default();
        sink.upsert(&[fact(0, "power_avg", 1.0)]).await.unwrap();
        let inserted = sink.upsert(&[fact(0, "power_avg", 99.0)]).await.unwrap();

        assert_eq!(inserted, 0);
        let stored = sink.get(&fact(0, "power_avg", 0.0).key()).unwrap();
        assert_eq!(stored.value, 1.0);
    }

    #[tokio::test]
    async fn test_duplicates_inside_one_batch() {
        let mut sink = MemorySink::default();
        let inserted = sink
            .upsert(&[fact(0, "flow", 1.0), fact(0, "flow", 2.0)])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        assert_eq!(sink.get(&fact(0, "flow", 0.0).key()).unwrap().value, 1.0);
    }

    #[tokio::test]
    async fn test_insert_statement_shape() {
        let pool = PgPool::connect_lazy("postgres://localhost/telemetry").unwrap();
        let sink = PgSink::new(pool, "measurements", 5000);
        let page = [fact(0, "power_avg", 1.0), fact(15, "power_avg", 2.0)];

        let builder = sink.insert_page(&page);
        let sql = builder.sql();
        assert!(sql.starts_with(
            "INSERT INTO measurements (time, source, metric, value, unit, error_flag, low_alarm, high_alarm) VALUES ($1, $2"
        ));
        assert!(sql.contains("$16"));
        assert!(!sql.contains("$17"));
        assert!(sql.ends_with(" ON CONFLICT (time, source, metric) DO NOTHING"));
    }

    #[tokio::test]
    async fn test_page_size_clamped() {
        let pool = PgPool::connect_lazy("postgres://localhost/telemetry").unwrap();
        assert_eq!(PgSink::new(pool.clone(), "measurements", 100_000).page_size, MAX_PAGE_SIZE);
        assert_eq!(PgSink::new(pool, "measurements", 0).page_size, 1);
    }

    #[test]
    fn test_page_size_respects_bind_limit() {
        assert_eq!(MAX_PAGE_SIZE, 8191);
        assert!(MAX_PAGE_SIZE * BINDS_PER_ROW <= u16::MAX as usize);
    }
}

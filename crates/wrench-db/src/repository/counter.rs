//! # Counter Repository
//!
//! Per-period invoice number counters.
//!
//! ```text
//! invoice_counters
//! ┌────────┬───────┐
//! │ period │ value │      next_value(2610) ──► 1, 2, 3, ...
//! ├────────┼───────┤      next_value(2611) ──► 1, 2, ...
//! │ 2610   │ 3     │
//! │ 2611   │ 2     │
//! └────────┴───────┘
//! ```
//!
//! The increment is a single upsert statement, so two concurrent callers can
//! never observe the same value. A value handed out and then not used (the
//! invoice insert failed) is simply skipped; numbers are unique, not gapless.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use wrench_core::NumberPeriod;

#[derive(Debug, Clone)]
pub struct CounterRepository {
    pool: SqlitePool,
}

impl CounterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CounterRepository { pool }
    }

    /// Atomically increments the counter for `period` and returns the new
    /// value. The first call for a period returns 1.
    pub async fn next_value(&self, period: &NumberPeriod) -> DbResult<i64> {
        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoice_counters (period, value)
            VALUES (?1, 1)
            ON CONFLICT (period) DO UPDATE SET value = value + 1
            RETURNING value
            "#,
        )
        .bind(period.key())
        .fetch_one(&self.pool)
        .await?;

        debug!(period = %period, value, "Issued counter value");
        Ok(value)
    }

    /// Current value for `period` without incrementing (0 if unused).
    pub async fn current_value(&self, period: &NumberPeriod) -> DbResult<i64> {
        let value: Option<i64> =
            sqlx::query_scalar("SELECT value FROM invoice_counters WHERE period = ?1")
                .bind(period.key())
                .fetch_optional(&self.pool)
                .await?;

        Ok(value.unwrap_or(0))
    }
}

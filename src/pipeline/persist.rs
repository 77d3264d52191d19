// src/pipeline/persist.rs

//! Persistence gateway.
//!
//! Wraps the sink with the bounded recovery policy: one reconnect attempt
//! and one retry, then the item is reported failed and dropped.

use crate::error::{AppError, Result};
use crate::models::InsightRow;
use crate::storage::{InsertOutcome, InsightSink};

/// Gateway in front of an [`InsightSink`].
pub struct PersistenceGateway<S> {
    sink: S,
}

impl<S: InsightSink> PersistenceGateway<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Write one insight, recovering from at most one sink failure.
    ///
    /// A duplicate key is a successful no-op. Any write error triggers
    /// exactly one `reconnect()` followed by one retry; a second failure
    /// surfaces as [`AppError::Persistence`].
    pub async fn persist(&self, row: &InsightRow) -> Result<InsertOutcome> {
        let first = match self.sink.insert(row).await {
            Ok(outcome) => return Ok(outcome),
            Err(e) => e,
        };

        log::warn!("Insight write failed, reconnecting once: {first}");
        self.sink
            .reconnect()
            .await
            .map_err(|e| AppError::persistence(format!("reconnect failed after '{first}': {e}")))?;

        self.sink
            .insert(row)
            .await
            .map_err(|e| AppError::persistence(format!("retry failed after reconnect: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    /// Sink that fails the first `failures` inserts, then succeeds.
    struct FlakySink {
        failures: Mutex<usize>,
        inserts: Mutex<usize>,
        reconnects: Mutex<usize>,
    }

    impl FlakySink {
        fn failing(failures: usize) -> Self {
            Self {
                failures: Mutex::new(failures),
                inserts: Mutex::new(0),
                reconnects: Mutex::new(0),
            }
        }

        fn insert_count(&self) -> usize {
            *self.inserts.lock().unwrap()
        }

        fn reconnect_count(&self) -> usize {
            *self.reconnects.lock().unwrap()
        }
    }

    #[async_trait]
    impl InsightSink for FlakySink {
        async fn insert(&self, _row: &InsightRow) -> Result<InsertOutcome> {
            *self.inserts.lock().unwrap() += 1;
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(AppError::persistence("connection dropped"));
            }
            Ok(InsertOutcome::Inserted)
        }

        async fn reconnect(&self) -> Result<()> {
            *self.reconnects.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn sample_row() -> InsightRow {
        InsightRow {
            tweet_text: "post".to_string(),
            author: "@a".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            strategy_type: "lending".to_string(),
            protocol_mentioned: "zkLend".to_string(),
            sentiment: 10.0,
            engagement_score: 22,
            text_hash: InsightRow::hash_text("post"),
        }
    }

    #[tokio::test]
    async fn healthy_write_needs_no_reconnect() {
        let gateway = PersistenceGateway::new(FlakySink::failing(0));
        let outcome = gateway.persist(&sample_row()).await.unwrap();

        assert_eq!(outcome, InsertOutcome::Inserted);
        assert_eq!(gateway.sink.insert_count(), 1);
        assert_eq!(gateway.sink.reconnect_count(), 0);
    }

    #[tokio::test]
    async fn one_failure_is_recovered_by_single_retry() {
        let gateway = PersistenceGateway::new(FlakySink::failing(1));
        let outcome = gateway.persist(&sample_row()).await.unwrap();

        assert_eq!(outcome, InsertOutcome::Inserted);
        assert_eq!(gateway.sink.insert_count(), 2);
        assert_eq!(gateway.sink.reconnect_count(), 1);
    }

    #[tokio::test]
    async fn second_failure_surfaces_and_retry_stays_bounded() {
        let gateway = PersistenceGateway::new(FlakySink::failing(2));
        let err = gateway.persist(&sample_row()).await.unwrap_err();

        assert!(matches!(err, AppError::Persistence { .. }));
        assert_eq!(gateway.sink.insert_count(), 2);
        assert_eq!(gateway.sink.reconnect_count(), 1);
    }
}

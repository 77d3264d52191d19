// src/storage/postgres.rs

//! Postgres sink implementation.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::Result;
use crate::models::{InsightRow, SinkConfig};
use crate::storage::{InsertOutcome, InsightSink};

/// Table schema with the idempotency key enforced by a unique index.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS twitter_defi_insights (
    id BIGSERIAL PRIMARY KEY,
    tweet_text TEXT NOT NULL,
    author TEXT NOT NULL,
    timestamp TIMESTAMPTZ NOT NULL,
    strategy_type TEXT NOT NULL,
    protocol_mentioned TEXT NOT NULL,
    sentiment DOUBLE PRECISION NOT NULL,
    engagement_score BIGINT NOT NULL,
    text_hash TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS twitter_defi_insights_identity
    ON twitter_defi_insights (author, timestamp, text_hash);
"#;

const INSERT_SQL: &str = r#"
INSERT INTO twitter_defi_insights
    (tweet_text, author, timestamp, strategy_type, protocol_mentioned,
     sentiment, engagement_score, text_hash)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (author, timestamp, text_hash) DO NOTHING
"#;

/// Postgres-backed insight sink.
#[derive(Clone)]
pub struct PgSink {
    pool: PgPool,
}

impl PgSink {
    /// Connect to the sink with bounded acquire timeouts.
    ///
    /// Fails fast if the database is unreachable; bootstrap decides what
    /// that means for the process exit status.
    pub async fn connect(database_url: &str, config: &SinkConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Create the insights table and idempotency index if absent.
    pub async fn ensure_schema(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::raw_sql(SCHEMA_SQL).execute(&mut *tx).await?;
        tx.commit().await?;
        log::info!("Sink schema is in place");
        Ok(())
    }
}

#[async_trait]
impl InsightSink for PgSink {
    async fn insert(&self, row: &InsightRow) -> Result<InsertOutcome> {
        let result = sqlx::query(INSERT_SQL)
            .bind(&row.tweet_text)
            .bind(&row.author)
            .bind(row.timestamp)
            .bind(&row.strategy_type)
            .bind(&row.protocol_mentioned)
            .bind(row.sentiment)
            .bind(row.engagement_score)
            .bind(&row.text_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn reconnect(&self) -> Result<()> {
        // The pool re-establishes broken connections on acquire; holding one
        // round-trip proves the sink is reachable again.
        let mut conn = self.pool.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}

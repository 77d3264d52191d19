// src/storage/mod.rs

//! Sink abstractions for insight persistence.
//!
//! The sink owns the database session exclusively; callers go through
//! [`InsightSink`] and never manage connections directly.

pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::InsightRow;

// Re-export for convenience
pub use postgres::PgSink;

/// Outcome of a single insight insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written
    Inserted,
    /// A row with the same idempotency key already existed; no-op
    Duplicate,
}

/// Trait for insight sink backends.
#[async_trait]
pub trait InsightSink: Send + Sync {
    /// Write one insight row atomically.
    ///
    /// Inserting a row whose `(author, timestamp, text_hash)` key already
    /// exists succeeds as a [`InsertOutcome::Duplicate`] no-op.
    async fn insert(&self, row: &InsightRow) -> Result<InsertOutcome>;

    /// Re-validate the session after a failed write.
    ///
    /// Safe to call after any failure; the gateway calls it exactly once
    /// before its single retry.
    async fn reconnect(&self) -> Result<()>;
}

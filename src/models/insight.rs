//! Classification results and the persisted insight row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::PostRecord;

/// Where a classification came from.
///
/// The two fallback kinds carry the same literal shape but must stay
/// distinguishable downstream, so the tag travels with the values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassificationSource {
    /// Validated model response
    Model,
    /// Model payload was unparseable or mistyped
    ParseFallback,
    /// The classifier service call itself failed
    ServiceFallback,
}

/// Strategy classification for a single post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Strategy type (yield farming, lending, liquidity provision, ...)
    pub strategy_type: String,

    /// Protocol mentioned in the post
    pub protocol: String,

    /// Sentiment score in [-100, 100]
    pub sentiment: f64,

    /// Origin of these values
    pub source: ClassificationSource,
}

impl Classification {
    /// Fixed fallback for an unparseable or mistyped model payload.
    pub fn parse_fallback() -> Self {
        Self {
            strategy_type: "unknown".to_string(),
            protocol: "unknown".to_string(),
            sentiment: 0.0,
            source: ClassificationSource::ParseFallback,
        }
    }

    /// Fixed fallback for a failed classifier service call.
    pub fn service_fallback() -> Self {
        Self {
            strategy_type: "error".to_string(),
            protocol: "error".to_string(),
            sentiment: 0.0,
            source: ClassificationSource::ServiceFallback,
        }
    }

    /// True if this classification did not come from a validated response.
    pub fn is_fallback(&self) -> bool {
        self.source != ClassificationSource::Model
    }
}

/// The durable row combining a post, its classification, and its
/// engagement score.
///
/// Keyed for idempotency by `(author, timestamp, text_hash)` so the same
/// post surfacing under two queries or across runs inserts exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRow {
    pub tweet_text: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub strategy_type: String,
    pub protocol_mentioned: String,
    pub sentiment: f64,
    pub engagement_score: i64,

    /// SHA-256 of the post text, hex-encoded
    pub text_hash: String,
}

impl InsightRow {
    /// Assemble the row from the pipeline stages' outputs.
    ///
    /// A score beyond the column range is clamped to `i64::MAX` so it can
    /// never round-trip as a negative value.
    pub fn new(record: PostRecord, classification: Classification, engagement_score: u64) -> Self {
        let text_hash = Self::hash_text(&record.text);
        Self {
            tweet_text: record.text,
            author: record.author,
            timestamp: record.timestamp,
            strategy_type: classification.strategy_type,
            protocol_mentioned: classification.protocol,
            sentiment: classification.sentiment,
            engagement_score: i64::try_from(engagement_score).unwrap_or(i64::MAX),
            text_hash,
        }
    }

    /// Hex-encoded SHA-256 of a post's text, the third idempotency key part.
    pub fn hash_text(text: &str) -> String {
        hex::encode(Sha256::digest(text.as_bytes()))
    }
}

/// Aggregate outcome counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Fragments that passed normalization
    pub processed: usize,
    /// Fragments rejected by the normalizer
    pub normalization_failed: usize,
    /// Classifications substituted after an invalid model payload
    pub parse_fallback: usize,
    /// Classifications substituted after a failed service call
    pub service_fallback: usize,
    /// New rows written to the sink
    pub persisted: usize,
    /// Writes that were no-ops because the row already existed
    pub duplicates: usize,
    /// Items dropped after the bounded write retry failed
    pub persist_failed: usize,
}

impl RunReport {
    /// Emit the final summary through the logger.
    pub fn log_summary(&self) {
        log::info!("Run summary:");
        log::info!("    processed: {}", self.processed);
        log::info!("    normalization failed: {}", self.normalization_failed);
        log::info!("    parse fallbacks: {}", self.parse_fallback);
        log::info!("    service fallbacks: {}", self.service_fallback);
        log::info!("    persisted: {}", self.persisted);
        log::info!("    duplicates: {}", self.duplicates);
        log::info!("    persist failed: {}", self.persist_failed);
    }
}

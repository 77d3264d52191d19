// src/pipeline/run.rs

//! Pipeline orchestrator.
//!
//! Drives each captured fragment through normalize → classify → score →
//! persist, one item at a time. Failure isolation is at item granularity:
//! one bad post never aborts a query's batch or the run.

use std::time::Duration;

use crate::error::Result;
use crate::models::{ClassificationSource, Config, InsightRow, RawFragment, RunReport};
use crate::pipeline::PersistenceGateway;
use crate::services::{ClassifierAdapter, ClassifierService, engagement_score, normalize};
use crate::sources::CrawlerSource;
use crate::storage::{InsertOutcome, InsightSink};

/// Number of failed writes in one run above which the sink is presumed
/// unhealthy and an operator warning is raised.
const PERSIST_FAILURE_ALERT_THRESHOLD: usize = 3;

/// Orchestrates one full run over the configured query set.
pub struct Pipeline<C, L, S> {
    config: Config,
    source: C,
    classifier: ClassifierAdapter<L>,
    gateway: PersistenceGateway<S>,
}

impl<C, L, S> Pipeline<C, L, S>
where
    C: CrawlerSource,
    L: ClassifierService,
    S: InsightSink,
{
    pub fn new(config: Config, source: C, classifier: ClassifierAdapter<L>, sink: S) -> Self {
        Self {
            config,
            source,
            classifier,
            gateway: PersistenceGateway::new(sink),
        }
    }

    /// Process every query in configured order and return the aggregate
    /// report.
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        let delay = Duration::from_millis(self.config.crawler.request_delay_ms);
        let limit = self.config.crawler.max_posts_per_query;

        for query in &self.config.crawler.queries {
            log::info!("Processing query: {query}");

            let fragments = match self.source.fetch(query, limit).await {
                Ok(fragments) => fragments,
                Err(e) => {
                    // Query-level isolation: a dead batch skips to the next query.
                    log::warn!("Fragment fetch failed for '{query}': {e}");
                    continue;
                }
            };

            if fragments.is_empty() {
                log::info!("Source exhausted for '{query}'");
                continue;
            }
            log::info!("Found {} fragments for '{query}'", fragments.len());

            for fragment in &fragments {
                self.process_fragment(fragment, &mut report).await;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        if report.persist_failed >= PERSIST_FAILURE_ALERT_THRESHOLD {
            log::warn!(
                "{} insight writes failed this run; the sink looks unhealthy",
                report.persist_failed
            );
        }

        Ok(report)
    }

    /// Run one fragment through the four stages, recording the outcome.
    ///
    /// Infallible from the caller's perspective; every failure mode ends
    /// in a counter, not an error.
    async fn process_fragment(&self, fragment: &RawFragment, report: &mut RunReport) {
        let record = match normalize(fragment) {
            Ok(record) => record,
            Err(e) => {
                report.normalization_failed += 1;
                log::warn!("Skipping fragment: {e}");
                return;
            }
        };
        report.processed += 1;
        log::debug!("Processing post by {}", record.author);

        let classification = self.classifier.classify(&record.text).await;
        match classification.source {
            ClassificationSource::Model => {}
            ClassificationSource::ParseFallback => report.parse_fallback += 1,
            ClassificationSource::ServiceFallback => report.service_fallback += 1,
        }

        let score = engagement_score(&record);
        let row = InsightRow::new(record, classification, score);

        match self.gateway.persist(&row).await {
            Ok(InsertOutcome::Inserted) => report.persisted += 1,
            Ok(InsertOutcome::Duplicate) => {
                report.duplicates += 1;
                log::debug!("Duplicate insight skipped for {}", row.author);
            }
            Err(e) => {
                report.persist_failed += 1;
                log::warn!("Dropping insight after failed write: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// In-memory source serving canned fragments per query.
    struct FakeSource {
        batches: HashMap<String, Vec<RawFragment>>,
    }

    #[async_trait]
    impl CrawlerSource for FakeSource {
        async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<RawFragment>> {
            let mut batch = self.batches.get(query).cloned().unwrap_or_default();
            batch.truncate(limit);
            Ok(batch)
        }
    }

    /// Always returns the same valid classification payload.
    struct FakeClassifier;

    #[async_trait]
    impl ClassifierService for FakeClassifier {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(r#"{"strategy_type": "lending", "protocol": "zkLend", "sentiment": 25}"#.to_string())
        }
    }

    /// Always fails, exercising the service-fallback path.
    struct DownClassifier;

    #[async_trait]
    impl ClassifierService for DownClassifier {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Err(AppError::classifier("timeout"))
        }
    }

    /// In-memory sink deduplicating on the idempotency key.
    #[derive(Default)]
    struct MemorySink {
        keys: Mutex<HashSet<(String, String, String)>>,
    }

    #[async_trait]
    impl InsightSink for MemorySink {
        async fn insert(&self, row: &InsightRow) -> Result<InsertOutcome> {
            let key = (
                row.author.clone(),
                row.timestamp.to_rfc3339(),
                row.text_hash.clone(),
            );
            if self.keys.lock().unwrap().insert(key) {
                Ok(InsertOutcome::Inserted)
            } else {
                Ok(InsertOutcome::Duplicate)
            }
        }

        async fn reconnect(&self) -> Result<()> {
            Ok(())
        }
    }

    fn fragment(text: &str) -> RawFragment {
        RawFragment {
            text: Some(text.to_string()),
            author: Some("@defi_anon".to_string()),
            timestamp: Some("2024-03-01T12:00:00Z".to_string()),
            likes: Some("10".to_string()),
            retweets: Some("3".to_string()),
            replies: Some("2".to_string()),
        }
    }

    fn config_with_queries(queries: &[&str]) -> Config {
        let mut config = Config::default();
        config.crawler.queries = queries.iter().map(|q| q.to_string()).collect();
        config.crawler.request_delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn bad_fragment_does_not_abort_batch() {
        let mut broken = fragment("ignored");
        broken.text = None;

        let batches = HashMap::from([(
            "starknet yields".to_string(),
            vec![
                fragment("post one"),
                fragment("post two"),
                broken,
                fragment("post four"),
                fragment("post five"),
            ],
        )]);

        let pipeline = Pipeline::new(
            config_with_queries(&["starknet yields"]),
            FakeSource { batches },
            ClassifierAdapter::new(FakeClassifier),
            MemorySink::default(),
        );
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.processed, 4);
        assert_eq!(report.normalization_failed, 1);
        assert_eq!(report.persisted, 4);
        assert_eq!(report.persist_failed, 0);
    }

    #[tokio::test]
    async fn same_post_across_queries_persists_once() {
        let batches = HashMap::from([
            ("starknet yields".to_string(), vec![fragment("same post")]),
            ("starknet farming".to_string(), vec![fragment("same post")]),
        ]);

        let pipeline = Pipeline::new(
            config_with_queries(&["starknet yields", "starknet farming"]),
            FakeSource { batches },
            ClassifierAdapter::new(FakeClassifier),
            MemorySink::default(),
        );
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.persisted, 1);
        assert_eq!(report.duplicates, 1);
    }

    #[tokio::test]
    async fn classifier_outage_still_persists_with_fallback() {
        let batches = HashMap::from([(
            "starknet reward".to_string(),
            vec![fragment("post one"), fragment("post two")],
        )]);

        let pipeline = Pipeline::new(
            config_with_queries(&["starknet reward"]),
            FakeSource { batches },
            ClassifierAdapter::new(DownClassifier),
            MemorySink::default(),
        );
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.service_fallback, 2);
        assert_eq!(report.parse_fallback, 0);
        assert_eq!(report.persisted, 2);
    }

    #[tokio::test]
    async fn empty_source_reaches_done_with_empty_report() {
        let pipeline = Pipeline::new(
            config_with_queries(&["starknet liquidity"]),
            FakeSource {
                batches: HashMap::new(),
            },
            ClassifierAdapter::new(FakeClassifier),
            MemorySink::default(),
        );
        let report = pipeline.run().await.unwrap();
        assert_eq!(report, RunReport::default());
    }

    #[tokio::test]
    async fn batch_bound_is_enforced() {
        let batches = HashMap::from([(
            "starknet yields".to_string(),
            (0..10).map(|i| fragment(&format!("post {i}"))).collect(),
        )]);

        let mut config = config_with_queries(&["starknet yields"]);
        config.crawler.max_posts_per_query = 4;

        let pipeline = Pipeline::new(
            config,
            FakeSource { batches },
            ClassifierAdapter::new(FakeClassifier),
            MemorySink::default(),
        );
        let report = pipeline.run().await.unwrap();
        assert_eq!(report.processed, 4);
    }
}

// src/sources/mod.rs

//! Crawler source seam.
//!
//! The browser layer that renders search pages and extracts post fragments
//! is an external collaborator; the pipeline only consumes the fragment
//! sequence it yields per query.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RawFragment;

/// Source of raw post fragments for a query.
///
/// Yields a bounded, finite batch per query; an empty batch is the normal
/// exhausted condition, not an error.
#[async_trait]
pub trait CrawlerSource: Send + Sync {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<RawFragment>>;
}

/// Replays fragment captures written by the browser layer.
///
/// Each query maps to one JSON Lines file under the capture directory,
/// one fragment object per line.
pub struct CaptureDirSource {
    root_dir: PathBuf,
}

impl CaptureDirSource {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Capture file path for a query, e.g. "starknet defi strategy" →
    /// `{root}/starknet-defi-strategy.jsonl`.
    ///
    /// Separator runs collapse to a single dash. The slug is lossy on
    /// purpose: the capture layer names its files with the same rule, so
    /// queries differing only in separators share one capture file.
    fn capture_path(&self, query: &str) -> PathBuf {
        let mut slug = String::with_capacity(query.len());
        for c in query.trim().to_lowercase().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c);
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        self.root_dir.join(format!("{}.jsonl", slug.trim_matches('-')))
    }
}

#[async_trait]
impl CrawlerSource for CaptureDirSource {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<RawFragment>> {
        let path = self.capture_path(query);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("No capture file for query '{}' at {}", query, path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut fragments = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawFragment>(line) {
                Ok(fragment) => fragments.push(fragment),
                // A corrupt capture line is an item problem, not a batch problem.
                Err(e) => log::warn!("Skipping corrupt capture line in {}: {}", path.display(), e),
            }
            if fragments.len() >= limit {
                break;
            }
        }

        Ok(fragments)
    }
}

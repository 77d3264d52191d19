//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
///
/// Secrets (`DATABASE_URL`, `OPENAI_API_KEY`) are read from the environment
/// at bootstrap, never from this file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Query set and batch behavior
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Classifier service settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Sink connection settings
    #[serde(default)]
    pub sink: SinkConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.queries.is_empty() {
            return Err(AppError::validation("No search queries defined"));
        }
        if self.crawler.queries.iter().any(|q| q.trim().is_empty()) {
            return Err(AppError::validation("crawler.queries contains a blank query"));
        }
        if self.crawler.max_posts_per_query == 0 {
            return Err(AppError::validation(
                "crawler.max_posts_per_query must be > 0",
            ));
        }
        if self.classifier.model.trim().is_empty() {
            return Err(AppError::validation("classifier.model is empty"));
        }
        if self.classifier.timeout_secs == 0 {
            return Err(AppError::validation("classifier.timeout_secs must be > 0"));
        }
        if !(0.0..=2.0).contains(&self.classifier.temperature) {
            return Err(AppError::validation(
                "classifier.temperature must be in [0, 2]",
            ));
        }
        if self.sink.max_connections == 0 {
            return Err(AppError::validation("sink.max_connections must be > 0"));
        }
        if self.sink.acquire_timeout_secs == 0 {
            return Err(AppError::validation("sink.acquire_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Query set and per-query batch behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Fixed search queries, iterated in this order
    #[serde(default = "defaults::queries")]
    pub queries: Vec<String>,

    /// Upper bound on fragments consumed per query
    #[serde(default = "defaults::max_posts_per_query")]
    pub max_posts_per_query: usize,

    /// Delay between items in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            queries: defaults::queries(),
            max_posts_per_query: defaults::max_posts_per_query(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Classifier service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Chat completion model name
    #[serde(default = "defaults::model")]
    pub model: String,

    /// API base URL (OpenAI-compatible)
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Sampling temperature
    #[serde(default = "defaults::temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: defaults::model(),
            base_url: defaults::base_url(),
            temperature: defaults::temperature(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Sink connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Maximum pooled connections
    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,

    /// Timeout for acquiring a connection, in seconds
    #[serde(default = "defaults::acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            max_connections: defaults::max_connections(),
            acquire_timeout_secs: defaults::acquire_timeout(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn queries() -> Vec<String> {
        [
            "starknet defi strategy",
            "starknet reward",
            "starknet yields",
            "starknet defi protocols",
            "starknet liquidity",
            "starknet farming",
            "starknet yield guide",
            "starknet defi guide",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn max_posts_per_query() -> usize {
        50
    }
    pub fn request_delay() -> u64 {
        100
    }

    // Classifier defaults
    pub fn model() -> String {
        "gpt-4o-mini".into()
    }
    pub fn base_url() -> String {
        "https://api.openai.com/v1".into()
    }
    pub fn temperature() -> f32 {
        0.7
    }
    pub fn timeout() -> u64 {
        30
    }

    // Sink defaults
    pub fn max_connections() -> u32 {
        5
    }
    pub fn acquire_timeout() -> u64 {
        10
    }
}

// src/models/mod.rs

//! Domain models for the insights pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod insight;
mod post;

// Re-export all public types
pub use config::{ClassifierConfig, Config, CrawlerConfig, SinkConfig};
pub use insight::{Classification, ClassificationSource, InsightRow, RunReport};
pub use post::{PostRecord, RawFragment};

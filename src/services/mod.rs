// src/services/mod.rs

//! Per-post processing stages: normalization, classification, scoring.

mod classifier;
mod normalizer;
mod scorer;

pub use classifier::{ClassifierAdapter, ClassifierService, OpenAiClassifier};
pub use normalizer::normalize;
pub use scorer::engagement_score;

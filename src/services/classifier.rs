// src/services/classifier.rs

//! Classifier adapter.
//!
//! Sends post text to the classifier service with a strict JSON output
//! contract. The adapter boundary is total: every call returns a
//! [`Classification`], substituting a tagged fallback when the payload is
//! invalid or the service call fails.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Classification, ClassificationSource, ClassifierConfig};

const SYSTEM_PROMPT: &str = "You are a helpful assistant that always responds with valid JSON";

/// Build the deterministic classification prompt for one post.
fn build_prompt(text: &str) -> String {
    format!(
        "Analyze this tweet about Starknet DeFi and extract:\n\
         1. Strategy type (yield farming, lending, liquidity provision, etc)\n\
         2. Protocol mentioned\n\
         3. Sentiment score (-100 to 100)\n\n\
         Tweet: {text}\n\n\
         You must respond with valid JSON in this exact format:\n\
         {{\"strategy_type\": \"type\", \"protocol\": \"name\", \"sentiment\": number}}"
    )
}

/// Transport seam to the classifier service.
///
/// Returns the raw assistant payload for one classification request; any
/// transport-level failure surfaces as an error for the adapter to absorb.
#[async_trait]
pub trait ClassifierService: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Classifier service backed by an OpenAI-compatible chat completion API.
pub struct OpenAiClassifier {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiClassifier {
    /// Create a classifier client with a bounded request timeout.
    pub fn new(config: &ClassifierConfig, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.trim().to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ClassifierService for OpenAiClassifier {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        log::debug!("Classifier request to model {}", self.model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::classifier(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::classifier("No content in response"))
    }
}

/// Total classification boundary over a [`ClassifierService`].
pub struct ClassifierAdapter<S> {
    service: S,
}

impl<S: ClassifierService> ClassifierAdapter<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Classify one post's text.
    ///
    /// Never fails past this boundary: an invalid payload yields the
    /// `unknown/unknown/0.0` fallback, a failed service call the
    /// `error/error/0.0` fallback. Out-of-range sentiment is clamped.
    pub async fn classify(&self, text: &str) -> Classification {
        match self.service.complete(SYSTEM_PROMPT, &build_prompt(text)).await {
            Ok(payload) => match parse_payload(&payload) {
                Some(classification) => classification,
                None => {
                    log::warn!("Classifier returned an invalid payload: {payload}");
                    Classification::parse_fallback()
                }
            },
            Err(e) => {
                log::warn!("Classifier request failed: {e}");
                Classification::service_fallback()
            }
        }
    }
}

/// Validate a payload against the output contract.
///
/// Requires a JSON object with `strategy_type: string`, `protocol: string`
/// and `sentiment: number`; anything else is a contract violation.
fn parse_payload(payload: &str) -> Option<Classification> {
    let value: serde_json::Value = serde_json::from_str(payload.trim()).ok()?;
    let object = value.as_object()?;

    let strategy_type = object.get("strategy_type")?.as_str()?;
    let protocol = object.get("protocol")?.as_str()?;
    let sentiment = object.get("sentiment")?.as_f64()?;

    Some(Classification {
        strategy_type: strategy_type.to_string(),
        protocol: protocol.to_string(),
        sentiment: sentiment.clamp(-100.0, 100.0),
        source: ClassificationSource::Model,
    })
}

//! OpenAI-compatible chat completions backend.
//!
//! Retry strategy (same for both calls):
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, ... (capped at 2^5)

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::Enricher;
use crate::config::EnrichmentConfig;
use crate::error::CapabilityError;
use crate::models::DocumentType;

/// Characters of content sent to the classifier.
pub const CLASSIFY_PREVIEW_CHARS: usize = 1000;

pub struct OpenAiEnricher {
    name: String,
    model: String,
    base_url: String,
    api_key: String,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiEnricher {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not in the environment or the
    /// HTTP client cannot be built.
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => bail!("OPENAI_API_KEY environment variable not set"),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            name: format!("openai:{}", config.model),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: config.max_retries,
            client,
        })
    }

    async fn chat(&self, body: &Value) -> Result<String, CapabilityError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: Value = response
                            .json()
                            .await
                            .map_err(|e| CapabilityError::InvalidResponse(e.to_string()))?;
                        return parse_message_content(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = CapabilityError::Http(format!("{}: {}", status, body_text));
                    if status.as_u16() == 429 || status.is_server_error() {
                        debug!(attempt, %status, "retrying enrichment request");
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    last_err = Some(CapabilityError::Http(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| CapabilityError::Http("request failed".to_string())))
    }
}

#[async_trait]
impl Enricher for OpenAiEnricher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn summarize(
        &self,
        text: &str,
        type_hint: DocumentType,
        max_tokens: u32,
    ) -> Result<String, CapabilityError> {
        let body = summarize_request(&self.model, text, type_hint, max_tokens);
        self.chat(&body).await
    }

    async fn classify(
        &self,
        filename: &str,
        preview: &str,
    ) -> Result<DocumentType, CapabilityError> {
        let body = classify_request(&self.model, filename, preview);
        let reply = self.chat(&body).await?;
        parse_classification(&reply)
    }
}

fn summarize_request(model: &str, text: &str, type_hint: DocumentType, max_tokens: u32) -> Value {
    json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": [
            {
                "role": "system",
                "content": format!(
                    "You summarize maritime documents. This one is a {}. Cover the parties, \
                     dates, key maritime terms and the important clauses. Be concise.",
                    type_hint.as_str().replace('_', " ")
                ),
            },
            { "role": "user", "content": text },
        ],
    })
}

fn classify_request(model: &str, filename: &str, preview: &str) -> Value {
    let preview: String = preview.chars().take(CLASSIFY_PREVIEW_CHARS).collect();
    json!({
        "model": model,
        "response_format": { "type": "json_object" },
        "messages": [
            {
                "role": "system",
                "content": "Classify the maritime document. Reply with JSON: \
                    {\"documentType\": \"charter_party|bill_of_lading|weather_report|voyage_instructions|other\"}",
            },
            {
                "role": "user",
                "content": format!("Filename: {}\n\nContent preview:\n{}", filename, preview),
            },
        ],
    })
}

/// Extract `choices[0].message.content`; an empty reply counts as invalid.
fn parse_message_content(json: &Value) -> Result<String, CapabilityError> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .ok_or_else(|| CapabilityError::InvalidResponse("missing message content".to_string()))?;
    if content.is_empty() {
        return Err(CapabilityError::InvalidResponse("empty message content".to_string()));
    }
    Ok(content.to_string())
}

/// Parse the classifier's JSON reply. Unknown labels map to `other`.
fn parse_classification(reply: &str) -> Result<DocumentType, CapabilityError> {
    let json: Value = serde_json::from_str(reply)
        .map_err(|e| CapabilityError::InvalidResponse(e.to_string()))?;
    Ok(json
        .get("documentType")
        .and_then(Value::as_str)
        .and_then(DocumentType::from_label)
        .unwrap_or(DocumentType::Other))
}

//! Optional enrichment capability (hosted language model).
//!
//! Defines the [`Enricher`] trait and its implementations:
//! - **[`DisabledEnricher`]**: always reports [`CapabilityError::Unavailable`]; injected when
//!   no provider is configured so callers never check for a missing capability.
//! - **[`OpenAiEnricher`]**: calls an OpenAI-compatible chat completions API.
//!
//! Every caller treats a failure as a soft error and falls back to local
//! heuristics. See [`crate::summarize`] for the summary fallback.

mod openai;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::EnrichmentConfig;
use crate::error::CapabilityError;
use crate::models::DocumentType;

pub use openai::{OpenAiEnricher, CLASSIFY_PREVIEW_CHARS};

/// An external text-understanding capability.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Provider identifier for logs (e.g. `"openai:gpt-4o"`).
    fn name(&self) -> &str;

    /// Produce a synopsis of `text`, bounded by `max_tokens`.
    async fn summarize(
        &self,
        text: &str,
        type_hint: DocumentType,
        max_tokens: u32,
    ) -> Result<String, CapabilityError>;

    /// Classify a document from its filename and a content preview.
    async fn classify(&self, filename: &str, preview: &str)
        -> Result<DocumentType, CapabilityError>;
}

/// The no-op capability used when enrichment is not configured.
pub struct DisabledEnricher;

#[async_trait]
impl Enricher for DisabledEnricher {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn summarize(
        &self,
        _text: &str,
        _type_hint: DocumentType,
        _max_tokens: u32,
    ) -> Result<String, CapabilityError> {
        Err(CapabilityError::Unavailable)
    }

    async fn classify(
        &self,
        _filename: &str,
        _preview: &str,
    ) -> Result<DocumentType, CapabilityError> {
        Err(CapabilityError::Unavailable)
    }
}

/// Instantiate the enricher selected by `config.provider`.
pub fn create_enricher(config: &EnrichmentConfig) -> Result<Arc<dyn Enricher>> {
    if !config.is_enabled() {
        return Ok(Arc::new(DisabledEnricher));
    }
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiEnricher::new(config)?)),
        other => anyhow::bail!("Unknown enrichment provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_enricher_is_unavailable() {
        let enricher = create_enricher(&EnrichmentConfig::default()).unwrap();
        assert_eq!(enricher.name(), "disabled");
        let err = enricher
            .summarize("text", DocumentType::GeneralMaritime, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable));
        let err = enricher.classify("cp.pdf", "text").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Unavailable));
    }

    #[test]
    fn factory_follows_is_enabled() {
        let config = EnrichmentConfig::default();
        assert!(!config.is_enabled());
        assert_eq!(create_enricher(&config).unwrap().name(), "disabled");

        let config = EnrichmentConfig {
            provider: "carrier-pigeon".to_string(),
            ..EnrichmentConfig::default()
        };
        assert!(config.is_enabled());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = EnrichmentConfig {
            provider: "carrier-pigeon".to_string(),
            ..EnrichmentConfig::default()
        };
        assert!(create_enricher(&config).is_err());
    }
}

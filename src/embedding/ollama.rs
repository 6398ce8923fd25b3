//! Embedding provider backed by an Ollama server.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::embedding::provider::{EmbeddingProvider, EmbeddingProviderFactory, EmbeddingResult};
use crate::embedding::retry::with_retries;
use crate::error::EmbeddingError;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

/// Calls `POST {base_url}/api/embeddings`, retrying failed requests.
pub struct OllamaEmbedder {
    client: Client,
    config: EmbeddingConfig,
}

impl OllamaEmbedder {
    pub fn new(config: EmbeddingConfig) -> EmbeddingResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EmbeddingError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.config.base_url.trim_end_matches('/'))
    }

    async fn request_once(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let url = self.endpoint();
        debug!("Requesting embedding from {url}");

        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.config.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::connection(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::generation(format!(
                "embedding service returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::generation(format!("invalid embedding response: {e}")))?;
        match parsed.embedding {
            Some(vector) if !vector.is_empty() => Ok(vector),
            _ => Err(EmbeddingError::generation("no embedding in response")),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn get_embedding(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        with_retries(self.config.retries, |_| self.request_once(text)).await
    }

    fn vector_dimension(&self) -> EmbeddingResult<usize> {
        self.config.dimension()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Factory building one [`OllamaEmbedder`] per override configuration.
pub fn ollama_factory() -> impl EmbeddingProviderFactory {
    |config: &EmbeddingConfig| -> EmbeddingResult<Arc<dyn EmbeddingProvider>> {
        Ok(Arc::new(OllamaEmbedder::new(config.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_and_metadata() {
        let embedder = OllamaEmbedder::new(EmbeddingConfig {
            base_url: "http://ollama:11434/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(embedder.endpoint(), "http://ollama:11434/api/embeddings");
        assert_eq!(embedder.model_name(), "nomic-embed-text");
        assert_eq!(embedder.vector_dimension().unwrap(), 768);
    }

    #[test]
    fn test_factory_uses_override_config() {
        let provider = ollama_factory()
            .create(&EmbeddingConfig {
                model: "unknown".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(provider.model_name(), "unknown");
        assert!(matches!(provider.vector_dimension(), Err(EmbeddingError::Config(_))));
    }
}

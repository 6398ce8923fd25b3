//! Embedding retrieval and KNN search against a collection.

use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::client::SearchClient;
use crate::config::{BridgeConfig, EmbeddingConfig, EmbeddingOverrides};
use crate::embedding::provider::{EmbeddingProvider, EmbeddingProviderFactory};
use crate::error::{Result, SolrSqlError};
use crate::query::native::NativeQuerySpec;
use crate::schema::field::{DOCID_FIELD, SCORE_FIELD};
use crate::vector::results::{DISTANCE_FIELD, stored_id_of};

/// Fetches query vectors and runs KNN searches.
///
/// The default provider serves every call without overrides. Calls that
/// override the embedding settings get a provider built by the factory,
/// used once and dropped.
pub struct VectorManager {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    factory: Option<Arc<dyn EmbeddingProviderFactory>>,
    embedding_config: EmbeddingConfig,
    embedding_field: String,
    default_top_k: usize,
}

impl VectorManager {
    pub fn new(embedding_field: impl Into<String>) -> Self {
        Self {
            provider: None,
            factory: None,
            embedding_config: EmbeddingConfig::default(),
            embedding_field: embedding_field.into(),
            default_top_k: 10,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            provider: None,
            factory: None,
            embedding_config: config.embedding.clone(),
            embedding_field: config.embedding_field.clone(),
            default_top_k: config.default_top_k,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn EmbeddingProviderFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k;
        self
    }

    pub fn embedding_field(&self) -> &str {
        &self.embedding_field
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    pub fn embedding_config(&self) -> &EmbeddingConfig {
        &self.embedding_config
    }

    fn provider_for(
        &self,
        overrides: Option<&EmbeddingOverrides>,
    ) -> Result<Arc<dyn EmbeddingProvider>> {
        if let Some(overrides) = overrides.filter(|o| !o.is_empty()) {
            let factory = self.factory.as_ref().ok_or_else(|| {
                SolrSqlError::vector_operation(
                    "Error getting vector: overrides require a provider factory",
                )
            })?;
            let config = self.embedding_config.merged(overrides);
            debug!("Creating embedding provider for model {}", config.model);
            return factory.create(&config).map_err(|e| {
                SolrSqlError::vector_operation(format!("Error getting vector: {e}"))
            });
        }

        self.provider.clone().ok_or_else(|| {
            SolrSqlError::vector_operation("Error getting vector: no embedding provider configured")
        })
    }

    /// Embed `text` with the default provider, or with a one-off provider
    /// when `overrides` sets anything.
    pub async fn get_vector(
        &self,
        text: &str,
        overrides: Option<&EmbeddingOverrides>,
    ) -> Result<Vec<f32>> {
        let provider = self.provider_for(overrides)?;
        provider
            .get_embedding(text)
            .await
            .map_err(|e| SolrSqlError::vector_operation(format!("Error getting vector: {e}")))
    }

    /// `{!knn f=<field> topK=<k>}[v1,v2,...]`; `topK` only when given.
    pub fn format_knn_query(
        &self,
        vector: &[f32],
        field: Option<&str>,
        top_k: Option<usize>,
    ) -> String {
        let field = field.unwrap_or(&self.embedding_field);
        let components: Vec<String> = vector.iter().map(|v| format_component(*v)).collect();
        let vector = format!("[{}]", components.join(","));
        match top_k {
            Some(k) => format!("{{!knn f={field} topK={k}}}{vector}"),
            None => format!("{{!knn f={field}}}{vector}"),
        }
    }

    /// Run a KNN query, optionally restricted by `filter_query`.
    pub async fn execute_vector_search(
        &self,
        client: &dyn SearchClient,
        collection: &str,
        vector: &[f32],
        field: Option<&str>,
        top_k: Option<usize>,
        filter_query: Option<&str>,
    ) -> Result<Value> {
        let mut spec = NativeQuerySpec::new()
            .with_query(self.format_knn_query(vector, field, top_k))
            .with_field_list(format!("{DOCID_FIELD},{SCORE_FIELD},{DISTANCE_FIELD}"));
        if let Some(k) = top_k {
            spec = spec.with_rows(k as u64);
        }
        if let Some(fq) = filter_query {
            spec = spec.with_filter(fq);
        }

        debug!("Executing vector search on {collection}: {}", spec.query);
        client
            .select(collection, &spec)
            .await
            .map_err(|e| {
                SolrSqlError::vector_operation(format!("Vector search failed: {}", e.message()))
            })
    }

    /// Document ids of a select response in the order returned.
    ///
    /// Reads `id` first, then the engine's docid aliases; docs without
    /// either are skipped.
    pub fn extract_doc_ids(&self, response: &Value) -> Vec<String> {
        response
            .get("response")
            .and_then(|r| r.get("docs"))
            .and_then(Value::as_array)
            .map(|docs| {
                docs.iter()
                    .filter_map(Value::as_object)
                    .filter_map(stored_id_of)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Whole numbers keep one decimal so the engine reads them as floats.
fn format_component(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

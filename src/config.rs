use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result, SolrSqlError};

fn default_solr_base_url() -> String {
    "http://localhost:8983/solr".to_string()
}

fn default_embedding_field() -> String {
    "embedding".to_string()
}

fn default_top_k() -> usize {
    10
}

fn default_connection_timeout_secs() -> u64 {
    10
}

fn default_field_cache_max_age_secs() -> u64 {
    300
}

fn default_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

/// Known embedding models and the dimension of the vectors they produce.
const MODEL_DIMENSIONS: &[(&str, usize)] = &[("nomic-embed-text", 768)];

/// Configuration of the bridge between the SQL surface and the search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base URL of the search engine, e.g. `http://localhost:8983/solr`.
    #[serde(default = "default_solr_base_url")]
    pub solr_base_url: String,
    /// Collection used when a request does not name one.
    #[serde(default)]
    pub default_collection: Option<String>,
    /// Dense vector field queried by KNN searches.
    #[serde(default = "default_embedding_field")]
    pub embedding_field: String,
    /// KNN `topK` used when the caller gives none.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
    /// Age after which cached field sets are refreshed.
    #[serde(default = "default_field_cache_max_age_secs")]
    pub field_cache_max_age_secs: u64,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl BridgeConfig {
    pub fn new(solr_base_url: impl Into<String>) -> Self {
        Self {
            solr_base_url: solr_base_url.into(),
            ..Default::default()
        }
    }

    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Parse a configuration from a JSON document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.solr_base_url.trim().is_empty() {
            return Err(SolrSqlError::configuration("solr_base_url must not be empty"));
        }
        if self.embedding_field.trim().is_empty() {
            return Err(SolrSqlError::configuration("embedding_field must not be empty"));
        }
        if self.default_top_k == 0 {
            return Err(SolrSqlError::configuration("default_top_k must be > 0"));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.solr_base_url.trim_end_matches('/')
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn field_cache_max_age(&self) -> Duration {
        Duration::from_secs(self.field_cache_max_age_secs)
    }

    /// Resolve the collection a request targets.
    ///
    /// An explicit, non-blank collection wins; otherwise the configured
    /// default is used.
    pub fn resolve_collection(&self, collection: Option<&str>) -> Result<String> {
        match collection.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => Ok(c.to_string()),
            None => self.default_collection.clone().ok_or_else(|| {
                SolrSqlError::configuration(
                    "No collection specified and no default collection configured",
                )
            }),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            solr_base_url: default_solr_base_url(),
            default_collection: None,
            embedding_field: default_embedding_field(),
            default_top_k: default_top_k(),
            connection_timeout_secs: default_connection_timeout_secs(),
            field_cache_max_age_secs: default_field_cache_max_age_secs(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

#[derive(Default)]
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    pub fn solr_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.solr_base_url = url.into();
        self
    }

    pub fn default_collection(mut self, collection: impl Into<String>) -> Self {
        self.config.default_collection = Some(collection.into());
        self
    }

    pub fn embedding_field(mut self, field: impl Into<String>) -> Self {
        self.config.embedding_field = field.into();
        self
    }

    pub fn default_top_k(mut self, top_k: usize) -> Self {
        self.config.default_top_k = top_k;
        self
    }

    pub fn connection_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connection_timeout_secs = secs;
        self
    }

    pub fn field_cache_max_age_secs(mut self, secs: u64) -> Self {
        self.config.field_cache_max_age_secs = secs;
        self
    }

    pub fn embedding(mut self, embedding: EmbeddingConfig) -> Self {
        self.config.embedding = embedding;
        self
    }

    pub fn build(self) -> Result<BridgeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Connection settings of the embedding provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after the first failed request.
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply per-call overrides on top of this configuration.
    pub fn merged(&self, overrides: &EmbeddingOverrides) -> EmbeddingConfig {
        EmbeddingConfig {
            model: overrides.model.clone().unwrap_or_else(|| self.model.clone()),
            base_url: overrides
                .base_url
                .clone()
                .unwrap_or_else(|| self.base_url.clone()),
            timeout_secs: overrides.timeout_secs.unwrap_or(self.timeout_secs),
            retries: overrides.retries.unwrap_or(self.retries),
        }
    }

    /// Dimension of the vectors produced by the configured model.
    pub fn dimension(&self) -> std::result::Result<usize, EmbeddingError> {
        MODEL_DIMENSIONS
            .iter()
            .find(|(name, _)| *name == self.model)
            .map(|(_, dim)| *dim)
            .ok_or_else(|| {
                EmbeddingError::config(format!(
                    "Unknown vector dimension for model '{}'",
                    self.model
                ))
            })
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_embedding_base_url(),
            timeout_secs: default_embedding_timeout_secs(),
            retries: default_retries(),
        }
    }
}

/// Per-call overrides of the embedding provider settings.
///
/// Unset fields fall back to the manager's default [`EmbeddingConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingOverrides {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retries: Option<u32>,
}

impl EmbeddingOverrides {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.base_url.is_none()
            && self.timeout_secs.is_none()
            && self.retries.is_none()
    }
}

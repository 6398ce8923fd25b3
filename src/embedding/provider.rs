use std::sync::Arc;

use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

pub type EmbeddingResult<T> = std::result::Result<T, EmbeddingError>;

/// A service that turns text into dense vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn get_embedding(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Embed several texts, in order. The default embeds them one at a time.
    async fn get_embeddings(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.get_embedding(text).await?);
        }
        Ok(vectors)
    }

    /// Dimension of the produced vectors.
    fn vector_dimension(&self) -> EmbeddingResult<usize>;

    fn model_name(&self) -> &str;
}

/// Builds short-lived providers for calls that override the default settings.
pub trait EmbeddingProviderFactory: Send + Sync {
    fn create(&self, config: &EmbeddingConfig) -> EmbeddingResult<Arc<dyn EmbeddingProvider>>;
}

impl<F> EmbeddingProviderFactory for F
where
    F: Fn(&EmbeddingConfig) -> EmbeddingResult<Arc<dyn EmbeddingProvider>> + Send + Sync,
{
    fn create(&self, config: &EmbeddingConfig) -> EmbeddingResult<Arc<dyn EmbeddingProvider>> {
        self(config)
    }
}

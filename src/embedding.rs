//! Embedding providers used by vector and semantic search.

#[cfg(feature = "http")]
pub mod ollama;
pub mod provider;
pub mod retry;

#[cfg(feature = "http")]
pub use ollama::{OllamaEmbedder, ollama_factory};
pub use provider::{EmbeddingProvider, EmbeddingProviderFactory, EmbeddingResult};
pub use retry::with_retries;

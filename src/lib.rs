//! # solr-sql
//!
//! SQL SELECT over Solr collections.
//!
//! ## Features
//!
//! - Restricted SELECT dialect with `field:value` shorthand
//! - Schema-driven validation of projected and sorted fields
//! - Cached field discovery with fallbacks for unreachable schemas
//! - KNN and semantic selects fused with SQL filters
//! - Optional HTTP transport (`http` feature)
pub mod client;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod query;
pub mod response;
pub mod schema;
pub mod vector;

#[cfg(test)]
mod testing;

// Re-exports for the public API
#[cfg(feature = "http")]
pub use client::HttpSolrClient;
pub use client::SearchClient;
pub use config::{BridgeConfig, EmbeddingConfig, EmbeddingOverrides};
pub use embedding::{EmbeddingProvider, EmbeddingProviderFactory};
pub use engine::SolrSqlEngine;
pub use error::{EmbeddingError, Result, SolrSqlError, format_error_response};
pub use query::{NativeQuerySpec, ParsedQuery, QueryBuilder, QueryParser, QueryValidator};
pub use response::{SearchResponse, TextValue, normalize_response};
pub use schema::{
    FieldCache, FieldInfo, FieldManager, FieldType, SchemaCatalog, SchemaSource, SortDirection,
};
pub use vector::{VectorManager, VectorSearchResults};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

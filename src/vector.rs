//! Vector search: query embeddings, KNN queries and their results.

pub mod manager;
pub mod results;

pub use manager::VectorManager;
pub use results::{VectorSearchResult, VectorSearchResults, doc_id_of, internal_doc_id};

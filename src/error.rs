//! Error types for the SQL-to-Solr translation layer.
//!
//! All fallible operations in the crate return [`Result`], whose error type
//! [`SolrSqlError`] distinguishes configuration, schema, query and
//! native search-layer failures. Embedding provider failures keep their own
//! [`EmbeddingError`] kinds and are wrapped at the vector manager boundary.

use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// The provider answered but no usable vector could be produced.
    #[error("embedding generation failed: {0}")]
    Generation(String),

    /// The provider could not be reached.
    #[error("embedding service connection failed: {0}")]
    Connection(String),

    /// The provider is misconfigured (e.g. unknown model dimension).
    #[error("embedding configuration error: {0}")]
    Config(String),
}

impl EmbeddingError {
    pub fn generation<S: Into<String>>(msg: S) -> Self {
        EmbeddingError::Generation(msg.into())
    }

    pub fn connection<S: Into<String>>(msg: S) -> Self {
        EmbeddingError::Connection(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        EmbeddingError::Config(msg.into())
    }
}

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum SolrSqlError {
    /// Invalid or missing connection configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Schema unreachable, malformed, or a referenced field/collection is absent.
    #[error("Schema error: {0}")]
    Schema(String),

    /// SQL dialect violation or field validation failure.
    #[error("Query error: {0}")]
    Query(String),

    /// Generic failure of the native query layer.
    #[error("Solr error: {0}")]
    Solr(String),

    /// Vector search or embedding retrieval failed at the vector manager.
    #[error("Vector operation error: {0}")]
    VectorOperation(String),

    /// Embedding provider error that was not wrapped by the vector manager.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Transport-level failure talking to the search engine.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SolrSqlError {
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        SolrSqlError::Configuration(msg.into())
    }

    pub fn schema<S: Into<String>>(msg: S) -> Self {
        SolrSqlError::Schema(msg.into())
    }

    pub fn query<S: Into<String>>(msg: S) -> Self {
        SolrSqlError::Query(msg.into())
    }

    pub fn solr<S: Into<String>>(msg: S) -> Self {
        SolrSqlError::Solr(msg.into())
    }

    pub fn vector_operation<S: Into<String>>(msg: S) -> Self {
        SolrSqlError::VectorOperation(msg.into())
    }

    pub fn http<S: Into<String>>(msg: S) -> Self {
        SolrSqlError::Http(msg.into())
    }

    pub fn is_query(&self) -> bool {
        matches!(self, SolrSqlError::Query(_))
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, SolrSqlError::Schema(_))
    }

    /// Returns true for every error belonging to the native search layer,
    /// including vector operation failures.
    pub fn is_solr(&self) -> bool {
        matches!(
            self,
            SolrSqlError::Solr(_) | SolrSqlError::VectorOperation(_) | SolrSqlError::Http(_)
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, SolrSqlError::Configuration(_))
    }

    /// The human-readable message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            SolrSqlError::Configuration(msg)
            | SolrSqlError::Schema(msg)
            | SolrSqlError::Query(msg)
            | SolrSqlError::Solr(msg)
            | SolrSqlError::VectorOperation(msg)
            | SolrSqlError::Http(msg) => msg.clone(),
            SolrSqlError::Embedding(err) => err.to_string(),
            SolrSqlError::Json(err) => err.to_string(),
        }
    }

    /// Stable machine-readable code used in error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            SolrSqlError::Configuration(_) => "CONFIGURATION_ERROR",
            SolrSqlError::Schema(_) => "SCHEMA_ERROR",
            SolrSqlError::Query(_) => "QUERY_ERROR",
            SolrSqlError::Solr(_) | SolrSqlError::VectorOperation(_) | SolrSqlError::Http(_) => {
                "SOLR_ERROR"
            }
            SolrSqlError::Embedding(_) | SolrSqlError::Json(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, SolrSqlError>;

/// Render an error as the JSON envelope handed to the transport layer.
pub fn format_error_response(err: &SolrSqlError) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": err.code(),
            "message": err.message(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_display() {
        let err = SolrSqlError::query("Invalid SQL syntax");
        assert_eq!(err.to_string(), "Query error: Invalid SQL syntax");
        assert!(err.is_query());
        assert!(!err.is_schema());
    }

    #[test]
    fn test_vector_operation_is_solr_kind() {
        let err = SolrSqlError::vector_operation("Vector search failed: timeout");
        assert!(err.is_solr());
        assert_eq!(err.code(), "SOLR_ERROR");
    }

    #[test]
    fn test_embedding_error_from() {
        let err: SolrSqlError = EmbeddingError::config("unknown model 'foo'").into();
        assert!(matches!(err, SolrSqlError::Embedding(EmbeddingError::Config(_))));
        assert!(err.to_string().contains("unknown model"));
    }

    #[test]
    fn test_format_error_response_codes() {
        let envelope = format_error_response(&SolrSqlError::query("Invalid SQL syntax"));
        assert_eq!(envelope["error"]["code"], "QUERY_ERROR");
        assert_eq!(envelope["error"]["message"], "Invalid SQL syntax");

        let envelope = format_error_response(&SolrSqlError::solr("Connection failed"));
        assert_eq!(envelope["error"]["code"], "SOLR_ERROR");
        assert_eq!(envelope["error"]["message"], "Connection failed");

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let envelope = format_error_response(&SolrSqlError::from(json_err));
        assert_eq!(envelope["error"]["code"], "INTERNAL_ERROR");
    }
}

//! Seams between the schema layer and the outside world.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::schema::field::FieldInfo;

/// Remote source of schema information for a collection.
///
/// Implementations return the raw JSON bodies; interpretation is left to
/// [`FieldManager`](crate::schema::FieldManager).
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Full schema document (`GET /{collection}/schema`).
    async fn fetch_schema(&self, collection: &str) -> Result<Value>;

    /// Field listing (`GET /{collection}/schema/fields`).
    async fn fetch_schema_fields(&self, collection: &str) -> Result<Value>;

    /// No-op select (`q=*:*`, `rows=0`) whose response header echoes the request parameters.
    async fn probe_fields(&self, collection: &str) -> Result<Value>;
}

/// Synchronous read access to already-loaded schema metadata.
///
/// The query validator only talks to this trait, so parsing, validation and
/// query building never perform I/O.
pub trait SchemaCatalog: Send + Sync {
    /// Succeeds if the collection's schema is known.
    fn check_collection(&self, collection: &str) -> Result<()>;

    /// Field name to type name map of a collection.
    fn field_types(&self, collection: &str) -> Result<HashMap<String, String>>;

    /// Sortable fields derived from the collection schema.
    fn sortable_fields(&self, collection: &str) -> Result<HashMap<String, FieldInfo>>;

    /// Fails with one error naming every field that cannot be sorted on.
    fn check_sort_fields(&self, collection: &str, fields: &[String]) -> Result<()>;
}

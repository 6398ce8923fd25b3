//! In-memory fixtures shared by unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{Result, SolrSqlError};
use crate::schema::manager::FieldManager;
use crate::schema::source::SchemaSource;

/// Schema source serving fixed documents per collection.
#[derive(Default)]
pub(crate) struct StaticSchemaSource {
    schemas: HashMap<String, Value>,
    fields: HashMap<String, Value>,
}

impl StaticSchemaSource {
    pub(crate) fn with_collection(mut self, collection: &str, fields: Value) -> Self {
        self.schemas
            .insert(collection.to_string(), json!({"schema": {"fields": fields.clone()}}));
        self.fields
            .insert(collection.to_string(), json!({"fields": fields}));
        self
    }

    /// A `docs` collection with text, string, numeric, date and vector fields.
    pub(crate) fn docs() -> Self {
        Self::default().with_collection(
            "docs",
            json!([
                {"name": "id", "type": "string", "stored": true, "docValues": true},
                {"name": "title", "type": "text_general", "stored": true},
                {"name": "content", "type": "text_general", "stored": false},
                {"name": "category", "type": "string", "docValues": true},
                {"name": "price", "type": "pfloat", "docValues": true},
                {"name": "published", "type": "pdate", "docValues": true},
                {"name": "embedding", "type": "knn_vector", "stored": false},
                {"name": "_text_", "type": "text_general", "stored": false},
                {"name": "_version_", "type": "plong", "docValues": true}
            ]),
        )
    }
}

#[async_trait]
impl SchemaSource for StaticSchemaSource {
    async fn fetch_schema(&self, collection: &str) -> Result<Value> {
        self.schemas
            .get(collection)
            .cloned()
            .ok_or_else(|| SolrSqlError::http(format!("collection {collection} not found")))
    }

    async fn fetch_schema_fields(&self, collection: &str) -> Result<Value> {
        self.fields
            .get(collection)
            .cloned()
            .ok_or_else(|| SolrSqlError::http(format!("collection {collection} not found")))
    }

    async fn probe_fields(&self, collection: &str) -> Result<Value> {
        Err(SolrSqlError::http(format!("collection {collection} not found")))
    }
}

/// A field manager with the `docs` collection already loaded.
pub(crate) fn loaded_manager() -> Arc<FieldManager> {
    let manager = Arc::new(FieldManager::new(Arc::new(StaticSchemaSource::docs())));
    tokio_test::block_on(manager.load("docs")).expect("docs collection loads");
    manager
}

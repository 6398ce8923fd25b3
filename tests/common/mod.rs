#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use solr_sql::embedding::EmbeddingResult;
use solr_sql::{
    BridgeConfig, EmbeddingError, EmbeddingProvider, NativeQuerySpec, Result, SchemaSource,
    SearchClient, SolrSqlEngine, SolrSqlError, VectorManager,
};

/// Schema source serving fixed field lists; unknown collections fail.
#[derive(Default)]
pub struct StaticSchema {
    fields: HashMap<String, Value>,
    probe: Option<Value>,
    schema_fetches: AtomicUsize,
    field_fetches: AtomicUsize,
}

impl StaticSchema {
    pub fn with_collection(mut self, collection: &str, fields: Value) -> Self {
        self.fields.insert(collection.to_string(), fields);
        self
    }

    pub fn with_probe(mut self, response: Value) -> Self {
        self.probe = Some(response);
        self
    }

    pub fn docs() -> Self {
        Self::default().with_collection(
            "docs",
            json!([
                {"name": "id", "type": "string", "stored": true, "docValues": true},
                {"name": "title", "type": "text_general", "stored": true},
                {"name": "content", "type": "text_general", "stored": false},
                {"name": "category", "type": "string", "docValues": true},
                {"name": "price", "type": "pfloat", "docValues": true},
                {"name": "tags", "type": "string", "docValues": true, "multiValued": true},
                {"name": "embedding", "type": "knn_vector", "stored": false},
                {"name": "_text_", "type": "text_general", "stored": false}
            ]),
        )
    }

    pub fn schema_fetches(&self) -> usize {
        self.schema_fetches.load(Ordering::SeqCst)
    }

    pub fn field_fetches(&self) -> usize {
        self.field_fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, collection: &str) -> Result<&Value> {
        self.fields
            .get(collection)
            .ok_or_else(|| SolrSqlError::http(format!("404 for collection {collection}")))
    }
}

#[async_trait]
impl SchemaSource for StaticSchema {
    async fn fetch_schema(&self, collection: &str) -> Result<Value> {
        self.schema_fetches.fetch_add(1, Ordering::SeqCst);
        let fields = self.lookup(collection)?;
        Ok(json!({"schema": {"name": collection, "uniqueKey": "id", "fields": fields}}))
    }

    async fn fetch_schema_fields(&self, collection: &str) -> Result<Value> {
        self.field_fetches.fetch_add(1, Ordering::SeqCst);
        let fields = self.lookup(collection)?;
        Ok(json!({"fields": fields}))
    }

    async fn probe_fields(&self, collection: &str) -> Result<Value> {
        self.probe
            .clone()
            .ok_or_else(|| SolrSqlError::http(format!("404 for collection {collection}")))
    }
}

/// Search client answering KNN queries and plain selects from fixed docs.
#[derive(Default)]
pub struct FakeSolr {
    knn_docs: Vec<Value>,
    select_docs: Vec<Value>,
    docid_when_named: bool,
    requests: Mutex<Vec<(String, NativeQuerySpec)>>,
}

impl FakeSolr {
    pub fn with_knn_docs(mut self, docs: Vec<Value>) -> Self {
        self.knn_docs = docs;
        self
    }

    pub fn with_select_docs(mut self, docs: Vec<Value>) -> Self {
        self.select_docs = docs;
        self
    }

    /// Return `_docid_` on plain selects only when `fl` names it, as Solr does.
    pub fn docid_when_named(mut self) -> Self {
        self.docid_when_named = true;
        self
    }

    pub fn requests(&self) -> Vec<(String, NativeQuerySpec)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl SearchClient for FakeSolr {
    async fn select(&self, collection: &str, query: &NativeQuerySpec) -> Result<Value> {
        self.requests
            .lock()
            .push((collection.to_string(), query.clone()));
        let docs = if query.query.starts_with("{!knn") {
            self.knn_docs.clone()
        } else if self.docid_when_named && !names_docid(query) {
            self.select_docs
                .iter()
                .cloned()
                .map(|mut doc| {
                    if let Some(doc) = doc.as_object_mut() {
                        doc.remove("_docid_");
                    }
                    doc
                })
                .collect()
        } else {
            self.select_docs.clone()
        };
        Ok(json!({
            "responseHeader": {"status": 0, "QTime": 1},
            "response": {"numFound": docs.len(), "start": 0, "docs": docs}
        }))
    }
}

fn names_docid(query: &NativeQuerySpec) -> bool {
    query
        .field_list
        .as_deref()
        .is_some_and(|fl| fl.split(',').any(|f| f.trim() == "_docid_"))
}

/// Embedder returning the same vector for every text.
pub struct FixedEmbedder(pub Vec<f32>);

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn get_embedding(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.is_empty() {
            return Err(EmbeddingError::generation("empty text"));
        }
        Ok(self.0.clone())
    }

    fn vector_dimension(&self) -> EmbeddingResult<usize> {
        Ok(self.0.len())
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

pub fn engine(schema: Arc<StaticSchema>, solr: Arc<FakeSolr>) -> SolrSqlEngine {
    let config = BridgeConfig::builder()
        .default_collection("docs")
        .build()
        .expect("valid config");
    let vectors = VectorManager::from_config(&config)
        .with_provider(Arc::new(FixedEmbedder(vec![0.5, 0.25])));
    SolrSqlEngine::new(config, schema, solr, vectors).expect("engine builds")
}

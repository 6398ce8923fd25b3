//! Schema retrieval and field validation for collections.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SolrSqlError};
use crate::schema::cache::{CollectionFieldSet, DEFAULT_MAX_AGE, FieldCache};
use crate::schema::document::{FieldListing, SchemaDocument, SchemaField};
use crate::schema::field::{
    DEFAULT_SEARCHABLE_FIELDS, FieldInfo, FieldType, SCORE_FIELD, SortDirection, TEXT_FIELD,
    is_hidden_field, synthetic_sort_fields,
};
use crate::schema::source::{SchemaCatalog, SchemaSource};

/// Searchable and sortable fields derived from a full schema document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionFieldInfo {
    pub searchable_fields: Vec<String>,
    pub sortable_fields: HashMap<String, FieldInfo>,
}

/// Owns the schema document cache, the field type cache and the [`FieldCache`].
///
/// Async methods may contact the [`SchemaSource`]; the [`SchemaCatalog`]
/// implementation only reads what has already been loaded.
pub struct FieldManager {
    source: Arc<dyn SchemaSource>,
    cache: FieldCache,
    schemas: RwLock<HashMap<String, Arc<SchemaDocument>>>,
    field_types: RwLock<HashMap<String, Arc<HashMap<String, String>>>>,
    max_age: Duration,
}

impl FieldManager {
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            source,
            cache: FieldCache::new(),
            schemas: RwLock::new(HashMap::new()),
            field_types: RwLock::new(HashMap::new()),
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Set the age after which cached field sets are refreshed.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn cache(&self) -> &FieldCache {
        &self.cache
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn cached_schema(&self, collection: &str) -> Option<Arc<SchemaDocument>> {
        self.schemas.read().get(collection).cloned()
    }

    fn cached_field_types(&self, collection: &str) -> Option<Arc<HashMap<String, String>>> {
        self.field_types.read().get(collection).cloned()
    }

    fn store_field_types(
        &self,
        collection: &str,
        schema: &SchemaDocument,
    ) -> Arc<HashMap<String, String>> {
        let types = Arc::new(schema.type_map());
        self.field_types
            .write()
            .insert(collection.to_string(), types.clone());
        types
    }

    /// Get the schema document of a collection.
    ///
    /// The document is cached until [`clear_cache`](Self::clear_cache) is called.
    pub async fn get_schema(&self, collection: &str) -> Result<Arc<SchemaDocument>> {
        if let Some(schema) = self.cached_schema(collection) {
            return Ok(schema);
        }

        let fetched = match self.source.fetch_schema(collection).await {
            Ok(response) => SchemaDocument::from_response(&response, collection),
            Err(e) => Err(e),
        };
        let schema = fetched.map_err(|e| {
            error!("Failed to get schema for collection {collection}: {e}");
            SolrSqlError::schema(format!(
                "Failed to get schema for collection {collection}: {}",
                e.message()
            ))
        })?;

        let schema = Arc::new(schema);
        self.schemas
            .write()
            .insert(collection.to_string(), schema.clone());
        Ok(schema)
    }

    /// Map of field names to type names, derived from the schema and cached.
    pub async fn get_field_types(&self, collection: &str) -> Result<Arc<HashMap<String, String>>> {
        if let Some(types) = self.cached_field_types(collection) {
            return Ok(types);
        }
        let schema = self.get_schema(collection).await?;
        Ok(self.store_field_types(collection, &schema))
    }

    pub async fn get_field_type(&self, collection: &str, field: &str) -> Result<String> {
        let types = self.get_field_types(collection).await?;
        types
            .get(field)
            .cloned()
            .ok_or_else(|| SolrSqlError::schema(format!("Field not found: {field}")))
    }

    /// Searchable and sortable fields of a collection, computed from its schema.
    pub async fn get_field_info(&self, collection: &str) -> Result<CollectionFieldInfo> {
        let schema = self.get_schema(collection).await.map_err(|e| {
            error!("Error getting field info: {e}");
            SolrSqlError::schema(format!("Failed to get field info: {}", e.message()))
        })?;
        Ok(field_info_from_schema(&schema))
    }

    /// Sortable descriptor of a single field.
    pub async fn get_field(&self, collection: &str, field: &str) -> Result<FieldInfo> {
        let info = self.get_field_info(collection).await?;
        info.sortable_fields.get(field).cloned().ok_or_else(|| {
            SolrSqlError::schema(format!("Field {field} not found in collection {collection}"))
        })
    }

    pub async fn validate_field_exists(&self, field: &str, collection: &str) -> Result<bool> {
        if field == "*" {
            return Ok(true);
        }
        let info = self.get_field_info(collection).await?;
        if !info.searchable_fields.iter().any(|f| f == field) {
            return Err(SolrSqlError::schema(format!(
                "Field {field} not found in collection {collection}"
            )));
        }
        Ok(true)
    }

    pub async fn validate_sort_field(&self, field: &str, collection: &str) -> Result<bool> {
        let info = self.get_field_info(collection).await?;
        if !info.sortable_fields.contains_key(field) {
            return Err(SolrSqlError::schema(format!(
                "Field {field} is not sortable in collection {collection}"
            )));
        }
        Ok(true)
    }

    pub async fn validate_collection_exists(&self, collection: &str) -> Result<bool> {
        self.get_schema(collection).await.map_err(|_| {
            SolrSqlError::schema(format!("Collection {collection} does not exist"))
        })?;
        Ok(true)
    }

    /// Schema fields of a collection, each annotated with the fields copied into it.
    pub async fn list_fields(&self, collection: &str) -> Result<Vec<FieldListing>> {
        let schema = self.get_schema(collection).await?;
        Ok(schema
            .fields
            .iter()
            .filter(|f| !f.name.is_empty())
            .map(|f| FieldListing {
                field: f.clone(),
                copies_from: schema.copy_sources(&f.name),
            })
            .collect())
    }

    /// Drop cached schema documents and field types for one or all collections.
    pub fn clear_cache(&self, collection: Option<&str>) {
        match collection {
            Some(c) => {
                self.schemas.write().remove(c);
                self.field_types.write().remove(c);
            }
            None => {
                self.schemas.write().clear();
                self.field_types.write().clear();
            }
        }
    }

    /// Load everything the synchronous validators need for a collection.
    ///
    /// The field set is refreshed even when the schema cannot be fetched;
    /// the schema error is still returned.
    pub async fn load(&self, collection: &str) -> Result<()> {
        let (_, types) = futures::join!(
            self.get_collection_fields(collection),
            self.get_field_types(collection)
        );
        types.map(|_| ())
    }

    /// Field set of a collection, served from the [`FieldCache`] while fresh.
    ///
    /// Never fails: discovery falls back to progressively smaller defaults.
    pub async fn get_collection_fields(&self, collection: &str) -> CollectionFieldSet {
        if !self.cache.is_stale(collection, self.max_age)
            && let Some(field_set) = self.cache.get(collection)
        {
            return field_set;
        }

        let (searchable, sortable) = futures::join!(
            self.discover_searchable_fields(collection),
            self.discover_sortable_fields(collection)
        );
        let field_set = CollectionFieldSet::new(searchable, sortable);
        self.cache.set(collection, field_set.clone());

        info!("Loaded field information for collection {collection}");
        debug!("Searchable fields: {:?}", field_set.searchable_fields);
        debug!(
            "Sortable fields: {:?}",
            field_set.sortable_fields.keys().collect::<Vec<_>>()
        );
        field_set
    }

    async fn fetch_field_list(&self, collection: &str) -> Result<Vec<SchemaField>> {
        let response = self.source.fetch_schema_fields(collection).await?;
        SchemaField::list_from_response(&response)
    }

    /// Searchable fields: schema fields API, then a probing select, then defaults.
    pub async fn discover_searchable_fields(&self, collection: &str) -> Vec<String> {
        match self.fetch_field_list(collection).await {
            Ok(fields) => {
                let mut searchable: Vec<String> = fields
                    .iter()
                    .filter(|f| is_searchable_candidate(f))
                    .map(|f| f.name.clone())
                    .collect();
                extend_unique(&mut searchable, DEFAULT_SEARCHABLE_FIELDS);
                info!("Using searchable fields for collection {collection}: {searchable:?}");
                searchable
            }
            Err(e) => {
                warn!("Error getting schema fields for collection {collection}: {e}");
                match self.source.probe_fields(collection).await {
                    Ok(response) => {
                        let mut searchable = echoed_field_list(&response);
                        extend_unique(&mut searchable, DEFAULT_SEARCHABLE_FIELDS);
                        info!(
                            "Using probed searchable fields for collection {collection}: \
                             {searchable:?}"
                        );
                        searchable
                    }
                    Err(e) => {
                        error!("Error getting searchable fields for collection {collection}: {e}");
                        DEFAULT_SEARCHABLE_FIELDS.iter().map(|f| f.to_string()).collect()
                    }
                }
            }
        }
    }

    /// Sortable fields: schema fields API, then a probing select, then `score` only.
    pub async fn discover_sortable_fields(&self, collection: &str) -> HashMap<String, FieldInfo> {
        match self.fetch_field_list(collection).await {
            Ok(fields) => {
                let mut sortable = HashMap::new();
                for field in &fields {
                    if field.name.is_empty()
                        || is_hidden_field(&field.name)
                        || field.is_multi_valued()
                    {
                        continue;
                    }
                    let Some(field_type) = FieldType::from_solr_type(field.type_name()) else {
                        continue;
                    };
                    sortable.insert(
                        field.name.clone(),
                        FieldInfo::sortable(field_type, field_type.default_direction(), true),
                    );
                }
                for (name, info) in synthetic_sort_fields() {
                    sortable.insert(name.to_string(), info);
                }
                sortable
            }
            Err(e) => {
                warn!("Error getting sortable fields for collection {collection}: {e}");
                match self.source.probe_fields(collection).await {
                    Ok(_) => synthetic_sort_fields()
                        .into_iter()
                        .map(|(name, info)| (name.to_string(), info))
                        .collect(),
                    Err(e) => {
                        error!("Error probing collection {collection}: {e}");
                        let mut sortable = HashMap::new();
                        sortable.insert(SCORE_FIELD.to_string(), FieldInfo::score());
                        sortable
                    }
                }
            }
        }
    }

    /// Fail with one error naming every field unknown to the collection.
    pub async fn validate_fields(&self, collection: &str, fields: &[String]) -> Result<()> {
        let field_set = self.get_collection_fields(collection).await;
        check_known_fields(&field_set, collection, fields)
    }

    /// Fail with one error naming every field the collection cannot sort on.
    pub async fn validate_sort_fields(&self, collection: &str, fields: &[String]) -> Result<()> {
        let field_set = self.get_collection_fields(collection).await;
        check_sortable_fields(&field_set, collection, fields)
    }
}

impl SchemaCatalog for FieldManager {
    fn check_collection(&self, collection: &str) -> Result<()> {
        self.cached_schema(collection)
            .map(|_| ())
            .ok_or_else(|| SolrSqlError::schema(format!("Collection {collection} does not exist")))
    }

    fn field_types(&self, collection: &str) -> Result<HashMap<String, String>> {
        if let Some(types) = self.cached_field_types(collection) {
            return Ok(types.as_ref().clone());
        }
        let schema = self.cached_schema(collection).ok_or_else(|| not_loaded(collection))?;
        Ok(self.store_field_types(collection, &schema).as_ref().clone())
    }

    fn sortable_fields(&self, collection: &str) -> Result<HashMap<String, FieldInfo>> {
        let schema = self.cached_schema(collection).ok_or_else(|| not_loaded(collection))?;
        Ok(field_info_from_schema(&schema).sortable_fields)
    }

    fn check_sort_fields(&self, collection: &str, fields: &[String]) -> Result<()> {
        check_sortable_fields(&self.cache.get_or_default(collection), collection, fields)
    }
}

fn not_loaded(collection: &str) -> SolrSqlError {
    SolrSqlError::schema(format!("Schema for collection {collection} is not loaded"))
}

fn field_info_from_schema(schema: &SchemaDocument) -> CollectionFieldInfo {
    let mut searchable_fields = Vec::new();
    let mut sortable_fields = HashMap::new();

    for field in schema.fields.iter().filter(|f| !f.name.is_empty()) {
        if field.is_indexed() {
            searchable_fields.push(field.name.clone());
        }
        if field.has_doc_values() || field.is_stored() {
            let field_type =
                FieldType::from_solr_type(field.type_name()).unwrap_or(FieldType::String);
            sortable_fields.insert(
                field.name.clone(),
                FieldInfo::sortable(field_type, SortDirection::Asc, field.is_indexed()),
            );
        }
    }
    for (name, info) in synthetic_sort_fields() {
        sortable_fields.insert(name.to_string(), info);
    }

    CollectionFieldInfo {
        searchable_fields,
        sortable_fields,
    }
}

fn is_searchable_candidate(field: &SchemaField) -> bool {
    if field.name.is_empty() || (field.name.starts_with('_') && field.name != TEXT_FIELD) {
        return false;
    }
    let ty = field.type_name();
    ty == "text_general" || ty == "string" || ty.contains("text")
}

fn extend_unique(fields: &mut Vec<String>, extra: &[&str]) {
    for name in extra {
        if !fields.iter().any(|f| f == name) {
            fields.push(name.to_string());
        }
    }
}

/// Field names echoed back in `responseHeader.params.fl`.
fn echoed_field_list(response: &Value) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    let raw = match response.pointer("/responseHeader/params/fl") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    for entry in raw {
        for name in entry.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }
    }
    fields
}

fn check_known_fields(
    field_set: &CollectionFieldSet,
    collection: &str,
    fields: &[String],
) -> Result<()> {
    let invalid: Vec<&str> = fields
        .iter()
        .filter(|f| f.as_str() != "*" && !field_set.contains_field(f))
        .map(String::as_str)
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(SolrSqlError::schema(format!(
            "Invalid fields for collection {collection}: {}",
            invalid.join(", ")
        )))
    }
}

fn check_sortable_fields(
    field_set: &CollectionFieldSet,
    collection: &str,
    fields: &[String],
) -> Result<()> {
    let invalid: Vec<&str> = fields
        .iter()
        .filter(|f| !field_set.is_sortable(f))
        .map(String::as_str)
        .collect();
    if invalid.is_empty() {
        Ok(())
    } else {
        Err(SolrSqlError::schema(format!(
            "Fields not sortable in collection {collection}: {}",
            invalid.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    #[derive(Default)]
    struct MockSource {
        schema: Option<Value>,
        fields: Option<Value>,
        probe: Option<Value>,
        schema_calls: AtomicUsize,
        fields_calls: AtomicUsize,
    }

    #[async_trait]
    impl SchemaSource for MockSource {
        async fn fetch_schema(&self, collection: &str) -> Result<Value> {
            self.schema_calls.fetch_add(1, Ordering::SeqCst);
            self.schema
                .clone()
                .ok_or_else(|| SolrSqlError::http(format!("404 for {collection}")))
        }

        async fn fetch_schema_fields(&self, _collection: &str) -> Result<Value> {
            self.fields_calls.fetch_add(1, Ordering::SeqCst);
            self.fields
                .clone()
                .ok_or_else(|| SolrSqlError::http("schema/fields unavailable"))
        }

        async fn probe_fields(&self, _collection: &str) -> Result<Value> {
            self.probe
                .clone()
                .ok_or_else(|| SolrSqlError::http("select unavailable"))
        }
    }

    fn full_source() -> MockSource {
        MockSource {
            schema: Some(json!({
                "schema": {
                    "fields": [
                        {"name": "id", "type": "string", "stored": true, "docValues": true},
                        {"name": "title", "type": "text_general", "stored": false},
                        {"name": "content", "type": "text_general", "stored": false},
                        {"name": "price", "type": "pfloat", "docValues": true},
                        {"name": "hidden", "type": "string", "indexed": false, "stored": true}
                    ],
                    "fieldTypes": [{"name": "string"}, {"name": "text_general"}],
                    "copyFields": [{"source": "title", "dest": "_text_"}]
                }
            })),
            fields: Some(json!({
                "fields": [
                    {"name": "id", "type": "string"},
                    {"name": "title", "type": "text_general"},
                    {"name": "tags", "type": "string", "multiValued": true},
                    {"name": "published", "type": "pdate"},
                    {"name": "active", "type": "boolean"},
                    {"name": "embedding", "type": "knn_vector"},
                    {"name": "_version_", "type": "plong"},
                    {"name": "_text_", "type": "text_general"}
                ]
            })),
            ..Default::default()
        }
    }

    fn manager(source: MockSource) -> (Arc<MockSource>, FieldManager) {
        let source = Arc::new(source);
        (source.clone(), FieldManager::new(source))
    }

    #[tokio::test]
    async fn test_get_schema_is_cached() {
        let (source, manager) = manager(full_source());
        manager.get_schema("docs").await.unwrap();
        manager.get_schema("docs").await.unwrap();
        assert_eq!(source.schema_calls.load(Ordering::SeqCst), 1);

        manager.clear_cache(Some("docs"));
        manager.get_schema("docs").await.unwrap();
        assert_eq!(source.schema_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_schema_without_schema_key() {
        let (_, manager) = manager(MockSource {
            schema: Some(json!({"responseHeader": {}})),
            ..Default::default()
        });
        let err = manager.get_schema("docs").await.unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("Invalid schema response"));
    }

    #[tokio::test]
    async fn test_field_types() {
        let (_, manager) = manager(full_source());
        let types = manager.get_field_types("docs").await.unwrap();
        assert_eq!(types["price"], "pfloat");
        assert_eq!(manager.get_field_type("docs", "title").await.unwrap(), "text_general");

        let err = manager.get_field_type("docs", "missing").await.unwrap_err();
        assert!(err.to_string().contains("Field not found: missing"));
    }

    #[tokio::test]
    async fn test_get_field_info() {
        let (_, manager) = manager(full_source());
        let info = manager.get_field_info("docs").await.unwrap();

        assert_eq!(info.searchable_fields, vec!["id", "title", "content", "price"]);
        assert!(info.sortable_fields.contains_key("id"));
        assert!(info.sortable_fields.contains_key("price"));
        assert!(info.sortable_fields.contains_key("hidden"));
        assert!(!info.sortable_fields.contains_key("title"));
        assert_eq!(info.sortable_fields["price"].field_type, FieldType::Numeric);
        assert!(!info.sortable_fields["hidden"].searchable);
        assert_eq!(info.sortable_fields["score"], FieldInfo::score());
        assert_eq!(info.sortable_fields["_docid_"], FieldInfo::docid());

        let id = manager.get_field("docs", "id").await.unwrap();
        assert_eq!(id.default_direction, SortDirection::Asc);
        let err = manager.get_field("docs", "title").await.unwrap_err();
        assert!(err.is_schema());
    }

    #[tokio::test]
    async fn test_field_info_for_missing_collection_names_it() {
        let (_, manager) = manager(MockSource::default());
        let err = manager.get_field_info("ghost").await.unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn test_single_field_validation() {
        let (_, manager) = manager(full_source());
        assert!(manager.validate_field_exists("*", "docs").await.unwrap());
        assert!(manager.validate_field_exists("title", "docs").await.unwrap());
        assert!(manager.validate_field_exists("hidden", "docs").await.is_err());

        assert!(manager.validate_sort_field("id", "docs").await.unwrap());
        let err = manager.validate_sort_field("content", "docs").await.unwrap_err();
        assert!(err.to_string().contains("not sortable"));

        assert!(manager.validate_collection_exists("docs").await.unwrap());
    }

    #[tokio::test]
    async fn test_validate_collection_missing() {
        let (_, manager) = manager(MockSource::default());
        let err = manager.validate_collection_exists("ghost").await.unwrap_err();
        assert_eq!(err.to_string(), "Schema error: Collection ghost does not exist");
    }

    #[tokio::test]
    async fn test_list_fields_with_copy_sources() {
        let mut source = full_source();
        source.schema = Some(json!({
            "schema": {
                "fields": [
                    {"name": "_text_", "type": "text_general"},
                    {"name": "title", "type": "text_general"}
                ],
                "copyFields": [
                    {"source": "title", "dest": "_text_"},
                    {"source": "body", "dest": "_text_"}
                ]
            }
        }));
        let (_, manager) = manager(source);
        let fields = manager.list_fields("docs").await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].copies_from, vec!["title", "body"]);
        assert!(fields[1].copies_from.is_empty());
    }

    #[tokio::test]
    async fn test_discover_from_schema_fields() {
        let (_, manager) = manager(full_source());

        let searchable = manager.discover_searchable_fields("docs").await;
        assert_eq!(searchable, vec!["id", "title", "tags", "_text_", "content"]);

        let sortable = manager.discover_sortable_fields("docs").await;
        assert!(sortable.contains_key("id"));
        assert_eq!(sortable["published"].field_type, FieldType::Date);
        assert_eq!(sortable["published"].default_direction, SortDirection::Asc);
        assert_eq!(sortable["active"].default_direction, SortDirection::Desc);
        assert!(!sortable.contains_key("tags"));
        assert!(!sortable.contains_key("title"));
        assert!(!sortable.contains_key("embedding"));
        assert!(!sortable.contains_key("_version_"));
        assert!(sortable.contains_key("score"));
        assert!(sortable.contains_key("_docid_"));
    }

    #[tokio::test]
    async fn test_discover_falls_back_to_probe() {
        let (_, manager) = manager(MockSource {
            probe: Some(json!({
                "responseHeader": {"params": {"q": "*:*", "fl": "id,title,author"}}
            })),
            ..Default::default()
        });

        let searchable = manager.discover_searchable_fields("docs").await;
        assert_eq!(searchable, vec!["id", "title", "author", "content", "_text_"]);

        let sortable = manager.discover_sortable_fields("docs").await;
        assert_eq!(sortable.len(), 2);
        assert!(sortable.contains_key("_docid_"));
    }

    #[tokio::test]
    async fn test_discover_falls_back_to_defaults() {
        let (_, manager) = manager(MockSource::default());

        let searchable = manager.discover_searchable_fields("ghost").await;
        assert_eq!(searchable, vec!["content", "title", "_text_"]);

        let sortable = manager.discover_sortable_fields("ghost").await;
        assert_eq!(sortable.len(), 1);
        assert_eq!(sortable["score"], FieldInfo::score());
    }

    #[tokio::test]
    async fn test_collection_fields_cached_until_stale() {
        let (source, manager) = manager(full_source());
        manager.get_collection_fields("docs").await;
        manager.get_collection_fields("docs").await;
        assert_eq!(source.fields_calls.load(Ordering::SeqCst), 2);

        let (source, manager) = {
            let source = Arc::new(full_source());
            let manager = FieldManager::new(source.clone()).with_max_age(Duration::ZERO);
            (source, manager)
        };
        manager.get_collection_fields("docs").await;
        std::thread::sleep(Duration::from_millis(5));
        manager.get_collection_fields("docs").await;
        assert_eq!(source.fields_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_batch_validation_names_all_invalid_fields() {
        let (_, manager) = manager(full_source());
        let fields: Vec<String> = ["id", "bad1", "title", "bad2"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let err = manager.validate_fields("docs", &fields).await.unwrap_err();
        let msg = err.to_string();
        assert!(err.is_schema());
        assert!(msg.ends_with("docs: bad1, bad2"));
        assert!(!msg.contains("title"));

        manager
            .validate_fields("docs", &["*".to_string(), "score".to_string()])
            .await
            .unwrap();

        let err = manager
            .validate_sort_fields(
                "docs",
                &["title".to_string(), "tags".to_string(), "id".to_string()],
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Fields not sortable in collection docs: title, tags"));
    }

    #[tokio::test]
    async fn test_catalog_requires_load() {
        let (_, manager) = manager(full_source());
        assert!(manager.check_collection("docs").is_err());
        assert!(manager.field_types("docs").is_err());

        manager.load("docs").await.unwrap();
        manager.check_collection("docs").unwrap();
        assert_eq!(manager.field_types("docs").unwrap()["id"], "string");
        assert!(manager.sortable_fields("docs").unwrap().contains_key("id"));
        manager
            .check_sort_fields("docs", &["published".to_string()])
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_reports_schema_error_but_caches_fields() {
        let (_, manager) = manager(MockSource::default());
        let err = manager.load("ghost").await.unwrap_err();
        assert!(err.is_schema());

        let cached = manager.cache().get("ghost").unwrap();
        assert!(cached.searchable_fields.contains(&"_text_".to_string()));
    }

    #[test]
    fn test_echoed_field_list_array_form() {
        let fields = echoed_field_list(&json!({
            "responseHeader": {"params": {"fl": ["id,title", "title, body"]}}
        }));
        assert_eq!(fields, vec!["id", "title", "body"]);
        assert!(echoed_field_list(&json!({})).is_empty());
    }
}

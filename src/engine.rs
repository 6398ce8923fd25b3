//! Entry point composing schema loading, query building and vector search.

use std::sync::Arc;

use log::debug;

use crate::client::SearchClient;
use crate::config::{BridgeConfig, EmbeddingOverrides};
use crate::error::{Result, SolrSqlError};
use crate::query::builder::QueryBuilder;
use crate::query::parser::ParsedQuery;
use crate::response::{SearchResponse, normalize_response};
use crate::schema::document::FieldListing;
use crate::schema::field::DOCID_FIELD;
use crate::schema::manager::{CollectionFieldInfo, FieldManager};
use crate::schema::source::SchemaSource;
use crate::vector::manager::VectorManager;
use crate::vector::results::{VectorSearchResults, internal_doc_id};

/// Runs SQL SELECT statements against a search engine.
///
/// Keyword selects are translated into one native request. Vector and
/// semantic selects first run a KNN search, then restrict the statement to
/// the hits and return them in vector relevance order unless the statement
/// has its own ORDER BY.
pub struct SolrSqlEngine {
    config: BridgeConfig,
    fields: Arc<FieldManager>,
    builder: QueryBuilder,
    vectors: VectorManager,
    client: Arc<dyn SearchClient>,
}

impl SolrSqlEngine {
    pub fn new(
        config: BridgeConfig,
        source: Arc<dyn SchemaSource>,
        client: Arc<dyn SearchClient>,
        vectors: VectorManager,
    ) -> Result<Self> {
        config.validate()?;
        let fields =
            Arc::new(FieldManager::new(source).with_max_age(config.field_cache_max_age()));
        let builder = QueryBuilder::new(fields.clone());
        Ok(Self {
            config,
            fields,
            builder,
            vectors,
            client,
        })
    }

    /// Engine talking HTTP to Solr, embedding text through Ollama.
    #[cfg(feature = "http")]
    pub fn connect(config: BridgeConfig) -> Result<Self> {
        use crate::client::HttpSolrClient;
        use crate::embedding::{OllamaEmbedder, ollama_factory};

        let solr = Arc::new(HttpSolrClient::new(&config)?);
        let embedder = OllamaEmbedder::new(config.embedding.clone())?;
        let vectors = VectorManager::from_config(&config)
            .with_provider(Arc::new(embedder))
            .with_factory(Arc::new(ollama_factory()));
        log::info!("Connecting to {}", config.base_url());
        Self::new(config, solr.clone(), solr, vectors)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn field_manager(&self) -> &Arc<FieldManager> {
        &self.fields
    }

    pub fn query_builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn vector_manager(&self) -> &VectorManager {
        &self.vectors
    }

    /// Load the target collection's schema, then parse and validate.
    async fn prepare(&self, sql: &str) -> Result<ParsedQuery> {
        let collection = self.builder.parser().parse(sql)?.collection;
        self.fields.load(&collection).await?;
        self.builder.parse_and_validate(sql)
    }

    pub async fn execute_select(&self, sql: &str) -> Result<SearchResponse> {
        let parsed = self.prepare(sql).await?;
        let spec = self.builder.build_solr_query(&parsed.ast);
        debug!("Native query for {}: {:?}", parsed.collection, spec.to_params());

        let raw = self.client.select(&parsed.collection, &spec).await?;
        normalize_response(&raw)
    }

    /// Run a statement over the nearest neighbours of `vector`.
    ///
    /// KNN fetches LIMIT + OFFSET candidates (LIMIT defaults to the
    /// configured top-k); OFFSET and LIMIT are applied after reordering.
    pub async fn execute_vector_select(
        &self,
        sql: &str,
        vector: &[f32],
    ) -> Result<SearchResponse> {
        let parsed = self.prepare(sql).await?;
        let limit = parsed.ast.limit.unwrap_or(self.vectors.default_top_k() as u64);
        let offset = parsed.ast.offset.unwrap_or(0);
        let top_k = limit
            .checked_add(offset)
            .and_then(|k| usize::try_from(k).ok())
            .ok_or_else(|| SolrSqlError::query("LIMIT + OFFSET too large"))?;

        let raw = self
            .vectors
            .execute_vector_search(
                self.client.as_ref(),
                &parsed.collection,
                vector,
                None,
                Some(top_k),
                None,
            )
            .await?;
        let hits = VectorSearchResults::from_response(&raw, top_k);
        let doc_ids = hits.doc_ids();
        if doc_ids.is_empty() {
            debug!("Vector search on {} found nothing", parsed.collection);
            return Ok(SearchResponse::empty());
        }

        // hits are matched back to the ranking by docid, so it must be returned
        let mut spec = self.builder.build_vector_query(sql, &doc_ids)?;
        spec.ensure_field(DOCID_FIELD);
        spec.start = None;
        spec.rows = Some(doc_ids.len() as u64);

        let raw = self.client.select(&parsed.collection, &spec).await?;
        let mut response = normalize_response(&raw)?;
        if parsed.ast.order_by.is_empty() {
            response.reorder_by(&doc_ids, internal_doc_id);
        }

        response.num_found = response.docs.len() as u64;
        response.start = offset;
        response.docs = response
            .docs
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(response)
    }

    /// Embed `text` and run [`execute_vector_select`](Self::execute_vector_select).
    pub async fn execute_semantic_select(
        &self,
        sql: &str,
        text: &str,
        overrides: Option<&EmbeddingOverrides>,
    ) -> Result<SearchResponse> {
        let vector = self.vectors.get_vector(text, overrides).await?;
        self.execute_vector_select(sql, &vector).await
    }

    /// Schema fields of a collection, or of the default collection.
    pub async fn list_fields(&self, collection: Option<&str>) -> Result<Vec<FieldListing>> {
        let collection = self.config.resolve_collection(collection)?;
        self.fields.list_fields(&collection).await
    }

    pub async fn field_info(&self, collection: Option<&str>) -> Result<CollectionFieldInfo> {
        let collection = self.config.resolve_collection(collection)?;
        self.fields.get_field_info(&collection).await
    }
}

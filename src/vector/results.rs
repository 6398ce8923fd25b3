//! Ranked results of a KNN search.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Field the engine reports vector distance under.
pub const DISTANCE_FIELD: &str = "_vector_distance_";

/// Keys a document's internal ordinal may appear under, most specific first.
const DOCID_ALIASES: [&str; 3] = ["_docid_", "[docid]", "docid"];

/// Render a scalar id value as a string. Numbers keep their JSON text.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Internal document id of a result document, read from the docid aliases only.
pub fn internal_doc_id(doc: &Map<String, Value>) -> Option<String> {
    DOCID_ALIASES
        .iter()
        .find_map(|key| doc.get(*key).and_then(id_text))
}

/// Internal document id of a result document.
///
/// Checks the docid aliases first and falls back to `id`.
pub fn doc_id_of(doc: &Map<String, Value>) -> Option<String> {
    internal_doc_id(doc).or_else(|| doc.get("id").and_then(id_text))
}

/// Same as [`doc_id_of`] but prefers the stored `id` over the aliases.
pub fn stored_id_of(doc: &Map<String, Value>) -> Option<String> {
    std::iter::once(&"id")
        .chain(DOCID_ALIASES.iter())
        .find_map(|key| doc.get(*key).and_then(id_text))
}

/// One hit of a vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchResult {
    pub doc_id: String,
    pub score: f64,
    pub distance: f64,
    /// Every other field of the hit.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl VectorSearchResult {
    fn from_doc(doc: &Map<String, Value>) -> Self {
        let doc_id = doc_id_of(doc).unwrap_or_else(|| "0".to_string());
        let score = doc.get("score").and_then(Value::as_f64).unwrap_or(0.0);
        let distance = doc.get(DISTANCE_FIELD).and_then(Value::as_f64).unwrap_or(0.0);
        let metadata = doc
            .iter()
            .filter(|(k, _)| {
                !DOCID_ALIASES.contains(&k.as_str()) && *k != "score" && *k != DISTANCE_FIELD
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            doc_id,
            score,
            distance,
            metadata,
        }
    }
}

/// Hits of a vector search in relevance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSearchResults {
    pub results: Vec<VectorSearchResult>,
    pub total_found: u64,
    pub top_k: usize,
    pub query_time_ms: Option<u64>,
}

impl VectorSearchResults {
    /// Read a raw select response. Missing sections yield empty results.
    pub fn from_response(response: &Value, top_k: usize) -> Self {
        let body = response.get("response");
        let results = body
            .and_then(|b| b.get("docs"))
            .and_then(Value::as_array)
            .map(|docs| {
                docs.iter()
                    .filter_map(Value::as_object)
                    .map(VectorSearchResult::from_doc)
                    .collect()
            })
            .unwrap_or_default();
        let total_found = body
            .and_then(|b| b.get("numFound"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let query_time_ms = response
            .get("responseHeader")
            .and_then(|h| h.get("QTime"))
            .and_then(Value::as_u64);

        Self {
            results,
            total_found,
            top_k,
            query_time_ms,
        }
    }

    pub fn doc_ids(&self) -> Vec<String> {
        self.results.iter().map(|r| r.doc_id.clone()).collect()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.score).collect()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.distance).collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "results": self.results,
            "metadata": {
                "total_found": self.total_found,
                "top_k": self.top_k,
                "query_time_ms": self.query_time_ms,
            }
        })
    }
}

//! Normalisation of search engine responses.
//!
//! A select request answers with `{"response": {numFound, start, maxScore, docs}}`
//! while the SQL handler answers with `{"result-set": {docs}}`, where the last
//! doc is an `EOF` marker and failures arrive as an `EXCEPTION` doc.
//! [`normalize_response`] turns both into one [`SearchResponse`].

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Result, SolrSqlError};

/// Document fields that hold display text.
pub const TEXT_FIELDS: [&str; 2] = ["title", "content"];

/// A text field stored either as a single value or as a multi-valued list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Scalar(String),
    Repeated(Vec<String>),
}

impl TextValue {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// The canonical single string; a list yields its first entry.
    pub fn into_text(self) -> Option<String> {
        match self {
            TextValue::Scalar(s) => Some(s),
            TextValue::Repeated(values) => values.into_iter().next(),
        }
    }
}

/// Normalised hits of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub num_found: u64,
    pub start: u64,
    pub max_score: Option<f64>,
    pub docs: Vec<Map<String, Value>>,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Reorder docs so those whose key (per `key_of`) appears in `ranking`
    /// come first, in ranking order. Other docs keep their relative order
    /// after them.
    pub fn reorder_by<F>(&mut self, ranking: &[String], key_of: F)
    where
        F: Fn(&Map<String, Value>) -> Option<String>,
    {
        let position = |doc: &Map<String, Value>| {
            key_of(doc)
                .and_then(|key| ranking.iter().position(|id| *id == key))
                .unwrap_or(usize::MAX)
        };
        self.docs.sort_by_key(|doc| position(doc));
    }

    /// The `result-set` rendering handed to callers.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "numFound": self.num_found,
            "start": self.start,
            "docs": self.docs,
        });
        if let Some(max_score) = self.max_score {
            body["maxScore"] = json!(max_score);
        }
        json!({ "result-set": body })
    }
}

/// Convert either response shape into a [`SearchResponse`].
///
/// An `EXCEPTION` doc becomes an error: a query error when the engine failed
/// to parse the statement, a native layer error otherwise.
pub fn normalize_response(raw: &Value) -> Result<SearchResponse> {
    if let Some(body) = raw.get("response") {
        let docs = collect_docs(body.get("docs"));
        return Ok(SearchResponse {
            num_found: body
                .get("numFound")
                .and_then(Value::as_u64)
                .unwrap_or(docs.len() as u64),
            start: body.get("start").and_then(Value::as_u64).unwrap_or(0),
            max_score: body.get("maxScore").and_then(Value::as_f64),
            docs,
        });
    }

    if let Some(body) = raw.get("result-set") {
        let docs = collect_docs(body.get("docs"));
        if let Some(exception) = docs
            .iter()
            .find_map(|doc| doc.get("EXCEPTION").and_then(Value::as_str))
        {
            return Err(exception_error(exception));
        }

        let docs: Vec<_> = docs.into_iter().filter(|d| !d.contains_key("EOF")).collect();
        debug!("Normalised result-set with {} docs", docs.len());
        return Ok(SearchResponse {
            num_found: body
                .get("numFound")
                .and_then(Value::as_u64)
                .unwrap_or(docs.len() as u64),
            start: body.get("start").and_then(Value::as_u64).unwrap_or(0),
            max_score: body.get("maxScore").and_then(Value::as_f64),
            docs,
        });
    }

    Err(SolrSqlError::solr(
        "Unrecognized response: expected 'response' or 'result-set'",
    ))
}

fn exception_error(message: &str) -> SolrSqlError {
    warn!("Search engine reported: {message}");
    if message.contains("must have DocValues") {
        SolrSqlError::solr(format!(
            "Field must have DocValues to be sorted or aggregated: {message}"
        ))
    } else if message.contains("parse failed:") {
        SolrSqlError::query(format!("SQL parse error: {message}"))
    } else {
        SolrSqlError::solr(format!("SQL execution error: {message}"))
    }
}

fn collect_docs(docs: Option<&Value>) -> Vec<Map<String, Value>> {
    docs.and_then(Value::as_array)
        .map(|docs| {
            docs.iter()
                .filter_map(Value::as_object)
                .map(normalize_doc)
                .collect()
        })
        .unwrap_or_default()
}

fn normalize_doc(doc: &Map<String, Value>) -> Map<String, Value> {
    let mut doc = doc.clone();
    for field in TEXT_FIELDS {
        if let Some(text) = doc
            .get(field)
            .and_then(TextValue::from_value)
            .and_then(TextValue::into_text)
        {
            doc.insert(field.to_string(), Value::String(text));
        }
    }
    doc
}

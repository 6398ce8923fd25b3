//! Native (search engine) query parameters produced by the builder.

use serde::{Deserialize, Serialize};

fn default_query() -> String {
    "*:*".to_string()
}

/// Parameters of one native select request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeQuerySpec {
    /// Main query (`q`); match-all unless a KNN query replaces it.
    #[serde(default = "default_query")]
    pub query: String,
    /// Filter queries (`fq`), combined with AND by the engine.
    #[serde(default)]
    pub filter_queries: Vec<String>,
    /// Field list (`fl`); `None` returns every stored field.
    #[serde(default)]
    pub field_list: Option<String>,
    /// Sort clause, e.g. `"title DESC"`.
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub rows: Option<u64>,
    #[serde(default)]
    pub start: Option<u64>,
}

impl Default for NativeQuerySpec {
    fn default() -> Self {
        Self {
            query: default_query(),
            filter_queries: Vec::new(),
            field_list: None,
            sort: None,
            rows: None,
            start: None,
        }
    }
}

impl NativeQuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter_queries.push(filter.into());
        self
    }

    pub fn with_field_list(mut self, field_list: impl Into<String>) -> Self {
        self.field_list = Some(field_list.into());
        self
    }

    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows = Some(rows);
        self
    }

    /// All filter queries as a single clause, or `None` when there are none.
    pub fn filter_clause(&self) -> Option<String> {
        match self.filter_queries.len() {
            0 => None,
            1 => Some(self.filter_queries[0].clone()),
            _ => Some(
                self.filter_queries
                    .iter()
                    .map(|fq| format!("({fq})"))
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        }
    }

    /// Add `field` to the field list unless it is already present.
    ///
    /// An absent field list (all stored fields) becomes `*,<field>`, since
    /// pseudo-fields such as `_docid_` are only returned when named.
    pub fn ensure_field(&mut self, field: &str) {
        match &mut self.field_list {
            None => self.field_list = Some(format!("*,{field}")),
            Some(fl) if !fl.split(',').any(|f| f.trim() == field) => {
                if !fl.is_empty() {
                    fl.push(',');
                }
                fl.push_str(field);
            }
            Some(_) => {}
        }
    }

    /// Request parameters in wire order; `fq` may repeat.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("q".to_string(), self.query.clone())];
        for fq in &self.filter_queries {
            params.push(("fq".to_string(), fq.clone()));
        }
        if let Some(fl) = &self.field_list {
            params.push(("fl".to_string(), fl.clone()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort".to_string(), sort.clone()));
        }
        if let Some(rows) = self.rows {
            params.push(("rows".to_string(), rows.to_string()));
        }
        if let Some(start) = self.start {
            params.push(("start".to_string(), start.to_string()));
        }
        params.push(("wt".to_string(), "json".to_string()));
        params
    }

    /// Value of the first parameter named `name`.
    pub fn param(&self, name: &str) -> Option<String> {
        self.to_params()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

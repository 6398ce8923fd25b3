//! Cross-checks parsed queries against collection schema metadata.
//!
//! Every failure surfaces as a query error, whatever the underlying cause.

use std::sync::Arc;

use crate::error::{Result, SolrSqlError};
use crate::schema::field::{SortDirection, is_synthetic_sort_field};
use crate::schema::source::SchemaCatalog;

pub struct QueryValidator {
    catalog: Arc<dyn SchemaCatalog>,
}

impl QueryValidator {
    pub fn new(catalog: Arc<dyn SchemaCatalog>) -> Self {
        Self { catalog }
    }

    /// Fail on the first field the collection does not define.
    ///
    /// `*` and the synthetic `score`/`_docid_` fields always pass.
    pub fn validate_fields(&self, collection: &str, fields: &[String]) -> Result<()> {
        let field_types = self
            .catalog
            .field_types(collection)
            .map_err(|e| SolrSqlError::query(format!("Field validation error: {}", e.message())))?;

        for field in fields {
            if field == "*" || is_synthetic_sort_field(field) {
                continue;
            }
            if !field_types.contains_key(field) {
                return Err(SolrSqlError::query(format!("Invalid field '{field}'")));
            }
        }
        Ok(())
    }

    pub fn validate_sort_fields(&self, collection: &str, fields: &[String]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        self.catalog
            .check_sort_fields(collection, fields)
            .map_err(|e| {
                SolrSqlError::query(format!("Sort field validation error: {}", e.message()))
            })
    }

    /// Normalise a `"field [direction]"` sort specification.
    ///
    /// Returns `None` for an absent or blank specification. A missing
    /// direction is replaced by the field's default direction.
    pub fn validate_sort(&self, sort: Option<&str>, collection: &str) -> Result<Option<String>> {
        let Some(sort) = sort.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let parts: Vec<&str> = sort.split_whitespace().collect();
        if parts.len() > 2 {
            return Err(SolrSqlError::query(format!(
                "Invalid sort format '{sort}'. Must be 'field' or 'field direction'"
            )));
        }
        let field = parts[0];

        let sortable = self.catalog.sortable_fields(collection).map_err(|e| {
            SolrSqlError::query(format!("Sort field validation error: {}", e.message()))
        })?;
        let info = sortable
            .get(field)
            .ok_or_else(|| SolrSqlError::query(format!("Field '{field}' is not sortable")))?;

        let direction = match parts.get(1) {
            None => info.default_direction,
            Some(raw) => SortDirection::parse(raw)
                .filter(|d| info.supports(*d))
                .ok_or_else(|| {
                    SolrSqlError::query(format!(
                        "Invalid sort direction '{raw}' for field '{field}'"
                    ))
                })?,
        };

        Ok(Some(format!("{field} {direction}")))
    }
}

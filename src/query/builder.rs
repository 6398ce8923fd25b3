//! Builds native queries from validated SQL.

use std::sync::Arc;

use log::debug;

use crate::error::{Result, SolrSqlError};
use crate::query::ast::{OrderByItem, Projection, SelectStatement};
use crate::query::native::NativeQuerySpec;
use crate::query::parser::{ParsedQuery, QueryParser};
use crate::query::translate::{escape_term, to_filter_query};
use crate::query::validator::QueryValidator;
use crate::schema::field::DOCID_FIELD;
use crate::schema::source::SchemaCatalog;

/// Parses, validates and translates SELECT statements.
pub struct QueryBuilder {
    parser: QueryParser,
    validator: QueryValidator,
    catalog: Arc<dyn SchemaCatalog>,
}

impl QueryBuilder {
    pub fn new(catalog: Arc<dyn SchemaCatalog>) -> Self {
        Self {
            parser: QueryParser::new(),
            validator: QueryValidator::new(catalog.clone()),
            catalog,
        }
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    pub fn validator(&self) -> &QueryValidator {
        &self.validator
    }

    /// Parse a statement and check its collection, projected fields and sort fields.
    ///
    /// Any failure is reported as a query error, including an unknown collection.
    pub fn parse_and_validate(&self, query: &str) -> Result<ParsedQuery> {
        debug!("Parsing query: {query}");
        let parsed = self.parser.parse(query)?;

        self.catalog
            .check_collection(&parsed.collection)
            .map_err(|e| SolrSqlError::query(e.message()))?;
        self.validator
            .validate_fields(&parsed.collection, &parsed.source_fields())?;
        self.validator
            .validate_sort_fields(&parsed.collection, &parsed.sort_field_names())?;

        Ok(parsed)
    }

    /// [`parse_and_validate`](Self::parse_and_validate) without the sort fields.
    pub fn parse_and_validate_select(
        &self,
        query: &str,
    ) -> Result<(SelectStatement, String, Vec<String>)> {
        let parsed = self.parse_and_validate(query)?;
        Ok((parsed.ast, parsed.collection, parsed.fields))
    }

    /// Translate a statement into native query parameters.
    pub fn build_solr_query(&self, ast: &SelectStatement) -> NativeQuerySpec {
        let mut spec = NativeQuerySpec::new();
        if let Some(selection) = &ast.selection {
            spec.filter_queries.push(to_filter_query(selection));
        }
        spec.field_list = field_list(&ast.projection);
        spec.sort = sort_clause(&ast.order_by);
        spec.rows = ast.limit;
        spec.start = ast.offset;
        spec
    }

    /// Restrict a statement to the documents found by a vector search.
    ///
    /// The ID filter is a separate `fq`, so it is ANDed with the WHERE filter.
    /// With no IDs the statement is translated without an ID filter and its
    /// OFFSET is dropped.
    pub fn build_vector_query(
        &self,
        base_query: &str,
        doc_ids: &[String],
    ) -> Result<NativeQuerySpec> {
        let (ast, collection, _) = self.parser.parse_select(base_query)?;
        let mut spec = self.build_solr_query(&ast);

        if doc_ids.is_empty() {
            debug!("No document IDs for vector query on {collection}");
            spec.start = None;
        } else {
            spec.filter_queries.push(doc_id_filter(doc_ids));
        }
        Ok(spec)
    }

    pub fn validate_sort(&self, sort: Option<&str>, collection: &str) -> Result<Option<String>> {
        self.validator.validate_sort(sort, collection)
    }

    pub fn extract_sort_fields(&self, sort: &str) -> Vec<String> {
        self.parser.extract_sort_fields(sort)
    }
}

/// `_docid_:(id1 OR id2 ...)`, keeping the given order.
pub fn doc_id_filter(doc_ids: &[String]) -> String {
    let ids: Vec<String> = doc_ids.iter().map(|id| escape_term(id)).collect();
    format!("{DOCID_FIELD}:({})", ids.join(" OR "))
}

fn field_list(projection: &Projection) -> Option<String> {
    match projection {
        Projection::Wildcard => None,
        Projection::Columns(items) => Some(
            items
                .iter()
                .map(|item| match &item.alias {
                    Some(alias) => format!("{alias}:{}", item.column),
                    None => item.column.clone(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

fn sort_clause(order_by: &[OrderByItem]) -> Option<String> {
    if order_by.is_empty() {
        return None;
    }
    Some(
        order_by
            .iter()
            .map(|item| format!("{} {}", item.column, item.effective_direction().as_sql()))
            .collect::<Vec<_>>()
            .join(","),
    )
}

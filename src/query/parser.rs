//! SQL parser for the restricted SELECT dialect.
//!
//! Statements go through [`preprocess_query`] first, which rewrites the
//! search engine's `field:value` shorthand into SQL equality so that queries
//! mixing both styles still parse.

use std::borrow::Cow;

use lazy_static::lazy_static;
use log::debug;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SolrSqlError};
use crate::query::ast::{
    CompareOp, Expr, Literal, OrderByItem, Projection, SelectItem, SelectStatement,
};
use crate::schema::field::SortDirection;

#[derive(Parser)]
#[grammar = "query/sql.pest"]
struct SqlGrammar;

lazy_static! {
    // Quoted SQL strings are matched first and copied through untouched.
    static ref SHORTHAND: Regex = Regex::new(
        r#"'(?:[^']|'')*'|([A-Za-z_][\w.]*):("(?:[^"\\]|\\.)*"|'(?:[^']|'')*'|[^\s'"(),:\[\]{}]+)"#
    )
    .expect("shorthand pattern is valid");
}

/// Rewrite `field:value` tokens into `field = 'value'`.
///
/// Values may be bare, double-quoted or single-quoted. Text inside SQL
/// string literals is left alone.
pub fn preprocess_query(query: &str) -> String {
    SHORTHAND
        .replace_all(query, |caps: &Captures| {
            let (Some(field), Some(value)) = (caps.get(1), caps.get(2)) else {
                return caps[0].to_string();
            };
            let raw = value.as_str();
            let double_quoted = raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"');
            let escaped: Cow<str> = if double_quoted {
                Cow::Owned(raw[1..raw.len() - 1].replace("\\\"", "\"").replace('\'', "''"))
            } else if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
                Cow::Borrowed(&raw[1..raw.len() - 1])
            } else {
                Cow::Owned(raw.replace('\'', "''"))
            };
            format!("{} = '{}'", field.as_str(), escaped)
        })
        .into_owned()
}

/// Result of parsing one SELECT statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub ast: SelectStatement,
    pub collection: String,
    /// Projected names with aliases applied, or `["*"]`.
    pub fields: Vec<String>,
    pub sort_fields: Vec<(String, SortDirection)>,
}

impl ParsedQuery {
    /// Projected column names before aliasing.
    pub fn source_fields(&self) -> Vec<String> {
        self.ast.projection.source_columns()
    }

    pub fn sort_field_names(&self) -> Vec<String> {
        self.sort_fields.iter().map(|(f, _)| f.clone()).collect()
    }
}

/// Parser for the SELECT dialect.
#[derive(Debug, Clone, Default)]
pub struct QueryParser;

impl QueryParser {
    pub fn new() -> Self {
        Self
    }

    pub fn preprocess_query(&self, query: &str) -> String {
        preprocess_query(query)
    }

    /// Parse a statement into its AST, target collection and projected names.
    pub fn parse_select(&self, query: &str) -> Result<(SelectStatement, String, Vec<String>)> {
        let processed = preprocess_query(query);
        debug!("Preprocessed query: {processed}");

        if !starts_with_select(&processed) {
            return Err(SolrSqlError::query("Only SELECT statements are supported"));
        }

        let statement = parse_statement(&processed)?;
        let collection = match statement.from.as_deref().map(str::trim) {
            None => return Err(SolrSqlError::query("FROM clause is required")),
            Some("") => return Err(SolrSqlError::query("FROM clause must name a collection")),
            Some(c) => c.to_string(),
        };
        let fields = statement.projection.display_names();
        Ok((statement, collection, fields))
    }

    /// [`parse_select`](Self::parse_select) plus the ORDER BY fields.
    pub fn parse(&self, query: &str) -> Result<ParsedQuery> {
        let (ast, collection, fields) = self.parse_select(query)?;
        let sort_fields = self.get_sort_fields(&ast);
        Ok(ParsedQuery {
            ast,
            collection,
            fields,
            sort_fields,
        })
    }

    /// ORDER BY entries, ascending when no direction is written.
    pub fn get_sort_fields(&self, ast: &SelectStatement) -> Vec<(String, SortDirection)> {
        ast.order_by
            .iter()
            .map(|item| (item.column.clone(), item.effective_direction()))
            .collect()
    }

    /// Field names of a flat `"field dir, field dir"` sort string.
    pub fn extract_sort_fields(&self, sort: &str) -> Vec<String> {
        sort.split(',')
            .filter_map(|entry| entry.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }
}

fn starts_with_select(query: &str) -> bool {
    let trimmed = query.trim_start();
    match trimmed.get(..6) {
        Some(head) if head.eq_ignore_ascii_case("select") => !trimmed[6..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// Parse a statement without the FROM checks of [`QueryParser::parse_select`].
pub fn parse_statement(sql: &str) -> Result<SelectStatement> {
    let mut pairs = SqlGrammar::parse(Rule::statement, sql)
        .map_err(|e| SolrSqlError::query(format!("Invalid SQL syntax: {e}")))?;

    let statement = pairs
        .next()
        .and_then(|p| p.into_inner().find(|p| p.as_rule() == Rule::select_stmt))
        .ok_or_else(|| SolrSqlError::query("Invalid SQL syntax: missing SELECT statement"))?;
    build_select(statement)
}

fn build_select(pair: Pair<Rule>) -> Result<SelectStatement> {
    let mut statement = SelectStatement {
        projection: Projection::Wildcard,
        from: None,
        selection: None,
        order_by: Vec::new(),
        limit: None,
        offset: None,
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::select_list => statement.projection = build_projection(inner),
            Rule::from_clause => {
                let table = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::table_ref)
                    .map(build_table)
                    .unwrap_or_default();
                statement.from = Some(table);
            }
            Rule::where_clause => {
                if let Some(expr) = inner.into_inner().find(|p| p.as_rule() == Rule::expr) {
                    statement.selection = Some(build_expr(expr)?);
                }
            }
            Rule::order_clause => {
                statement.order_by = inner
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::order_item)
                    .map(build_order_item)
                    .collect();
            }
            Rule::limit_clause => statement.limit = Some(parse_count(inner, "LIMIT")?),
            Rule::offset_clause => statement.offset = Some(parse_count(inner, "OFFSET")?),
            _ => {}
        }
    }

    Ok(statement)
}

fn build_projection(pair: Pair<Rule>) -> Projection {
    let mut items = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::star => return Projection::Wildcard,
            Rule::select_item => {
                let mut column = String::new();
                let mut alias = None;
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::name => column = build_name(part),
                        Rule::alias => {
                            alias = part
                                .into_inner()
                                .find(|p| p.as_rule() == Rule::name)
                                .map(build_name);
                        }
                        _ => {}
                    }
                }
                items.push(SelectItem { column, alias });
            }
            _ => {}
        }
    }
    Projection::Columns(items)
}

fn build_name(pair: Pair<Rule>) -> String {
    match pair.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::quoted_ident => inner
            .into_inner()
            .next()
            .map(|p| p.as_str().to_string())
            .unwrap_or_default(),
        Some(inner) => inner.as_str().to_string(),
        None => String::new(),
    }
}

fn build_table(pair: Pair<Rule>) -> String {
    match pair.into_inner().next() {
        Some(inner) => match inner.as_rule() {
            Rule::quoted_ident => inner
                .into_inner()
                .next()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default(),
            Rule::string_lit => unquote(inner),
            _ => inner.as_str().to_string(),
        },
        None => String::new(),
    }
}

fn unquote(string_lit: Pair<Rule>) -> String {
    string_lit
        .into_inner()
        .next()
        .map(|p| p.as_str().replace("''", "'"))
        .unwrap_or_default()
}

fn build_order_item(pair: Pair<Rule>) -> OrderByItem {
    let mut column = String::new();
    let mut direction = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::name => column = build_name(inner),
            Rule::kw_asc => direction = Some(SortDirection::Asc),
            Rule::kw_desc => direction = Some(SortDirection::Desc),
            _ => {}
        }
    }
    OrderByItem { column, direction }
}

fn parse_count(pair: Pair<Rule>, clause: &str) -> Result<u64> {
    let text = pair
        .into_inner()
        .find(|p| p.as_rule() == Rule::integer)
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    text.parse::<u64>()
        .map_err(|_| SolrSqlError::query(format!("Invalid {clause} value '{text}'")))
}

fn build_expr(pair: Pair<Rule>) -> Result<Expr> {
    match pair.into_inner().next() {
        Some(or_expr) => build_or(or_expr),
        None => Err(SolrSqlError::query("Invalid SQL syntax: empty WHERE clause")),
    }
}

fn build_or(pair: Pair<Rule>) -> Result<Expr> {
    let mut items = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::and_expr)
        .map(build_and)
        .collect::<Result<Vec<_>>>()?;
    Ok(if items.len() == 1 {
        items.remove(0)
    } else {
        Expr::Or(items)
    })
}

fn build_and(pair: Pair<Rule>) -> Result<Expr> {
    let mut items = pair
        .into_inner()
        .filter(|p| p.as_rule() == Rule::not_expr)
        .map(build_not)
        .collect::<Result<Vec<_>>>()?;
    Ok(if items.len() == 1 {
        items.remove(0)
    } else {
        Expr::And(items)
    })
}

fn build_not(pair: Pair<Rule>) -> Result<Expr> {
    let mut negated = false;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::kw_not => negated = true,
            Rule::not_expr => return Ok(Expr::Not(Box::new(build_not(inner)?))),
            Rule::primary => {
                let expr = build_primary(inner)?;
                return Ok(if negated { Expr::Not(Box::new(expr)) } else { expr });
            }
            _ => {}
        }
    }
    Err(SolrSqlError::query("Invalid SQL syntax: dangling NOT"))
}

fn build_primary(pair: Pair<Rule>) -> Result<Expr> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| SolrSqlError::query("Invalid SQL syntax: empty expression"))?;
    match inner.as_rule() {
        Rule::expr => build_expr(inner),
        Rule::predicate => {
            let predicate = inner
                .into_inner()
                .next()
                .ok_or_else(|| SolrSqlError::query("Invalid SQL syntax: empty predicate"))?;
            build_predicate(predicate)
        }
        _ => Err(SolrSqlError::query(format!(
            "Unsupported expression: {}",
            inner.as_str()
        ))),
    }
}

fn build_predicate(pair: Pair<Rule>) -> Result<Expr> {
    let rule = pair.as_rule();
    let text = pair.as_str().to_string();

    let mut column = String::new();
    let mut negated = false;
    let mut op = None;
    let mut literals = Vec::new();
    let mut pattern = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::name => column = build_name(inner),
            Rule::kw_not => negated = true,
            Rule::comp_op => op = CompareOp::from_symbol(inner.as_str()),
            Rule::literal => literals.push(build_literal(inner)?),
            Rule::string_lit => pattern = Some(unquote(inner)),
            _ => {}
        }
    }

    match rule {
        Rule::comparison => {
            let op = op.ok_or_else(|| {
                SolrSqlError::query(format!("Unsupported comparison operator in '{text}'"))
            })?;
            let value = literals.pop().unwrap_or(Literal::Null);
            match (op, value) {
                (CompareOp::Eq, Literal::Null) => Ok(Expr::IsNull {
                    column,
                    negated: false,
                }),
                (CompareOp::NotEq, Literal::Null) => Ok(Expr::IsNull {
                    column,
                    negated: true,
                }),
                (_, Literal::Null) => Err(SolrSqlError::query(format!(
                    "Unsupported comparison with NULL in '{text}'"
                ))),
                (op, value) => Ok(Expr::Compare { column, op, value }),
            }
        }
        Rule::in_pred => Ok(Expr::InList {
            column,
            values: literals,
            negated,
        }),
        Rule::null_pred => Ok(Expr::IsNull { column, negated }),
        Rule::like_pred => Ok(Expr::Like {
            column,
            pattern: pattern.unwrap_or_default(),
            negated,
        }),
        Rule::between_pred => {
            let mut bounds = literals.into_iter();
            match (bounds.next(), bounds.next()) {
                (Some(low), Some(high)) => Ok(Expr::Between {
                    column,
                    low,
                    high,
                    negated,
                }),
                _ => Err(SolrSqlError::query(format!("Invalid BETWEEN in '{text}'"))),
            }
        }
        _ => Err(SolrSqlError::query(format!("Unsupported predicate '{text}'"))),
    }
}

fn build_literal(pair: Pair<Rule>) -> Result<Literal> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| SolrSqlError::query("Invalid SQL syntax: empty literal"))?;
    Ok(match inner.as_rule() {
        Rule::string_lit => Literal::String(unquote(inner)),
        Rule::number => Literal::Number(inner.as_str().to_string()),
        Rule::kw_true => Literal::Boolean(true),
        Rule::kw_false => Literal::Boolean(false),
        _ => Literal::Null,
    })
}

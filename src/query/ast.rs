//! Syntax tree of the supported SELECT dialect.

use serde::{Deserialize, Serialize};

use crate::schema::field::SortDirection;

/// A parsed `SELECT ... FROM ... [WHERE] [ORDER BY] [LIMIT] [OFFSET]` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    pub projection: Projection,
    /// Target collection; `None` when the statement has no FROM clause.
    pub from: Option<String>,
    pub selection: Option<Expr>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    Wildcard,
    Columns(Vec<SelectItem>),
}

impl Projection {
    /// Names shown to the caller: aliases where given, `["*"]` for a wildcard.
    pub fn display_names(&self) -> Vec<String> {
        match self {
            Projection::Wildcard => vec!["*".to_string()],
            Projection::Columns(items) => {
                items.iter().map(|i| i.display_name().to_string()).collect()
            }
        }
    }

    /// Names of the underlying columns, ignoring aliases.
    pub fn source_columns(&self) -> Vec<String> {
        match self {
            Projection::Wildcard => vec!["*".to_string()],
            Projection::Columns(items) => items.iter().map(|i| i.column.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectItem {
    pub column: String,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub column: String,
    /// `None` when the ORDER BY entry carries no ASC/DESC keyword.
    pub direction: Option<SortDirection>,
}

impl OrderByItem {
    pub fn effective_direction(&self) -> SortDirection {
        self.direction.unwrap_or(SortDirection::Asc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(CompareOp::Eq),
            "<>" | "!=" => Some(CompareOp::NotEq),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::LtEq),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::GtEq),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    /// Numeric literal kept in its source spelling.
    Number(String),
    Boolean(bool),
    Null,
}

/// WHERE clause expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Compare {
        column: String,
        op: CompareOp,
        value: Literal,
    },
    InList {
        column: String,
        values: Vec<Literal>,
        negated: bool,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    Like {
        column: String,
        pattern: String,
        negated: bool,
    },
    Between {
        column: String,
        low: Literal,
        high: Literal,
        negated: bool,
    },
}

impl Expr {
    /// Shorthand for `column = 'value'`.
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Expr::Compare {
            column: column.into(),
            op: CompareOp::Eq,
            value: Literal::String(value.into()),
        }
    }

    /// Columns referenced anywhere in the expression, in order of appearance.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::And(items) | Expr::Or(items) => {
                for item in items {
                    item.collect_columns(out);
                }
            }
            Expr::Not(inner) => inner.collect_columns(out),
            Expr::Compare { column, .. }
            | Expr::InList { column, .. }
            | Expr::IsNull { column, .. }
            | Expr::Like { column, .. }
            | Expr::Between { column, .. } => {
                if !out.contains(&column.as_str()) {
                    out.push(column);
                }
            }
        }
    }
}

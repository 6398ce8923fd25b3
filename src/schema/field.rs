//! Field metadata used for sort and projection validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolrSqlError};

/// Relevance score pseudo-field.
pub const SCORE_FIELD: &str = "score";
/// Internal Lucene document ordinal pseudo-field.
pub const DOCID_FIELD: &str = "_docid_";
/// Catch-all text field allowed through the underscore filter.
pub const TEXT_FIELD: &str = "_text_";

/// Searchable fields assumed when field discovery fails entirely.
pub const DEFAULT_SEARCHABLE_FIELDS: &[&str] = &["content", "title", TEXT_FIELD];

/// Sort direction of an ORDER BY entry or a sort specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a direction keyword, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    /// Lowercase form used in normalised sort strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Uppercase SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simplified type system sortable fields are mapped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Numeric,
    Date,
    Boolean,
}

impl FieldType {
    /// Map a Solr field type name into the simplified type system.
    ///
    /// Returns `None` for types that cannot be sorted on (text, vectors, ...).
    pub fn from_solr_type(type_name: &str) -> Option<FieldType> {
        match type_name {
            "string" | "pstring" => Some(FieldType::String),
            "pint" | "plong" | "pfloat" | "pdouble" | "int" | "long" | "float" | "double"
            | "tint" | "tlong" | "tfloat" | "tdouble" => Some(FieldType::Numeric),
            "pdate" | "date" | "tdate" => Some(FieldType::Date),
            "boolean" => Some(FieldType::Boolean),
            _ => None,
        }
    }

    /// Direction applied when a sort names only the field.
    pub fn default_direction(&self) -> SortDirection {
        match self {
            FieldType::String | FieldType::Numeric | FieldType::Date => SortDirection::Asc,
            FieldType::Boolean => SortDirection::Desc,
        }
    }
}

/// Descriptor of a sortable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub directions: Vec<SortDirection>,
    pub default_direction: SortDirection,
    pub searchable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl FieldInfo {
    /// Create a descriptor, checking that `default_direction` is one of `directions`.
    pub fn new(
        field_type: FieldType,
        directions: Vec<SortDirection>,
        default_direction: SortDirection,
        searchable: bool,
    ) -> Result<Self> {
        let mut unique: Vec<SortDirection> = Vec::with_capacity(directions.len());
        for direction in directions {
            if !unique.contains(&direction) {
                unique.push(direction);
            }
        }
        if unique.is_empty() {
            return Err(SolrSqlError::schema("Sort directions must not be empty"));
        }
        if !unique.contains(&default_direction) {
            return Err(SolrSqlError::schema(format!(
                "Default direction '{}' is not one of the allowed directions",
                default_direction
            )));
        }
        Ok(Self {
            field_type,
            directions: unique,
            default_direction,
            searchable,
            warning: None,
        })
    }

    /// A field sortable in both directions.
    pub fn sortable(
        field_type: FieldType,
        default_direction: SortDirection,
        searchable: bool,
    ) -> Self {
        Self {
            field_type,
            directions: vec![SortDirection::Asc, SortDirection::Desc],
            default_direction,
            searchable,
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    pub fn supports(&self, direction: SortDirection) -> bool {
        self.directions.contains(&direction)
    }

    /// The synthetic `score` entry.
    pub fn score() -> Self {
        Self::sortable(FieldType::Numeric, SortDirection::Desc, true)
    }

    /// The synthetic `_docid_` entry.
    pub fn docid() -> Self {
        Self::sortable(FieldType::Numeric, SortDirection::Asc, false).with_warning(
            "_docid_ is an internal Lucene document ordinal, not a stable identifier",
        )
    }
}

/// Pseudo-fields that are always sortable, regardless of schema.
pub fn synthetic_sort_fields() -> Vec<(&'static str, FieldInfo)> {
    vec![(SCORE_FIELD, FieldInfo::score()), (DOCID_FIELD, FieldInfo::docid())]
}

pub fn is_synthetic_sort_field(name: &str) -> bool {
    name == SCORE_FIELD || name == DOCID_FIELD
}

/// Underscore-prefixed fields are internal unless explicitly passed through.
pub(crate) fn is_hidden_field(name: &str) -> bool {
    name.starts_with('_') && name != TEXT_FIELD && !is_synthetic_sort_field(name)
}

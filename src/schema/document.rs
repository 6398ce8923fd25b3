//! Typed view of the schema documents returned by the search engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SolrSqlError};

/// A field definition as reported by the schema API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored: Option<bool>,
    #[serde(rename = "docValues", default, skip_serializing_if = "Option::is_none")]
    pub doc_values: Option<bool>,
    #[serde(rename = "multiValued", default, skip_serializing_if = "Option::is_none")]
    pub multi_valued: Option<bool>,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: Some(field_type.into()),
            ..Default::default()
        }
    }

    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = Some(indexed);
        self
    }

    pub fn stored(mut self, stored: bool) -> Self {
        self.stored = Some(stored);
        self
    }

    pub fn doc_values(mut self, doc_values: bool) -> Self {
        self.doc_values = Some(doc_values);
        self
    }

    pub fn multi_valued(mut self, multi_valued: bool) -> Self {
        self.multi_valued = Some(multi_valued);
        self
    }

    /// Fields are indexed unless the schema says otherwise.
    pub fn is_indexed(&self) -> bool {
        self.indexed.unwrap_or(true)
    }

    pub fn is_stored(&self) -> bool {
        self.stored.unwrap_or(false)
    }

    pub fn has_doc_values(&self) -> bool {
        self.doc_values.unwrap_or(false)
    }

    pub fn is_multi_valued(&self) -> bool {
        self.multi_valued.unwrap_or(false)
    }

    pub fn type_name(&self) -> &str {
        self.field_type.as_deref().unwrap_or("")
    }

    /// Parse the `fields` array of a `schema/fields` response.
    ///
    /// A response without a `fields` key yields an empty list.
    pub fn list_from_response(response: &Value) -> Result<Vec<SchemaField>> {
        match response.get("fields") {
            Some(fields) => serde_json::from_value(fields.clone())
                .map_err(|e| SolrSqlError::schema(format!("Malformed schema fields: {e}"))),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaFieldType {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyField {
    pub source: String,
    pub dest: String,
}

/// The `schema` object of a schema API response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "uniqueKey", default, skip_serializing_if = "Option::is_none")]
    pub unique_key: Option<String>,
    #[serde(default)]
    pub fields: Vec<SchemaField>,
    #[serde(rename = "fieldTypes", default)]
    pub field_types: Vec<SchemaFieldType>,
    #[serde(rename = "copyFields", default)]
    pub copy_fields: Vec<CopyField>,
}

impl SchemaDocument {
    /// Extract the schema from a raw schema API response.
    pub fn from_response(response: &Value, collection: &str) -> Result<Self> {
        let schema = response.get("schema").ok_or_else(|| {
            SolrSqlError::schema(format!("Invalid schema response for collection {collection}"))
        })?;
        serde_json::from_value(schema.clone()).map_err(|e| {
            SolrSqlError::schema(format!(
                "Malformed schema for collection {collection}: {e}"
            ))
        })
    }

    /// Map of field (and field type) names to type names.
    ///
    /// Field type names map to themselves, so a type name is also a valid key.
    pub fn type_map(&self) -> HashMap<String, String> {
        let mut types = HashMap::new();
        for field_type in &self.field_types {
            if !field_type.name.is_empty() {
                types.insert(field_type.name.clone(), field_type.name.clone());
            }
        }
        for field in &self.fields {
            if let Some(ty) = &field.field_type
                && !field.name.is_empty()
            {
                types.insert(field.name.clone(), ty.clone());
            }
        }
        types
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Source fields copied into `dest`, in declaration order.
    pub fn copy_sources(&self, dest: &str) -> Vec<String> {
        self.copy_fields
            .iter()
            .filter(|c| c.dest == dest)
            .map(|c| c.source.clone())
            .collect()
    }
}

/// A schema field listing entry, annotated with its copy-field sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldListing {
    #[serde(flatten)]
    pub field: SchemaField,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub copies_from: Vec<String>,
}

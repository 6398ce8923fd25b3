//! Collection schema access: field metadata, caching and validation.

pub mod cache;
pub mod document;
pub mod field;
pub mod manager;
pub mod source;

pub use cache::{CollectionFieldSet, FieldCache, FieldSetUpdate};
pub use document::{CopyField, FieldListing, SchemaDocument, SchemaField, SchemaFieldType};
pub use field::{FieldInfo, FieldType, SortDirection};
pub use manager::{CollectionFieldInfo, FieldManager};
pub use source::{SchemaCatalog, SchemaSource};

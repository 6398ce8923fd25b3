//! Per-collection cache of searchable and sortable field metadata.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::schema::field::{FieldInfo, SCORE_FIELD, TEXT_FIELD};

/// Default age after which an entry must be refreshed.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

/// Searchable and sortable fields of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionFieldSet {
    /// Field names in discovery order, without duplicates.
    pub searchable_fields: Vec<String>,
    pub sortable_fields: HashMap<String, FieldInfo>,
    pub last_updated: DateTime<Utc>,
}

impl CollectionFieldSet {
    pub fn new(
        searchable_fields: Vec<String>,
        sortable_fields: HashMap<String, FieldInfo>,
    ) -> Self {
        let mut unique = Vec::with_capacity(searchable_fields.len());
        for field in searchable_fields {
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self {
            searchable_fields: unique,
            sortable_fields,
            last_updated: Utc::now(),
        }
    }

    /// Minimal safe set: `_text_` searchable, `score` sortable.
    pub fn minimal_default() -> Self {
        let mut sortable = HashMap::new();
        sortable.insert(SCORE_FIELD.to_string(), FieldInfo::score());
        Self::new(vec![TEXT_FIELD.to_string()], sortable)
    }

    /// True if the field is searchable or sortable.
    pub fn contains_field(&self, field: &str) -> bool {
        self.searchable_fields.iter().any(|f| f == field)
            || self.sortable_fields.contains_key(field)
    }

    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortable_fields.contains_key(field)
    }
}

/// Partial update merged into an existing entry by [`FieldCache::update`].
#[derive(Debug, Clone, Default)]
pub struct FieldSetUpdate {
    pub searchable_fields: Option<Vec<String>>,
    pub sortable_fields: Option<HashMap<String, FieldInfo>>,
}

/// In-memory field metadata cache keyed by collection name.
///
/// Every write replaces one collection's entry; concurrent refreshes of the
/// same collection are last-writer-wins.
#[derive(Debug, Default)]
pub struct FieldCache {
    entries: RwLock<HashMap<String, CollectionFieldSet>>,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, collection: &str) -> Option<CollectionFieldSet> {
        self.entries.read().get(collection).cloned()
    }

    /// Store a field set, stamping it with the current time.
    pub fn set(&self, collection: &str, field_set: CollectionFieldSet) {
        self.set_at(collection, field_set, Utc::now());
    }

    pub(crate) fn set_at(
        &self,
        collection: &str,
        mut field_set: CollectionFieldSet,
        at: DateTime<Utc>,
    ) {
        field_set.last_updated = at;
        self.entries.write().insert(collection.to_string(), field_set);
    }

    /// An absent entry is stale; a present one is stale once older than `max_age`.
    pub fn is_stale(&self, collection: &str, max_age: Duration) -> bool {
        self.is_stale_at(collection, max_age, Utc::now())
    }

    pub(crate) fn is_stale_at(
        &self,
        collection: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        let guard = self.entries.read();
        let Some(entry) = guard.get(collection) else {
            return true;
        };
        match now.signed_duration_since(entry.last_updated).to_std() {
            Ok(elapsed) => elapsed > max_age,
            // clock went backwards
            Err(_) => false,
        }
    }

    /// The cached entry, or [`CollectionFieldSet::minimal_default`] without caching it.
    pub fn get_or_default(&self, collection: &str) -> CollectionFieldSet {
        self.get(collection)
            .unwrap_or_else(CollectionFieldSet::minimal_default)
    }

    /// Merge a partial update into the entry, creating it if needed.
    pub fn update(&self, collection: &str, update: FieldSetUpdate) {
        let mut guard = self.entries.write();
        let entry = guard
            .entry(collection.to_string())
            .or_insert_with(|| CollectionFieldSet::new(Vec::new(), HashMap::new()));
        if let Some(searchable) = update.searchable_fields {
            entry.searchable_fields = searchable;
        }
        if let Some(sortable) = update.sortable_fields {
            entry.sortable_fields = sortable;
        }
        entry.last_updated = Utc::now();
    }

    /// Remove one collection's entry, or every entry when `collection` is `None`.
    pub fn clear(&self, collection: Option<&str>) {
        let mut guard = self.entries.write();
        match collection {
            Some(c) => {
                guard.remove(c);
            }
            None => guard.clear(),
        }
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.entries.read().contains_key(collection)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Document Storage Module
//!
//! Persistence for characters and abilities, treated by the rest of the
//! service as a black box behind [`DocumentStore`].
//!
//! ## Backends
//!
//! - [`MemoryStore`] - process-local maps, used when `DATA_DIR` is unset and in tests
//! - [`FsStore`] - one JSON file per document under `DATA_DIR`
//!
//! ## Storage Layout (file backend)
//!
//! ```text
//! $DATA_DIR/
//!   characters/{id}.json
//!   abilities/{id}.json
//! ```
//!
//! ## Consistency
//!
//! Every call touches a single document (or reads a collection). There is
//! no multi-document transaction: an ownership check and the write that
//! follows it are two separate calls, so concurrent writers to the same
//! document resolve last-write-wins.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::models::DocumentId;

pub mod fs;
pub mod memory;
pub mod ownership;
pub mod paths;
pub mod repository;

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use ownership::{OwnedResource, OwnershipCheck, OwnershipEnforcer, OwnershipError};
pub use paths::StoragePaths;
pub use repository::Repository;

/// A stored document: a JSON object whose `id` field holds its [`DocumentId`].
pub type Document = Map<String, Value>;

/// The collections the service stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Characters,
    Abilities,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Characters => "characters",
            Collection::Abilities => "abilities",
        }
    }

    /// The collection this one's relationship ids point into.
    pub fn counterpart(&self) -> Collection {
        match self {
            Collection::Characters => Collection::Abilities,
            Collection::Abilities => Collection::Characters,
        }
    }

    pub const ALL: [Collection; 2] = [Collection::Characters, Collection::Abilities];
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner set field of every current document.
pub const OWNERS_FIELD: &str = "owners";

/// Single-owner field of older documents, superseded by [`OWNERS_FIELD`].
pub const LEGACY_OWNER_FIELD: &str = "owner";

/// Query predicate for [`DocumentStore::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Documents whose owner set contains this identity.
    OwnedBy(String),
    /// Documents with one of these ids.
    IdIn(Vec<DocumentId>),
}

impl DocumentFilter {
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            // The legacy field only counts when no owner set was ever written.
            DocumentFilter::OwnedBy(identity) => match document.get(OWNERS_FIELD) {
                Some(owners) => owners
                    .as_array()
                    .is_some_and(|owners| owners.iter().any(|o| o.as_str() == Some(identity))),
                None => {
                    document.get(LEGACY_OWNER_FIELD).and_then(Value::as_str) == Some(identity)
                }
            },
            DocumentFilter::IdIn(ids) => {
                document_id(document).is_some_and(|id| ids.contains(&id))
            }
        }
    }
}

/// Read the `id` field of a stored document.
pub fn document_id(document: &Document) -> Option<DocumentId> {
    document
        .get("id")
        .and_then(Value::as_str)
        .and_then(DocumentId::parse)
}

/// A partial update of one stored document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    set: Document,
    unset: Vec<String>,
    guard: Option<(String, Value)>,
}

impl FieldUpdate {
    /// Overwrite these top-level fields.
    pub fn set(fields: Document) -> Self {
        Self {
            set: fields,
            ..Self::default()
        }
    }

    /// Also remove a top-level field.
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.push(field.into());
        self
    }

    /// Apply only while `field` still holds `expected`.
    pub fn only_if(mut self, field: impl Into<String>, expected: Value) -> Self {
        self.guard = Some((field.into(), expected));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Apply to `document` in place. Returns `false`, leaving it untouched,
    /// when the guard does not hold.
    pub fn apply(self, document: &mut Document) -> bool {
        if let Some((field, expected)) = &self.guard {
            if document.get(field) != Some(expected) {
                return false;
            }
        }
        for field in &self.unset {
            document.remove(field);
        }
        for (key, value) in self.set {
            document.insert(key, value);
        }
        true
    }
}

/// Result of [`DocumentStore::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    /// The guard of the update did not hold; nothing was written.
    Conflict,
}

/// Error type for document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    /// A stored document no longer matches its schema.
    #[error("Corrupt document: {0}")]
    Corrupt(String),
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable document persistence.
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in a collection.
    async fn find_all(&self, collection: Collection) -> StoreResult<Vec<Document>>;

    async fn find_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> StoreResult<Option<Document>>;

    /// Documents matching a filter.
    async fn find(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> StoreResult<Vec<Document>> {
        let documents = self.find_all(collection).await?;
        Ok(documents
            .into_iter()
            .filter(|document| filter.matches(document))
            .collect())
    }

    /// Store a new document. Fails with `AlreadyExists` on an id clash.
    async fn insert(
        &self,
        collection: Collection,
        id: DocumentId,
        document: Document,
    ) -> StoreResult<()>;

    /// Apply a partial update to an existing document.
    ///
    /// The guard check and the write happen under one lock.
    async fn update(
        &self,
        collection: Collection,
        id: DocumentId,
        update: FieldUpdate,
    ) -> StoreResult<UpdateOutcome>;

    /// Remove a document. Returns `false` if it did not exist.
    async fn delete(&self, collection: Collection, id: DocumentId) -> StoreResult<bool>;

    /// The subset of `ids` that exist in the collection.
    async fn existing_ids(
        &self,
        collection: Collection,
        ids: &[DocumentId],
    ) -> StoreResult<HashSet<DocumentId>>;

    /// Check the backend is usable.
    async fn health_check(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test documents are objects"),
        }
    }

    #[test]
    fn owned_by_matches_list_and_legacy_owner() {
        let filter = DocumentFilter::OwnedBy("user-1".into());

        assert!(filter.matches(&doc(json!({ "owners": ["user-2", "user-1"] }))));
        assert!(filter.matches(&doc(json!({ "owner": "user-1" }))));
        assert!(!filter.matches(&doc(json!({ "owners": ["user-2"] }))));
        assert!(!filter.matches(&doc(json!({ "name": "unowned" }))));
    }

    #[test]
    fn owner_set_overrides_stale_legacy_owner() {
        let filter = DocumentFilter::OwnedBy("user-1".into());
        assert!(!filter.matches(&doc(json!({ "owner": "user-1", "owners": ["user-2"] }))));
    }

    #[test]
    fn field_update_sets_unsets_and_respects_guard() {
        let mut document = doc(json!({ "owner": "user-1", "name": "Aria", "abilities": [] }));

        let stale = FieldUpdate::set(doc(json!({ "name": "Stale" })))
            .only_if("abilities", json!(["x"]));
        assert!(!stale.apply(&mut document));
        assert_eq!(document["name"], "Aria");

        let update = FieldUpdate::set(doc(json!({ "owners": ["user-1", "user-2"] })))
            .unset(LEGACY_OWNER_FIELD)
            .only_if("abilities", json!([]));
        assert!(update.apply(&mut document));
        assert!(!document.contains_key(LEGACY_OWNER_FIELD));
        assert_eq!(document["owners"], json!(["user-1", "user-2"]));
    }

    #[test]
    fn id_in_matches_listed_ids() {
        let wanted = DocumentId::new();
        let filter = DocumentFilter::IdIn(vec![wanted]);

        assert!(filter.matches(&doc(json!({ "id": wanted.to_string() }))));
        assert!(!filter.matches(&doc(json!({ "id": DocumentId::new().to_string() }))));
        assert!(!filter.matches(&doc(json!({ "id": "abc" }))));
    }

    #[test]
    fn counterparts_are_symmetric() {
        for collection in Collection::ALL {
            assert_eq!(collection.counterpart().counterpart(), collection);
        }
    }
}

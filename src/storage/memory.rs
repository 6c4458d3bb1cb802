// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory document store.
//!
//! Used when no `DATA_DIR` is configured and throughout the tests. Contents
//! are lost on restart.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    Collection, Document, DocumentStore, FieldUpdate, StoreError, StoreResult, UpdateOutcome,
};
use crate::models::DocumentId;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<DocumentId, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.get(&id))
            .cloned())
    }

    async fn insert(
        &self,
        collection: Collection,
        id: DocumentId,
        document: Document,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();
        if documents.contains_key(&id) {
            return Err(StoreError::AlreadyExists(format!("{collection}/{id}")));
        }
        documents.insert(id, document);
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: DocumentId,
        update: FieldUpdate,
    ) -> StoreResult<UpdateOutcome> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(&collection)
            .and_then(|documents| documents.get_mut(&id))
        else {
            return Ok(UpdateOutcome::NotFound);
        };

        Ok(if update.apply(document) {
            UpdateOutcome::Updated
        } else {
            UpdateOutcome::Conflict
        })
    }

    async fn delete(&self, collection: Collection, id: DocumentId) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&collection)
            .is_some_and(|documents| documents.remove(&id).is_some()))
    }

    async fn existing_ids(
        &self,
        collection: Collection,
        ids: &[DocumentId],
    ) -> StoreResult<HashSet<DocumentId>> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(&collection) else {
            return Ok(HashSet::new());
        };
        Ok(ids
            .iter()
            .filter(|id| documents.contains_key(id))
            .copied()
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed access to one collection of the document store.
//!
//! [`Repository`] turns raw JSON documents into characters or abilities and
//! back. Documents that no longer deserialize are reported as
//! [`StoreError::Corrupt`] on direct lookup and skipped (with a warning) in
//! listings, so one bad file does not take a whole listing down.

use std::marker::PhantomData;

use serde_json::Value;

use super::{
    Document, DocumentFilter, DocumentStore, FieldUpdate, StoreError, StoreResult, UpdateOutcome,
    LEGACY_OWNER_FIELD, OWNERS_FIELD,
};
use crate::models::{DocumentId, Resource};

/// Repository for one resource kind.
pub struct Repository<'a, R> {
    store: &'a dyn DocumentStore,
    _resource: PhantomData<R>,
}

impl<'a, R: Resource> Repository<'a, R> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            _resource: PhantomData,
        }
    }

    /// Get a document by id, or `None` if it does not exist.
    pub async fn get(&self, id: DocumentId) -> StoreResult<Option<R>> {
        match self.store.find_by_id(R::COLLECTION, id).await? {
            Some(document) => decode::<R>(document).map(Some),
            None => Ok(None),
        }
    }

    /// Every document whose owner set contains `user_id`.
    pub async fn list_owned_by(&self, user_id: &str) -> StoreResult<Vec<R>> {
        let filter = DocumentFilter::OwnedBy(user_id.to_string());
        let documents = self.store.find(R::COLLECTION, &filter).await?;
        Ok(decode_all(documents))
    }

    /// Documents with the given ids, in store order. Missing ids are skipped.
    pub async fn find_many(&self, ids: &[DocumentId]) -> StoreResult<Vec<R>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = DocumentFilter::IdIn(ids.to_vec());
        let documents = self.store.find(R::COLLECTION, &filter).await?;
        Ok(decode_all(documents))
    }

    /// Every decodable document in the collection, regardless of owner.
    pub async fn list_all(&self) -> StoreResult<Vec<R>> {
        let documents = self.store.find_all(R::COLLECTION).await?;
        Ok(decode_all(documents))
    }

    /// Store a new document.
    pub async fn insert(&self, resource: &R) -> StoreResult<()> {
        self.store
            .insert(R::COLLECTION, resource.id(), encode(resource)?)
            .await
    }

    /// Write back only the named fields of `resource`.
    ///
    /// Fields the resource does not serialize (an absent optional) are
    /// skipped. Writing the owner set also drops a legacy `owner` field.
    /// Returns `false` if the document has gone away.
    pub async fn update_fields(&self, resource: &R, fields: &[&str]) -> StoreResult<bool> {
        let mut encoded = encode(resource)?;
        let partial: Document = fields
            .iter()
            .filter_map(|field| encoded.remove(*field).map(|value| (field.to_string(), value)))
            .collect();
        let writes_owners = partial.contains_key(OWNERS_FIELD);

        let mut update = FieldUpdate::set(partial);
        if writes_owners {
            update = update.unset(LEGACY_OWNER_FIELD);
        }
        if update.is_empty() {
            return Ok(true);
        }
        let outcome = self.store.update(R::COLLECTION, resource.id(), update).await?;
        Ok(outcome == UpdateOutcome::Updated)
    }

    /// Replace only the relationship list of a document, and only if it
    /// still equals `expected`.
    pub async fn replace_links(
        &self,
        id: DocumentId,
        expected: &[DocumentId],
        links: &[DocumentId],
    ) -> StoreResult<UpdateOutcome> {
        let mut partial = Document::new();
        partial.insert(R::LINK_FIELD.to_string(), serde_json::to_value(links)?);
        let update =
            FieldUpdate::set(partial).only_if(R::LINK_FIELD, serde_json::to_value(expected)?);
        self.store.update(R::COLLECTION, id, update).await
    }

    /// Delete a document. Returns `false` if it did not exist.
    pub async fn delete(&self, id: DocumentId) -> StoreResult<bool> {
        self.store.delete(R::COLLECTION, id).await
    }
}

fn encode<R: Resource>(resource: &R) -> StoreResult<Document> {
    match serde_json::to_value(resource)? {
        Value::Object(document) => Ok(document),
        _ => Err(StoreError::Corrupt(format!(
            "{} {} did not serialize to an object",
            R::KIND,
            resource.id()
        ))),
    }
}

fn decode<R: Resource>(document: Document) -> StoreResult<R> {
    let id = super::document_id(&document);
    serde_json::from_value(Value::Object(document)).map_err(|e| {
        StoreError::Corrupt(format!(
            "{} {}: {e}",
            R::KIND,
            id.map(|id| id.to_string()).unwrap_or_else(|| "<no id>".into())
        ))
    })
}

fn decode_all<R: Resource>(documents: Vec<Document>) -> Vec<R> {
    documents
        .into_iter()
        .filter_map(|document| match decode::<R>(document) {
            Ok(resource) => Some(resource),
            Err(e) => {
                tracing::warn!(collection = %R::COLLECTION, error = %e, "Skipping unreadable document");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ability, AbilityDraft, Character, OwnerSet};
    use crate::storage::{Collection, MemoryStore};
    use serde_json::json;

    fn ability(owner: &str, name: &str) -> Ability {
        let draft: AbilityDraft =
            serde_json::from_value(json!({ "name": name, "type": "Offensive" })).unwrap();
        Ability::from_draft(DocumentId::new(), owner, draft, Vec::new()).unwrap()
    }

    #[tokio::test]
    async fn insert_get_and_delete() {
        let store = MemoryStore::new();
        let repo = Repository::<Ability>::new(&store);
        let fireball = ability("user-1", "Fireball");

        repo.insert(&fireball).await.unwrap();
        assert_eq!(repo.get(fireball.id).await.unwrap(), Some(fireball.clone()));

        assert!(repo.delete(fireball.id).await.unwrap());
        assert_eq!(repo.get(fireball.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_owned_by_skips_corrupt_documents() {
        let store = MemoryStore::new();
        let repo = Repository::<Ability>::new(&store);
        repo.insert(&ability("user-1", "Fireball")).await.unwrap();
        repo.insert(&ability("user-2", "Frostbite")).await.unwrap();

        let broken = DocumentId::new();
        let document = match json!({ "id": broken.to_string(), "owners": ["user-1"] }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        store
            .insert(Collection::Abilities, broken, document)
            .await
            .unwrap();

        let mine = repo.list_owned_by("user-1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Fireball");

        assert!(matches!(
            repo.get(broken).await,
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn update_fields_writes_only_named_fields() {
        let store = MemoryStore::new();
        let repo = Repository::<Ability>::new(&store);
        let mut fireball = ability("user-1", "Fireball");
        repo.insert(&fireball).await.unwrap();

        // A concurrent writer changes the type.
        let mut other = Document::new();
        other.insert("type".into(), json!("Support"));
        store
            .update(Collection::Abilities, fireball.id, FieldUpdate::set(other))
            .await
            .unwrap();

        fireball.name = "Greater Fireball".into();
        assert!(repo.update_fields(&fireball, &["name"]).await.unwrap());

        let stored = repo.get(fireball.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Greater Fireball");
        assert_eq!(stored.kind, "Support");
    }

    #[tokio::test]
    async fn writing_owners_migrates_legacy_owner() {
        let store = MemoryStore::new();
        let repo = Repository::<Ability>::new(&store);
        let id = DocumentId::new();
        let legacy = match json!({
            "id": id.to_string(),
            "name": "Ember",
            "type": "Offensive",
            "owner": "user-1"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        store.insert(Collection::Abilities, id, legacy).await.unwrap();

        let mut ember = repo.get(id).await.unwrap().unwrap();
        ember.owners = OwnerSet::single("user-2");
        assert!(repo.update_fields(&ember, &["owners"]).await.unwrap());

        let raw = store.find_by_id(Collection::Abilities, id).await.unwrap().unwrap();
        assert!(!raw.contains_key(LEGACY_OWNER_FIELD));
        assert_eq!(repo.get(id).await.unwrap().unwrap().owners, OwnerSet::single("user-2"));
        assert!(repo.list_owned_by("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_links_refuses_changed_list() {
        let store = MemoryStore::new();
        let repo = Repository::<Ability>::new(&store);
        let fireball = ability("user-1", "Fireball");
        repo.insert(&fireball).await.unwrap();

        let written = DocumentId::new();
        let outcome = repo.replace_links(fireball.id, &[], &[written]).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Updated);

        // The list moved on since `expected` was read.
        let outcome = repo.replace_links(fireball.id, &[], &[]).await.unwrap();
        assert_eq!(outcome, UpdateOutcome::Conflict);
        let stored = repo.get(fireball.id).await.unwrap().unwrap();
        assert_eq!(stored.characters_who_use, vec![written]);

        let outcome = Repository::<Character>::new(&store)
            .replace_links(DocumentId::new(), &[], &[])
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn find_many_ignores_missing_ids() {
        let store = MemoryStore::new();
        let repo = Repository::<Ability>::new(&store);
        let fireball = ability("user-2", "Fireball");
        repo.insert(&fireball).await.unwrap();

        let found = repo
            .find_many(&[fireball.id, DocumentId::new()])
            .await
            .unwrap();
        assert_eq!(found, vec![fireball]);
        assert!(repo.find_many(&[]).await.unwrap().is_empty());
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-backed document store.
//!
//! Each document is a pretty-printed JSON file named after its id. Writes go
//! to a temp file first and are renamed into place, so a reader never sees a
//! half-written document. Writers are serialized by a process-local mutex;
//! the store does not coordinate with other processes sharing the directory.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    document_id, Collection, Document, DocumentStore, FieldUpdate, StoragePaths, StoreError,
    StoreResult, UpdateOutcome,
};
use crate::models::DocumentId;

pub struct FsStore {
    paths: StoragePaths,
    write_lock: Mutex<()>,
}

impl FsStore {
    /// Open a store rooted at `paths`, creating the collection directories.
    ///
    /// Safe to call on an existing layout.
    pub fn open(paths: StoragePaths) -> StoreResult<Self> {
        for collection in Collection::ALL {
            fs::create_dir_all(paths.collection_dir(collection))?;
        }
        Ok(Self {
            paths,
            write_lock: Mutex::new(()),
        })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    fn read_document(&self, path: &Path) -> StoreResult<Document> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write a JSON file (atomic write via rename).
    fn write_document(&self, path: &Path, document: &Document) -> StoreResult<()> {
        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, document)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Ids of every document file in a collection, sorted.
    fn list_ids(&self, collection: Collection) -> StoreResult<Vec<DocumentId>> {
        let dir = self.paths.collection_dir(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(DocumentId::parse)
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn find_all(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        for id in self.list_ids(collection)? {
            match self.read_document(&self.paths.document(collection, id)) {
                Ok(document) => documents.push(document),
                // Deleted between listing and reading.
                Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(documents)
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> StoreResult<Option<Document>> {
        let path = self.paths.document(collection, id);
        match self.read_document(&path) {
            Ok(document) => Ok(Some(document)),
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn insert(
        &self,
        collection: Collection,
        id: DocumentId,
        document: Document,
    ) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.paths.document(collection, id);
        if path.exists() {
            return Err(StoreError::AlreadyExists(format!("{collection}/{id}")));
        }
        self.write_document(&path, &document)
    }

    async fn update(
        &self,
        collection: Collection,
        id: DocumentId,
        update: FieldUpdate,
    ) -> StoreResult<UpdateOutcome> {
        let _guard = self.write_lock.lock().await;
        let path = self.paths.document(collection, id);
        let mut document = match self.read_document(&path) {
            Ok(document) => document,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(UpdateOutcome::NotFound)
            }
            Err(e) => return Err(e),
        };

        if document_id(&document) != Some(id) {
            return Err(StoreError::Corrupt(format!(
                "{collection}/{id}: id field does not match file name"
            )));
        }

        if !update.apply(&mut document) {
            return Ok(UpdateOutcome::Conflict);
        }
        self.write_document(&path, &document)?;
        Ok(UpdateOutcome::Updated)
    }

    async fn delete(&self, collection: Collection, id: DocumentId) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(self.paths.document(collection, id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn existing_ids(
        &self,
        collection: Collection,
        ids: &[DocumentId],
    ) -> StoreResult<HashSet<DocumentId>> {
        Ok(ids
            .iter()
            .filter(|id| self.paths.document(collection, **id).is_file())
            .copied()
            .collect())
    }

    /// Write-read-delete round trip on a scratch file.
    async fn health_check(&self) -> StoreResult<()> {
        let probe = self.paths.health_probe();
        let data = b"health_check_data";

        fs::write(&probe, data)?;
        let read_back = fs::read(&probe)?;
        fs::remove_file(&probe)?;

        if read_back != data {
            return Err(StoreError::IntegrityViolation(
                "Health check data mismatch".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DocumentFilter;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn test_store() -> (FsStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FsStore::open(StoragePaths::new(temp_dir.path())).expect("Failed to open");
        (store, temp_dir)
    }

    fn doc(id: DocumentId, owner: &str) -> Document {
        match json!({ "id": id.to_string(), "name": "Ember", "owners": [owner] }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn open_creates_collection_dirs() {
        let (store, _temp_dir) = test_store();
        for collection in Collection::ALL {
            assert!(store.paths().collection_dir(collection).is_dir());
        }
    }

    #[tokio::test]
    async fn insert_then_read_back() {
        let (store, _temp_dir) = test_store();
        let id = DocumentId::new();
        store
            .insert(Collection::Abilities, id, doc(id, "user-1"))
            .await
            .unwrap();

        let loaded = store
            .find_by_id(Collection::Abilities, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, doc(id, "user-1"));
        assert!(store
            .find_by_id(Collection::Abilities, DocumentId::new())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_writes_only_given_fields() {
        let (store, _temp_dir) = test_store();
        let id = DocumentId::new();
        store
            .insert(Collection::Characters, id, doc(id, "user-1"))
            .await
            .unwrap();

        let mut fields = Document::new();
        fields.insert("name".into(), json!("Cinder"));
        let update = FieldUpdate::set(fields).unset("owners");
        assert_eq!(
            store.update(Collection::Characters, id, update).await.unwrap(),
            UpdateOutcome::Updated
        );

        let loaded = store
            .find_by_id(Collection::Characters, id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded["name"], "Cinder");
        assert!(!loaded.contains_key("owners"));

        let stale = FieldUpdate::set(Document::new()).only_if("name", json!("Ember"));
        assert_eq!(
            store.update(Collection::Characters, id, stale).await.unwrap(),
            UpdateOutcome::Conflict
        );

        // No temp file is left behind by the atomic rename.
        let leftovers: Vec<_> = fs::read_dir(store.paths().collection_dir(Collection::Characters))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn delete_and_existing_ids() {
        let (store, _temp_dir) = test_store();
        let kept = DocumentId::new();
        let removed = DocumentId::new();
        for id in [kept, removed] {
            store
                .insert(Collection::Characters, id, doc(id, "user-1"))
                .await
                .unwrap();
        }

        assert!(store.delete(Collection::Characters, removed).await.unwrap());
        assert!(!store.delete(Collection::Characters, removed).await.unwrap());

        let existing = store
            .existing_ids(Collection::Characters, &[kept, removed])
            .await
            .unwrap();
        assert_eq!(existing, HashSet::from([kept]));
    }

    #[tokio::test]
    async fn find_scopes_to_owner_and_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = FsStore::open(StoragePaths::new(temp_dir.path())).unwrap();
            for owner in ["user-1", "user-2"] {
                let id = DocumentId::new();
                store
                    .insert(Collection::Characters, id, doc(id, owner))
                    .await
                    .unwrap();
            }
        }

        let reopened = FsStore::open(StoragePaths::new(temp_dir.path())).unwrap();
        let mine = reopened
            .find(
                Collection::Characters,
                &DocumentFilter::OwnedBy("user-2".into()),
            )
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0]["owners"], json!(["user-2"]));
    }

    #[tokio::test]
    async fn health_check_works() {
        let (store, _temp_dir) = test_store();
        store.health_check().await.expect("Health check should pass");
    }
}

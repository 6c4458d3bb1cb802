// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for the file-backed document layout.

use std::path::{Path, PathBuf};

use super::Collection;
use crate::models::DocumentId;

/// Storage path utilities for the file backend.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    /// Layout rooted at `root` (the `DATA_DIR` directory).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory containing every document of a collection.
    pub fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.as_str())
    }

    /// Path to a specific document file.
    pub fn document(&self, collection: Collection, id: DocumentId) -> PathBuf {
        self.collection_dir(collection).join(format!("{id}.json"))
    }

    /// Scratch file used by the health check.
    pub fn health_probe(&self) -> PathBuf {
        self.root.join(".health_check")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_paths_nest_under_collection() {
        let paths = StoragePaths::new("/tmp/newworld");
        let id = DocumentId::new();

        assert_eq!(
            paths.collection_dir(Collection::Abilities),
            PathBuf::from("/tmp/newworld/abilities")
        );
        assert_eq!(
            paths.document(Collection::Characters, id),
            PathBuf::from(format!("/tmp/newworld/characters/{id}.json"))
        );
    }

    #[test]
    fn health_probe_sits_at_root() {
        let paths = StoragePaths::new("/tmp/newworld");
        assert_eq!(paths.health_probe(), PathBuf::from("/tmp/newworld/.health_check"));
    }
}

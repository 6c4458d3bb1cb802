// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ownership-Scoped Access Controller
//!
//! Gates every read and write on a character or ability by the caller's
//! identity. Written once over [`Expandable`] and used for both kinds.
//!
//! | Operation | Missing | Not an owner |
//! |-----------|---------|--------------|
//! | list      | n/a     | excluded     |
//! | get       | 404     | 404          |
//! | update    | 404     | 403          |
//! | delete    | 404     | 403          |
//!
//! Reads fold "not yours" into "not found" so ids cannot be probed. Writes
//! report 403 explicitly. The ownership check and the write are separate
//! store calls; concurrent updates to one document are last-write-wins.

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::{DocumentId, Resource};
use crate::relations::{self, Expandable};
use crate::storage::{DocumentStore, OwnershipCheck, OwnershipEnforcer, Repository};

/// Per-request access controller for one resource kind.
pub struct AccessController<'a, R> {
    store: &'a dyn DocumentStore,
    repo: Repository<'a, R>,
}

impl<'a, R: Expandable> AccessController<'a, R> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            repo: Repository::new(store),
        }
    }

    /// Parse a path id, rejecting malformed ones before any store call.
    pub fn parse_id(raw: &str) -> Result<DocumentId, ApiError> {
        DocumentId::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid {} ID", kind_lower::<R>())))
    }

    fn not_found() -> ApiError {
        ApiError::not_found(format!("{} not found", R::KIND))
    }

    fn forbidden() -> ApiError {
        ApiError::forbidden(format!(
            "Forbidden: you are not an owner of this {}",
            kind_lower::<R>()
        ))
    }

    /// Fetch for a write: absent is 404, foreign is 403.
    async fn load_for_write(
        &self,
        user: &AuthenticatedUser,
        raw_id: &str,
    ) -> Result<R, ApiError> {
        let id = Self::parse_id(raw_id)?;
        let resource = self.repo.get(id).await?.ok_or_else(Self::not_found)?;
        if let Err(e) = resource.verify_ownership(user) {
            tracing::info!(kind = R::KIND, id = %id, error = %e, "Write refused");
            return Err(Self::forbidden());
        }
        Ok(resource)
    }

    /// Every document the caller owns, expanded.
    pub async fn list(&self, user: &AuthenticatedUser) -> Result<Vec<R::View>, ApiError> {
        let owned = self.repo.list_owned_by(&user.user_id).await?;
        Ok(relations::expand_all(self.store, owned).await?)
    }

    /// One document the caller owns, expanded.
    pub async fn get(&self, user: &AuthenticatedUser, raw_id: &str) -> Result<R::View, ApiError> {
        let id = Self::parse_id(raw_id)?;
        let resource = self
            .repo
            .get(id)
            .await?
            .visible_to(user)
            .map_err(|_| Self::not_found())?;
        Ok(relations::expand(self.store, resource).await?)
    }

    /// Create a document owned by exactly the caller.
    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        draft: R::Draft,
    ) -> Result<R::View, ApiError> {
        let links = relations::filter_existing(
            self.store,
            R::COLLECTION.counterpart(),
            R::draft_links(&draft),
        )
        .await?;

        let resource = R::from_draft(DocumentId::new(), &user.user_id, draft, links)?;
        self.repo.insert(&resource).await?;
        tracing::info!(kind = R::KIND, id = %resource.id(), user_id = %user.user_id, "Created");

        Ok(relations::expand(self.store, resource).await?)
    }

    /// Apply a partial update. Only the supplied fields are written back.
    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        raw_id: &str,
        patch: R::Patch,
    ) -> Result<R::View, ApiError> {
        let mut resource = self.load_for_write(user, raw_id).await?;

        let links = match R::patch_links(&patch) {
            Some(raw) => Some(
                relations::filter_existing(self.store, R::COLLECTION.counterpart(), raw).await?,
            ),
            None => None,
        };
        let touched = resource.apply(patch, links)?;

        // Deleted between the fetch and the write.
        if !self.repo.update_fields(&resource, &touched).await? {
            return Err(Self::not_found());
        }
        tracing::info!(kind = R::KIND, id = %resource.id(), fields = ?touched, "Updated");

        Ok(relations::expand(self.store, resource).await?)
    }

    /// Hard delete. Links held by other documents are left dangling.
    pub async fn delete(&self, user: &AuthenticatedUser, raw_id: &str) -> Result<(), ApiError> {
        let resource = self.load_for_write(user, raw_id).await?;
        if !self.repo.delete(resource.id()).await? {
            return Err(Self::not_found());
        }
        tracing::info!(kind = R::KIND, id = %resource.id(), user_id = %user.user_id, "Deleted");
        Ok(())
    }
}

fn kind_lower<R: Resource>() -> String {
    R::KIND.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Ability, AbilityDraft, AbilityPatch, Character, CharacterDraft, CharacterPatch,
    };
    use crate::storage::{Collection, MemoryStore};
    use axum::http::StatusCode;
    use serde_json::json;

    fn user(id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: id.to_string(),
            issued_at: 0,
            expires_at: i64::MAX,
        }
    }

    fn ability_draft(value: serde_json::Value) -> AbilityDraft {
        serde_json::from_value(value).unwrap()
    }

    fn character_draft(name: &str) -> CharacterDraft {
        serde_json::from_value(json!({
            "name": name,
            "age": 120,
            "gender": "male",
            "race": "Dwarf",
            "coreRank": "Advanced"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_sets_owner_to_caller() {
        let store = MemoryStore::new();
        let abilities = AccessController::<Ability>::new(&store);

        let view = abilities
            .create(
                &user("alice"),
                ability_draft(json!({ "name": "Fireball", "type": "Offensive" })),
            )
            .await
            .unwrap();
        assert_eq!(view.owners.as_slice(), ["alice".to_string()]);
    }

    #[tokio::test]
    async fn list_is_scoped_to_caller() {
        let store = MemoryStore::new();
        let characters = AccessController::<Character>::new(&store);
        characters
            .create(&user("alice"), character_draft("Aria"))
            .await
            .unwrap();
        characters
            .create(&user("bob"), character_draft("Borin"))
            .await
            .unwrap();

        let mine = characters.list(&user("alice")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Aria");
        assert!(characters.list(&user("carol")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_hides_foreign_documents_as_not_found() {
        let store = MemoryStore::new();
        let characters = AccessController::<Character>::new(&store);
        let aria = characters
            .create(&user("alice"), character_draft("Aria"))
            .await
            .unwrap();

        let err = characters
            .get(&user("bob"), &aria.id.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Character not found");

        let err = characters.get(&user("alice"), "abc").await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid character ID");
    }

    #[tokio::test]
    async fn writes_by_non_owner_are_forbidden_and_leave_document_intact() {
        let store = MemoryStore::new();
        let abilities = AccessController::<Ability>::new(&store);
        let fireball = abilities
            .create(
                &user("alice"),
                ability_draft(json!({ "name": "Fireball", "type": "Offensive" })),
            )
            .await
            .unwrap();
        let before = store
            .find_by_id(Collection::Abilities, fireball.id)
            .await
            .unwrap();

        let patch = AbilityPatch {
            name: Some("Stolen".into()),
            ..Default::default()
        };
        let err = abilities
            .update(&user("mallory"), &fireball.id.to_string(), patch)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let err = abilities
            .delete(&user("mallory"), &fireball.id.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let after = store
            .find_by_id(Collection::Abilities, fireball.id)
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_vec(&before).unwrap(),
            serde_json::to_vec(&after).unwrap()
        );
    }

    #[tokio::test]
    async fn update_and_delete_missing_are_not_found() {
        let store = MemoryStore::new();
        let characters = AccessController::<Character>::new(&store);
        let missing = DocumentId::new().to_string();

        let err = characters
            .update(&user("alice"), &missing, CharacterPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = characters.delete(&user("alice"), &missing).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_refilters_links_and_can_share_ownership() {
        let store = MemoryStore::new();
        let characters = AccessController::<Character>::new(&store);
        let abilities = AccessController::<Ability>::new(&store);

        let aria = characters
            .create(&user("alice"), character_draft("Aria"))
            .await
            .unwrap();
        let fireball = abilities
            .create(
                &user("alice"),
                ability_draft(json!({ "name": "Fireball", "type": "Offensive" })),
            )
            .await
            .unwrap();

        let patch: AbilityPatch = serde_json::from_value(json!({
            "charactersWhoUse": [aria.id.to_string(), DocumentId::new().to_string(), "abc"],
            "owners": ["alice", "bob"]
        }))
        .unwrap();
        let view = abilities
            .update(&user("alice"), &fireball.id.to_string(), patch)
            .await
            .unwrap();
        assert_eq!(view.characters_who_use.len(), 1);
        assert_eq!(view.characters_who_use[0].id, aria.id);

        // bob is now an owner and may write.
        let patch = AbilityPatch {
            description: Some("Hot".into()),
            ..Default::default()
        };
        let view = abilities
            .update(&user("bob"), &fireball.id.to_string(), patch)
            .await
            .unwrap();
        assert_eq!(view.description.as_deref(), Some("Hot"));
    }

    #[tokio::test]
    async fn update_cannot_empty_owner_set() {
        let store = MemoryStore::new();
        let characters = AccessController::<Character>::new(&store);
        let aria = characters
            .create(&user("alice"), character_draft("Aria"))
            .await
            .unwrap();

        let patch = CharacterPatch {
            owners: Some(Vec::new()),
            ..Default::default()
        };
        let err = characters
            .update(&user("alice"), &aria.id.to_string(), patch)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let still = characters
            .get(&user("alice"), &aria.id.to_string())
            .await
            .unwrap();
        assert_eq!(still.owners.as_slice(), ["alice".to_string()]);
    }

    #[tokio::test]
    async fn delete_does_not_cascade() {
        let store = MemoryStore::new();
        let characters = AccessController::<Character>::new(&store);
        let abilities = AccessController::<Ability>::new(&store);

        let fireball = abilities
            .create(
                &user("alice"),
                ability_draft(json!({ "name": "Fireball", "type": "Offensive" })),
            )
            .await
            .unwrap();
        let draft: CharacterDraft = serde_json::from_value(json!({
            "name": "Aria",
            "age": 30,
            "gender": "female",
            "race": "Elf",
            "coreRank": "Expert",
            "abilities": [fireball.id.to_string()]
        }))
        .unwrap();
        let aria = characters.create(&user("alice"), draft).await.unwrap();
        assert_eq!(aria.abilities.len(), 1);

        abilities
            .delete(&user("alice"), &fireball.id.to_string())
            .await
            .unwrap();

        let stored = Repository::<Character>::new(&store)
            .get(aria.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.abilities, vec![fireball.id]);

        let view = characters
            .get(&user("alice"), &aria.id.to_string())
            .await
            .unwrap();
        assert!(view.abilities.is_empty());
    }
}

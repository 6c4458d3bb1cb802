// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relationship Resolver
//!
//! Characters list the abilities they know (`abilities`); abilities list the
//! characters that use them (`charactersWhoUse`). The two lists are stored
//! independently and are only eventually consistent:
//!
//! - on write, supplied ids are filtered down to counterparts that exist
//!   ([`filter_existing`]); bad ids are dropped, never an error
//! - on read, stored ids are replaced by counterpart summaries ([`expand`]);
//!   ids whose counterpart is gone simply vanish from the view
//! - in the background, [`Reconciler`] prunes dangling ids from storage
//!
//! Neither list is ever mirrored into the other.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::{Ability, AbilityView, Character, CharacterView, DocumentId, Resource};
use crate::storage::{Collection, DocumentStore, Repository, StoreResult};

pub mod reconcile;

pub use reconcile::Reconciler;

/// Parse raw ids, dropping malformed ones and later duplicates.
pub fn parse_unique(raw: &[String]) -> Vec<DocumentId> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|id| DocumentId::parse(id))
        .filter(|id| seen.insert(*id))
        .collect()
}

/// The subset of `raw` that names existing documents in `counterpart`,
/// in first-seen order.
pub async fn filter_existing(
    store: &dyn DocumentStore,
    counterpart: Collection,
    raw: &[String],
) -> StoreResult<Vec<DocumentId>> {
    let candidates = parse_unique(raw);
    if candidates.is_empty() {
        return Ok(candidates);
    }
    let existing = store.existing_ids(counterpart, &candidates).await?;
    Ok(candidates
        .into_iter()
        .filter(|id| existing.contains(id))
        .collect())
}

/// A resource whose stored links expand into counterpart summaries.
pub trait Expandable: Resource {
    type Counterpart: Resource;
    type View: Serialize + Send;

    /// Build the view from the counterparts that still exist, keyed by id.
    fn with_counterparts(
        self,
        counterparts: &HashMap<DocumentId, Self::Counterpart>,
    ) -> Self::View;
}

impl Expandable for Character {
    type Counterpart = Ability;
    type View = CharacterView;

    fn with_counterparts(self, counterparts: &HashMap<DocumentId, Ability>) -> CharacterView {
        let abilities = self
            .abilities
            .iter()
            .filter_map(|id| counterparts.get(id).map(Ability::summary))
            .collect();
        self.into_view(abilities)
    }
}

impl Expandable for Ability {
    type Counterpart = Character;
    type View = AbilityView;

    fn with_counterparts(self, counterparts: &HashMap<DocumentId, Character>) -> AbilityView {
        let characters = self
            .characters_who_use
            .iter()
            .filter_map(|id| counterparts.get(id).map(Character::summary))
            .collect();
        self.into_view(characters)
    }
}

/// Counterparts of the given ids that still exist, keyed by id.
async fn counterparts_of<R: Expandable>(
    store: &dyn DocumentStore,
    ids: &[DocumentId],
) -> StoreResult<HashMap<DocumentId, R::Counterpart>> {
    Ok(Repository::<R::Counterpart>::new(store)
        .find_many(ids)
        .await?
        .into_iter()
        .map(|counterpart| (counterpart.id(), counterpart))
        .collect())
}

/// Expand one resource.
///
/// Counterparts are summarized regardless of who owns them.
pub async fn expand<R: Expandable>(store: &dyn DocumentStore, resource: R) -> StoreResult<R::View> {
    let counterparts = counterparts_of::<R>(store, resource.links()).await?;
    Ok(resource.with_counterparts(&counterparts))
}

/// Expand a batch of resources with a single counterpart lookup.
pub async fn expand_all<R: Expandable>(
    store: &dyn DocumentStore,
    resources: Vec<R>,
) -> StoreResult<Vec<R::View>> {
    let mut seen = HashSet::new();
    let wanted: Vec<DocumentId> = resources
        .iter()
        .flat_map(|resource| resource.links().iter().copied())
        .filter(|id| seen.insert(*id))
        .collect();

    let counterparts = counterparts_of::<R>(store, &wanted).await?;
    Ok(resources
        .into_iter()
        .map(|resource| resource.with_counterparts(&counterparts))
        .collect())
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Models
//!
//! Stored documents, the typed commands that create and patch them, and the
//! expanded views returned by the API. All types derive `Serialize` and
//! `ToSchema`; stored documents also derive `Deserialize`.
//!
//! ## Model Categories
//!
//! - **Characters**: people of the world, linking to the abilities they know
//! - **Abilities**: powers, linking back to the characters who use them
//! - **Shared**: document ids, owner sets, lenient numeric fields

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage::{Collection, OwnedResource};

pub mod ability;
pub mod character;
pub mod coerce;

pub use ability::{Ability, AbilityDraft, AbilityPatch, AbilitySummary, AbilityView, Element};
pub use character::{
    Appearance, Character, CharacterDraft, CharacterPatch, CharacterSummary, CharacterView,
    CoreRank, History, HistoryEvent, Personality, Relationships,
};

// =============================================================================
// Document Id
// =============================================================================

/// Identifier of a stored document.
///
/// Any string that parses as a UUID is a well-formed id; everything else is
/// rejected before the store is consulted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Fresh random id for a new document.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a caller-supplied id, returning `None` if it is malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DocumentId {
    fn from(value: Uuid) -> Self {
        DocumentId(value)
    }
}

// =============================================================================
// Owner Set
// =============================================================================

/// Identities permitted to mutate or delete a document.
///
/// Older documents stored a single `owner` string, and the oldest have no
/// owner at all. Both shapes deserialize into this type; an empty set marks
/// an unowned legacy document that nobody can see or change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct OwnerSet(Vec<String>);

impl OwnerSet {
    /// Owner set holding exactly one identity.
    pub fn single(identity: impl Into<String>) -> Self {
        Self(vec![identity.into()])
    }

    /// Build a replacement owner set from caller input.
    ///
    /// Blank entries are rejected, duplicates collapse, order is kept.
    pub fn from_ids(ids: Vec<String>) -> Result<Self, ValidationError> {
        let mut owners: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.trim().to_string();
            if id.is_empty() {
                return Err(ValidationError::invalid("owners", "identities must not be blank"));
            }
            if !owners.contains(&id) {
                owners.push(id);
            }
        }
        if owners.is_empty() {
            return Err(ValidationError::EmptyOwnerSet);
        }
        Ok(Self(owners))
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.0.iter().any(|owner| owner == identity)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OwnerRepr {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for OwnerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<OwnerRepr>::deserialize(deserializer)? {
            None => OwnerSet::default(),
            Some(OwnerRepr::One(owner)) => OwnerSet(vec![owner]),
            Some(OwnerRepr::Many(owners)) => OwnerSet(owners),
        })
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Field-level constraint violation on a write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("owners must contain at least one identity")]
    EmptyOwnerSet,
}

impl ValidationError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Reject blank values for a required text field.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

// =============================================================================
// Resource Contract
// =============================================================================

/// An owned document type that links to documents of a counterpart type.
///
/// Characters and abilities both implement this; the access controller and
/// relationship resolver are written once against it.
pub trait Resource: OwnedResource + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the documents live in.
    const COLLECTION: Collection;
    /// Human-readable kind, used in messages ("Character not found").
    const KIND: &'static str;
    /// Serialized name of the field holding counterpart ids.
    const LINK_FIELD: &'static str;

    /// Typed create command.
    type Draft: Send;
    /// Typed partial-update command.
    type Patch: Send;

    fn id(&self) -> DocumentId;

    /// Stored counterpart ids.
    fn links(&self) -> &[DocumentId];

    /// Raw counterpart ids supplied with a create command.
    fn draft_links(draft: &Self::Draft) -> &[String];

    /// Raw counterpart ids supplied with an update, if the update touches them.
    fn patch_links(patch: &Self::Patch) -> Option<&[String]>;

    /// Build a new document owned by exactly `owner`.
    fn from_draft(
        id: DocumentId,
        owner: &str,
        draft: Self::Draft,
        links: Vec<DocumentId>,
    ) -> Result<Self, ValidationError>;

    /// Merge the supplied fields over `self` and re-validate.
    ///
    /// Returns the serialized names of the fields that were replaced, which
    /// is what gets written back to the store.
    fn apply(
        &mut self,
        patch: Self::Patch,
        links: Option<Vec<DocumentId>>,
    ) -> Result<Vec<&'static str>, ValidationError>;
}

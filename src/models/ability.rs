// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ability documents.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    coerce, require_text, CharacterSummary, DocumentId, OwnerSet, Resource, ValidationError,
};
use crate::storage::{Collection, OwnedResource};

/// Elemental component of an ability and how many orbs it costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Element {
    pub element: String,
    #[serde(deserialize_with = "coerce::integer")]
    pub orbs: i64,
}

/// An ability as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ability {
    pub id: DocumentId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Ids of the characters that use this ability.
    #[serde(default)]
    pub characters_who_use: Vec<DocumentId>,
    #[serde(default, alias = "owner")]
    pub owners: OwnerSet,
}

/// Request to create an ability.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AbilityDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Character ids; unknown or malformed ids are dropped.
    #[serde(default)]
    pub characters_who_use: Vec<String>,
}

/// Request to update an ability. Omitted fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AbilityPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub elements: Option<Vec<Element>>,
    #[serde(default)]
    pub characters_who_use: Option<Vec<String>>,
    /// Replacement owner set; must not be empty.
    #[serde(default)]
    pub owners: Option<Vec<String>>,
}

/// Short form of an ability shown inside a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AbilitySummary {
    pub id: DocumentId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// An ability as returned by the API, with its users expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AbilityView {
    pub id: DocumentId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub elements: Vec<Element>,
    pub characters_who_use: Vec<CharacterSummary>,
    pub owners: OwnerSet,
}

impl Ability {
    pub fn summary(&self) -> AbilitySummary {
        AbilitySummary {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind.clone(),
        }
    }

    pub fn into_view(self, characters_who_use: Vec<CharacterSummary>) -> AbilityView {
        AbilityView {
            id: self.id,
            name: self.name,
            kind: self.kind,
            description: self.description,
            elements: self.elements,
            characters_who_use,
            owners: self.owners,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("type", &self.kind)?;
        for element in &self.elements {
            require_text("elements.element", &element.element)?;
            if element.orbs < 0 {
                return Err(ValidationError::invalid("elements.orbs", "must not be negative"));
            }
        }
        if self.owners.is_empty() {
            return Err(ValidationError::EmptyOwnerSet);
        }
        Ok(())
    }
}

impl OwnedResource for Ability {
    fn owners(&self) -> &OwnerSet {
        &self.owners
    }
}

impl Resource for Ability {
    const COLLECTION: Collection = Collection::Abilities;
    const KIND: &'static str = "Ability";
    const LINK_FIELD: &'static str = "charactersWhoUse";

    type Draft = AbilityDraft;
    type Patch = AbilityPatch;

    fn id(&self) -> DocumentId {
        self.id
    }

    fn links(&self) -> &[DocumentId] {
        &self.characters_who_use
    }

    fn draft_links(draft: &AbilityDraft) -> &[String] {
        &draft.characters_who_use
    }

    fn patch_links(patch: &AbilityPatch) -> Option<&[String]> {
        patch.characters_who_use.as_deref()
    }

    fn from_draft(
        id: DocumentId,
        owner: &str,
        draft: AbilityDraft,
        links: Vec<DocumentId>,
    ) -> Result<Self, ValidationError> {
        let ability = Ability {
            id,
            name: draft.name,
            kind: draft.kind,
            description: draft.description,
            elements: draft.elements,
            characters_who_use: links,
            owners: OwnerSet::single(owner),
        };
        ability.validate()?;
        Ok(ability)
    }

    fn apply(
        &mut self,
        patch: AbilityPatch,
        links: Option<Vec<DocumentId>>,
    ) -> Result<Vec<&'static str>, ValidationError> {
        let mut touched = Vec::new();

        if let Some(name) = patch.name {
            self.name = name;
            touched.push("name");
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
            touched.push("type");
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
            touched.push("description");
        }
        if let Some(elements) = patch.elements {
            self.elements = elements;
            touched.push("elements");
        }
        if let Some(owners) = patch.owners {
            self.owners = OwnerSet::from_ids(owners)?;
            touched.push("owners");
        }
        if let Some(links) = links {
            self.characters_who_use = links;
            touched.push(Self::LINK_FIELD);
        }

        self.validate()?;
        Ok(touched)
    }
}

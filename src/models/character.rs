// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Character documents.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    coerce, require_text, AbilitySummary, DocumentId, OwnerSet, Resource, ValidationError,
};
use crate::storage::{Collection, OwnedResource};

/// Power tier of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CoreRank {
    Basic,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Legend,
    #[serde(rename = "Semi-God")]
    SemiGod,
    Divine,
    God,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Appearance {
    #[serde(default, deserialize_with = "coerce::opt_float", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "coerce::opt_float", skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothing_style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Personality {
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub quirks: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct HistoryEvent {
    #[serde(default, deserialize_with = "coerce::opt_integer", skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct History {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthplace: Option<String>,
    #[serde(default)]
    pub events: Vec<HistoryEvent>,
}

/// Free-text ties to other people; not validated against stored characters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct Relationships {
    #[serde(default)]
    pub family: Vec<String>,
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default)]
    pub enemies: Vec<String>,
    #[serde(default)]
    pub allies: Vec<String>,
    #[serde(default)]
    pub romance: Vec<String>,
}

/// A character as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: DocumentId,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub race: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default)]
    pub appearance: Appearance,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub relationships: Relationships,
    /// Ids of the abilities this character knows.
    #[serde(default)]
    pub abilities: Vec<DocumentId>,
    pub core_rank: CoreRank,
    #[serde(default, alias = "owner")]
    pub owners: OwnerSet,
}

/// Request to create a character.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CharacterDraft {
    pub name: String,
    #[serde(deserialize_with = "coerce::integer")]
    pub age: i64,
    pub gender: String,
    pub race: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub appearance: Appearance,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub relationships: Relationships,
    /// Ability ids; unknown or malformed ids are dropped.
    #[serde(default)]
    pub abilities: Vec<String>,
    pub core_rank: CoreRank,
}

/// Request to update a character. Omitted fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CharacterPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_integer")]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub appearance: Option<Appearance>,
    #[serde(default)]
    pub personality: Option<Personality>,
    #[serde(default)]
    pub history: Option<History>,
    #[serde(default)]
    pub relationships: Option<Relationships>,
    #[serde(default)]
    pub abilities: Option<Vec<String>>,
    #[serde(default)]
    pub core_rank: Option<CoreRank>,
    /// Replacement owner set; must not be empty.
    #[serde(default)]
    pub owners: Option<Vec<String>>,
}

/// Short form of a character shown inside an ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSummary {
    pub id: DocumentId,
    pub name: String,
    pub race: String,
    pub core_rank: CoreRank,
}

/// A character as returned by the API, with its abilities expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CharacterView {
    pub id: DocumentId,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub race: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub appearance: Appearance,
    pub personality: Personality,
    pub history: History,
    pub relationships: Relationships,
    pub abilities: Vec<AbilitySummary>,
    pub core_rank: CoreRank,
    pub owners: OwnerSet,
}

impl Character {
    pub fn summary(&self) -> CharacterSummary {
        CharacterSummary {
            id: self.id,
            name: self.name.clone(),
            race: self.race.clone(),
            core_rank: self.core_rank,
        }
    }

    pub fn into_view(self, abilities: Vec<AbilitySummary>) -> CharacterView {
        CharacterView {
            id: self.id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            race: self.race,
            nickname: self.nickname,
            appearance: self.appearance,
            personality: self.personality,
            history: self.history,
            relationships: self.relationships,
            abilities,
            core_rank: self.core_rank,
            owners: self.owners,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("gender", &self.gender)?;
        require_text("race", &self.race)?;
        if self.age < 0 {
            return Err(ValidationError::invalid("age", "must not be negative"));
        }
        if self.owners.is_empty() {
            return Err(ValidationError::EmptyOwnerSet);
        }
        Ok(())
    }
}

impl OwnedResource for Character {
    fn owners(&self) -> &OwnerSet {
        &self.owners
    }
}

impl Resource for Character {
    const COLLECTION: Collection = Collection::Characters;
    const KIND: &'static str = "Character";
    const LINK_FIELD: &'static str = "abilities";

    type Draft = CharacterDraft;
    type Patch = CharacterPatch;

    fn id(&self) -> DocumentId {
        self.id
    }

    fn links(&self) -> &[DocumentId] {
        &self.abilities
    }

    fn draft_links(draft: &CharacterDraft) -> &[String] {
        &draft.abilities
    }

    fn patch_links(patch: &CharacterPatch) -> Option<&[String]> {
        patch.abilities.as_deref()
    }

    fn from_draft(
        id: DocumentId,
        owner: &str,
        draft: CharacterDraft,
        links: Vec<DocumentId>,
    ) -> Result<Self, ValidationError> {
        let character = Character {
            id,
            name: draft.name,
            age: draft.age,
            gender: draft.gender,
            race: draft.race,
            nickname: draft.nickname,
            appearance: draft.appearance,
            personality: draft.personality,
            history: draft.history,
            relationships: draft.relationships,
            abilities: links,
            core_rank: draft.core_rank,
            owners: OwnerSet::single(owner),
        };
        character.validate()?;
        Ok(character)
    }

    fn apply(
        &mut self,
        patch: CharacterPatch,
        links: Option<Vec<DocumentId>>,
    ) -> Result<Vec<&'static str>, ValidationError> {
        let mut touched = Vec::new();

        if let Some(name) = patch.name {
            self.name = name;
            touched.push("name");
        }
        if let Some(age) = patch.age {
            self.age = age;
            touched.push("age");
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
            touched.push("gender");
        }
        if let Some(race) = patch.race {
            self.race = race;
            touched.push("race");
        }
        if let Some(nickname) = patch.nickname {
            self.nickname = Some(nickname);
            touched.push("nickname");
        }
        if let Some(appearance) = patch.appearance {
            self.appearance = appearance;
            touched.push("appearance");
        }
        if let Some(personality) = patch.personality {
            self.personality = personality;
            touched.push("personality");
        }
        if let Some(history) = patch.history {
            self.history = history;
            touched.push("history");
        }
        if let Some(relationships) = patch.relationships {
            self.relationships = relationships;
            touched.push("relationships");
        }
        if let Some(core_rank) = patch.core_rank {
            self.core_rank = core_rank;
            touched.push("coreRank");
        }
        if let Some(owners) = patch.owners {
            self.owners = OwnerSet::from_ids(owners)?;
            touched.push("owners");
        }
        if let Some(links) = links {
            self.abilities = links;
            touched.push(Self::LINK_FIELD);
        }

        self.validate()?;
        Ok(touched)
    }
}

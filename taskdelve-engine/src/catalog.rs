//! Static content definitions: dungeons and preset tasks.
//!
//! Catalog JSON is decoded once per session. Reward tags are resolved to
//! [`Reward`] variants here, at load time, so the rest of the engine never
//! touches raw strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no definition was found with the name {name:?}")]
    DefinitionNotFound { name: String },
    #[error("malformed catalog data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("dungeon {dungeon:?} carries reward {item:?} with unusable value {value:?}")]
    InvalidReward {
        dungeon: String,
        item: String,
        value: String,
    },
}

/// A reward a dungeon grants on completion, resolved from its raw tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reward {
    /// Raises the account's inspiration-point ceiling.
    CapacityIncrease(i64),
    /// A tag this build does not understand; carried through untouched so
    /// newer catalog data does not fail to load.
    Unrecognized { item: String, value: String },
}

/// Raw reward entry as it appears in catalog JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardDef {
    pub item: String,
    pub value: String,
}

/// An adventure template: what it costs, how long it runs, what it grants.
#[derive(Debug, Clone, PartialEq)]
pub struct DungeonDef {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub image_names: Vec<String>,
    pub rewards: Vec<Reward>,
    pub cost: i64,
    pub hours: f64,
}

/// A ready-made task template the user can mint tasks from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDef {
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(rename = "rewardPoints")]
    pub points: i64,
    #[serde(rename = "durationHours")]
    pub hours: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDungeon {
    id: u32,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image_names: Vec<String>,
    #[serde(default)]
    rewards: Vec<RewardDef>,
    cost: i64,
    #[serde(rename = "durationHours")]
    hours: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    dungeons: Vec<RawDungeon>,
    #[serde(default)]
    presets: Vec<PresetDef>,
}

/// Immutable content definitions for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    dungeons: Vec<DungeonDef>,
    presets: Vec<PresetDef>,
}

impl Catalog {
    /// Empty catalog, useful as a test fixture.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode a catalog from JSON and resolve every reward tag.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Decode`] for malformed JSON and
    /// [`CatalogError::InvalidReward`] when a recognized reward tag
    /// carries an unparsable value.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        let mut dungeons = raw
            .dungeons
            .into_iter()
            .map(resolve_dungeon)
            .collect::<Result<Vec<_>, _>>()?;
        dungeons.sort_by_key(|d| d.id);
        Ok(Self {
            dungeons,
            presets: raw.presets,
        })
    }

    /// All dungeons, sorted by id ascending.
    #[must_use]
    pub fn dungeons(&self) -> &[DungeonDef] {
        &self.dungeons
    }

    #[must_use]
    pub fn presets(&self) -> &[PresetDef] {
        &self.presets
    }

    /// Look up a dungeon by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DefinitionNotFound`] when no dungeon
    /// matches.
    pub fn dungeon(&self, name: &str) -> Result<&DungeonDef, CatalogError> {
        self.dungeons
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| CatalogError::DefinitionNotFound {
                name: name.to_string(),
            })
    }

    /// Look up a preset task template by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DefinitionNotFound`] when no preset
    /// matches.
    pub fn preset(&self, name: &str) -> Result<&PresetDef, CatalogError> {
        self.presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| CatalogError::DefinitionNotFound {
                name: name.to_string(),
            })
    }
}

fn resolve_dungeon(raw: RawDungeon) -> Result<DungeonDef, CatalogError> {
    let rewards = raw
        .rewards
        .into_iter()
        .map(|r| resolve_reward(&raw.name, r))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DungeonDef {
        id: raw.id,
        name: raw.name,
        description: raw.description,
        image_names: raw.image_names,
        rewards,
        cost: raw.cost,
        hours: raw.hours,
    })
}

fn resolve_reward(dungeon: &str, def: RewardDef) -> Result<Reward, CatalogError> {
    match def.item.as_str() {
        "ipMaxIncrease" => {
            let amount = def.value.parse::<i64>().map_err(|_| CatalogError::InvalidReward {
                dungeon: dungeon.to_string(),
                item: def.item.clone(),
                value: def.value.clone(),
            })?;
            Ok(Reward::CapacityIncrease(amount))
        }
        _ => Ok(Reward::Unrecognized {
            item: def.item,
            value: def.value,
        }),
    }
}

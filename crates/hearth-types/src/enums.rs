//! Enumeration types shared by every Hearth crate.
//!
//! Several enums carry a lowercase *token* (`tree`, `berries`, `campfire`)
//! that is the spelling used in entity ids, plan steps, goal names and
//! oracle prompts. `token()` and `from_token()` are the only conversions
//! between the two worlds.

use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Resources and items
// ---------------------------------------------------------------------------

/// The kind of a harvestable resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A tree, yields wood.
    Tree,
    /// A rock outcrop, yields stone.
    Rock,
    /// A berry bush, yields berries.
    #[serde(rename = "berry")]
    BerryBush,
}

impl ResourceKind {
    /// All resource kinds in spawn order.
    pub const ALL: [Self; 3] = [Self::Tree, Self::Rock, Self::BerryBush];

    /// Token used in ids and plan steps.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Rock => "rock",
            Self::BerryBush => "berry",
        }
    }

    /// Parse an id token. `bush` is accepted as an alias for berry bushes.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "tree" => Some(Self::Tree),
            "rock" => Some(Self::Rock),
            "berry" | "bush" => Some(Self::BerryBush),
            _ => None,
        }
    }

    /// The item one harvest of this node yields.
    pub const fn yield_item(self) -> Item {
        match self {
            Self::Tree => Item::Wood,
            Self::Rock => Item::Stone,
            Self::BerryBush => Item::Berries,
        }
    }

    /// The node kind that yields `item`, if any.
    pub const fn yielding(item: Item) -> Option<Self> {
        match item {
            Item::Wood => Some(Self::Tree),
            Item::Stone => Some(Self::Rock),
            Item::Berries => Some(Self::BerryBush),
            Item::RawMeat | Item::CookedMeat | Item::Fur => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// An item that can be held in an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub enum Item {
    /// Lumber from trees.
    Wood,
    /// Stone from rocks.
    Stone,
    /// Berries from bushes.
    Berries,
    /// Uncooked meat.
    RawMeat,
    /// Meat cooked over a fire.
    CookedMeat,
    /// Animal fur.
    Fur,
}

impl Item {
    /// Every item, in inventory display order.
    pub const ALL: [Self; 6] = [
        Self::Wood,
        Self::Stone,
        Self::Berries,
        Self::RawMeat,
        Self::CookedMeat,
        Self::Fur,
    ];

    /// Order in which an unspecific "eat" picks food.
    pub const EDIBLE_PRIORITY: [Self; 3] = [Self::CookedMeat, Self::RawMeat, Self::Berries];

    /// Token used in goal names and prompts.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Wood => "wood",
            Self::Stone => "stone",
            Self::Berries => "berries",
            Self::RawMeat => "rawMeat",
            Self::CookedMeat => "cookedMeat",
            Self::Fur => "fur",
        }
    }

    /// Parse a token case-insensitively, accepting a few common spellings.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "wood" => Some(Self::Wood),
            "stone" => Some(Self::Stone),
            "berries" | "berry" => Some(Self::Berries),
            "rawmeat" | "raw_meat" | "meat" => Some(Self::RawMeat),
            "cookedmeat" | "cooked_meat" => Some(Self::CookedMeat),
            "fur" => Some(Self::Fur),
            _ => None,
        }
    }

    /// Whether the item can be eaten.
    pub const fn is_edible(self) -> bool {
        matches!(self, Self::Berries | Self::RawMeat | Self::CookedMeat)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ---------------------------------------------------------------------------
// Buildings, recipes, equipment
// ---------------------------------------------------------------------------

/// A constructed building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    /// Warms agents standing nearby.
    Campfire,
    /// Slow passive warmth over a wider radius.
    Shelter,
}

impl BuildingKind {
    /// Token used in ids and plan steps.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Campfire => "campfire",
            Self::Shelter => "shelter",
        }
    }

    /// Parse an id token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "campfire" => Some(Self::Campfire),
            "shelter" => Some(Self::Shelter),
            _ => None,
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A portable tool or weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Equipment {
    /// Enables hunting.
    Spear,
}

/// Identifier of a crafting recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "UPPERCASE")]
pub enum RecipeId {
    /// Builds a [`BuildingKind::Campfire`].
    Campfire,
    /// Builds a [`BuildingKind::Shelter`].
    Shelter,
    /// Crafts an [`Equipment::Spear`].
    Spear,
}

impl RecipeId {
    /// Every recipe, in prompt order.
    pub const ALL: [Self; 3] = [Self::Campfire, Self::Shelter, Self::Spear];

    /// Lowercase token (`campfire`).
    pub const fn token(self) -> &'static str {
        match self {
            Self::Campfire => "campfire",
            Self::Shelter => "shelter",
            Self::Spear => "spear",
        }
    }

    /// Parse a recipe name case-insensitively.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "campfire" => Some(Self::Campfire),
            "shelter" => Some(Self::Shelter),
            "spear" => Some(Self::Spear),
            _ => None,
        }
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ---------------------------------------------------------------------------
// Agent state
// ---------------------------------------------------------------------------

/// Urgency attached to a strategic goal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal.
    #[default]
    Medium,
    /// Should happen soon.
    High,
    /// Life-threatening.
    Urgent,
}

impl Priority {
    /// Parse a priority label, defaulting to `Medium` for anything unknown.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "LOW" => Self::Low,
            "HIGH" => Self::High,
            "URGENT" | "CRITICAL" => Self::Urgent,
            _ => Self::Medium,
        }
    }
}

/// One of the four vital stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    /// Satiation. Decays over time, restored by eating.
    Food,
    /// Body heat. Decays over time, restored near buildings.
    Warmth,
    /// Life. Zero means death.
    Health,
    /// Stamina. Decays over time, restored by resting.
    Energy,
}

/// What an agent's body is doing right now, for presentation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    /// Standing still.
    #[default]
    Idle,
    /// Walking toward a destination.
    Moving,
    /// Waiting on a harvest timer.
    Harvesting,
    /// Waiting on a craft timer.
    Crafting,
    /// Eating.
    Eating,
    /// Waiting or resting.
    Resting,
}

/// Cognition state of an agent as seen by the scheduler.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum CognitionPhase {
    /// No plan and no outstanding request.
    #[default]
    Idle,
    /// A strategic goal request is outstanding.
    AwaitingStrategy,
    /// A tactical plan request is outstanding.
    AwaitingTactics,
    /// A behavior tree is running.
    Executing,
    /// The agent died and is no longer scheduled.
    Dead,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_kind_tokens_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_token(kind.token()), Some(kind));
        }
        assert_eq!(ResourceKind::from_token("BUSH"), Some(ResourceKind::BerryBush));
    }

    #[test]
    fn yield_mapping_is_consistent() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::yielding(kind.yield_item()), Some(kind));
        }
        assert_eq!(ResourceKind::yielding(Item::CookedMeat), None);
    }

    #[test]
    fn item_parsing_accepts_variants() {
        assert_eq!(Item::from_token("Berry"), Some(Item::Berries));
        assert_eq!(Item::from_token("cooked_meat"), Some(Item::CookedMeat));
        assert_eq!(Item::from_token("rawMeat"), Some(Item::RawMeat));
        assert_eq!(Item::from_token("gold"), None);
    }

    #[test]
    fn item_serde_uses_camel_case() {
        let json = serde_json::to_string(&Item::CookedMeat).unwrap_or_default();
        assert_eq!(json, "\"cookedMeat\"");
    }

    #[test]
    fn priority_labels_are_tolerant() {
        assert_eq!(Priority::from_label(" high "), Priority::High);
        assert_eq!(Priority::from_label("critical"), Priority::Urgent);
        assert_eq!(Priority::from_label("whenever"), Priority::Medium);
    }

    #[test]
    fn edible_priority_prefers_cooked_meat() {
        assert_eq!(Item::EDIBLE_PRIORITY.first(), Some(&Item::CookedMeat));
        assert!(Item::EDIBLE_PRIORITY.iter().all(|i| i.is_edible()));
        assert!(!Item::Wood.is_edible());
    }
}

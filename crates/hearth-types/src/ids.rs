//! Identifiers for agents and world entities.
//!
//! Agents are identified by UUID v7 wrappers. Resource nodes and buildings
//! carry human-readable ids of the form `<kind>_<index>` (`tree_3`,
//! `campfire_1`) because those ids travel through the plan step vocabulary
//! and the oracle prompts verbatim.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{BuildingKind, ResourceKind};

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent in the simulation.
    AgentId
}

/// Error returned when an entity id string does not have the
/// `<kind>_<index>` shape or names an unknown kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entity id: {0:?}")]
pub struct ParseIdError(pub String);

/// Split `tree_3` into `("tree", 3)`.
fn split_kind_index(s: &str) -> Option<(&str, u32)> {
    let (kind, index) = s.rsplit_once('_')?;
    if kind.is_empty() || index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((kind, index.parse().ok()?))
}

/// Identifier of a harvestable resource node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ResourceId {
    /// What the node is (tree, rock, berry bush).
    pub kind: ResourceKind,
    /// Per-world sequence number, starting at 1.
    pub index: u32,
}

impl ResourceId {
    /// Build an id from its parts.
    pub const fn new(kind: ResourceKind, index: u32) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.token(), self.index)
    }
}

impl FromStr for ResourceId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, index) = split_kind_index(s).ok_or_else(|| ParseIdError(s.to_owned()))?;
        let kind = ResourceKind::from_token(kind).ok_or_else(|| ParseIdError(s.to_owned()))?;
        Ok(Self { kind, index })
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ResourceId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identifier of a constructed building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BuildingId {
    /// Building type.
    pub kind: BuildingKind,
    /// Per-world sequence number, starting at 1.
    pub index: u32,
}

impl BuildingId {
    /// Build an id from its parts.
    pub const fn new(kind: BuildingKind, index: u32) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.token(), self.index)
    }
}

impl FromStr for BuildingId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, index) = split_kind_index(s).ok_or_else(|| ParseIdError(s.to_owned()))?;
        let kind = BuildingKind::from_token(kind).ok_or_else(|| ParseIdError(s.to_owned()))?;
        Ok(Self { kind, index })
    }
}

impl From<BuildingId> for String {
    fn from(id: BuildingId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for BuildingId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Anything a movement or proximity node can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TargetId {
    /// A resource node.
    Resource(ResourceId),
    /// A building.
    Building(BuildingId),
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(id) => id.fmt(f),
            Self::Building(id) => id.fmt(f),
        }
    }
}

impl FromStr for TargetId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<ResourceId>()
            .map(Self::Resource)
            .or_else(|_| s.parse::<BuildingId>().map(Self::Building))
    }
}

impl From<ResourceId> for TargetId {
    fn from(id: ResourceId) -> Self {
        Self::Resource(id)
    }
}

impl From<BuildingId> for TargetId {
    fn from(id: BuildingId) -> Self {
        Self::Building(id)
    }
}

impl From<TargetId> for String {
    fn from(id: TargetId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for TargetId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_id_display_and_parse() {
        let id = ResourceId::new(ResourceKind::Tree, 7);
        assert_eq!(id.to_string(), "tree_7");
        assert_eq!("tree_7".parse::<ResourceId>().ok(), Some(id));
        assert_eq!(
            "berry_12".parse::<ResourceId>().ok(),
            Some(ResourceId::new(ResourceKind::BerryBush, 12))
        );
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!("tree".parse::<ResourceId>().is_err());
        assert!("tree_".parse::<ResourceId>().is_err());
        assert!("tree_x1".parse::<ResourceId>().is_err());
        assert!("lake_1".parse::<ResourceId>().is_err());
        assert!("_4".parse::<TargetId>().is_err());
    }

    #[test]
    fn target_id_dispatches_on_kind() {
        assert_eq!(
            "campfire_2".parse::<TargetId>().ok(),
            Some(TargetId::Building(BuildingId::new(BuildingKind::Campfire, 2)))
        );
        assert_eq!(
            "rock_1".parse::<TargetId>().ok(),
            Some(TargetId::Resource(ResourceId::new(ResourceKind::Rock, 1)))
        );
    }

    #[test]
    fn entity_ids_serialize_as_strings() {
        let id = TargetId::Resource(ResourceId::new(ResourceKind::Rock, 4));
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"rock_4\"");
        let back: Result<TargetId, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(id));
    }

    #[test]
    fn agent_ids_are_unique() {
        assert_ne!(AgentId::new(), AgentId::new());
    }
}

//! World state snapshot and the goal oracle request/response contract.
//!
//! A snapshot is everything an oracle knows about the world when it picks a
//! goal or a plan for one agent. Both the strategic and the tactical
//! contract carry the same snapshot shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Activity, BuildingKind, Equipment, Item, Priority, RecipeId, ResourceKind};
use crate::ids::{AgentId, BuildingId, ResourceId};
use crate::structs::{FailureRecord, Position, StrategicGoal, Vitals};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything one agent perceives, serialized for an oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WorldSnapshot {
    /// Agent the snapshot was built for.
    pub agent_id: AgentId,
    /// Simulation time, in milliseconds.
    pub time_ms: u64,
    /// The agent's own state.
    pub self_view: SelfView,
    /// Distance to the nearest live node of each kind. `None` when no node
    /// of that kind is alive anywhere.
    pub nearest_distances: BTreeMap<ResourceKind, Option<f64>>,
    /// Up to five closest live nodes per kind, sorted by distance.
    pub resources: Vec<NearbyResource>,
    /// Every building in the world, sorted by distance.
    pub buildings: Vec<NearbyBuilding>,
    /// Other living agents.
    pub others: Vec<NearbyAgent>,
    /// Per-recipe affordability.
    pub recipes: Vec<RecipeReadiness>,
    /// Resource kinds with no live node in view.
    pub exploration_cues: Vec<ResourceKind>,
    /// Operator directive that must be acknowledged first, if active.
    pub whisper: Option<String>,
}

/// The agent-facing view of its own body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SelfView {
    /// Display name.
    pub name: String,
    /// Current position.
    pub position: Position,
    /// Current vitals.
    pub vitals: Vitals,
    /// Inventory counts (non-zero entries only).
    pub inventory: BTreeMap<Item, u32>,
    /// Equipment carried.
    pub equipment: Vec<Equipment>,
    /// What the body is doing.
    pub activity: Activity,
    /// Name of the current strategic goal.
    pub strategic_goal: Option<String>,
    /// Last recorded plan failure.
    pub last_failure: Option<FailureRecord>,
}

/// A live resource node as seen from the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NearbyResource {
    /// Node id (`tree_3`).
    #[ts(as = "String")]
    pub id: ResourceId,
    /// Node kind.
    pub kind: ResourceKind,
    /// Node position.
    pub position: Position,
    /// Units left before depletion.
    pub remaining: u32,
    /// Distance from the agent.
    pub distance: f64,
}

/// A building as seen from the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NearbyBuilding {
    /// Building id (`campfire_1`).
    #[ts(as = "String")]
    pub id: BuildingId,
    /// Building type.
    pub kind: BuildingKind,
    /// Building position.
    pub position: Position,
    /// Distance from the agent.
    pub distance: f64,
}

/// Another living agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NearbyAgent {
    /// Display name.
    pub name: String,
    /// Position.
    pub position: Position,
    /// Distance from the observing agent.
    pub distance: f64,
}

/// Whether a recipe can be crafted right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Readiness {
    /// All requirements are in inventory.
    Ready,
    /// Some requirements are missing.
    Missing,
    /// A singleton building of this type already exists.
    AlreadyBuilt,
}

/// Affordability of one recipe for the observing agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RecipeReadiness {
    /// Recipe.
    pub recipe: RecipeId,
    /// Overall status.
    pub status: Readiness,
    /// Full cost of the recipe.
    pub cost: BTreeMap<Item, u32>,
    /// Shortfall per item (empty when ready).
    pub missing: BTreeMap<Item, u32>,
}

// ---------------------------------------------------------------------------
// Oracle contract
// ---------------------------------------------------------------------------

/// Strategic request: pick a goal for this agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StrategicRequest {
    /// Agent asking.
    pub agent_id: AgentId,
    /// What the agent sees.
    pub snapshot: WorldSnapshot,
}

/// Strategic response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StrategicResponse {
    /// Goal name.
    pub goal: String,
    /// Urgency.
    #[serde(default)]
    pub priority: Priority,
    /// Justification.
    #[serde(default)]
    pub reasoning: String,
}

impl StrategicResponse {
    /// The conservative default response (`SURVIVE`, medium priority).
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            goal: StrategicGoal::DEFAULT_NAME.to_owned(),
            priority: Priority::Medium,
            reasoning: reason.into(),
        }
    }

    /// Stamp the response into a [`StrategicGoal`].
    pub fn into_goal(self, timestamp_ms: u64) -> StrategicGoal {
        StrategicGoal::new(self.goal, self.priority, self.reasoning, timestamp_ms)
    }
}

/// Tactical request: turn a goal into steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TacticalRequest {
    /// Agent asking.
    pub agent_id: AgentId,
    /// What the agent sees.
    pub snapshot: WorldSnapshot,
    /// Goal to realize.
    pub goal: StrategicGoal,
}

/// Tactical response. An empty `steps` list means no viable plan right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TacticalResponse {
    /// Ordered step descriptions.
    #[serde(default)]
    pub steps: Vec<String>,
    /// Commentary.
    #[serde(default)]
    pub thought: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategic_response_defaults_missing_fields() {
        let parsed: Result<StrategicResponse, _> =
            serde_json::from_str(r#"{"goal":"GATHER_WOOD"}"#);
        let parsed = parsed.unwrap_or_else(|_| StrategicResponse::fallback("parse"));
        assert_eq!(parsed.goal, "GATHER_WOOD");
        assert_eq!(parsed.priority, Priority::Medium);
        assert!(parsed.reasoning.is_empty());
    }

    #[test]
    fn priority_serializes_uppercase() {
        let resp = StrategicResponse {
            goal: "BUILD_CAMPFIRE".into(),
            priority: Priority::Urgent,
            reasoning: String::new(),
        };
        let json = serde_json::to_string(&resp).unwrap_or_default();
        assert!(json.contains("\"URGENT\""));
    }

    #[test]
    fn fallback_response_becomes_survive_goal() {
        let goal = StrategicResponse::fallback("timeout").into_goal(9);
        assert_eq!(goal.name, StrategicGoal::DEFAULT_NAME);
        assert_eq!(goal.reasoning, "timeout");
        assert_eq!(goal.timestamp_ms, 9);
    }
}

//! Presentation events.
//!
//! Fire-and-forget notifications for the rendering layer. Nothing in the
//! simulation waits on, or reads back, anything sent through this channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BuildingKind, Equipment, Item, Priority};
use crate::ids::{AgentId, BuildingId, ResourceId};
use crate::structs::Position;

/// Why an agent died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Food reached zero.
    Starvation,
    /// Warmth reached zero.
    Freezing,
    /// Health ran out with food and warmth both above zero.
    Exhaustion,
}

/// A discrete notification for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresentationEvent {
    /// An action node began a timed or visible action.
    ActionStarted {
        /// Acting agent.
        agent: AgentId,
        /// Action label (`harvest`, `build`, `eat`, `wait`).
        action: String,
        /// Target entity id, if any.
        target: Option<String>,
    },
    /// A timed action finished.
    ActionFinished {
        /// Acting agent.
        agent: AgentId,
        /// Action label.
        action: String,
        /// Whether the action applied its effect.
        success: bool,
    },
    /// One unit was taken from a resource node.
    ResourceHarvested {
        /// Harvesting agent.
        agent: AgentId,
        /// Node harvested.
        #[ts(as = "String")]
        resource: ResourceId,
        /// Item produced.
        item: Item,
        /// Units left on the node.
        remaining: u32,
    },
    /// A node ran out.
    ResourceDepleted {
        /// Node that ran out.
        #[ts(as = "String")]
        resource: ResourceId,
    },
    /// A depleted node came back.
    ResourceRespawned {
        /// Node that respawned.
        #[ts(as = "String")]
        resource: ResourceId,
    },
    /// A building was completed.
    BuildingConstructed {
        /// New building id.
        #[ts(as = "String")]
        building: BuildingId,
        /// Building type.
        kind: BuildingKind,
        /// Who built it.
        builder: AgentId,
        /// Where it stands.
        position: Position,
    },
    /// Equipment was crafted.
    EquipmentCrafted {
        /// Crafting agent.
        agent: AgentId,
        /// Item crafted.
        equipment: Equipment,
    },
    /// An agent ate something.
    AgentAte {
        /// Eating agent.
        agent: AgentId,
        /// Item eaten.
        item: Item,
        /// Food value restored.
        food: f64,
    },
    /// A strategic goal was accepted into the goal buffer.
    GoalReceived {
        /// Agent.
        agent: AgentId,
        /// Goal name.
        goal: String,
        /// Goal priority.
        priority: Priority,
    },
    /// A tactical plan was compiled and started.
    PlanStarted {
        /// Agent.
        agent: AgentId,
        /// Goal being realized.
        goal: String,
        /// Step list.
        steps: Vec<String>,
    },
    /// An agent died.
    AgentDied {
        /// Dead agent.
        agent: AgentId,
        /// Display name.
        name: String,
        /// Cause.
        cause: DeathCause,
    },
    /// Every agent died and the world was rebuilt.
    WorldReset {
        /// Generation counter after the reset, starting at 1.
        generation: u32,
    },
}

/// A presentation event stamped for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventEnvelope {
    /// Monotonic sequence number within one process.
    pub sequence: u64,
    /// Simulation time of emission, in milliseconds.
    pub sim_time_ms: u64,
    /// Wall-clock time of emission.
    pub emitted_at: DateTime<Utc>,
    /// The event.
    pub event: PresentationEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = PresentationEvent::WorldReset { generation: 2 };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert_eq!(json, r#"{"type":"world_reset","generation":2}"#);
    }

    #[test]
    fn resource_ids_serialize_as_text() {
        let event = PresentationEvent::ResourceDepleted {
            resource: ResourceId::new(crate::enums::ResourceKind::BerryBush, 4),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"berry_4\""));
    }
}

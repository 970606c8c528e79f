//! Shared type definitions for the Hearth survivor simulation.
//!
//! Every crate in the workspace speaks in these types. The snapshot, oracle
//! contract and presentation events are exported to `TypeScript` via
//! `ts-rs` for the rendering layer.
//!
//! # Modules
//!
//! - [`ids`] -- Agent UUIDs and textual entity ids (`tree_3`, `campfire_1`)
//! - [`enums`] -- Resource kinds, items, recipes, priorities, activities
//! - [`structs`] -- Positions, vitals, goals, plans, failure records
//! - [`snapshot`] -- World snapshot and the oracle request/response contract
//! - [`events`] -- Presentation notifications

pub mod enums;
pub mod events;
pub mod ids;
pub mod snapshot;
pub mod structs;

pub use enums::{
    Activity, BuildingKind, CognitionPhase, Equipment, Item, Priority, RecipeId, ResourceKind, Stat,
};
pub use events::{DeathCause, EventEnvelope, PresentationEvent};
pub use ids::{AgentId, BuildingId, ParseIdError, ResourceId, TargetId};
pub use snapshot::{
    NearbyAgent, NearbyBuilding, NearbyResource, Readiness, RecipeReadiness, SelfView,
    StrategicRequest, StrategicResponse, TacticalRequest, TacticalResponse, WorldSnapshot,
};
pub use structs::{FailureRecord, Position, STAT_MAX, StrategicGoal, TacticalPlan, Vitals};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::AgentId::export_all();

        let _ = crate::enums::ResourceKind::export_all();
        let _ = crate::enums::Item::export_all();
        let _ = crate::enums::BuildingKind::export_all();
        let _ = crate::enums::Equipment::export_all();
        let _ = crate::enums::RecipeId::export_all();
        let _ = crate::enums::Priority::export_all();
        let _ = crate::enums::Stat::export_all();
        let _ = crate::enums::Activity::export_all();
        let _ = crate::enums::CognitionPhase::export_all();

        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::Vitals::export_all();
        let _ = crate::structs::StrategicGoal::export_all();
        let _ = crate::structs::TacticalPlan::export_all();
        let _ = crate::structs::FailureRecord::export_all();

        let _ = crate::snapshot::WorldSnapshot::export_all();
        let _ = crate::snapshot::StrategicRequest::export_all();
        let _ = crate::snapshot::StrategicResponse::export_all();
        let _ = crate::snapshot::TacticalRequest::export_all();
        let _ = crate::snapshot::TacticalResponse::export_all();

        let _ = crate::events::DeathCause::export_all();
        let _ = crate::events::PresentationEvent::export_all();
        let _ = crate::events::EventEnvelope::export_all();
    }
}

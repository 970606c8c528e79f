//! Snapshot assembly.
//!
//! Builds the [`WorldSnapshot`] an oracle sees when it picks a goal or a
//! plan for one agent: the agent's own body, nearby live resources, every
//! building, the other survivors, recipe readiness and the active whisper.
//!
//! Depleted nodes never appear in a snapshot. A kind with no live node in
//! view is listed as an exploration cue instead.

use std::collections::BTreeMap;

use hearth_agents::{Agent, recipe};
use hearth_types::{
    NearbyAgent, NearbyBuilding, NearbyResource, RecipeId, RecipeReadiness, ResourceKind,
    SelfView, WorldSnapshot,
};
use hearth_world::{BuildingRegistry, ResourceRegistry};

use crate::context::VISIBLE_RADIUS;
use crate::world::World;

/// Live nodes reported per resource kind.
pub const NODES_PER_KIND: usize = 5;

/// Build the snapshot for `agent` as it stands in `world`.
pub fn build_snapshot(world: &World, agent: &Agent, whisper: Option<&str>) -> WorldSnapshot {
    let from = agent.position;
    let resources = nearby_resources(&world.resources, agent);

    let nearest_distances = ResourceKind::ALL
        .into_iter()
        .map(|kind| {
            let distance = world
                .resources
                .nearest_live(kind, from, None)
                .map(|node| from.distance_to(node.position));
            (kind, distance)
        })
        .collect::<BTreeMap<_, _>>();

    let exploration_cues = ResourceKind::ALL
        .into_iter()
        .filter(|kind| {
            !world
                .resources
                .live_within(from, VISIBLE_RADIUS)
                .any(|node| node.kind() == *kind)
        })
        .collect();

    let mut others: Vec<NearbyAgent> = world
        .agents
        .iter()
        .filter(|other| other.id != agent.id && other.is_alive())
        .map(|other| NearbyAgent {
            name: other.name.clone(),
            position: other.position,
            distance: from.distance_to(other.position),
        })
        .collect();
    others.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    WorldSnapshot {
        agent_id: agent.id,
        time_ms: world.now_ms(),
        self_view: self_view(agent),
        nearest_distances,
        resources,
        buildings: nearby_buildings(&world.buildings, agent),
        others,
        recipes: recipe_readiness(agent, &world.buildings),
        exploration_cues,
        whisper: whisper.map(str::to_owned),
    }
}

fn self_view(agent: &Agent) -> SelfView {
    SelfView {
        name: agent.name.clone(),
        position: agent.position,
        vitals: agent.vitals,
        inventory: agent.inventory.non_zero(),
        equipment: agent.equipment.iter().copied().collect(),
        activity: agent.activity,
        strategic_goal: agent.strategic_goal.as_ref().map(|g| g.name.clone()),
        last_failure: agent.last_failure.clone(),
    }
}

/// Up to [`NODES_PER_KIND`] closest live nodes of each kind, grouped by
/// kind and sorted by distance within each group.
fn nearby_resources(resources: &ResourceRegistry, agent: &Agent) -> Vec<NearbyResource> {
    let mut out = Vec::new();
    for kind in ResourceKind::ALL {
        let mut live: Vec<NearbyResource> = resources
            .iter()
            .filter(|node| node.kind() == kind && node.is_harvestable())
            .map(|node| NearbyResource {
                id: node.id,
                kind,
                position: node.position,
                remaining: node.remaining(),
                distance: agent.distance_to(node.position),
            })
            .collect();
        live.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        live.truncate(NODES_PER_KIND);
        out.extend(live);
    }
    out
}

fn nearby_buildings(buildings: &BuildingRegistry, agent: &Agent) -> Vec<NearbyBuilding> {
    let mut out: Vec<NearbyBuilding> = buildings
        .iter()
        .map(|b| NearbyBuilding {
            id: b.id,
            kind: b.kind(),
            position: b.position,
            distance: agent.distance_to(b.position),
        })
        .collect();
    out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    out
}

fn recipe_readiness(agent: &Agent, buildings: &BuildingRegistry) -> Vec<RecipeReadiness> {
    RecipeId::ALL
        .into_iter()
        .map(|id| {
            let recipe = recipe(id);
            let built = recipe.building().is_some_and(|kind| buildings.exists(kind));
            recipe.readiness(&agent.inventory, built)
        })
        .collect()
}

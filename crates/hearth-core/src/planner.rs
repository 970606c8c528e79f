//! Rule-based tactical planner.
//!
//! Turns a strategic goal into a short list of step descriptions using only
//! the live world state. The planner is deterministic apart from the
//! harvest repeat count, which is drawn from the caller's RNG, and it never
//! mutates anything.
//!
//! An empty step list means "cannot act on this goal right now". The
//! thought explains why.

use hearth_agents::{Agent, recipe};
use hearth_types::{BuildingKind, Item, RecipeId, ResourceKind, TacticalResponse, TargetId};
use hearth_world::{BuildingRegistry, ResourceRegistry};
use rand::Rng;

/// Highest number of harvest steps emitted for one gather goal.
pub const MAX_HARVEST_REPEATS: u32 = 3;

/// Pause after reaching the campfire.
pub const WARM_UP_WAIT_MS: u64 = 2_000;

fn no_plan(thought: impl Into<String>) -> TacticalResponse {
    TacticalResponse {
        steps: Vec::new(),
        thought: thought.into(),
    }
}

fn plan(steps: Vec<String>, thought: impl Into<String>) -> TacticalResponse {
    TacticalResponse {
        steps,
        thought: thought.into(),
    }
}

/// Plan steps for `goal` given the current world.
pub fn generate_plan<R: Rng>(
    agent: &Agent,
    goal: &str,
    resources: &ResourceRegistry,
    buildings: &BuildingRegistry,
    rng: &mut R,
) -> TacticalResponse {
    let goal = goal.trim().to_uppercase();

    if let Some(kind) = goal.strip_prefix("GATHER_") {
        return plan_gather(agent, kind, resources, rng);
    }
    if let Some(recipe_name) = goal.strip_prefix("BUILD_") {
        return plan_build(agent, recipe_name, buildings);
    }
    if let Some(item) = goal.strip_prefix("CONSUME_") {
        return plan_consume(agent, item);
    }
    if goal == "STAND_NEAR_CAMPFIRE" {
        return plan_warm_up(agent, buildings);
    }
    if goal == "SURVIVE" || goal == "IDLE" {
        return plan(vec!["WAIT".to_owned()], "Surviving...");
    }
    plan(vec!["WAIT".to_owned()], format!("Unknown goal {goal}, waiting"))
}

fn plan_gather<R: Rng>(
    agent: &Agent,
    kind_name: &str,
    resources: &ResourceRegistry,
    rng: &mut R,
) -> TacticalResponse {
    let kind = Item::from_token(kind_name)
        .and_then(ResourceKind::yielding)
        .or_else(|| ResourceKind::from_token(kind_name));
    let Some(kind) = kind else {
        return no_plan(format!("Nothing called {} can be gathered", kind_name.to_lowercase()));
    };

    let failed_target = agent
        .last_failure
        .as_ref()
        .and_then(|f| match f.target {
            Some(TargetId::Resource(id)) if id.kind == kind => Some(id),
            _ => None,
        });
    let Some(node) = resources.nearest_live(kind, agent.position, failed_target) else {
        return no_plan(format!("No {kind} found"));
    };

    let repeats = rng.random_range(1..=MAX_HARVEST_REPEATS);
    let mut steps = vec![format!("Move to {}", node.id)];
    steps.extend((0..repeats).map(|_| format!("Harvest {}", node.id)));
    plan(steps, format!("Gathering {kind} from {}", node.id))
}

fn plan_build(agent: &Agent, recipe_name: &str, buildings: &BuildingRegistry) -> TacticalResponse {
    let Some(id) = RecipeId::from_token(recipe_name) else {
        return no_plan(format!("Unknown recipe {}", recipe_name.to_lowercase()));
    };
    let recipe = recipe(id);
    if let Some(kind) = recipe.building().filter(|kind| buildings.exists(*kind)) {
        return no_plan(format!("A {kind} already exists"));
    }
    if !agent.inventory.has_all(&recipe.requirements) {
        return no_plan(format!("Missing materials for {id}"));
    }
    plan(vec![format!("Build {id}")], format!("Building {id}"))
}

fn plan_consume(agent: &Agent, item_name: &str) -> TacticalResponse {
    let Some(item) = Item::from_token(item_name).filter(|item| item.is_edible()) else {
        return no_plan(format!("{} is not food", item_name.to_lowercase()));
    };
    if !agent.inventory.has(item, 1) {
        return no_plan(format!("No {item} to eat"));
    }
    let step = match item {
        Item::CookedMeat => "Eat cooked meat".to_owned(),
        Item::RawMeat => "Eat raw meat".to_owned(),
        other => format!("Eat {other}"),
    };
    plan(vec![step], format!("Eating {item}"))
}

fn plan_warm_up(agent: &Agent, buildings: &BuildingRegistry) -> TacticalResponse {
    let Some(campfire) = buildings.nearest(BuildingKind::Campfire, agent.position) else {
        return no_plan("No campfire found");
    };
    plan(
        vec![
            format!("Move to {}", campfire.id),
            format!("Wait({WARM_UP_WAIT_MS})"),
        ],
        format!("Warming up at {}", campfire.id),
    )
}

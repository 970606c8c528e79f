//! Plan compiler: turns tactical step text into a behavior tree.
//!
//! Each step is lowercased, split into words and classified by keyword
//! family, checked in this order:
//!
//! | Family   | Keywords                                  | Compiles to                          |
//! |----------|-------------------------------------------|--------------------------------------|
//! | Movement | move/go/walk/head + "to"                  | `MoveTo(id)` or `GatherNearest(kind)` |
//! | Gather   | gather, harvest, collect, get, pick       | `MoveTo(id)` then `Harvest(id)`, or `GatherNearest(kind)` |
//! | Build    | build, construct, craft, make             | `Build(recipe)`                      |
//! | Eat      | eat, consume, munch                       | `Eat(item)`                          |
//! | Return   | return, go back, head back                | dropped                              |
//! | Wait     | wait, rest, assess, sleep, chill          | `Wait(ms)`                           |
//!
//! A family that matches its verb but finds nothing to bind to falls through
//! to the next family. An entity id in the text (`tree_3`, `rock 2`,
//! `campfire_1`) binds the step to that exact entity; a bare kind word
//! compiles to a node that finds the nearest live node when ticked.

use hearth_types::{
    BuildingId, BuildingKind, Item, RecipeId, ResourceId, ResourceKind, TargetId,
};
use tracing::{debug, warn};

use crate::bt::{
    BoxedNode, Build, BtNode, Eat, GatherNearest, Harvest, MoveTo, Sequence, StepTracker, Wait,
};

/// Name of the root node of every compiled plan.
pub const PLAN_ROOT_NAME: &str = "TacticalPlan";

/// Wait used when a rest step gives no duration.
pub const DEFAULT_WAIT_MS: u64 = 3_000;

/// Wait used when resting by the fire.
pub const CAMPFIRE_WAIT_MS: u64 = 10_000;

/// A compiled tactical plan.
pub struct CompiledPlan {
    /// Root sequence of step trackers.
    pub tree: Sequence,
    /// The steps that compiled, in order. Tracker indices point into this.
    pub steps: Vec<String>,
    /// Steps that could not be classified.
    pub dropped: Vec<String>,
}

/// Compile `steps` into a tree. Returns `None` when no step compiles.
pub fn compile_plan<S: AsRef<str>>(steps: &[S]) -> Option<CompiledPlan> {
    let mut nodes: Vec<BoxedNode> = Vec::new();
    let mut kept = Vec::new();
    let mut dropped = Vec::new();

    for step in steps {
        let text = step.as_ref();
        if let Some(node) = compile_step(text) {
            debug!(step = text, node = node.name(), "Step compiled");
            nodes.push(Box::new(StepTracker::new(kept.len(), node)));
            kept.push(text.to_owned());
        } else {
            warn!(step = text, "Could not parse plan step, dropping it");
            dropped.push(text.to_owned());
        }
    }

    if nodes.is_empty() {
        return None;
    }
    Some(CompiledPlan {
        tree: Sequence::new(PLAN_ROOT_NAME, nodes),
        steps: kept,
        dropped,
    })
}

/// Compile a single step.
pub fn compile_step(text: &str) -> Option<BoxedNode> {
    let words = tokenize(text);
    movement(&words)
        .or_else(|| gather(&words))
        .or_else(|| build(&words))
        .or_else(|| eat(&words))
        .or_else(|| {
            if is_return(&words) {
                None
            } else {
                wait(&words)
            }
        })
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_owned)
        .collect()
}

fn has_any(words: &[String], keywords: &[&str]) -> bool {
    words.iter().any(|w| keywords.contains(&w.as_str()))
}

fn has_pair(words: &[String], first: &[&str], second: &str) -> bool {
    words
        .windows(2)
        .any(|pair| matches!(pair, [a, b] if first.contains(&a.as_str()) && b == second))
}

// ---------------------------------------------------------------------------
// Entity ids
// ---------------------------------------------------------------------------

fn kind_word(word: &str) -> Option<TargetKind> {
    ResourceKind::from_token(word)
        .map(TargetKind::Resource)
        .or_else(|| BuildingKind::from_token(word).map(TargetKind::Building))
}

#[derive(Clone, Copy)]
enum TargetKind {
    Resource(ResourceKind),
    Building(BuildingKind),
}

impl TargetKind {
    const fn with_index(self, index: u32) -> TargetId {
        match self {
            Self::Resource(kind) => TargetId::Resource(ResourceId::new(kind, index)),
            Self::Building(kind) => TargetId::Building(BuildingId::new(kind, index)),
        }
    }
}

/// `tree_3`, `tree3`, `bush_2`, `campfire_1`.
fn joined_id(word: &str) -> Option<TargetId> {
    let split = word.find(|c: char| c.is_ascii_digit())?;
    let (prefix, digits) = word.split_at(split);
    let index = digits.parse::<u32>().ok()?;
    kind_word(prefix.trim_end_matches('_')).map(|kind| kind.with_index(index))
}

fn extract_target(words: &[String]) -> Option<TargetId> {
    words.iter().find_map(|w| joined_id(w)).or_else(|| {
        words.windows(2).find_map(|pair| match pair {
            [kind, index] => {
                let index = index.parse::<u32>().ok()?;
                kind_word(kind).map(|k| k.with_index(index))
            }
            _ => None,
        })
    })
}

fn resource_kind_of(words: &[String], table: &[(&[&str], ResourceKind)]) -> Option<ResourceKind> {
    table
        .iter()
        .find(|(keywords, _)| has_any(words, keywords))
        .map(|(_, kind)| *kind)
}

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

const MOVE_KINDS: &[(&[&str], ResourceKind)] = &[
    (&["tree", "forest", "woods"], ResourceKind::Tree),
    (&["rock", "stone", "mountain"], ResourceKind::Rock),
    (&["berry", "berries", "bush", "food"], ResourceKind::BerryBush),
];

const GATHER_KINDS: &[(&[&str], ResourceKind)] = &[
    (&["wood", "tree", "forest"], ResourceKind::Tree),
    (&["stone", "rock"], ResourceKind::Rock),
    (&["berry", "berries", "bush"], ResourceKind::BerryBush),
];

fn movement(words: &[String]) -> Option<BoxedNode> {
    let is_move = has_pair(words, &["move", "go", "walk", "head"], "to")
        || has_any(words, &["move_to", "go_to", "walk_to", "head_to"]);
    if !is_move {
        return None;
    }
    if let Some(target) = extract_target(words) {
        return Some(Box::new(MoveTo::new(target)));
    }
    resource_kind_of(words, MOVE_KINDS)
        .map(|kind| Box::new(GatherNearest::new(kind)) as BoxedNode)
}

fn gather(words: &[String]) -> Option<BoxedNode> {
    if !has_any(words, &["gather", "harvest", "collect", "get", "pick"]) {
        return None;
    }
    if let Some(TargetId::Resource(id)) = extract_target(words) {
        return Some(Box::new(Sequence::new(
            format!("Gather({id})"),
            vec![
                Box::new(MoveTo::new(TargetId::Resource(id))) as BoxedNode,
                Box::new(Harvest::new(id)),
            ],
        )));
    }
    resource_kind_of(words, GATHER_KINDS)
        .map(|kind| Box::new(GatherNearest::new(kind)) as BoxedNode)
}

fn build(words: &[String]) -> Option<BoxedNode> {
    if !has_any(words, &["build", "construct", "craft", "make"]) {
        return None;
    }
    let recipe = if has_any(words, &["shelter", "house"]) {
        RecipeId::Shelter
    } else if has_any(words, &["campfire", "fire"]) {
        RecipeId::Campfire
    } else if has_any(words, &["spear", "weapon"]) {
        RecipeId::Spear
    } else {
        return None;
    };
    Some(Box::new(Build::new(recipe)))
}

fn eat(words: &[String]) -> Option<BoxedNode> {
    if !has_any(words, &["eat", "consume", "munch"]) {
        return None;
    }
    let item = if has_any(words, &["berry", "berries"]) {
        Some(Item::Berries)
    } else if has_any(words, &["meat"]) {
        Some(if has_any(words, &["cooked"]) {
            Item::CookedMeat
        } else {
            Item::RawMeat
        })
    } else {
        None
    };
    Some(Box::new(Eat::new(item)))
}

fn is_return(words: &[String]) -> bool {
    has_any(words, &["return"]) || has_pair(words, &["go", "head"], "back")
}

fn wait(words: &[String]) -> Option<BoxedNode> {
    if !has_any(words, &["wait", "rest", "assess", "sleep", "chill"]) {
        return None;
    }
    let explicit = words.windows(2).find_map(|pair| match pair {
        [n, unit] if matches!(unit.as_str(), "s" | "sec" | "secs" | "second" | "seconds") => {
            n.parse::<u64>().ok().map(|secs| secs.saturating_mul(1000))
        }
        _ => None,
    });
    let explicit = explicit.or_else(|| words.iter().find_map(|w| w.parse::<u64>().ok()));
    let duration = explicit.unwrap_or_else(|| {
        if has_any(words, &["campfire", "fire"]) {
            CAMPFIRE_WAIT_MS
        } else {
            DEFAULT_WAIT_MS
        }
    });
    Some(Box::new(Wait::new(duration)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hearth_types::Position;

    use super::*;
    use crate::bt::NodeStatus;
    use crate::bt::testing::{test_world, tick_first};

    fn name_of(step: &str) -> Option<String> {
        compile_step(step).map(|n| n.name().to_owned())
    }

    #[test]
    fn move_then_harvest_binds_exact_id() {
        let plan = compile_plan(&["Move to tree_1", "Harvest tree_1"]).unwrap();
        assert_eq!(plan.tree.name(), PLAN_ROOT_NAME);
        assert_eq!(plan.tree.len(), 2);
        let first = plan.tree.children().next().unwrap();
        assert_eq!(first.target().map(|t| t.to_string()), Some("tree_1".to_owned()));
        assert_eq!(first.name(), "MoveTo(tree_1)");
    }

    #[test]
    fn keyword_families() {
        assert_eq!(name_of("Go to rock 4").as_deref(), Some("MoveTo(rock_4)"));
        assert_eq!(name_of("walk to bush_2").as_deref(), Some("MoveTo(berry_2)"));
        assert_eq!(name_of("Move to campfire_1").as_deref(), Some("MoveTo(campfire_1)"));
        assert_eq!(name_of("head to the forest").as_deref(), Some("GatherNearest(tree)"));
        assert_eq!(name_of("Collect stone").as_deref(), Some("GatherNearest(rock)"));
        assert_eq!(name_of("pick berries").as_deref(), Some("GatherNearest(berry)"));
        assert_eq!(name_of("Harvest rock3").as_deref(), Some("Gather(rock_3)"));
        assert_eq!(name_of("Build a house").as_deref(), Some("Build(shelter)"));
        assert_eq!(name_of("craft fire").as_deref(), Some("Build(campfire)"));
        assert_eq!(name_of("Make spear").as_deref(), Some("Build(spear)"));
        assert_eq!(name_of("Eat berries").as_deref(), Some("Eat(berries)"));
        assert_eq!(name_of("eat cooked meat").as_deref(), Some("Eat(cookedMeat)"));
        assert_eq!(name_of("consume meat").as_deref(), Some("Eat(rawMeat)"));
        assert_eq!(name_of("munch").as_deref(), Some("Eat"));
    }

    #[test]
    fn wait_durations() {
        assert_eq!(name_of("WAIT").as_deref(), Some("Wait(3000)"));
        assert_eq!(name_of("Wait(2000)").as_deref(), Some("Wait(2000)"));
        assert_eq!(name_of("rest 5 seconds").as_deref(), Some("Wait(5000)"));
        assert_eq!(name_of("Rest by the campfire").as_deref(), Some("Wait(10000)"));
        assert_eq!(name_of("assess surroundings").as_deref(), Some("Wait(3000)"));
    }

    #[test]
    fn forest_is_not_rest() {
        assert_eq!(name_of("explore the forest"), None);
    }

    #[test]
    fn return_steps_are_dropped() {
        assert_eq!(name_of("Return to camp and rest"), None);
        assert_eq!(name_of("go back"), None);
    }

    #[test]
    fn unparseable_plan_compiles_to_none() {
        assert!(compile_plan(&["dance", "sing a song"]).is_none());
        assert!(compile_plan::<&str>(&[]).is_none());
    }

    #[test]
    fn dropped_steps_do_not_shift_tracker_indices() {
        let plan = compile_plan(&["dance", "Gather wood", "Wait"]).unwrap();
        assert_eq!(plan.steps, vec!["Gather wood", "Wait"]);
        assert_eq!(plan.dropped, vec!["dance"]);
        assert_eq!(plan.tree.len(), 2);
    }

    #[test]
    fn gather_wood_resolves_at_tick_time() {
        let mut world = test_world();
        let plan = compile_plan(&["Gather wood"]).unwrap();
        let mut tree = plan.tree;
        world
            .resources
            .spawn(ResourceKind::Tree, Position::new(9.0, 0.0), 3, 3000, 60_000);
        assert_eq!(tick_first(&mut world, &mut tree), NodeStatus::Running);
        assert_eq!(
            world.agents.first().unwrap().destination,
            Some(Position::new(9.0, 0.0))
        );
    }
}

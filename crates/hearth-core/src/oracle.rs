//! Goal oracle seam and the built-in rule oracle.
//!
//! A [`GoalOracle`] answers the strategic contract (pick a goal for this
//! agent) and optionally the tactical one (turn a goal into steps). The
//! runner calls it out of band with a timeout and substitutes the fallback
//! goal when it errors, so implementations are free to fail.
//!
//! The trait uses `impl Future` returns and is therefore not object safe.
//! Binaries that choose a backend at runtime wrap the candidates in an enum.

use std::future::Future;

use hearth_types::{
    AgentId, Item, Priority, Readiness, RecipeId, ResourceKind, StrategicRequest,
    StrategicResponse, TacticalRequest, TacticalResponse, WorldSnapshot,
};
use tracing::debug;

/// Errors an oracle may return instead of a decision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The oracle did not answer before the deadline.
    #[error("oracle timed out for agent {agent} after {timeout_ms}ms")]
    Timeout {
        /// Agent the request was for.
        agent: AgentId,
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The oracle could not be reached.
    #[error("oracle unreachable: {message}")]
    Unreachable {
        /// Transport-level description.
        message: String,
    },

    /// The oracle answered with something unusable.
    #[error("malformed oracle response: {message}")]
    Malformed {
        /// What was wrong with it.
        message: String,
    },

    /// The oracle does not implement the tactical contract.
    #[error("oracle does not provide tactical plans")]
    TacticsUnsupported,
}

/// A source of strategic goals and, optionally, tactical plans.
pub trait GoalOracle: Send + Sync + 'static {
    /// Pick a strategic goal.
    fn strategic(
        &self,
        request: StrategicRequest,
    ) -> impl Future<Output = Result<StrategicResponse, OracleError>> + Send;

    /// Plan steps for a goal. The default declines, which makes the
    /// scheduler fall back to the local planner.
    fn tactical(
        &self,
        request: TacticalRequest,
    ) -> impl Future<Output = Result<TacticalResponse, OracleError>> + Send {
        drop(request);
        std::future::ready(Err(OracleError::TacticsUnsupported))
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Food below which an agent carrying food eats.
const HUNGRY: f64 = 40.0;

/// Food below which eating is urgent.
const STARVING: f64 = 20.0;

/// Warmth below which an agent heads for an existing campfire.
const COLD: f64 = 40.0;

/// Berries an agent likes to keep in reserve.
const BERRY_RESERVE: u32 = 5;

/// Deterministic goal selection from vitals, inventory and recipe
/// readiness. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleOracle;

impl RuleOracle {
    /// A rule oracle.
    pub const fn new() -> Self {
        Self
    }

    /// Choose a goal for the agent described by `snapshot`.
    pub fn decide(snapshot: &WorldSnapshot) -> StrategicResponse {
        let decision = whisper_goal(snapshot)
            .or_else(|| survival_goal(snapshot))
            .or_else(|| construction_goal(snapshot))
            .unwrap_or_else(|| idle_goal(snapshot));
        debug!(
            agent = %snapshot.self_view.name,
            goal = %decision.goal,
            priority = ?decision.priority,
            "Rule oracle decided"
        );
        decision
    }
}

impl GoalOracle for RuleOracle {
    fn strategic(
        &self,
        request: StrategicRequest,
    ) -> impl Future<Output = Result<StrategicResponse, OracleError>> + Send {
        std::future::ready(Ok(Self::decide(&request.snapshot)))
    }
}

fn respond(goal: impl Into<String>, priority: Priority, reasoning: impl Into<String>) -> StrategicResponse {
    StrategicResponse {
        goal: goal.into(),
        priority,
        reasoning: reasoning.into(),
    }
}

/// Map an operator directive onto a goal by keyword.
fn whisper_goal(snapshot: &WorldSnapshot) -> Option<StrategicResponse> {
    let text = snapshot.whisper.as_deref()?.to_lowercase();
    let goal = if text.contains("campfire") || text.contains("fire") {
        "BUILD_CAMPFIRE"
    } else if text.contains("shelter") {
        "BUILD_SHELTER"
    } else if text.contains("spear") {
        "BUILD_SPEAR"
    } else if text.contains("wood") || text.contains("tree") {
        "GATHER_WOOD"
    } else if text.contains("stone") || text.contains("rock") {
        "GATHER_STONE"
    } else if text.contains("berr") || text.contains("food") || text.contains("eat") {
        "GATHER_BERRIES"
    } else if text.contains("warm") {
        "STAND_NEAR_CAMPFIRE"
    } else {
        return None;
    };
    Some(respond(goal, Priority::Urgent, format!("Following the whisper: {text}")))
}

fn survival_goal(snapshot: &WorldSnapshot) -> Option<StrategicResponse> {
    let me = &snapshot.self_view;
    let food = me.vitals.food;

    if food < HUNGRY {
        let carried = Item::EDIBLE_PRIORITY
            .into_iter()
            .find(|item| me.inventory.get(item).copied().unwrap_or(0) > 0);
        let priority = if food < STARVING {
            Priority::Urgent
        } else {
            Priority::High
        };
        if let Some(item) = carried {
            return Some(respond(
                format!("CONSUME_{}", item.token().to_uppercase()),
                priority,
                format!("Hungry ({food:.0}) and carrying {item}"),
            ));
        }
        if has_live(snapshot, ResourceKind::BerryBush) {
            return Some(respond(
                "GATHER_BERRIES",
                priority,
                format!("Hungry ({food:.0}) with nothing to eat"),
            ));
        }
    }

    let has_campfire = snapshot
        .buildings
        .iter()
        .any(|b| b.kind == hearth_types::BuildingKind::Campfire);
    if me.vitals.warmth < COLD && has_campfire {
        return Some(respond(
            "STAND_NEAR_CAMPFIRE",
            Priority::High,
            format!("Cold ({:.0}), a campfire is burning", me.vitals.warmth),
        ));
    }
    None
}

fn construction_goal(snapshot: &WorldSnapshot) -> Option<StrategicResponse> {
    let owns_spear = snapshot
        .self_view
        .equipment
        .contains(&hearth_types::Equipment::Spear);
    for (recipe, priority) in [
        (RecipeId::Campfire, Priority::High),
        (RecipeId::Shelter, Priority::Medium),
        (RecipeId::Spear, Priority::Low),
    ] {
        if recipe == RecipeId::Spear && owns_spear {
            continue;
        }
        let Some(readiness) = snapshot.recipes.iter().find(|r| r.recipe == recipe) else {
            continue;
        };
        match readiness.status {
            Readiness::AlreadyBuilt => {}
            Readiness::Ready => {
                return Some(respond(
                    format!("BUILD_{}", recipe.token().to_uppercase()),
                    priority,
                    format!("Have everything for a {recipe}"),
                ));
            }
            Readiness::Missing => {
                let shortfall = readiness
                    .missing
                    .iter()
                    .filter(|(item, _)| {
                        ResourceKind::yielding(**item).is_some_and(|kind| has_live(snapshot, kind))
                    })
                    .max_by_key(|(_, amount)| **amount);
                if let Some((item, amount)) = shortfall {
                    return Some(respond(
                        format!("GATHER_{}", item.token().to_uppercase()),
                        Priority::Medium,
                        format!("Need {amount} more {item} for a {recipe}"),
                    ));
                }
            }
        }
    }
    None
}

fn idle_goal(snapshot: &WorldSnapshot) -> StrategicResponse {
    let berries = snapshot
        .self_view
        .inventory
        .get(&Item::Berries)
        .copied()
        .unwrap_or(0);
    if berries < BERRY_RESERVE && has_live(snapshot, ResourceKind::BerryBush) {
        return respond("GATHER_BERRIES", Priority::Low, "Stocking up on food");
    }
    StrategicResponse::fallback("Nothing pressing")
}

fn has_live(snapshot: &WorldSnapshot, kind: ResourceKind) -> bool {
    snapshot
        .nearest_distances
        .get(&kind)
        .is_some_and(Option::is_some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use hearth_types::{
        Activity, BuildingId, BuildingKind, NearbyBuilding, Position, RecipeReadiness, SelfView,
        Vitals,
    };

    use super::*;

    fn snapshot() -> WorldSnapshot {
        WorldSnapshot {
            agent_id: AgentId::new(),
            time_ms: 0,
            self_view: SelfView {
                name: "Ada".into(),
                position: Position::default(),
                vitals: Vitals::default(),
                inventory: BTreeMap::new(),
                equipment: Vec::new(),
                activity: Activity::Idle,
                strategic_goal: None,
                last_failure: None,
            },
            nearest_distances: ResourceKind::ALL.into_iter().map(|k| (k, Some(5.0))).collect(),
            resources: Vec::new(),
            buildings: Vec::new(),
            others: Vec::new(),
            recipes: RecipeId::ALL
                .into_iter()
                .map(|recipe| RecipeReadiness {
                    recipe,
                    status: Readiness::Missing,
                    cost: BTreeMap::new(),
                    missing: BTreeMap::from([(Item::Wood, 10), (Item::Stone, 3)]),
                })
                .collect(),
            exploration_cues: Vec::new(),
            whisper: None,
        }
    }

    #[test]
    fn hungry_agent_with_food_eats_best_item() {
        let mut snap = snapshot();
        snap.self_view.vitals.food = 10.0;
        snap.self_view.inventory.insert(Item::Berries, 2);
        snap.self_view.inventory.insert(Item::CookedMeat, 1);
        let decision = RuleOracle::decide(&snap);
        assert_eq!(decision.goal, "CONSUME_COOKEDMEAT");
        assert_eq!(decision.priority, Priority::Urgent);
    }

    #[test]
    fn hungry_agent_without_food_gathers_berries() {
        let mut snap = snapshot();
        snap.self_view.vitals.food = 30.0;
        let decision = RuleOracle::decide(&snap);
        assert_eq!(decision.goal, "GATHER_BERRIES");
        assert_eq!(decision.priority, Priority::High);
    }

    #[test]
    fn cold_agent_warms_up_at_campfire() {
        let mut snap = snapshot();
        snap.self_view.vitals.warmth = 20.0;
        snap.buildings.push(NearbyBuilding {
            id: BuildingId::new(BuildingKind::Campfire, 1),
            kind: BuildingKind::Campfire,
            position: Position::new(3.0, 0.0),
            distance: 3.0,
        });
        assert_eq!(RuleOracle::decide(&snap).goal, "STAND_NEAR_CAMPFIRE");
    }

    #[test]
    fn ready_campfire_is_built_first() {
        let mut snap = snapshot();
        if let Some(r) = snap.recipes.iter_mut().find(|r| r.recipe == RecipeId::Campfire) {
            r.status = Readiness::Ready;
            r.missing.clear();
        }
        assert_eq!(RuleOracle::decide(&snap).goal, "BUILD_CAMPFIRE");
    }

    #[test]
    fn missing_materials_gather_largest_shortfall() {
        let decision = RuleOracle::decide(&snapshot());
        assert_eq!(decision.goal, "GATHER_WOOD");
        assert!(decision.reasoning.contains("campfire"));
    }

    #[test]
    fn whisper_takes_precedence() {
        let mut snap = snapshot();
        snap.self_view.vitals.food = 10.0;
        snap.whisper = Some("Go find some STONE".into());
        let decision = RuleOracle::decide(&snap);
        assert_eq!(decision.goal, "GATHER_STONE");
        assert_eq!(decision.priority, Priority::Urgent);
    }

    #[test]
    fn nothing_to_do_falls_back_to_survive() {
        let mut snap = snapshot();
        snap.nearest_distances = ResourceKind::ALL.into_iter().map(|k| (k, None)).collect();
        assert_eq!(RuleOracle::decide(&snap).goal, "SURVIVE");
    }

    #[tokio::test]
    async fn rule_oracle_declines_tactics() {
        let snap = snapshot();
        let request = TacticalRequest {
            agent_id: snap.agent_id,
            goal: hearth_types::StrategicGoal::fallback(0),
            snapshot: snap,
        };
        assert_eq!(
            RuleOracle::new().tactical(request).await,
            Err(OracleError::TacticsUnsupported)
        );
    }
}

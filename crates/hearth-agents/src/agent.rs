//! The agent body: everything about an agent that the world can see and
//! the behavior tree can change.
//!
//! Cognition state (the running tree, the goal buffer, the thinking flag)
//! lives in the scheduler, not here.

use std::collections::BTreeSet;

use hearth_types::{
    Activity, AgentId, Equipment, FailureRecord, Item, Position, Stat, StrategicGoal,
    TacticalPlan, Vitals,
};

use crate::error::AgentError;
use crate::inventory::Inventory;

/// Energy restored by every meal.
pub const MEAL_ENERGY: f64 = 5.0;

/// Food value of an edible item.
pub const fn food_value(item: Item) -> Option<f64> {
    match item {
        Item::Berries => Some(15.0),
        Item::RawMeat => Some(20.0),
        Item::CookedMeat => Some(35.0),
        Item::Wood | Item::Stone | Item::Fur => None,
    }
}

/// A survivor.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Unique id.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Current position.
    pub position: Position,
    /// Where the agent is walking to, if anywhere.
    pub destination: Option<Position>,
    /// Survival stats.
    pub vitals: Vitals,
    /// Carried items.
    pub inventory: Inventory,
    /// Carried equipment.
    pub equipment: BTreeSet<Equipment>,
    /// What the body is doing.
    pub activity: Activity,
    /// Goal currently being pursued.
    pub strategic_goal: Option<StrategicGoal>,
    /// Plan currently being executed.
    pub tactical_plan: Option<TacticalPlan>,
    /// Last plan failure, cleared on success.
    pub last_failure: Option<FailureRecord>,
    /// Latest diagnostic left by a behavior node.
    pub diagnostic: Option<String>,
    alive: bool,
}

impl Agent {
    /// A fresh, healthy agent at `position`.
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            position,
            destination: None,
            vitals: Vitals::default(),
            inventory: Inventory::default(),
            equipment: BTreeSet::new(),
            activity: Activity::Idle,
            strategic_goal: None,
            tactical_plan: None,
            last_failure: None,
            diagnostic: None,
            alive: true,
        }
    }

    /// Whether the agent is still alive.
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Mark the agent dead. Dead agents stop moving and are never
    /// scheduled again.
    pub fn kill(&mut self) {
        self.alive = false;
        self.destination = None;
        self.activity = Activity::Idle;
        self.vitals.set(Stat::Health, 0.0);
    }

    /// Leave a diagnostic for the scheduler and the UI.
    pub fn record_diagnostic(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(agent = %self.name, diagnostic = %message, "Node diagnostic");
        self.diagnostic = Some(message);
    }

    /// Distance from the agent to `pos`.
    pub fn distance_to(&self, pos: Position) -> f64 {
        self.position.distance_to(pos)
    }

    /// Walk toward the destination for `dt_secs` at `speed`.
    /// Returns `true` on the step that arrives.
    pub fn step_movement(&mut self, speed: f64, dt_secs: f64) -> bool {
        let Some(dest) = self.destination else {
            return false;
        };
        self.position = self.position.step_toward(dest, speed * dt_secs.max(0.0));
        if self.position.distance_to(dest) <= f64::EPSILON {
            self.destination = None;
            if self.activity == Activity::Moving {
                self.activity = Activity::Idle;
            }
            return true;
        }
        self.activity = Activity::Moving;
        false
    }

    /// Eat one `item` from the inventory. Returns the food restored.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NotEdible`] for non-food items and
    /// [`AgentError::InsufficientItem`] when none is carried.
    pub fn eat(&mut self, item: Item) -> Result<f64, AgentError> {
        let value = food_value(item).ok_or(AgentError::NotEdible(item))?;
        self.inventory.remove(item, 1)?;
        self.vitals.adjust(Stat::Food, value);
        self.vitals.adjust(Stat::Energy, MEAL_ENERGY);
        self.activity = Activity::Eating;
        tracing::info!(agent = %self.name, item = %item, food = self.vitals.food, "Agent ate");
        Ok(value)
    }

    /// The best food carried, by [`Item::EDIBLE_PRIORITY`].
    pub fn best_food(&self) -> Option<Item> {
        Item::EDIBLE_PRIORITY
            .into_iter()
            .find(|item| self.inventory.has(*item, 1))
    }
}

//! Capabilities that behavior-tree action nodes need from the world.
//!
//! Action nodes never touch the registries directly. They go through the
//! [`Context`] trait, which the world implements with [`WorldContext`] and
//! tests can implement with a scripted fake.

use hearth_agents::{Agent, AgentError, recipe};
use hearth_types::{
    Activity, Item, Position, PresentationEvent, RecipeId, ResourceId, ResourceKind, TargetId,
};
use hearth_world::{BuildingRegistry, PacingPreset, ResourceRegistry};
use tracing::debug;

use crate::task::{TaskBook, TaskHandle, TaskKind, TaskPoll};

/// Distance at which an agent counts as having reached a target.
pub const INTERACTION_DISTANCE: f64 = 2.0;

/// Extra reach allowed when starting a harvest, on top of
/// [`INTERACTION_DISTANCE`].
pub const HARVEST_REACH_SLACK: f64 = 0.5;

/// Radius within which resources and buildings count as visible.
pub const VISIBLE_RADIUS: f64 = 20.0;

/// Why an action could not start.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    /// The target id does not exist in this world.
    #[error("target {0} not found")]
    TargetMissing(TargetId),

    /// The resource node exists but has nothing left.
    #[error("resource {0} is depleted")]
    Depleted(ResourceId),

    /// The agent is too far from the target to interact.
    #[error("too far from {target} ({distance:.1} units)")]
    TooFar {
        /// The target.
        target: TargetId,
        /// Current distance to it.
        distance: f64,
    },

    /// The agent lacks the recipe's requirements.
    #[error("cannot afford {0}")]
    CannotAfford(RecipeId),

    /// A building of this recipe already stands.
    #[error("{0} already built")]
    AlreadyBuilt(RecipeId),

    /// The inventory has no room for the harvested item.
    #[error("inventory full")]
    InventoryFull,

    /// An agent-level operation failed.
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Where a target is and whether it can still be used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTarget {
    /// Target position.
    pub position: Position,
    /// `false` for depleted resource nodes.
    pub available: bool,
}

/// What action nodes may ask of the world.
pub trait Context {
    /// Current simulation time in milliseconds.
    fn now_ms(&self) -> u64;

    /// Look up a target by exact id.
    fn resolve_target(&self, target: TargetId) -> Option<ResolvedTarget>;

    /// Nearest harvestable node of `kind`, skipping `exclude`.
    fn nearest_resource(
        &self,
        kind: ResourceKind,
        from: Position,
        exclude: Option<ResourceId>,
    ) -> Option<(ResourceId, Position)>;

    /// A harvestable node within `radius` that yields `item`, if any.
    fn visible_source_of(&self, item: Item, from: Position, radius: f64) -> Option<ResourceId>;

    /// Begin harvesting one unit from `resource`.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing, depleted or out of reach, or the
    /// agent's inventory is full.
    fn start_harvest(
        &mut self,
        agent: &mut Agent,
        resource: ResourceId,
    ) -> Result<TaskHandle, ActionError>;

    /// Pay for and begin crafting `recipe`.
    ///
    /// # Errors
    ///
    /// Fails without touching the inventory if the agent cannot afford the
    /// recipe or the building already exists.
    fn start_craft(&mut self, agent: &mut Agent, recipe: RecipeId)
    -> Result<TaskHandle, ActionError>;

    /// Check on a task started earlier.
    fn poll_task(&mut self, handle: &TaskHandle) -> TaskPoll;

    /// Eat one `item` from the agent's inventory. Returns the food restored.
    ///
    /// # Errors
    ///
    /// Fails if the item is not carried or not edible.
    fn consume_item(&mut self, agent: &mut Agent, item: Item) -> Result<f64, ActionError>;

    /// Emit a presentation event.
    fn notify(&mut self, event: PresentationEvent);
}

/// [`Context`] over the borrowed parts of a [`World`](crate::world::World).
#[derive(Debug)]
pub struct WorldContext<'a> {
    pub(crate) resources: &'a ResourceRegistry,
    pub(crate) buildings: &'a BuildingRegistry,
    pub(crate) tasks: &'a mut TaskBook,
    pub(crate) events: &'a mut Vec<PresentationEvent>,
    pub(crate) pacing: &'a PacingPreset,
    pub(crate) now_ms: u64,
}

impl Context for WorldContext<'_> {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn resolve_target(&self, target: TargetId) -> Option<ResolvedTarget> {
        match target {
            TargetId::Resource(id) => self.resources.get(id).map(|node| ResolvedTarget {
                position: node.position,
                available: node.is_harvestable(),
            }),
            TargetId::Building(id) => self.buildings.get(id).map(|b| ResolvedTarget {
                position: b.position,
                available: true,
            }),
        }
    }

    fn nearest_resource(
        &self,
        kind: ResourceKind,
        from: Position,
        exclude: Option<ResourceId>,
    ) -> Option<(ResourceId, Position)> {
        self.resources
            .nearest_live(kind, from, exclude)
            .map(|node| (node.id, node.position))
    }

    fn visible_source_of(&self, item: Item, from: Position, radius: f64) -> Option<ResourceId> {
        let kind = ResourceKind::yielding(item)?;
        self.resources
            .live_within(from, radius)
            .find(|node| node.kind() == kind)
            .map(|node| node.id)
    }

    fn start_harvest(
        &mut self,
        agent: &mut Agent,
        resource: ResourceId,
    ) -> Result<TaskHandle, ActionError> {
        let node = self
            .resources
            .get(resource)
            .ok_or(ActionError::TargetMissing(TargetId::Resource(resource)))?;
        if !node.is_harvestable() {
            return Err(ActionError::Depleted(resource));
        }
        let distance = agent.distance_to(node.position);
        if distance > INTERACTION_DISTANCE + HARVEST_REACH_SLACK {
            return Err(ActionError::TooFar {
                target: TargetId::Resource(resource),
                distance,
            });
        }
        if agent.inventory.free_space() == 0 {
            return Err(ActionError::InventoryFull);
        }

        let due = self.now_ms.saturating_add(node.harvest_ms);
        let handle = self
            .tasks
            .schedule(agent.id, TaskKind::Harvest { resource }, due);
        agent.activity = Activity::Harvesting;
        agent.destination = None;
        debug!(agent = %agent.name, resource = %resource, due_ms = due, "Harvest started");
        self.events.push(PresentationEvent::ActionStarted {
            agent: agent.id,
            action: "harvest".to_owned(),
            target: Some(resource.to_string()),
        });
        Ok(handle)
    }

    fn start_craft(
        &mut self,
        agent: &mut Agent,
        recipe_id: RecipeId,
    ) -> Result<TaskHandle, ActionError> {
        let recipe = recipe(recipe_id);
        if recipe
            .building()
            .is_some_and(|kind| self.buildings.exists(kind))
        {
            return Err(ActionError::AlreadyBuilt(recipe_id));
        }
        recipe
            .pay(&mut agent.inventory)
            .map_err(|err| {
                debug!(agent = %agent.name, error = %err, "Craft refused");
                ActionError::CannotAfford(recipe_id)
            })?;

        let due = self
            .now_ms
            .saturating_add(self.pacing.craft_ms(recipe.base_craft_ms));
        let handle = self.tasks.schedule(
            agent.id,
            TaskKind::Craft {
                recipe: recipe_id,
                paid: recipe.requirements.clone(),
            },
            due,
        );
        agent.activity = Activity::Crafting;
        agent.destination = None;
        debug!(agent = %agent.name, recipe = %recipe_id, due_ms = due, "Craft started");
        self.events.push(PresentationEvent::ActionStarted {
            agent: agent.id,
            action: "build".to_owned(),
            target: Some(recipe_id.token().to_owned()),
        });
        Ok(handle)
    }

    fn poll_task(&mut self, handle: &TaskHandle) -> TaskPoll {
        self.tasks.poll(handle)
    }

    fn consume_item(&mut self, agent: &mut Agent, item: Item) -> Result<f64, ActionError> {
        let food = agent.eat(item)?;
        self.events.push(PresentationEvent::AgentAte {
            agent: agent.id,
            item,
            food,
        });
        Ok(food)
    }

    fn notify(&mut self, event: PresentationEvent) {
        self.events.push(event);
    }
}

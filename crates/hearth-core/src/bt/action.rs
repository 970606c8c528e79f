//! Action nodes.
//!
//! Actions may span many ticks. Timed work (harvesting, crafting) is started
//! through the [`Context`] and tracked with a [`TaskHandle`]; the node keeps
//! returning [`NodeStatus::Running`] until the world settles the task.
//! Resetting a node drops its handle, which cancels the task.
//!
//! A failing action leaves a diagnostic on the agent so the next planning
//! round can see what went wrong.

use hearth_agents::Agent;
use hearth_types::{
    Activity, Item, PresentationEvent, RecipeId, ResourceId, ResourceKind, TargetId,
};

use super::{BtNode, NodeStatus};
use crate::context::{Context, INTERACTION_DISTANCE, VISIBLE_RADIUS};
use crate::task::{TaskHandle, TaskOutcome, TaskPoll};

const fn running_flag(status: NodeStatus) -> bool {
    matches!(status, NodeStatus::Running)
}

// ---------------------------------------------------------------------------
// MoveTo
// ---------------------------------------------------------------------------

/// Walk to a target named by exact id.
///
/// Fails at once if the target does not exist or is depleted. No other
/// target is substituted.
pub struct MoveTo {
    name: String,
    target: TargetId,
    running: bool,
}

impl MoveTo {
    /// Walk to `target`.
    pub fn new(target: TargetId) -> Self {
        Self {
            name: format!("MoveTo({target})"),
            target,
            running: false,
        }
    }
}

impl BtNode for MoveTo {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        let status = match ctx.resolve_target(self.target) {
            None => {
                agent.record_diagnostic(format!("target {} not found", self.target));
                agent.destination = None;
                NodeStatus::Failure
            }
            Some(resolved) if !resolved.available => {
                agent.record_diagnostic(format!("target {} is depleted", self.target));
                agent.destination = None;
                NodeStatus::Failure
            }
            Some(resolved) if agent.distance_to(resolved.position) <= INTERACTION_DISTANCE => {
                agent.destination = None;
                if agent.activity == Activity::Moving {
                    agent.activity = Activity::Idle;
                }
                NodeStatus::Success
            }
            Some(resolved) => {
                if !self.running {
                    ctx.notify(PresentationEvent::ActionStarted {
                        agent: agent.id,
                        action: "move".to_owned(),
                        target: Some(self.target.to_string()),
                    });
                }
                agent.destination = Some(resolved.position);
                agent.activity = Activity::Moving;
                NodeStatus::Running
            }
        };
        self.running = running_flag(status);
        status
    }

    fn reset(&mut self) {
        self.running = false;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Option<TargetId> {
        Some(self.target)
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        self.running.then_some(self as &dyn BtNode)
    }
}

// ---------------------------------------------------------------------------
// Harvest
// ---------------------------------------------------------------------------

/// Take one unit from a resource node the agent is standing next to.
pub struct Harvest {
    name: String,
    resource: ResourceId,
    handle: Option<TaskHandle>,
}

impl Harvest {
    /// Harvest `resource`.
    pub fn new(resource: ResourceId) -> Self {
        Self {
            name: format!("Harvest({resource})"),
            resource,
            handle: None,
        }
    }
}

impl BtNode for Harvest {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        let Some(handle) = &self.handle else {
            return match ctx.start_harvest(agent, self.resource) {
                Ok(handle) => {
                    self.handle = Some(handle);
                    NodeStatus::Running
                }
                Err(err) => {
                    agent.record_diagnostic(format!("cannot harvest {}: {err}", self.resource));
                    NodeStatus::Failure
                }
            };
        };

        match ctx.poll_task(handle) {
            TaskPoll::Pending => NodeStatus::Running,
            TaskPoll::Done(TaskOutcome::Harvested { .. }) => {
                self.handle = None;
                NodeStatus::Success
            }
            TaskPoll::Done(TaskOutcome::Failed { reason }) => {
                self.handle = None;
                agent.record_diagnostic(format!("harvest of {} failed: {reason}", self.resource));
                NodeStatus::Failure
            }
            TaskPoll::Done(_) | TaskPoll::Unknown => {
                self.handle = None;
                agent.record_diagnostic(format!("harvest of {} was lost", self.resource));
                NodeStatus::Failure
            }
        }
    }

    fn reset(&mut self) {
        self.handle = None;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Option<TargetId> {
        Some(TargetId::Resource(self.resource))
    }

    fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        self.handle.is_some().then_some(self as &dyn BtNode)
    }
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Pay for a recipe and wait out its craft time.
pub struct Build {
    name: String,
    recipe: RecipeId,
    handle: Option<TaskHandle>,
}

impl Build {
    /// Craft `recipe`.
    pub fn new(recipe: RecipeId) -> Self {
        Self {
            name: format!("Build({recipe})"),
            recipe,
            handle: None,
        }
    }
}

impl BtNode for Build {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        let Some(handle) = &self.handle else {
            return match ctx.start_craft(agent, self.recipe) {
                Ok(handle) => {
                    self.handle = Some(handle);
                    NodeStatus::Running
                }
                Err(err) => {
                    agent.record_diagnostic(format!("cannot build {}: {err}", self.recipe));
                    NodeStatus::Failure
                }
            };
        };

        match ctx.poll_task(handle) {
            TaskPoll::Pending => NodeStatus::Running,
            TaskPoll::Done(TaskOutcome::Built { .. } | TaskOutcome::Crafted { .. }) => {
                self.handle = None;
                NodeStatus::Success
            }
            TaskPoll::Done(TaskOutcome::Failed { reason }) => {
                self.handle = None;
                agent.record_diagnostic(format!("build of {} failed: {reason}", self.recipe));
                NodeStatus::Failure
            }
            TaskPoll::Done(TaskOutcome::Harvested { .. }) | TaskPoll::Unknown => {
                self.handle = None;
                agent.record_diagnostic(format!("build of {} was lost", self.recipe));
                NodeStatus::Failure
            }
        }
    }

    fn reset(&mut self) {
        self.handle = None;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        self.handle.is_some().then_some(self as &dyn BtNode)
    }
}

// ---------------------------------------------------------------------------
// Eat
// ---------------------------------------------------------------------------

/// Eat one carried food item.
///
/// With no item given, the best carried food is chosen. When the food is
/// not carried but a source of it is visible, the diagnostic says it must be
/// harvested first rather than that there is nothing to eat.
pub struct Eat {
    name: String,
    item: Option<Item>,
}

impl Eat {
    /// Eat `item`, or the best carried food when `None`.
    pub fn new(item: Option<Item>) -> Self {
        let name = item.map_or_else(|| "Eat".to_owned(), |item| format!("Eat({item})"));
        Self { name, item }
    }
}

impl BtNode for Eat {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        let wanted = self.item.or_else(|| agent.best_food());
        let Some(item) = wanted.filter(|item| agent.inventory.has(*item, 1)) else {
            let looking_for = wanted.unwrap_or(Item::Berries);
            let message = if ctx
                .visible_source_of(looking_for, agent.position, VISIBLE_RADIUS)
                .is_some()
            {
                format!("must harvest {looking_for} first")
            } else {
                "nothing to eat".to_owned()
            };
            agent.record_diagnostic(message);
            return NodeStatus::Failure;
        };

        match ctx.consume_item(agent, item) {
            Ok(_) => NodeStatus::Success,
            Err(err) => {
                agent.record_diagnostic(format!("cannot eat {item}: {err}"));
                NodeStatus::Failure
            }
        }
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        false
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        None
    }
}

// ---------------------------------------------------------------------------
// Wait
// ---------------------------------------------------------------------------

/// Rest in place for a fixed duration.
pub struct Wait {
    name: String,
    duration_ms: u64,
    started_at: Option<u64>,
}

impl Wait {
    /// Rest for `duration_ms`.
    pub fn new(duration_ms: u64) -> Self {
        Self {
            name: format!("Wait({duration_ms})"),
            duration_ms,
            started_at: None,
        }
    }

    /// Configured duration.
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

impl BtNode for Wait {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        let now = ctx.now_ms();
        let started = if let Some(started) = self.started_at {
            started
        } else {
            self.started_at = Some(now);
            agent.activity = Activity::Resting;
            agent.destination = None;
            ctx.notify(PresentationEvent::ActionStarted {
                agent: agent.id,
                action: "wait".to_owned(),
                target: None,
            });
            now
        };

        if now.saturating_sub(started) >= self.duration_ms {
            self.started_at = None;
            if agent.activity == Activity::Resting {
                agent.activity = Activity::Idle;
            }
            NodeStatus::Success
        } else {
            NodeStatus::Running
        }
    }

    fn reset(&mut self) {
        self.started_at = None;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        self.started_at.is_some().then_some(self as &dyn BtNode)
    }
}

// ---------------------------------------------------------------------------
// GatherNearest
// ---------------------------------------------------------------------------

/// Walk to the nearest live node of a kind and harvest one unit.
///
/// The target is looked up again on every tick while walking, so a node
/// that depletes or a closer one that respawns changes course. Once the
/// harvest has started the node stays bound to that target.
pub struct GatherNearest {
    name: String,
    kind: ResourceKind,
    bound: Option<ResourceId>,
    harvest: Option<Harvest>,
    running: bool,
}

impl GatherNearest {
    /// Gather from the nearest node of `kind`.
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            name: format!("GatherNearest({kind})"),
            kind,
            bound: None,
            harvest: None,
            running: false,
        }
    }

    /// Kind of node gathered from.
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn approach(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        let Some((id, position)) = ctx.nearest_resource(self.kind, agent.position, None) else {
            agent.record_diagnostic(format!("no harvestable {} left", self.kind));
            agent.destination = None;
            return NodeStatus::Failure;
        };
        self.bound = Some(id);

        if agent.distance_to(position) > INTERACTION_DISTANCE {
            agent.destination = Some(position);
            agent.activity = Activity::Moving;
            return NodeStatus::Running;
        }

        agent.destination = None;
        let mut harvest = Harvest::new(id);
        let status = harvest.tick(agent, ctx);
        if status == NodeStatus::Running {
            self.harvest = Some(harvest);
        }
        status
    }
}

impl BtNode for GatherNearest {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        let status = if let Some(harvest) = &mut self.harvest {
            let status = harvest.tick(agent, ctx);
            if status != NodeStatus::Running {
                self.harvest = None;
            }
            status
        } else {
            self.approach(agent, ctx)
        };
        self.running = running_flag(status);
        status
    }

    fn reset(&mut self) {
        self.bound = None;
        self.harvest = None;
        self.running = false;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Option<TargetId> {
        self.bound.map(TargetId::Resource)
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        if !self.running {
            return None;
        }
        self.harvest
            .as_ref()
            .map_or(Some(self as &dyn BtNode), |harvest| harvest.active_node())
    }
}

//! The world aggregate.
//!
//! [`World`] owns every piece of simulation state by value: resource nodes,
//! buildings, agent bodies, in-flight tasks, the simulation clock and the
//! buffer of presentation events emitted since the last drain. Cognition
//! state is kept beside it in the scheduler.

use hearth_agents::{Agent, RecipeOutput, pick_names, recipe};
use hearth_types::{Activity, AgentId, PresentationEvent};
use hearth_world::{
    Abundance, AbundancePreset, BuildingRegistry, Pacing, PacingPreset, ResourceRegistry,
    populate_resources, random_position,
};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::context::WorldContext;
use crate::task::{PendingTask, TaskBook, TaskKind, TaskOutcome};

/// Offset along +x at which a finished building is placed from its builder.
pub const BUILD_OFFSET: f64 = 2.0;

/// Parameters for populating a world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldSettings {
    /// Pacing preset.
    pub pacing: Pacing,
    /// Abundance preset.
    pub abundance: Abundance,
    /// Half-width of the square spawn area.
    pub spawn_range: f64,
    /// Agents spawned per generation.
    pub agent_count: usize,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            pacing: Pacing::Medium,
            abundance: Abundance::Medium,
            spawn_range: 30.0,
            agent_count: 3,
        }
    }
}

/// All simulation state.
#[derive(Debug)]
pub struct World {
    /// Resource nodes.
    pub resources: ResourceRegistry,
    /// Completed buildings.
    pub buildings: BuildingRegistry,
    /// Agent bodies, living and dead.
    pub agents: Vec<Agent>,
    /// In-flight timed actions.
    pub tasks: TaskBook,
    settings: WorldSettings,
    pacing: PacingPreset,
    abundance: AbundancePreset,
    now_ms: u64,
    generation: u32,
    events: Vec<PresentationEvent>,
}

impl World {
    /// An empty world at time zero.
    pub fn new(settings: WorldSettings) -> Self {
        Self {
            resources: ResourceRegistry::new(),
            buildings: BuildingRegistry::new(),
            agents: Vec::new(),
            tasks: TaskBook::new(),
            pacing: settings.pacing.preset(),
            abundance: settings.abundance.preset(),
            settings,
            now_ms: 0,
            generation: 0,
            events: Vec::new(),
        }
    }

    /// Spawn resource nodes and agents.
    pub fn populate<R: Rng>(&mut self, rng: &mut R) {
        let range = self.settings.spawn_range;
        populate_resources(
            &mut self.resources,
            &self.abundance,
            &self.pacing,
            range,
            rng,
        );
        for name in pick_names(self.settings.agent_count, rng) {
            let position = random_position(rng, range);
            self.agents.push(Agent::new(name, position));
        }
        info!(
            agents = self.agents.len(),
            resources = self.resources.len(),
            generation = self.generation,
            "World populated"
        );
    }

    /// Wipe everything and populate a fresh generation. The clock keeps
    /// running.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.tasks.clear();
        self.resources.clear();
        self.buildings.clear();
        self.agents.clear();
        self.generation = self.generation.saturating_add(1);
        self.populate(rng);
        self.events.push(PresentationEvent::WorldReset {
            generation: self.generation,
        });
        info!(generation = self.generation, "World reset");
    }

    /// Current simulation time in milliseconds.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Move the clock forward.
    pub const fn advance(&mut self, dt_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
    }

    /// Number of resets so far.
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Settings this world was created with.
    pub const fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Active pacing table.
    pub const fn pacing(&self) -> &PacingPreset {
        &self.pacing
    }

    /// Look up an agent.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Look up an agent mutably.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    /// Agents still alive.
    pub fn living_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    /// Queue a presentation event.
    pub fn emit(&mut self, event: PresentationEvent) {
        self.events.push(event);
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<PresentationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Split into the agent bodies and a [`Context`](crate::Context) over the
    /// rest of the world.
    pub fn parts(&mut self) -> (&mut [Agent], WorldContext<'_>) {
        let ctx = WorldContext {
            resources: &self.resources,
            buildings: &self.buildings,
            tasks: &mut self.tasks,
            events: &mut self.events,
            pacing: &self.pacing,
            now_ms: self.now_ms,
        };
        (&mut self.agents, ctx)
    }

    /// Respawn depleted nodes whose delay has elapsed.
    pub fn tick_respawns(&mut self) -> usize {
        let restored = self.resources.tick_respawns(self.now_ms);
        let count = restored.len();
        self.events.extend(
            restored
                .into_iter()
                .map(|resource| PresentationEvent::ResourceRespawned { resource }),
        );
        count
    }

    /// Apply every task that is due, and roll back every task whose handle
    /// was dropped. Outcomes are parked for the owning node to poll.
    pub fn settle_tasks(&mut self) {
        for task in self.tasks.take_settleable(self.now_ms) {
            let agent = self.agents.iter_mut().find(|a| a.id == task.agent);

            if task.token.is_cancelled() {
                if let (TaskKind::Craft { recipe, paid }, Some(agent)) = (&task.kind, agent) {
                    let restored = agent.inventory.refund(paid);
                    warn!(agent = %agent.name, recipe = %recipe, restored, "Craft cancelled, materials refunded");
                } else {
                    debug!(task = ?task.id, "Cancelled task dropped");
                }
                continue;
            }

            let outcome = match agent {
                Some(agent) if agent.is_alive() => complete(
                    &task,
                    agent,
                    &mut self.resources,
                    &mut self.buildings,
                    &mut self.events,
                    self.now_ms,
                ),
                _ => TaskOutcome::Failed {
                    reason: "agent is no longer alive".to_owned(),
                },
            };
            self.events.push(PresentationEvent::ActionFinished {
                agent: task.agent,
                action: task.kind.label().to_owned(),
                success: !matches!(outcome, TaskOutcome::Failed { .. }),
            });
            self.tasks.finish(&task, outcome);
        }
        self.tasks.purge_abandoned();
    }
}

/// Apply a due task's effect to a living agent.
fn complete(
    task: &PendingTask,
    agent: &mut Agent,
    resources: &mut ResourceRegistry,
    buildings: &mut BuildingRegistry,
    events: &mut Vec<PresentationEvent>,
    now_ms: u64,
) -> TaskOutcome {
    agent.activity = Activity::Idle;
    match &task.kind {
        TaskKind::Harvest { resource } => {
            let Some(node) = resources.get_mut(*resource) else {
                return TaskOutcome::Failed {
                    reason: format!("{resource} no longer exists"),
                };
            };
            if agent.inventory.free_space() == 0 {
                return TaskOutcome::Failed {
                    reason: "inventory full".to_owned(),
                };
            }
            let remaining = match node.take_one(now_ms) {
                Ok(remaining) => remaining,
                Err(err) => {
                    return TaskOutcome::Failed {
                        reason: err.to_string(),
                    };
                }
            };
            let item = node.item();
            agent.inventory.add(item, 1);
            debug!(agent = %agent.name, resource = %resource, item = %item, remaining, "Harvest completed");
            events.push(PresentationEvent::ResourceHarvested {
                agent: agent.id,
                resource: *resource,
                item,
                remaining,
            });
            if remaining == 0 {
                info!(resource = %resource, "Resource depleted");
                events.push(PresentationEvent::ResourceDepleted {
                    resource: *resource,
                });
            }
            TaskOutcome::Harvested { item, remaining }
        }
        TaskKind::Craft { recipe: id, paid } => match recipe(*id).output {
            RecipeOutput::Building(kind) => {
                if buildings.exists(kind) {
                    agent.inventory.refund(paid);
                    return TaskOutcome::Failed {
                        reason: format!("{kind} was built by someone else first"),
                    };
                }
                let position = agent.position.offset(BUILD_OFFSET, 0.0);
                let building = buildings.construct(kind, position, agent.id, now_ms);
                events.push(PresentationEvent::BuildingConstructed {
                    building,
                    kind,
                    builder: agent.id,
                    position,
                });
                TaskOutcome::Built { building }
            }
            RecipeOutput::Equipment(equipment) => {
                agent.equipment.insert(equipment);
                info!(agent = %agent.name, equipment = ?equipment, "Equipment crafted");
                events.push(PresentationEvent::EquipmentCrafted {
                    agent: agent.id,
                    equipment,
                });
                TaskOutcome::Crafted { equipment }
            }
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hearth_types::{BuildingKind, Item, Position, RecipeId, ResourceKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::context::Context;
    use crate::task::TaskPoll;

    fn test_world() -> World {
        let mut world = World::new(WorldSettings::default());
        world.agents.push(Agent::new("Ada", Position::new(0.0, 0.0)));
        world
    }

    #[test]
    fn populate_spawns_agents_and_nodes() {
        let mut world = World::new(WorldSettings::default());
        let mut rng = StdRng::seed_from_u64(1);
        world.populate(&mut rng);
        assert_eq!(world.agents.len(), 3);
        assert_eq!(world.resources.len(), 31);
        assert_eq!(world.living_count(), 3);
    }

    #[test]
    fn harvest_applies_once_when_due() {
        let mut world = test_world();
        let tree = world
            .resources
            .spawn(ResourceKind::Tree, Position::new(1.0, 0.0), 2, 3000, 60_000);

        let handle = {
            let (agents, mut ctx) = world.parts();
            let agent = agents.first_mut().unwrap();
            ctx.start_harvest(agent, tree).unwrap()
        };
        world.advance(2999);
        world.settle_tasks();
        assert_eq!(world.tasks.poll(&handle), TaskPoll::Pending);

        world.advance(1);
        world.settle_tasks();
        assert_eq!(
            world.tasks.poll(&handle),
            TaskPoll::Done(TaskOutcome::Harvested {
                item: Item::Wood,
                remaining: 1
            })
        );
        assert_eq!(world.agents.first().unwrap().inventory.count(Item::Wood), 1);
    }

    #[test]
    fn cancelled_harvest_never_mutates() {
        let mut world = test_world();
        let tree = world
            .resources
            .spawn(ResourceKind::Tree, Position::new(1.0, 0.0), 2, 3000, 60_000);
        {
            let (agents, mut ctx) = world.parts();
            let agent = agents.first_mut().unwrap();
            let handle = ctx.start_harvest(agent, tree).unwrap();
            drop(handle);
        }
        world.advance(10_000);
        world.settle_tasks();
        assert_eq!(world.resources.get(tree).unwrap().remaining(), 2);
        assert_eq!(world.agents.first().unwrap().inventory.count(Item::Wood), 0);
    }

    #[test]
    fn cancelled_craft_refunds_materials() {
        let mut world = test_world();
        world.agents.first_mut().unwrap().inventory.add(Item::Wood, 10);
        world.agents.first_mut().unwrap().inventory.add(Item::Stone, 3);
        {
            let (agents, mut ctx) = world.parts();
            let agent = agents.first_mut().unwrap();
            let handle = ctx.start_craft(agent, RecipeId::Campfire).unwrap();
            assert_eq!(agent.inventory.total(), 0);
            drop(handle);
        }
        world.settle_tasks();
        let agent = world.agents.first().unwrap();
        assert_eq!(agent.inventory.count(Item::Wood), 10);
        assert_eq!(agent.inventory.count(Item::Stone), 3);
        assert!(!world.buildings.exists(BuildingKind::Campfire));
    }

    #[test]
    fn craft_places_building_beside_builder() {
        let mut world = test_world();
        world.agents.first_mut().unwrap().inventory.add(Item::Wood, 10);
        world.agents.first_mut().unwrap().inventory.add(Item::Stone, 3);
        let handle = {
            let (agents, mut ctx) = world.parts();
            ctx.start_craft(agents.first_mut().unwrap(), RecipeId::Campfire)
                .unwrap()
        };
        world.advance(10_000);
        world.settle_tasks();
        assert!(matches!(
            world.tasks.poll(&handle),
            TaskPoll::Done(TaskOutcome::Built { .. })
        ));
        let campfire = world.buildings.iter().next().unwrap();
        assert_eq!(campfire.position, Position::new(2.0, 0.0));
    }

    #[test]
    fn unaffordable_craft_leaves_inventory_untouched() {
        let mut world = test_world();
        world.agents.first_mut().unwrap().inventory.add(Item::Wood, 4);
        let (agents, mut ctx) = world.parts();
        let agent = agents.first_mut().unwrap();
        let result = ctx.start_craft(agent, RecipeId::Spear);
        assert!(matches!(
            result,
            Err(crate::context::ActionError::CannotAfford(RecipeId::Spear))
        ));
        assert_eq!(agent.inventory.count(Item::Wood), 4);
    }

    #[test]
    fn harvest_of_depleted_node_fails_at_completion() {
        let mut world = test_world();
        world
            .agents
            .push(Agent::new("Bruno", Position::new(0.5, 0.0)));
        let bush = world.resources.spawn(
            ResourceKind::BerryBush,
            Position::new(1.0, 0.0),
            1,
            1000,
            30_000,
        );
        let (first, second) = {
            let (agents, mut ctx) = world.parts();
            let mut iter = agents.iter_mut();
            let a = iter.next().unwrap();
            let b = iter.next().unwrap();
            (
                ctx.start_harvest(a, bush).unwrap(),
                ctx.start_harvest(b, bush).unwrap(),
            )
        };
        world.advance(1000);
        world.settle_tasks();
        assert!(matches!(
            world.tasks.poll(&first),
            TaskPoll::Done(TaskOutcome::Harvested { remaining: 0, .. })
        ));
        assert!(matches!(
            world.tasks.poll(&second),
            TaskPoll::Done(TaskOutcome::Failed { .. })
        ));
        assert!(world.resources.get(bush).unwrap().is_depleted());
    }

    #[test]
    fn reset_bumps_generation_and_repopulates() {
        let mut world = World::new(WorldSettings::default());
        let mut rng = StdRng::seed_from_u64(5);
        world.populate(&mut rng);
        for agent in &mut world.agents {
            agent.kill();
        }
        assert_eq!(world.living_count(), 0);
        world.reset(&mut rng);
        assert_eq!(world.generation(), 1);
        assert_eq!(world.living_count(), 3);
        assert!(
            world
                .drain_events()
                .contains(&PresentationEvent::WorldReset { generation: 1 })
        );
    }
}

//! Cognition scheduler.
//!
//! Each living agent has a [`Mind`]: its goal buffer, its running behavior
//! tree, its strategic cadence and whether it is waiting on the oracle.
//! The scheduler ticks every mind once per simulation step in three stages:
//!
//! 1. **Execute** -- tick the running tree, enforcing the watchdog and the
//!    panic rule, and react to a terminal status.
//! 2. **Plan** -- with no tree and nothing outstanding, pop the next goal
//!    (or the goal being re-planned) and turn it into a tree.
//! 3. **Ask** -- when the cadence is due and no tree is running, queue a
//!    strategic request. Requests land in an outbox the runner drains.
//!
//! Oracle answers come back through [`Scheduler::deliver`]. A mind never
//! has more than one request outstanding.

use std::collections::{BTreeMap, VecDeque};

use hearth_agents::Agent;
use hearth_types::{
    Activity, AgentId, CognitionPhase, FailureRecord, PresentationEvent, StrategicGoal,
    StrategicRequest, StrategicResponse, TacticalPlan, TacticalRequest, TacticalResponse,
    TargetId,
};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::bt::{BtNode, NodeStatus, Sequence, failure_of};
use crate::compiler::compile_plan;
use crate::config::{CognitionConfig, TacticsSource};
use crate::context::Context;
use crate::perception::build_snapshot;
use crate::planner::generate_plan;
use crate::tick::TickError;
use crate::world::World;

/// Node name recorded when the watchdog discards a tree.
pub const WATCHDOG_NODE: &str = "Watchdog";

/// A request waiting to be sent to the goal oracle.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleRequest {
    /// Pick a goal.
    Strategic(StrategicRequest),
    /// Plan a goal.
    Tactical(TacticalRequest),
}

impl OracleRequest {
    /// Agent the request is for.
    pub const fn agent(&self) -> AgentId {
        match self {
            Self::Strategic(req) => req.agent_id,
            Self::Tactical(req) => req.agent_id,
        }
    }
}

/// An oracle answer routed back to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleReply {
    /// Answer to a strategic request.
    Strategic {
        /// Agent the answer is for.
        agent: AgentId,
        /// The chosen goal.
        response: StrategicResponse,
    },
    /// Answer to a tactical request. `None` means the oracle failed and the
    /// local planner should be used instead.
    Tactical {
        /// Agent the answer is for.
        agent: AgentId,
        /// Goal that was planned.
        goal: StrategicGoal,
        /// The plan, if the oracle produced one.
        response: Option<TacticalResponse>,
    },
}

/// What a mind is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Strategy,
    Tactics,
}

struct ActiveTree {
    root: Sequence,
    goal: StrategicGoal,
    started_ms: u64,
}

/// How a tree tick ended, captured before the tree is touched again.
enum TreeEvent {
    Running,
    Succeeded(StrategicGoal),
    Failed {
        goal: StrategicGoal,
        node: String,
        target: Option<TargetId>,
    },
    TimedOut(StrategicGoal),
    Panicked,
}

/// Per-agent cognition state.
pub struct Mind {
    agent: AgentId,
    awaiting: Option<Awaiting>,
    goals: VecDeque<StrategicGoal>,
    tree: Option<ActiveTree>,
    replan: Option<StrategicGoal>,
    replans: u32,
    next_strategic_ms: u64,
    retry_at_ms: u64,
    dead: bool,
    wants_strategy: bool,
    wants_tactics: Option<StrategicGoal>,
}

impl Mind {
    /// A mind whose first strategic request is due at `first_request_ms`.
    pub const fn new(agent: AgentId, first_request_ms: u64) -> Self {
        Self {
            agent,
            awaiting: None,
            goals: VecDeque::new(),
            tree: None,
            replan: None,
            replans: 0,
            next_strategic_ms: first_request_ms,
            retry_at_ms: 0,
            dead: false,
            wants_strategy: false,
            wants_tactics: None,
        }
    }

    /// Agent this mind belongs to.
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// Scheduler state.
    pub const fn phase(&self) -> CognitionPhase {
        if self.dead {
            return CognitionPhase::Dead;
        }
        if self.tree.is_some() {
            return CognitionPhase::Executing;
        }
        match self.awaiting {
            Some(Awaiting::Strategy) => CognitionPhase::AwaitingStrategy,
            Some(Awaiting::Tactics) => CognitionPhase::AwaitingTactics,
            None => CognitionPhase::Idle,
        }
    }

    /// Whether a request is outstanding.
    pub const fn is_thinking(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Goals waiting to be planned, oldest first.
    pub fn buffered_goals(&self) -> impl Iterator<Item = &StrategicGoal> {
        self.goals.iter()
    }

    /// Goal of the running tree.
    pub fn executing_goal(&self) -> Option<&StrategicGoal> {
        self.tree.as_ref().map(|t| &t.goal)
    }

    /// Name of the running leaf, for the inspector.
    pub fn active_node(&self) -> Option<String> {
        self.tree
            .as_ref()
            .and_then(|t| t.root.active_node())
            .map(|node| node.name().to_owned())
    }

    /// Simulation time of the next scheduled strategic request.
    pub const fn next_strategic_ms(&self) -> u64 {
        self.next_strategic_ms
    }

    /// Drop the running tree. In-flight tasks are cancelled with it.
    fn discard(&mut self, agent: &mut Agent) {
        self.tree = None;
        agent.destination = None;
        agent.activity = Activity::Idle;
        agent.tactical_plan = None;
    }

    fn buffer_goal(&mut self, goal: StrategicGoal, limit: usize) {
        self.goals.push_back(goal);
        if self.goals.len() > limit.max(1) {
            let newest = self.goals.pop_back();
            warn!(agent = %self.agent, dropped = self.goals.len(), "Goal buffer overflow, keeping newest");
            self.goals.clear();
            self.goals.extend(newest);
        }
    }

    /// Decide what follows a failed or timed-out goal.
    fn after_failure(&mut self, goal: StrategicGoal, now_ms: u64, max_replans: u32) {
        if self.goals.is_empty() {
            self.replans = 0;
            self.next_strategic_ms = now_ms;
        } else if self.replans < max_replans {
            self.replans = self.replans.saturating_add(1);
            debug!(agent = %self.agent, goal = %goal.name, attempt = self.replans, "Re-planning goal");
            self.replan = Some(goal);
        } else {
            warn!(agent = %self.agent, goal = %goal.name, "Giving up on goal");
            self.replans = 0;
        }
    }

    /// Nothing can be done for now: wait, then ask again.
    fn idle_for(&mut self, now_ms: u64, retry_ms: u64) {
        let retry_at = now_ms.saturating_add(retry_ms);
        self.retry_at_ms = retry_at;
        if self.goals.is_empty() {
            self.next_strategic_ms = self.next_strategic_ms.min(retry_at);
        }
    }

    /// Install a plan for `goal`. Returns the event to emit, if a tree was
    /// built.
    fn adopt(
        &mut self,
        agent: &mut Agent,
        goal: StrategicGoal,
        response: TacticalResponse,
        now_ms: u64,
        retry_ms: u64,
    ) -> Option<PresentationEvent> {
        agent.strategic_goal = Some(goal.clone());
        agent.tactical_plan = None;

        if response.steps.is_empty() {
            info!(agent = %agent.name, goal = %goal.name, thought = %response.thought, "No viable plan");
            self.idle_for(now_ms, retry_ms);
            return None;
        }
        let Some(compiled) = compile_plan(&response.steps) else {
            warn!(agent = %agent.name, goal = %goal.name, steps = ?response.steps, "No plan step could be compiled");
            self.idle_for(now_ms, retry_ms);
            return None;
        };

        info!(
            agent = %agent.name,
            goal = %goal.name,
            steps = compiled.steps.len(),
            thought = %response.thought,
            "Behavior tree started"
        );
        agent.diagnostic = None;
        agent.tactical_plan = Some(TacticalPlan {
            steps: compiled.steps.clone(),
            cursor: 0,
            thought: response.thought,
            timestamp_ms: now_ms,
        });
        let event = PresentationEvent::PlanStarted {
            agent: agent.id,
            goal: goal.name.clone(),
            steps: compiled.steps,
        };
        self.tree = Some(ActiveTree {
            root: compiled.tree,
            goal,
            started_ms: now_ms,
        });
        Some(event)
    }

    fn tick_tree<R: Rng>(
        &mut self,
        agent: &mut Agent,
        ctx: &mut dyn Context,
        config: &CognitionConfig,
        rng: &mut R,
    ) -> TreeEvent {
        let now_ms = ctx.now_ms();
        let Some(active) = self.tree.as_mut() else {
            return TreeEvent::Running;
        };

        if now_ms.saturating_sub(active.started_ms) > config.watchdog_ms {
            return TreeEvent::TimedOut(active.goal.clone());
        }

        let pressed = agent.vitals.food < config.panic_threshold
            || agent.vitals.warmth < config.panic_threshold;
        if pressed && rng.random_bool(config.panic_chance.clamp(0.0, 1.0)) {
            return TreeEvent::Panicked;
        }

        match active.root.tick(agent, ctx) {
            NodeStatus::Running => TreeEvent::Running,
            NodeStatus::Success => TreeEvent::Succeeded(active.goal.clone()),
            NodeStatus::Failure => {
                let failure = failure_of(&active.root);
                TreeEvent::Failed {
                    goal: active.goal.clone(),
                    node: failure.node,
                    target: failure.target,
                }
            }
        }
    }
}

/// Counts of tree outcomes in one scheduler tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CognitionReport {
    /// Trees that finished with success.
    pub succeeded: u32,
    /// Trees that finished with failure.
    pub failed: u32,
    /// Trees discarded by the watchdog or the panic rule.
    pub discarded: u32,
}

/// Owns every mind and the outbox of oracle requests.
pub struct Scheduler {
    config: CognitionConfig,
    minds: BTreeMap<AgentId, Mind>,
    outbox: Vec<OracleRequest>,
}

impl Scheduler {
    /// A scheduler with no minds.
    pub const fn new(config: CognitionConfig) -> Self {
        Self {
            config,
            minds: BTreeMap::new(),
            outbox: Vec::new(),
        }
    }

    /// Replace every mind with a fresh one for the agents of `world`.
    /// Consecutive agents' first requests are offset by the start stagger.
    pub fn attach(&mut self, world: &World) {
        self.minds.clear();
        self.outbox.clear();
        let now = world.now_ms();
        let mut offset: u64 = 0;
        for agent in &world.agents {
            self.minds
                .insert(agent.id, Mind::new(agent.id, now.saturating_add(offset)));
            offset = offset.saturating_add(self.config.start_stagger_ms);
        }
        info!(minds = self.minds.len(), "Minds attached");
    }

    /// Settings in use.
    pub const fn config(&self) -> &CognitionConfig {
        &self.config
    }

    /// Look up a mind.
    pub fn mind(&self, agent: AgentId) -> Option<&Mind> {
        self.minds.get(&agent)
    }

    /// Take every queued oracle request.
    pub fn take_requests(&mut self) -> Vec<OracleRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Stop scheduling a dead agent and drop its tree.
    pub fn bury(&mut self, agent: AgentId) {
        if let Some(mind) = self.minds.get_mut(&agent) {
            mind.dead = true;
            mind.tree = None;
            mind.goals.clear();
            mind.replan = None;
            mind.awaiting = None;
        }
    }

    /// Run one scheduler step over every living agent.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::MindMissing`] if a living agent was never
    /// attached.
    pub fn tick<R: Rng>(
        &mut self,
        world: &mut World,
        rng: &mut R,
        whisper: Option<&str>,
    ) -> Result<CognitionReport, TickError> {
        let now = world.now_ms();
        let mut report = CognitionReport::default();

        for index in 0..world.agents.len() {
            let Some((agent_id, alive)) = world.agents.get(index).map(|a| (a.id, a.is_alive()))
            else {
                continue;
            };
            if !alive {
                self.bury(agent_id);
                continue;
            }
            let mind = self
                .minds
                .get_mut(&agent_id)
                .ok_or(TickError::MindMissing { agent: agent_id })?;

            // Execute.
            {
                let (agents, mut ctx) = world.parts();
                let Some(agent) = agents.get_mut(index) else {
                    continue;
                };
                let event = mind.tick_tree(agent, &mut ctx, &self.config, rng);
                handle_tree_event(mind, agent, event, now, &self.config, &mut report);
            }

            // Plan.
            if mind.tree.is_none() && mind.awaiting.is_none() && now >= mind.retry_at_ms {
                let next = mind.replan.take().or_else(|| {
                    let goal = mind.goals.pop_front();
                    if goal.is_some() {
                        mind.replans = 0;
                    }
                    goal
                });
                if let Some(goal) = next {
                    match self.config.tactics {
                        TacticsSource::Local => {
                            let started = {
                                let Some(agent) = world.agents.get_mut(index) else {
                                    continue;
                                };
                                let response = generate_plan(
                                    agent,
                                    &goal.name,
                                    &world.resources,
                                    &world.buildings,
                                    rng,
                                );
                                mind.adopt(agent, goal, response, now, self.config.idle_retry_ms)
                            };
                            if let Some(event) = started {
                                world.emit(event);
                            }
                        }
                        TacticsSource::Oracle => mind.wants_tactics = Some(goal),
                    }
                }
            }

            // Ask.
            if mind.tree.is_none()
                && mind.awaiting.is_none()
                && mind.wants_tactics.is_none()
                && now >= mind.next_strategic_ms
            {
                mind.wants_strategy = true;
                let jitter = rng.random_range(0..=self.config.strategic_jitter_ms);
                mind.next_strategic_ms = now
                    .saturating_add(self.config.strategic_interval_ms)
                    .saturating_add(jitter);
            }
        }

        self.queue_requests(world, whisper);
        Ok(report)
    }

    /// Turn pending wants into oracle requests. Needs the settled world to
    /// build snapshots.
    fn queue_requests(&mut self, world: &World, whisper: Option<&str>) {
        for agent in world.agents.iter().filter(|a| a.is_alive()) {
            let Some(mind) = self.minds.get_mut(&agent.id) else {
                continue;
            };
            if let Some(goal) = mind.wants_tactics.take() {
                mind.wants_strategy = false;
                mind.awaiting = Some(Awaiting::Tactics);
                debug!(agent = %agent.name, goal = %goal.name, "Tactical request queued");
                self.outbox.push(OracleRequest::Tactical(TacticalRequest {
                    agent_id: agent.id,
                    snapshot: build_snapshot(world, agent, whisper),
                    goal,
                }));
            } else if std::mem::take(&mut mind.wants_strategy) {
                mind.awaiting = Some(Awaiting::Strategy);
                debug!(agent = %agent.name, "Strategic request queued");
                self.outbox.push(OracleRequest::Strategic(StrategicRequest {
                    agent_id: agent.id,
                    snapshot: build_snapshot(world, agent, whisper),
                }));
            }
        }
    }

    /// Apply an oracle answer. Answers for unknown or dead agents are
    /// ignored.
    pub fn deliver<R: Rng>(&mut self, world: &mut World, reply: OracleReply, rng: &mut R) {
        let now = world.now_ms();
        let agent_id = match &reply {
            OracleReply::Strategic { agent, .. } | OracleReply::Tactical { agent, .. } => *agent,
        };
        let Some(mind) = self.minds.get_mut(&agent_id).filter(|m| !m.dead) else {
            debug!(agent = %agent_id, "Reply for unknown or dead agent ignored");
            return;
        };
        mind.awaiting = None;

        match reply {
            OracleReply::Strategic { response, .. } => {
                let goal = response.into_goal(now);
                let name = world
                    .agent(agent_id)
                    .map_or_else(String::new, |a| a.name.clone());
                info!(agent = %name, goal = %goal.name, priority = ?goal.priority, "Strategic goal buffered");
                world.emit(PresentationEvent::GoalReceived {
                    agent: agent_id,
                    goal: goal.name.clone(),
                    priority: goal.priority,
                });
                mind.buffer_goal(goal, self.config.goal_buffer_limit);
            }
            OracleReply::Tactical { goal, response, .. } => {
                if mind.tree.is_some() {
                    debug!(agent = %agent_id, goal = %goal.name, "Tactical reply arrived while executing, ignored");
                    return;
                }
                let started = {
                    let Some(agent) = world.agents.iter_mut().find(|a| a.id == agent_id) else {
                        return;
                    };
                    let response = response.unwrap_or_else(|| {
                        warn!(agent = %agent.name, goal = %goal.name, "Tactical oracle failed, planning locally");
                        generate_plan(agent, &goal.name, &world.resources, &world.buildings, rng)
                    });
                    mind.adopt(agent, goal, response, now, self.config.idle_retry_ms)
                };
                if let Some(event) = started {
                    world.emit(event);
                }
            }
        }
    }
}

/// React to the outcome of a tree tick.
fn handle_tree_event(
    mind: &mut Mind,
    agent: &mut Agent,
    event: TreeEvent,
    now_ms: u64,
    config: &CognitionConfig,
    report: &mut CognitionReport,
) {
    match event {
        TreeEvent::Running => {}
        TreeEvent::Succeeded(goal) => {
            info!(agent = %agent.name, goal = %goal.name, "Plan completed");
            mind.discard(agent);
            mind.replans = 0;
            agent.last_failure = None;
            if mind.goals.is_empty() {
                mind.next_strategic_ms = now_ms;
            }
            report.succeeded = report.succeeded.saturating_add(1);
        }
        TreeEvent::Failed { goal, node, target } => {
            let reason = agent
                .diagnostic
                .take()
                .unwrap_or_else(|| format!("{node} failed"));
            warn!(agent = %agent.name, goal = %goal.name, node = %node, reason = %reason, "Plan failed");
            agent.last_failure = Some(FailureRecord {
                node,
                target,
                reason,
                goal: Some(goal.name.clone()),
                at_ms: now_ms,
            });
            mind.discard(agent);
            mind.after_failure(goal, now_ms, config.max_replans);
            report.failed = report.failed.saturating_add(1);
        }
        TreeEvent::TimedOut(goal) => {
            warn!(agent = %agent.name, goal = %goal.name, watchdog_ms = config.watchdog_ms, "Watchdog discarded behavior tree");
            agent.last_failure = Some(FailureRecord {
                node: WATCHDOG_NODE.to_owned(),
                target: None,
                reason: format!("plan ran longer than {}ms", config.watchdog_ms),
                goal: Some(goal.name.clone()),
                at_ms: now_ms,
            });
            mind.discard(agent);
            mind.after_failure(goal, now_ms, config.max_replans);
            report.discarded = report.discarded.saturating_add(1);
        }
        TreeEvent::Panicked => {
            warn!(
                agent = %agent.name,
                food = agent.vitals.food,
                warmth = agent.vitals.warmth,
                "Panic, abandoning plan"
            );
            mind.discard(agent);
            mind.replan = None;
            mind.next_strategic_ms = now_ms;
            report.discarded = report.discarded.saturating_add(1);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hearth_types::{Item, Position, Priority, ResourceKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::world::WorldSettings;

    fn quiet_config() -> CognitionConfig {
        CognitionConfig {
            strategic_jitter_ms: 0,
            panic_chance: 0.0,
            ..CognitionConfig::default()
        }
    }

    fn setup(names: &[&str], config: CognitionConfig) -> (World, Scheduler, StdRng) {
        let mut world = World::new(WorldSettings::default());
        for name in names {
            world.agents.push(Agent::new(*name, Position::default()));
        }
        let mut scheduler = Scheduler::new(config);
        scheduler.attach(&world);
        (world, scheduler, StdRng::seed_from_u64(7))
    }

    fn step(world: &mut World, scheduler: &mut Scheduler, rng: &mut StdRng, dt_ms: u64) -> CognitionReport {
        world.advance(dt_ms);
        world.settle_tasks();
        scheduler.tick(world, rng, None).unwrap()
    }

    fn first_id(world: &World) -> AgentId {
        world.agents.first().unwrap().id
    }

    fn goal_reply(agent: AgentId, goal: &str) -> OracleReply {
        OracleReply::Strategic {
            agent,
            response: StrategicResponse {
                goal: goal.to_owned(),
                priority: Priority::High,
                reasoning: String::new(),
            },
        }
    }

    fn plan_reply(agent: AgentId, goal: &str, steps: &[&str]) -> OracleReply {
        OracleReply::Tactical {
            agent,
            goal: StrategicGoal::new(goal, Priority::High, "", 0),
            response: Some(TacticalResponse {
                steps: steps.iter().map(|s| (*s).to_owned()).collect(),
                thought: "scripted".to_owned(),
            }),
        }
    }

    #[test]
    fn first_requests_are_staggered_and_never_doubled() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada", "Bruno"], quiet_config());
        scheduler.tick(&mut world, &mut rng, None).unwrap();
        let requests = scheduler.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests.first().unwrap().agent(), first_id(&world));

        step(&mut world, &mut scheduler, &mut rng, 1_000);
        assert!(scheduler.take_requests().is_empty());

        step(&mut world, &mut scheduler, &mut rng, 1_000);
        let requests = scheduler.take_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests.first().unwrap().agent(), world.agents.get(1).unwrap().id);
        assert_eq!(
            scheduler.mind(first_id(&world)).unwrap().phase(),
            CognitionPhase::AwaitingStrategy
        );
    }

    #[test]
    fn overflowing_goal_buffer_keeps_only_newest() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        let id = first_id(&world);
        for goal in ["GATHER_WOOD", "GATHER_STONE", "GATHER_WOOD", "BUILD_CAMPFIRE"] {
            scheduler.deliver(&mut world, goal_reply(id, goal), &mut rng);
        }
        let buffered: Vec<_> = scheduler
            .mind(id)
            .unwrap()
            .buffered_goals()
            .map(|g| g.name.clone())
            .collect();
        assert_eq!(buffered, vec!["BUILD_CAMPFIRE"]);
        let received = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, PresentationEvent::GoalReceived { .. }))
            .count();
        assert_eq!(received, 4);
    }

    #[test]
    fn duplicate_goals_are_kept() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        let id = first_id(&world);
        scheduler.deliver(&mut world, goal_reply(id, "GATHER_WOOD"), &mut rng);
        scheduler.deliver(&mut world, goal_reply(id, "GATHER_WOOD"), &mut rng);
        assert_eq!(scheduler.mind(id).unwrap().buffered_goals().count(), 2);
    }

    #[test]
    fn local_tactics_start_a_tree() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        let tree = world
            .resources
            .spawn(ResourceKind::Tree, Position::new(10.0, 0.0), 5, 3000, 60_000);
        scheduler.tick(&mut world, &mut rng, None).unwrap();
        assert_eq!(scheduler.take_requests().len(), 1);

        let id = first_id(&world);
        scheduler.deliver(&mut world, goal_reply(id, "GATHER_WOOD"), &mut rng);
        step(&mut world, &mut scheduler, &mut rng, 100);

        let mind = scheduler.mind(id).unwrap();
        assert_eq!(mind.phase(), CognitionPhase::Executing);
        assert_eq!(mind.executing_goal().unwrap().name, "GATHER_WOOD");
        let agent = world.agent(id).unwrap();
        let plan = agent.tactical_plan.as_ref().unwrap();
        assert_eq!(plan.steps.first().unwrap(), &format!("Move to {tree}"));
        assert!(world
            .drain_events()
            .iter()
            .any(|e| matches!(e, PresentationEvent::PlanStarted { .. })));
        assert!(scheduler.take_requests().is_empty());
    }

    #[test]
    fn oracle_tactics_queue_a_tactical_request() {
        let config = CognitionConfig {
            tactics: TacticsSource::Oracle,
            ..quiet_config()
        };
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], config);
        let id = first_id(&world);
        scheduler.deliver(&mut world, goal_reply(id, "GATHER_STONE"), &mut rng);
        step(&mut world, &mut scheduler, &mut rng, 100);

        let requests = scheduler.take_requests();
        assert_eq!(requests.len(), 1);
        assert!(matches!(
            requests.first().unwrap(),
            OracleRequest::Tactical(req) if req.goal.name == "GATHER_STONE"
        ));
        assert_eq!(
            scheduler.mind(id).unwrap().phase(),
            CognitionPhase::AwaitingTactics
        );
    }

    #[test]
    fn failed_tactical_oracle_falls_back_to_local_planner() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        world
            .resources
            .spawn(ResourceKind::Rock, Position::new(5.0, 0.0), 5, 3000, 90_000);
        let id = first_id(&world);
        let reply = OracleReply::Tactical {
            agent: id,
            goal: StrategicGoal::new("GATHER_STONE", Priority::High, "", 0),
            response: None,
        };
        scheduler.deliver(&mut world, reply, &mut rng);
        assert_eq!(
            scheduler.mind(id).unwrap().phase(),
            CognitionPhase::Executing
        );
    }

    #[test]
    fn failure_is_recorded_with_target_and_goal() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        let id = first_id(&world);
        scheduler.deliver(&mut world, plan_reply(id, "GATHER_WOOD", &["Move to tree_9"]), &mut rng);

        let report = step(&mut world, &mut scheduler, &mut rng, 100);
        assert_eq!(report.failed, 1);

        let failure = world.agent(id).unwrap().last_failure.clone().unwrap();
        assert_eq!(failure.node, "MoveTo(tree_9)");
        assert_eq!(failure.target, Some("tree_9".parse().unwrap()));
        assert_eq!(failure.reason, "target tree_9 not found");
        assert_eq!(failure.goal.as_deref(), Some("GATHER_WOOD"));

        // Empty buffer: a fresh strategic goal is requested at once.
        let requests = scheduler.take_requests();
        assert!(matches!(requests.as_slice(), [OracleRequest::Strategic(_)]));
    }

    #[test]
    fn failing_goal_is_replanned_a_bounded_number_of_times() {
        let mut mind = Mind::new(AgentId::new(), 0);
        mind.goals.push_back(StrategicGoal::fallback(0));
        let goal = StrategicGoal::new("BUILD_SHELTER", Priority::High, "", 0);

        mind.after_failure(goal.clone(), 10, 2);
        assert_eq!(mind.replan.take(), Some(goal.clone()));
        mind.after_failure(goal.clone(), 20, 2);
        assert_eq!(mind.replan.take(), Some(goal.clone()));
        mind.after_failure(goal, 30, 2);
        assert!(mind.replan.is_none());
        assert_eq!(mind.replans, 0);
        assert_eq!(mind.goals.len(), 1);
    }

    #[test]
    fn watchdog_discards_long_running_tree() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        let id = first_id(&world);
        scheduler.deliver(&mut world, plan_reply(id, "SURVIVE", &["Wait(120000)"]), &mut rng);

        let report = step(&mut world, &mut scheduler, &mut rng, 60_001);
        assert_eq!(report.discarded, 1);
        let failure = world.agent(id).unwrap().last_failure.clone().unwrap();
        assert_eq!(failure.node, WATCHDOG_NODE);
        assert_ne!(
            scheduler.mind(id).unwrap().phase(),
            CognitionPhase::Executing
        );
    }

    #[test]
    fn panic_abandons_plan_and_asks_for_a_goal() {
        let config = CognitionConfig {
            panic_chance: 1.0,
            ..quiet_config()
        };
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], config);
        let id = first_id(&world);
        world.agent_mut(id).unwrap().vitals.food = 1.0;
        scheduler.deliver(&mut world, plan_reply(id, "SURVIVE", &["Wait(10000)"]), &mut rng);

        let report = step(&mut world, &mut scheduler, &mut rng, 100);
        assert_eq!(report.discarded, 1);
        assert!(world.agent(id).unwrap().tactical_plan.is_none());
        let requests = scheduler.take_requests();
        assert!(matches!(requests.as_slice(), [OracleRequest::Strategic(_)]));
    }

    #[test]
    fn panic_cancels_in_flight_harvest() {
        let config = CognitionConfig {
            panic_chance: 1.0,
            panic_threshold: 0.0,
            ..quiet_config()
        };
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], config);
        let tree = world
            .resources
            .spawn(ResourceKind::Tree, Position::new(1.0, 0.0), 5, 3000, 60_000);
        let id = first_id(&world);
        let harvest = format!("Harvest {tree}");
        scheduler.deliver(&mut world, plan_reply(id, "GATHER_WOOD", &[harvest.as_str()]), &mut rng);
        step(&mut world, &mut scheduler, &mut rng, 100);
        step(&mut world, &mut scheduler, &mut rng, 100);
        assert_eq!(world.tasks.pending_len(), 1);

        // Freeze the agent so the next tick panics.
        world.agent_mut(id).unwrap().vitals.warmth = -1.0;
        step(&mut world, &mut scheduler, &mut rng, 100);
        step(&mut world, &mut scheduler, &mut rng, 5_000);
        assert_eq!(world.agent(id).unwrap().inventory.count(Item::Wood), 0);
        assert_eq!(world.resources.get(tree).unwrap().remaining(), 5);
    }

    #[test]
    fn goal_without_plan_idles_then_asks_again() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        scheduler.tick(&mut world, &mut rng, None).unwrap();
        scheduler.take_requests();
        let id = first_id(&world);
        scheduler.deliver(&mut world, goal_reply(id, "BUILD_CAMPFIRE"), &mut rng);

        step(&mut world, &mut scheduler, &mut rng, 100);
        let mind = scheduler.mind(id).unwrap();
        assert_eq!(mind.phase(), CognitionPhase::Idle);
        assert_eq!(mind.next_strategic_ms(), 5_100);
        assert_eq!(
            world.agent(id).unwrap().strategic_goal.as_ref().unwrap().name,
            "BUILD_CAMPFIRE"
        );
        assert!(scheduler.take_requests().is_empty());

        step(&mut world, &mut scheduler, &mut rng, 5_000);
        assert_eq!(scheduler.take_requests().len(), 1);
    }

    #[test]
    fn finished_plan_with_empty_buffer_asks_at_once() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        let id = first_id(&world);
        scheduler.deliver(&mut world, plan_reply(id, "SURVIVE", &["Wait(300)"]), &mut rng);

        let mut succeeded = 0_u32;
        for _ in 0..10 {
            let report = step(&mut world, &mut scheduler, &mut rng, 100);
            succeeded = succeeded.saturating_add(report.succeeded);
            if succeeded > 0 {
                break;
            }
        }
        assert_eq!(succeeded, 1);
        assert!(matches!(
            scheduler.take_requests().as_slice(),
            [OracleRequest::Strategic(_)]
        ));
    }

    #[test]
    fn dead_agents_stop_thinking() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        let id = first_id(&world);
        world.agent_mut(id).unwrap().kill();
        scheduler.tick(&mut world, &mut rng, None).unwrap();
        assert!(scheduler.take_requests().is_empty());
        assert_eq!(scheduler.mind(id).unwrap().phase(), CognitionPhase::Dead);

        scheduler.deliver(&mut world, goal_reply(id, "GATHER_WOOD"), &mut rng);
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn replies_for_unknown_agents_are_ignored() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        scheduler.deliver(&mut world, goal_reply(AgentId::new(), "GATHER_WOOD"), &mut rng);
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn unattached_living_agent_is_an_error() {
        let (mut world, mut scheduler, mut rng) = setup(&["Ada"], quiet_config());
        world.agents.push(Agent::new("Bruno", Position::default()));
        let err = scheduler.tick(&mut world, &mut rng, None).unwrap_err();
        assert!(matches!(err, TickError::MindMissing { .. }));
    }
}

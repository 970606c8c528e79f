//! Tick cycle: one fixed step of the simulation.
//!
//! Each tick runs these phases in order:
//!
//! 1. **Clock** -- advance simulation time by the step.
//! 2. **Settle** -- apply timed actions that came due, roll back cancelled
//!    ones.
//! 3. **Movement** -- step every agent with a destination toward it.
//! 4. **Cognition** -- tick every behavior tree and queue oracle requests
//!    (see [`Scheduler`]).
//! 5. **Vitals** -- decay needs, apply building warmth, process deaths.
//! 6. **Respawn** -- restore depleted resource nodes whose delay elapsed.
//!
//! Given the same world, seed and oracle answers the cycle is deterministic.

use std::time::Duration;

use hearth_agents::{VitalsConfig, apply_vitals};
use hearth_types::{AgentId, PresentationEvent};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::scheduler::{CognitionReport, Scheduler};
use crate::world::World;

/// Errors that can occur during tick execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickError {
    /// A tick must move time forward.
    #[error("tick interval must be greater than zero")]
    ZeroInterval,

    /// A living agent has no mind attached.
    #[error("agent {agent} has no mind attached")]
    MindMissing {
        /// The agent.
        agent: AgentId,
    },
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// Simulation time after the tick.
    pub time_ms: u64,
    /// Agents alive after the tick.
    pub agents_alive: usize,
    /// Agents that died this tick.
    pub deaths: Vec<AgentId>,
    /// Resource nodes restored this tick.
    pub respawned: usize,
    /// Behavior-tree outcomes.
    pub cognition: CognitionReport,
}

/// Run one tick of `dt_ms` milliseconds.
///
/// # Errors
///
/// Returns [`TickError::ZeroInterval`] for a zero step, or a scheduler
/// error if a living agent was never attached.
pub fn run_tick<R: Rng>(
    world: &mut World,
    scheduler: &mut Scheduler,
    vitals: &VitalsConfig,
    dt_ms: u64,
    rng: &mut R,
    whisper: Option<&str>,
) -> Result<TickSummary, TickError> {
    if dt_ms == 0 {
        return Err(TickError::ZeroInterval);
    }
    let dt_secs = Duration::from_millis(dt_ms).as_secs_f64();

    // Phase 1: clock.
    world.advance(dt_ms);

    // Phase 2: settle timed actions.
    world.settle_tasks();

    // Phase 3: movement.
    for agent in world.agents.iter_mut().filter(|a| a.is_alive()) {
        let speed = vitals.move_speed(&agent.vitals);
        if agent.step_movement(speed, dt_secs) {
            debug!(agent = %agent.name, "Arrived");
        }
    }

    // Phase 4: cognition.
    let cognition = scheduler.tick(world, rng, whisper)?;

    // Phase 5: vitals and deaths.
    let deaths = apply_needs(world, vitals, dt_secs);
    for agent in &deaths {
        scheduler.bury(*agent);
    }

    // Phase 6: respawn.
    let respawned = world.tick_respawns();

    Ok(TickSummary {
        time_ms: world.now_ms(),
        agents_alive: world.living_count(),
        deaths,
        respawned,
        cognition,
    })
}

fn apply_needs(world: &mut World, vitals: &VitalsConfig, dt_secs: f64) -> Vec<AgentId> {
    let mut deaths = Vec::new();
    let mut events = Vec::new();
    for agent in world.agents.iter_mut().filter(|a| a.is_alive()) {
        let warmth = world.buildings.warmth_at(agent.position);
        let tick = apply_vitals(&mut agent.vitals, agent.activity, warmth, dt_secs, vitals);
        if let Some(cause) = tick.death {
            warn!(agent = %agent.name, cause = ?cause, "Agent died");
            agent.kill();
            deaths.push(agent.id);
            events.push(PresentationEvent::AgentDied {
                agent: agent.id,
                name: agent.name.clone(),
                cause,
            });
        }
    }
    for event in events {
        world.emit(event);
    }
    if !deaths.is_empty() && world.living_count() == 0 {
        info!(generation = world.generation(), "Every survivor has died");
    }
    deaths
}

//! Tick callback that periodically logs the colony's condition.

use hearth_core::runner::{Simulation, TickCallback};
use hearth_core::tick::TickSummary;
use tracing::info;

/// Simulated time between status lines.
pub const STATUS_EVERY_MS: u64 = 60_000;

/// Logs one line per living agent every [`STATUS_EVERY_MS`] of simulated
/// time, plus every death as it happens.
pub struct StatusCallback {
    next_report_ms: u64,
}

impl StatusCallback {
    /// A callback whose first report is one period in.
    pub const fn new() -> Self {
        Self {
            next_report_ms: STATUS_EVERY_MS,
        }
    }

    /// Whether a report is due at `time_ms`; advances the deadline if so.
    fn due(&mut self, time_ms: u64) -> bool {
        if time_ms < self.next_report_ms {
            return false;
        }
        self.next_report_ms = time_ms.saturating_add(STATUS_EVERY_MS);
        true
    }
}

impl Default for StatusCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl TickCallback for StatusCallback {
    fn on_tick(&mut self, summary: &TickSummary, sim: &Simulation) {
        if !summary.deaths.is_empty() {
            info!(
                time_ms = summary.time_ms,
                deaths = summary.deaths.len(),
                agents_alive = summary.agents_alive,
                "Survivors lost"
            );
        }
        if !self.due(summary.time_ms) {
            return;
        }
        info!(
            time_ms = summary.time_ms,
            generation = sim.world.generation(),
            agents_alive = summary.agents_alive,
            buildings = sim.world.buildings.len(),
            plans_succeeded = summary.cognition.succeeded,
            plans_failed = summary.cognition.failed,
            "Colony status"
        );
        for agent in sim.world.agents.iter().filter(|a| a.is_alive()) {
            let phase = sim.scheduler.mind(agent.id).map(|m| m.phase());
            info!(
                agent = %agent.name,
                food = agent.vitals.food.round(),
                warmth = agent.vitals.warmth.round(),
                health = agent.vitals.health.round(),
                goal = agent.strategic_goal.as_ref().map_or("-", |g| g.name.as_str()),
                phase = ?phase,
                "Survivor status"
            );
        }
    }
}

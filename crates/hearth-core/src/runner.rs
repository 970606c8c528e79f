//! Simulation loop runner.
//!
//! [`Simulation`] owns the world, the scheduler and the RNG and advances
//! them one tick at a time. [`run_simulation`] drives it in real time:
//!
//! - a fixed-interval tick timer
//! - oracle requests dispatched to background tasks with a timeout, their
//!   answers fed back through a channel
//! - operator whispers read from an optional channel
//! - presentation events stamped and broadcast after every tick
//! - clean shutdown on a watch signal or after `max_ticks`
//!
//! Every oracle failure is absorbed here: a strategic request that errors
//! or times out becomes the `SURVIVE` fallback, a tactical one falls back to
//! the local planner. The loop itself never stops because of the oracle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hearth_agents::VitalsConfig;
use hearth_types::{EventEnvelope, StrategicResponse};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::HearthConfig;
use crate::oracle::{GoalOracle, OracleError};
use crate::scheduler::{OracleReply, OracleRequest, Scheduler};
use crate::tick::{self, TickError, TickSummary};
use crate::world::{World, WorldSettings};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// `max_ticks` ticks completed.
    MaxTicksReached,
    /// The shutdown signal fired.
    Shutdown,
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: EndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, sim: &Simulation);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _sim: &Simulation) {}
}

/// Channels connecting the loop to the outside world.
pub struct Controls {
    /// Set to `true` to stop the loop.
    pub shutdown: watch::Receiver<bool>,
    /// Operator whispers, one line each.
    pub whispers: Option<mpsc::Receiver<String>>,
    /// Stamped presentation events.
    pub events: broadcast::Sender<EventEnvelope>,
}

struct Whisper {
    text: String,
    expires_at_ms: u64,
}

/// Everything one simulation run owns.
pub struct Simulation {
    /// World state.
    pub world: World,
    /// Per-agent cognition.
    pub scheduler: Scheduler,
    config: HearthConfig,
    vitals: VitalsConfig,
    rng: StdRng,
    seed: u64,
    whisper: Option<Whisper>,
    extinct_since_ms: Option<u64>,
    sequence: u64,
}

impl Simulation {
    /// Build and populate a world from `config`. A missing seed is drawn
    /// at random and logged so the run can be replayed.
    pub fn new(config: HearthConfig) -> Self {
        let seed = config.simulation.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let settings = WorldSettings {
            pacing: config.presets.pacing,
            abundance: config.presets.abundance,
            spawn_range: config.simulation.spawn_range,
            agent_count: usize::try_from(config.simulation.agent_count).unwrap_or(usize::MAX),
        };
        let mut world = World::new(settings);
        world.populate(&mut rng);
        let mut scheduler = Scheduler::new(config.cognition.clone());
        scheduler.attach(&world);
        let vitals = VitalsConfig::from_pacing(world.pacing());
        info!(
            seed,
            pacing = ?settings.pacing,
            abundance = ?settings.abundance,
            tactics = ?config.cognition.tactics,
            "Simulation created"
        );
        Self {
            world,
            scheduler,
            config,
            vitals,
            rng,
            seed,
            whisper: None,
            extinct_since_ms: None,
            sequence: 0,
        }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &HearthConfig {
        &self.config
    }

    /// Seed of the RNG.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Attach an operator whisper to every snapshot until it expires. A
    /// blank line clears the current whisper.
    pub fn whisper(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.whisper = None;
            info!("Whisper cleared");
            return;
        }
        let expires_at_ms = self
            .world
            .now_ms()
            .saturating_add(self.config.oracle.whisper_timeout_ms);
        info!(whisper = text, expires_at_ms, "Whisper received");
        self.whisper = Some(Whisper {
            text: text.to_owned(),
            expires_at_ms,
        });
    }

    /// The whisper currently attached to snapshots.
    pub fn active_whisper(&self) -> Option<&str> {
        self.whisper.as_ref().map(|w| w.text.as_str())
    }

    /// Advance one tick, then reset the world if everyone has been dead
    /// long enough.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if the tick cannot run.
    pub fn step(&mut self) -> Result<TickSummary, TickError> {
        let now = self.world.now_ms();
        if self.whisper.as_ref().is_some_and(|w| now >= w.expires_at_ms) {
            debug!("Whisper expired");
            self.whisper = None;
        }
        let summary = tick::run_tick(
            &mut self.world,
            &mut self.scheduler,
            &self.vitals,
            self.config.simulation.tick_interval_ms,
            &mut self.rng,
            self.whisper.as_ref().map(|w| w.text.as_str()),
        )?;
        self.check_extinction();
        Ok(summary)
    }

    fn check_extinction(&mut self) {
        if self.world.agents.is_empty() || self.world.living_count() > 0 {
            self.extinct_since_ms = None;
            return;
        }
        let now = self.world.now_ms();
        let since = *self.extinct_since_ms.get_or_insert_with(|| {
            info!(
                generation = self.world.generation(),
                reset_in_ms = self.config.simulation.extinction_reset_ms,
                "Extinction"
            );
            now
        });
        if now.saturating_sub(since) >= self.config.simulation.extinction_reset_ms {
            self.world.reset(&mut self.rng);
            self.scheduler.attach(&self.world);
            self.extinct_since_ms = None;
        }
    }

    /// Apply an oracle answer.
    pub fn deliver(&mut self, reply: OracleReply) {
        self.scheduler.deliver(&mut self.world, reply, &mut self.rng);
    }

    /// Take every queued oracle request.
    pub fn take_requests(&mut self) -> Vec<OracleRequest> {
        self.scheduler.take_requests()
    }

    /// Stamp and take every event emitted since the last call.
    pub fn drain_envelopes(&mut self) -> Vec<EventEnvelope> {
        let sim_time_ms = self.world.now_ms();
        let emitted_at = Utc::now();
        self.world
            .drain_events()
            .into_iter()
            .map(|event| {
                self.sequence = self.sequence.saturating_add(1);
                EventEnvelope {
                    sequence: self.sequence,
                    sim_time_ms,
                    emitted_at,
                    event,
                }
            })
            .collect()
    }
}

/// Run the simulation loop until shutdown or the tick limit.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation<O: GoalOracle>(
    sim: &mut Simulation,
    oracle: Arc<O>,
    controls: Controls,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let Controls {
        mut shutdown,
        mut whispers,
        events,
    } = controls;
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<OracleReply>();
    let request_timeout = Duration::from_millis(sim.config.oracle.request_timeout_ms);
    let max_ticks = sim.config.simulation.max_ticks;

    let mut interval =
        tokio::time::interval(Duration::from_millis(sim.config.simulation.tick_interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        tick_interval_ms = sim.config.simulation.tick_interval_ms,
        agents = sim.world.agents.len(),
        max_ticks = ?max_ticks,
        "Simulation starting"
    );

    loop {
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Shutdown requested");
                    return Ok(SimulationResult {
                        end_reason: EndReason::Shutdown,
                        final_summary: last_summary,
                        total_ticks,
                    });
                }
            }

            Some(reply) = reply_rx.recv() => sim.deliver(reply),

            line = next_whisper(&mut whispers) => match line {
                Some(text) => sim.whisper(&text),
                None => {
                    debug!("Whisper input closed");
                    whispers = None;
                }
            },

            _ = interval.tick() => {
                let summary = sim.step()?;
                total_ticks = total_ticks.saturating_add(1);

                for request in sim.take_requests() {
                    dispatch(&oracle, request, request_timeout, reply_tx.clone());
                }
                for envelope in sim.drain_envelopes() {
                    // No subscribers is fine.
                    let _ = events.send(envelope);
                }
                callback.on_tick(&summary, sim);

                if max_ticks.is_some_and(|max| total_ticks >= max) {
                    info!(total_ticks, "Tick limit reached");
                    return Ok(SimulationResult {
                        end_reason: EndReason::MaxTicksReached,
                        final_summary: Some(summary),
                        total_ticks,
                    });
                }
                last_summary = Some(summary);
            }
        }
    }
}

async fn next_whisper(rx: &mut Option<mpsc::Receiver<String>>) -> Option<String> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Ask the oracle in the background and route the answer back.
fn dispatch<O: GoalOracle>(
    oracle: &Arc<O>,
    request: OracleRequest,
    timeout: Duration,
    replies: mpsc::UnboundedSender<OracleReply>,
) {
    let oracle = Arc::clone(oracle);
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    tokio::spawn(async move {
        let reply = match request {
            OracleRequest::Strategic(request) => {
                let agent = request.agent_id;
                let outcome = tokio::time::timeout(timeout, oracle.strategic(request))
                    .await
                    .unwrap_or(Err(OracleError::Timeout { agent, timeout_ms }));
                let response = outcome.unwrap_or_else(|err| {
                    warn!(agent = %agent, error = %err, "Strategic oracle failed, using fallback goal");
                    StrategicResponse::fallback(err.to_string())
                });
                OracleReply::Strategic { agent, response }
            }
            OracleRequest::Tactical(request) => {
                let agent = request.agent_id;
                let goal = request.goal.clone();
                let outcome = tokio::time::timeout(timeout, oracle.tactical(request))
                    .await
                    .unwrap_or(Err(OracleError::Timeout { agent, timeout_ms }));
                let response = match outcome {
                    Ok(plan) => Some(plan),
                    Err(OracleError::TacticsUnsupported) => None,
                    Err(err) => {
                        warn!(agent = %agent, goal = %goal.name, error = %err, "Tactical oracle failed");
                        None
                    }
                };
                OracleReply::Tactical {
                    agent,
                    goal,
                    response,
                }
            }
        };
        if replies.send(reply).is_err() {
            debug!("Runner stopped, oracle reply dropped");
        }
    });
}

/// Log the simulation end.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_time_ms = result.final_summary.as_ref().map(|s| s.time_ms),
        final_agents_alive = result.final_summary.as_ref().map(|s| s.agents_alive),
        "Simulation ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hearth_types::{PresentationEvent, StrategicRequest};

    use super::*;
    use crate::oracle::RuleOracle;

    fn config(seed: u64) -> HearthConfig {
        let mut config = HearthConfig::default();
        config.simulation.seed = Some(seed);
        config.simulation.tick_interval_ms = 100;
        config
    }

    fn controls() -> (watch::Sender<bool>, broadcast::Receiver<EventEnvelope>, Controls) {
        let (shutdown_tx, shutdown) = watch::channel(false);
        let (events, events_rx) = broadcast::channel(16_384);
        (
            shutdown_tx,
            events_rx,
            Controls {
                shutdown,
                whispers: None,
                events,
            },
        )
    }

    fn drain(rx: &mut broadcast::Receiver<EventEnvelope>) -> Vec<EventEnvelope> {
        let mut out = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            out.push(envelope);
        }
        out
    }

    #[test]
    fn same_seed_gives_same_world() {
        let a = Simulation::new(config(42));
        let b = Simulation::new(config(42));
        let describe = |sim: &Simulation| {
            sim.world
                .agents
                .iter()
                .map(|agent| (agent.name.clone(), agent.position))
                .collect::<Vec<_>>()
        };
        assert_eq!(describe(&a), describe(&b));
        assert_eq!(a.world.resources.len(), b.world.resources.len());
    }

    #[test]
    fn extinction_resets_after_delay() {
        let mut config = config(3);
        config.simulation.extinction_reset_ms = 1_000;
        let mut sim = Simulation::new(config);
        for agent in &mut sim.world.agents {
            agent.kill();
        }

        for _ in 0..9 {
            sim.step().unwrap();
        }
        assert_eq!(sim.world.generation(), 0);

        for _ in 0..2 {
            sim.step().unwrap();
        }
        assert_eq!(sim.world.generation(), 1);
        assert_eq!(sim.world.living_count(), 3);
        assert!(sim.drain_envelopes().iter().any(|e| matches!(
            e.event,
            PresentationEvent::WorldReset { generation: 1 }
        )));
    }

    #[test]
    fn whisper_expires_in_simulation_time() {
        let mut config = config(5);
        config.oracle.whisper_timeout_ms = 500;
        let mut sim = Simulation::new(config);
        sim.whisper("  build a fire  ");
        assert_eq!(sim.active_whisper(), Some("build a fire"));

        for _ in 0..4 {
            sim.step().unwrap();
        }
        assert_eq!(sim.active_whisper(), Some("build a fire"));
        for _ in 0..2 {
            sim.step().unwrap();
        }
        assert_eq!(sim.active_whisper(), None);
    }

    #[test]
    fn envelopes_are_sequenced() {
        let mut sim = Simulation::new(config(9));
        sim.world.reset(&mut StdRng::seed_from_u64(1));
        sim.world.emit(PresentationEvent::WorldReset { generation: 7 });
        let envelopes = sim.drain_envelopes();
        let sequences: Vec<u64> = envelopes.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
        assert!(sim.drain_envelopes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_at_tick_limit() {
        let mut config = config(11);
        config.simulation.max_ticks = Some(50);
        let mut sim = Simulation::new(config);
        let (_shutdown, mut events_rx, controls) = controls();

        let result = run_simulation(&mut sim, Arc::new(RuleOracle::new()), controls, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, EndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 50);
        assert_eq!(result.final_summary.unwrap().time_ms, 5_000);

        let events = drain(&mut events_rx);
        assert!(events
            .iter()
            .any(|e| matches!(e.event, PresentationEvent::GoalReceived { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_before_ticking() {
        let mut sim = Simulation::new(config(13));
        let (shutdown, _events_rx, controls) = controls();
        shutdown.send(true).unwrap();

        let result = run_simulation(&mut sim, Arc::new(RuleOracle::new()), controls, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, EndReason::Shutdown);
        assert_eq!(result.total_ticks, 0);
    }

    struct SlowOracle;

    impl GoalOracle for SlowOracle {
        fn strategic(
            &self,
            request: StrategicRequest,
        ) -> impl Future<Output = Result<StrategicResponse, OracleError>> + Send {
            async move {
                drop(request);
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(StrategicResponse::fallback("too late"))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn oracle_timeout_falls_back_to_survive() {
        let mut config = config(17);
        config.simulation.max_ticks = Some(40);
        config.oracle.request_timeout_ms = 1_000;
        let mut sim = Simulation::new(config);
        let (_shutdown, mut events_rx, controls) = controls();

        run_simulation(&mut sim, Arc::new(SlowOracle), controls, &mut NoOpCallback)
            .await
            .unwrap();

        let goals: Vec<String> = drain(&mut events_rx)
            .into_iter()
            .filter_map(|e| match e.event {
                PresentationEvent::GoalReceived { goal, .. } => Some(goal),
                _ => None,
            })
            .collect();
        assert!(!goals.is_empty());
        assert!(goals.iter().all(|g| g == "SURVIVE"));
    }

    #[tokio::test(start_paused = true)]
    async fn whispers_reach_the_simulation() {
        let mut config = config(19);
        config.simulation.max_ticks = Some(5);
        let mut sim = Simulation::new(config);
        let (_shutdown, _events_rx, mut controls) = controls();
        let (whisper_tx, whisper_rx) = mpsc::channel(4);
        controls.whispers = Some(whisper_rx);
        whisper_tx.send("gather wood".to_owned()).await.unwrap();
        drop(whisper_tx);

        run_simulation(&mut sim, Arc::new(RuleOracle::new()), controls, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(sim.active_whisper(), Some("gather wood"));
    }
}

//! End-to-end runs of the simulation driven by the rule oracle.
//!
//! Oracle answers are delivered synchronously after each tick, so every run
//! is fully determined by its seed.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use hearth_core::config::{HearthConfig, TacticsSource};
use hearth_core::oracle::RuleOracle;
use hearth_core::runner::Simulation;
use hearth_core::scheduler::{OracleReply, OracleRequest};
use hearth_types::PresentationEvent;

/// Ten simulated minutes at 100 ms per tick.
const TEN_MINUTES: u32 = 6_000;

fn config(seed: u64) -> HearthConfig {
    let mut config = HearthConfig::default();
    config.simulation.seed = Some(seed);
    config.simulation.tick_interval_ms = 100;
    config
}

/// Step `ticks` times, answering every request on the spot.
fn drive(sim: &mut Simulation, ticks: u32) -> Vec<PresentationEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        sim.step().unwrap();
        for request in sim.take_requests() {
            let reply = match request {
                OracleRequest::Strategic(req) => OracleReply::Strategic {
                    agent: req.agent_id,
                    response: RuleOracle::decide(&req.snapshot),
                },
                OracleRequest::Tactical(req) => OracleReply::Tactical {
                    agent: req.agent_id,
                    goal: req.goal,
                    response: None,
                },
            };
            sim.deliver(reply);
        }
        events.extend(sim.drain_envelopes().into_iter().map(|e| e.event));
    }
    events
}

// =============================================================================
// Behavior
// =============================================================================

#[test]
fn rule_driven_survivors_gather_and_plan() {
    let mut sim = Simulation::new(config(1));
    let events = drive(&mut sim, TEN_MINUTES);

    assert!(events
        .iter()
        .any(|e| matches!(e, PresentationEvent::GoalReceived { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, PresentationEvent::PlanStarted { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, PresentationEvent::ResourceHarvested { .. })));
}

#[test]
fn plans_are_never_empty() {
    let mut sim = Simulation::new(config(2));
    let events = drive(&mut sim, TEN_MINUTES);
    for event in &events {
        if let PresentationEvent::PlanStarted { steps, .. } = event {
            assert!(!steps.is_empty());
        }
    }
}

#[test]
fn world_invariants_hold_throughout() {
    let mut sim = Simulation::new(config(3));
    for _ in 0..20 {
        drive(&mut sim, 300);
        for agent in &sim.world.agents {
            assert!(agent.inventory.total() <= agent.inventory.capacity());
            for value in [
                agent.vitals.food,
                agent.vitals.warmth,
                agent.vitals.health,
                agent.vitals.energy,
            ] {
                assert!((0.0..=100.0).contains(&value));
            }
        }
        let campfires = sim
            .world
            .buildings
            .iter()
            .filter(|b| b.kind() == hearth_types::BuildingKind::Campfire)
            .count();
        assert!(campfires <= 1);
    }
}

#[test]
fn same_seed_tells_the_same_story() {
    let mut a = Simulation::new(config(99));
    let mut b = Simulation::new(config(99));
    assert_eq!(drive(&mut a, 3_000), drive(&mut b, 3_000));
}

#[test]
fn oracle_tactics_fall_back_to_local_planner() {
    let mut config = config(4);
    config.cognition.tactics = TacticsSource::Oracle;
    let mut sim = Simulation::new(config);
    let events = drive(&mut sim, 1_200);
    assert!(events
        .iter()
        .any(|e| matches!(e, PresentationEvent::PlanStarted { .. })));
}

// =============================================================================
// Extinction
// =============================================================================

#[test]
fn extinction_brings_a_new_generation() {
    let mut sim = Simulation::new(config(5));
    for agent in &mut sim.world.agents {
        agent.vitals.food = 0.0;
        agent.vitals.warmth = 0.0;
        agent.vitals.health = 0.5;
    }

    let events = drive(&mut sim, 200);
    let deaths = events
        .iter()
        .filter(|e| matches!(e, PresentationEvent::AgentDied { .. }))
        .count();
    assert_eq!(deaths, 3);
    assert!(events
        .iter()
        .any(|e| matches!(e, PresentationEvent::WorldReset { generation: 1 })));
    assert_eq!(sim.world.generation(), 1);
    assert_eq!(sim.world.living_count(), 3);
}

//! Vital stat simulation.
//!
//! Applied exactly once per agent per simulation tick, scaled by the tick's
//! elapsed seconds:
//!
//! 1. Food, warmth and energy decay at the pacing rates
//! 2. Nearby buildings add warmth
//! 3. Resting restores energy
//! 4. Health drops while food or warmth sits at zero
//! 5. Health regenerates only while food, warmth and energy are all healthy
//!
//! Every stat is clamped to `0..=100` by [`Vitals::set`].

use hearth_types::{Activity, DeathCause, Stat, Vitals};
use hearth_world::PacingPreset;

/// Tunables for [`apply_vitals`] and movement speed.
#[derive(Debug, Clone, PartialEq)]
pub struct VitalsConfig {
    /// Food lost per second.
    pub food_decay_per_sec: f64,
    /// Warmth lost per second.
    pub warmth_decay_per_sec: f64,
    /// Energy lost per second.
    pub energy_decay_per_sec: f64,
    /// Health regained per second while healthy.
    pub health_regen_per_sec: f64,
    /// Health lost per second while food or warmth is zero (default: 0.5).
    pub deprivation_damage_per_sec: f64,
    /// Energy regained per second while resting (default: 2.0).
    pub rest_recovery_per_sec: f64,
    /// Food, warmth and energy must all exceed this for health to
    /// regenerate (default: 50).
    pub healthy_threshold: f64,
    /// Food level below which movement slows (default: 20).
    pub starving_threshold: f64,
    /// Movement speed in units per second (default: 9.0).
    pub base_speed: f64,
    /// Movement speed while starving (default: 4.8).
    pub starving_speed: f64,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self::from_pacing(&hearth_world::Pacing::Medium.preset())
    }
}

impl VitalsConfig {
    /// Build a config from a pacing preset with default thresholds.
    pub const fn from_pacing(pacing: &PacingPreset) -> Self {
        Self {
            food_decay_per_sec: pacing.food_decay_per_sec,
            warmth_decay_per_sec: pacing.warmth_decay_per_sec,
            energy_decay_per_sec: pacing.energy_decay_per_sec,
            health_regen_per_sec: pacing.health_regen_per_sec,
            deprivation_damage_per_sec: 0.5,
            rest_recovery_per_sec: 2.0,
            healthy_threshold: 50.0,
            starving_threshold: 20.0,
            base_speed: 9.0,
            starving_speed: 4.8,
        }
    }

    /// Movement speed for an agent with these vitals.
    pub fn move_speed(&self, vitals: &Vitals) -> f64 {
        if vitals.food < self.starving_threshold {
            self.starving_speed
        } else {
            self.base_speed
        }
    }
}

/// Result of one vitals step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VitalTick {
    /// Set when health reached zero this step.
    pub death: Option<DeathCause>,
}

/// Advance `vitals` by `dt_secs`.
///
/// `building_warmth` is the warmth per second granted by buildings in range
/// of the agent.
pub fn apply_vitals(
    vitals: &mut Vitals,
    activity: Activity,
    building_warmth: f64,
    dt_secs: f64,
    config: &VitalsConfig,
) -> VitalTick {
    let dt = dt_secs.max(0.0);

    vitals.adjust(Stat::Food, -config.food_decay_per_sec * dt);
    vitals.adjust(
        Stat::Warmth,
        (building_warmth - config.warmth_decay_per_sec) * dt,
    );
    let energy_delta = if activity == Activity::Resting {
        config.rest_recovery_per_sec
    } else {
        -config.energy_decay_per_sec
    };
    vitals.adjust(Stat::Energy, energy_delta * dt);

    let starving = vitals.food <= 0.0;
    let freezing = vitals.warmth <= 0.0;
    if starving || freezing {
        vitals.adjust(Stat::Health, -config.deprivation_damage_per_sec * dt);
    } else if vitals.food > config.healthy_threshold
        && vitals.warmth > config.healthy_threshold
        && vitals.energy > config.healthy_threshold
    {
        vitals.adjust(Stat::Health, config.health_regen_per_sec * dt);
    }

    let death = (vitals.health <= 0.0).then(|| {
        if starving {
            DeathCause::Starvation
        } else if freezing {
            DeathCause::Freezing
        } else {
            DeathCause::Exhaustion
        }
    });
    VitalTick { death }
}

//! Pacing and abundance presets.
//!
//! Pacing controls how fast vitals decay and how long timed actions take.
//! Abundance controls how many nodes spawn, how much each yields, and how
//! long depleted nodes stay down. Multipliers are stored as integer percent
//! so durations stay in exact milliseconds.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use hearth_types::ResourceKind;

use crate::error::WorldError;

/// Respawn delay of a tree before the abundance multiplier.
pub const TREE_RESPAWN_MS: u64 = 60_000;
/// Respawn delay of a rock before the abundance multiplier.
pub const ROCK_RESPAWN_MS: u64 = 90_000;
/// Respawn delay of a berry bush before the abundance multiplier.
pub const BERRY_RESPAWN_MS: u64 = 30_000;

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// Pacing preset name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    /// Intense survival pressure.
    Fast,
    /// Balanced.
    #[default]
    Medium,
    /// Relaxed, focus on building.
    Slow,
}

/// Rates derived from a [`Pacing`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingPreset {
    /// Food lost per second.
    pub food_decay_per_sec: f64,
    /// Warmth lost per second.
    pub warmth_decay_per_sec: f64,
    /// Energy lost per second.
    pub energy_decay_per_sec: f64,
    /// Health regained per second while healthy.
    pub health_regen_per_sec: f64,
    /// Duration of one harvest action.
    pub harvest_ms: u64,
    /// Craft duration scaling, in percent.
    pub craft_time_percent: u64,
}

impl Pacing {
    /// The rate table for this preset.
    pub const fn preset(self) -> PacingPreset {
        match self {
            Self::Fast => PacingPreset {
                food_decay_per_sec: 2.0,
                warmth_decay_per_sec: 0.5,
                energy_decay_per_sec: 0.3,
                health_regen_per_sec: 0.1,
                harvest_ms: 2000,
                craft_time_percent: 50,
            },
            Self::Medium => PacingPreset {
                food_decay_per_sec: 1.0,
                warmth_decay_per_sec: 0.2,
                energy_decay_per_sec: 0.1,
                health_regen_per_sec: 0.05,
                harvest_ms: 3000,
                craft_time_percent: 100,
            },
            Self::Slow => PacingPreset {
                food_decay_per_sec: 0.5,
                warmth_decay_per_sec: 0.1,
                energy_decay_per_sec: 0.05,
                health_regen_per_sec: 0.02,
                harvest_ms: 4000,
                craft_time_percent: 150,
            },
        }
    }
}

impl FromStr for Pacing {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "medium" => Ok(Self::Medium),
            "slow" => Ok(Self::Slow),
            _ => Err(WorldError::UnknownPreset {
                category: "pacing",
                name: s.to_owned(),
            }),
        }
    }
}

impl PacingPreset {
    /// Scale a recipe's base craft time by this preset.
    pub fn craft_ms(&self, base_ms: u64) -> u64 {
        scale_percent(base_ms, self.craft_time_percent)
    }
}

// ---------------------------------------------------------------------------
// Abundance
// ---------------------------------------------------------------------------

/// Abundance preset name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Abundance {
    /// Scarce.
    Low,
    /// Balanced.
    #[default]
    Medium,
    /// Plentiful.
    High,
}

/// Spawn table derived from an [`Abundance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbundancePreset {
    /// Trees spawned per world.
    pub trees: u32,
    /// Rocks spawned per world.
    pub rocks: u32,
    /// Berry bushes spawned per world.
    pub berry_bushes: u32,
    /// Smallest yield a node can roll.
    pub yield_min: u32,
    /// Largest yield a node can roll (inclusive).
    pub yield_max: u32,
    /// Respawn delay scaling, in percent.
    pub respawn_percent: u64,
}

impl Abundance {
    /// The spawn table for this preset.
    pub const fn preset(self) -> AbundancePreset {
        match self {
            Self::Low => AbundancePreset {
                trees: 8,
                rocks: 5,
                berry_bushes: 3,
                yield_min: 3,
                yield_max: 5,
                respawn_percent: 200,
            },
            Self::Medium => AbundancePreset {
                trees: 15,
                rocks: 10,
                berry_bushes: 6,
                yield_min: 5,
                yield_max: 10,
                respawn_percent: 100,
            },
            Self::High => AbundancePreset {
                trees: 25,
                rocks: 18,
                berry_bushes: 12,
                yield_min: 8,
                yield_max: 15,
                respawn_percent: 50,
            },
        }
    }
}

impl FromStr for Abundance {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "scarce" => Ok(Self::Low),
            "medium" | "balanced" => Ok(Self::Medium),
            "high" | "abundant" => Ok(Self::High),
            _ => Err(WorldError::UnknownPreset {
                category: "abundance",
                name: s.to_owned(),
            }),
        }
    }
}

impl AbundancePreset {
    /// How many nodes of `kind` to spawn.
    pub const fn count(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Tree => self.trees,
            ResourceKind::Rock => self.rocks,
            ResourceKind::BerryBush => self.berry_bushes,
        }
    }

    /// Respawn delay for a node of `kind` under this preset.
    pub fn respawn_ms(&self, kind: ResourceKind) -> u64 {
        scale_percent(base_respawn_ms(kind), self.respawn_percent)
    }
}

/// Respawn delay before scaling.
pub const fn base_respawn_ms(kind: ResourceKind) -> u64 {
    match kind {
        ResourceKind::Tree => TREE_RESPAWN_MS,
        ResourceKind::Rock => ROCK_RESPAWN_MS,
        ResourceKind::BerryBush => BERRY_RESPAWN_MS,
    }
}

fn scale_percent(value: u64, percent: u64) -> u64 {
    value.saturating_mul(percent).checked_div(100).unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respawn_scales_with_abundance() {
        assert_eq!(Abundance::Low.preset().respawn_ms(ResourceKind::Tree), 120_000);
        assert_eq!(Abundance::Medium.preset().respawn_ms(ResourceKind::Rock), 90_000);
        assert_eq!(
            Abundance::High.preset().respawn_ms(ResourceKind::BerryBush),
            15_000
        );
    }

    #[test]
    fn craft_time_scales_with_pacing() {
        assert_eq!(Pacing::Fast.preset().craft_ms(10_000), 5_000);
        assert_eq!(Pacing::Slow.preset().craft_ms(10_000), 15_000);
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("FAST".parse::<Pacing>().ok(), Some(Pacing::Fast));
        assert_eq!("scarce".parse::<Abundance>().ok(), Some(Abundance::Low));
        assert!("ludicrous".parse::<Pacing>().is_err());
    }

    #[test]
    fn yield_ranges_are_ordered() {
        for a in [Abundance::Low, Abundance::Medium, Abundance::High] {
            let p = a.preset();
            assert!(p.yield_min <= p.yield_max);
        }
    }
}

//! Constructed buildings and their warmth effects.
//!
//! Buildings exist only once a craft has completed and persist until the
//! world is reset. Each building type has a fixed blueprint effect, and at
//! most one building of each type is ever planned per world.

use std::collections::BTreeMap;

use hearth_types::{AgentId, BuildingId, BuildingKind, Position};

/// Seconds per minute, for per-minute effect rates.
const SECS_PER_MINUTE: f64 = 60.0;

/// Passive effect a building has on agents in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BuildingEffect {
    /// Warms agents standing within `radius`.
    WarmthNearby {
        /// Effect radius.
        radius: f64,
        /// Warmth restored per second.
        per_second: f64,
    },
    /// Slow warmth over a larger radius.
    WarmthPassive {
        /// Effect radius.
        radius: f64,
        /// Warmth restored per minute.
        per_minute: f64,
    },
}

impl BuildingEffect {
    /// Effect radius.
    pub const fn radius(&self) -> f64 {
        match *self {
            Self::WarmthNearby { radius, .. } | Self::WarmthPassive { radius, .. } => radius,
        }
    }

    /// Warmth per second granted to an agent in range.
    pub fn warmth_per_second(&self) -> f64 {
        match *self {
            Self::WarmthNearby { per_second, .. } => per_second,
            Self::WarmthPassive { per_minute, .. } => per_minute / SECS_PER_MINUTE,
        }
    }
}

/// The fixed effect of each building type.
pub const fn blueprint(kind: BuildingKind) -> BuildingEffect {
    match kind {
        BuildingKind::Campfire => BuildingEffect::WarmthNearby {
            radius: 5.0,
            per_second: 0.5,
        },
        BuildingKind::Shelter => BuildingEffect::WarmthPassive {
            radius: 8.0,
            per_minute: 2.0,
        },
    }
}

/// A completed building.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    /// Textual id (`campfire_1`).
    pub id: BuildingId,
    /// Where it stands.
    pub position: Position,
    /// Passive effect.
    pub effect: BuildingEffect,
    /// Who built it.
    pub builder: AgentId,
    /// Simulation time of completion, in milliseconds.
    pub built_at_ms: u64,
}

impl Building {
    /// Building type.
    pub const fn kind(&self) -> BuildingKind {
        self.id.kind
    }

    /// Whether `pos` lies within this building's effect radius.
    pub fn covers(&self, pos: Position) -> bool {
        self.position.distance_to(pos) <= self.effect.radius()
    }
}

/// Every building in a world.
#[derive(Debug, Clone, Default)]
pub struct BuildingRegistry {
    buildings: Vec<Building>,
    next_index: BTreeMap<BuildingKind, u32>,
}

impl BuildingRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished building and return its id.
    pub fn construct(
        &mut self,
        kind: BuildingKind,
        position: Position,
        builder: AgentId,
        now_ms: u64,
    ) -> BuildingId {
        let counter = self.next_index.entry(kind).or_insert(0);
        *counter = counter.saturating_add(1);
        let id = BuildingId::new(kind, *counter);
        self.buildings.push(Building {
            id,
            position,
            effect: blueprint(kind),
            builder,
            built_at_ms: now_ms,
        });
        tracing::info!(building = %id, x = position.x, y = position.y, "Building constructed");
        id
    }

    /// Look up a building.
    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    /// Iterate in construction order.
    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter()
    }

    /// Number of buildings.
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    /// Whether nothing has been built yet.
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Whether any building of `kind` exists.
    pub fn exists(&self, kind: BuildingKind) -> bool {
        self.buildings.iter().any(|b| b.kind() == kind)
    }

    /// Nearest building of `kind` to `from`.
    pub fn nearest(&self, kind: BuildingKind, from: Position) -> Option<&Building> {
        self.buildings
            .iter()
            .filter(|b| b.kind() == kind)
            .min_by(|a, b| {
                from.distance_to(a.position)
                    .total_cmp(&from.distance_to(b.position))
            })
    }

    /// Total warmth per second every building in range grants at `pos`.
    pub fn warmth_at(&self, pos: Position) -> f64 {
        self.buildings
            .iter()
            .filter(|b| b.covers(pos))
            .map(|b| b.effect.warmth_per_second())
            .sum()
    }

    /// Remove every building and reset id counters.
    pub fn clear(&mut self) {
        self.buildings.clear();
        self.next_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct_assigns_per_kind_ids() {
        let mut reg = BuildingRegistry::new();
        let builder = AgentId::new();
        let a = reg.construct(BuildingKind::Campfire, Position::default(), builder, 0);
        let b = reg.construct(BuildingKind::Shelter, Position::default(), builder, 0);
        assert_eq!(a.to_string(), "campfire_1");
        assert_eq!(b.to_string(), "shelter_1");
        assert!(reg.exists(BuildingKind::Campfire));
        assert_eq!(reg.get(a).map(|x| x.builder), Some(builder));
    }

    #[test]
    fn warmth_only_applies_in_radius() {
        let mut reg = BuildingRegistry::new();
        reg.construct(BuildingKind::Campfire, Position::new(0.0, 0.0), AgentId::new(), 0);
        assert!((reg.warmth_at(Position::new(4.0, 0.0)) - 0.5).abs() < 1e-9);
        assert!(reg.warmth_at(Position::new(6.0, 0.0)).abs() < 1e-9);
    }

    #[test]
    fn shelter_warmth_is_per_minute() {
        let effect = blueprint(BuildingKind::Shelter);
        assert!((effect.warmth_per_second() - 2.0 / 60.0).abs() < 1e-9);
        assert!((effect.radius() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nearest_picks_closest_of_kind() {
        let mut reg = BuildingRegistry::new();
        let agent = AgentId::new();
        reg.construct(BuildingKind::Shelter, Position::new(1.0, 0.0), agent, 0);
        let fire = reg.construct(BuildingKind::Campfire, Position::new(3.0, 0.0), agent, 0);
        let found = reg.nearest(BuildingKind::Campfire, Position::default());
        assert_eq!(found.map(|b| b.id), Some(fire));
    }
}

//! Value structs carried by agents and exchanged between crates.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Priority, Stat};
use crate::ids::TargetId;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point on the ground plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// East-west coordinate.
    pub x: f64,
    /// North-south coordinate.
    pub y: f64,
}

impl Position {
    /// Construct a position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Move at most `max_step` toward `target`, landing exactly on it when
    /// the remaining distance is shorter than the step.
    pub fn step_toward(self, target: Self, max_step: f64) -> Self {
        let dist = self.distance_to(target);
        if dist <= max_step || dist <= f64::EPSILON {
            return target;
        }
        let ratio = max_step / dist;
        Self {
            x: (target.x - self.x).mul_add(ratio, self.x),
            y: (target.y - self.y).mul_add(ratio, self.y),
        }
    }

    /// Offset by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

// ---------------------------------------------------------------------------
// Vitals
// ---------------------------------------------------------------------------

/// Upper bound of every vital stat.
pub const STAT_MAX: f64 = 100.0;

/// The four survival stats. Every field is kept within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vitals {
    /// Satiation.
    pub food: f64,
    /// Body heat.
    pub warmth: f64,
    /// Life. Reaching zero kills the agent.
    pub health: f64,
    /// Stamina.
    pub energy: f64,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            food: STAT_MAX,
            warmth: STAT_MAX,
            health: STAT_MAX,
            energy: STAT_MAX,
        }
    }
}

impl Vitals {
    /// Read one stat.
    pub const fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Food => self.food,
            Stat::Warmth => self.warmth,
            Stat::Health => self.health,
            Stat::Energy => self.energy,
        }
    }

    /// Overwrite one stat, clamping to `0..=100`. NaN becomes zero.
    pub fn set(&mut self, stat: Stat, value: f64) {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, STAT_MAX)
        };
        match stat {
            Stat::Food => self.food = value,
            Stat::Warmth => self.warmth = value,
            Stat::Health => self.health = value,
            Stat::Energy => self.energy = value,
        }
    }

    /// Add `delta` to one stat, clamping the result.
    pub fn adjust(&mut self, stat: Stat, delta: f64) {
        self.set(stat, self.get(stat) + delta);
    }
}

// ---------------------------------------------------------------------------
// Cognition records
// ---------------------------------------------------------------------------

/// A long-horizon directive chosen by the goal oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StrategicGoal {
    /// Goal name, e.g. `GATHER_WOOD` or `BUILD_CAMPFIRE`.
    pub name: String,
    /// Urgency.
    pub priority: Priority,
    /// Free-text justification from the oracle.
    pub reasoning: String,
    /// Simulation time the goal was received, in milliseconds.
    pub timestamp_ms: u64,
}

impl StrategicGoal {
    /// Generic survival goal used whenever the oracle gives nothing usable.
    pub const DEFAULT_NAME: &'static str = "SURVIVE";

    /// Build a goal stamped at `timestamp_ms`.
    pub fn new(
        name: impl Into<String>,
        priority: Priority,
        reasoning: impl Into<String>,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            reasoning: reasoning.into(),
            timestamp_ms,
        }
    }

    /// The conservative fallback goal.
    pub fn fallback(timestamp_ms: u64) -> Self {
        Self::new(
            Self::DEFAULT_NAME,
            Priority::Medium,
            "No usable decision; staying alive.",
            timestamp_ms,
        )
    }
}

/// The ordered steps realizing the current strategic goal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TacticalPlan {
    /// Step descriptions in execution order.
    pub steps: Vec<String>,
    /// Index of the step currently being executed.
    pub cursor: usize,
    /// Planner commentary.
    pub thought: String,
    /// Simulation time the plan was adopted, in milliseconds.
    pub timestamp_ms: u64,
}

/// Diagnostic remembered after a behavior tree fails, fed into the next
/// planning request so the same dead target is not chosen again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FailureRecord {
    /// Name of the node that failed.
    pub node: String,
    /// Entity the failing node was bound to, if any.
    #[ts(as = "Option<String>")]
    pub target: Option<TargetId>,
    /// Human-readable reason.
    pub reason: String,
    /// Goal that was being pursued.
    pub goal: Option<String>,
    /// Simulation time of the failure, in milliseconds.
    pub at_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vitals_are_clamped() {
        let mut v = Vitals::default();
        v.adjust(Stat::Food, 40.0);
        assert!((v.food - STAT_MAX).abs() < f64::EPSILON);
        v.adjust(Stat::Warmth, -250.0);
        assert!(v.warmth.abs() < f64::EPSILON);
        v.set(Stat::Energy, f64::NAN);
        assert!(v.energy.abs() < f64::EPSILON);
    }

    #[test]
    fn step_toward_never_overshoots() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        let mid = a.step_toward(b, 1.0);
        assert!((a.distance_to(mid) - 1.0).abs() < 1e-9);
        let end = mid.step_toward(b, 10.0);
        assert!((end.distance_to(b)).abs() < f64::EPSILON);
    }

    #[test]
    fn fallback_goal_is_survive() {
        let goal = StrategicGoal::fallback(42);
        assert_eq!(goal.name, "SURVIVE");
        assert_eq!(goal.priority, Priority::Medium);
        assert_eq!(goal.timestamp_ms, 42);
    }
}

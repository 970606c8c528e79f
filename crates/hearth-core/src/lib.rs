//! Cognition, behavior trees, planning and the tick loop for the Hearth
//! simulation.
//!
//! Survivors think on two levels. A goal oracle picks a strategic goal
//! (`GATHER_WOOD`, `BUILD_CAMPFIRE`) every half minute or so; the planner
//! turns the goal into step text, the compiler turns the text into a
//! behavior tree, and the tree is ticked every simulation step until it
//! succeeds, fails or is discarded.
//!
//! # Modules
//!
//! - [`bt`] -- Behavior-tree nodes: composites, decorators, conditions and
//!   the world-facing actions.
//! - [`compiler`] -- Step text to behavior tree.
//! - [`config`] -- Configuration loading from `hearth.yaml`.
//! - [`context`] -- [`Context`] trait action nodes act through.
//! - [`oracle`] -- [`GoalOracle`] trait and the rule-based [`RuleOracle`].
//! - [`perception`] -- Per-agent world snapshots.
//! - [`planner`] -- Rule-based tactical planner.
//! - [`runner`] -- Real-time loop with oracle dispatch and shutdown.
//! - [`scheduler`] -- Per-agent minds: goal buffer, cadence, watchdog.
//! - [`task`] -- Timed actions and their cancellation tokens.
//! - [`tick`] -- The six-phase tick cycle.
//! - [`world`] -- All simulation state.
//!
//! [`Context`]: context::Context
//! [`GoalOracle`]: oracle::GoalOracle
//! [`RuleOracle`]: oracle::RuleOracle

pub mod bt;
pub mod compiler;
pub mod config;
pub mod context;
pub mod oracle;
pub mod perception;
pub mod planner;
pub mod runner;
pub mod scheduler;
pub mod task;
pub mod tick;
pub mod world;

pub use context::Context;

//! Behavior tree engine.
//!
//! Every node implements [`BtNode`]: it is ticked once per simulation step
//! with the agent body and a [`Context`], answers with a [`NodeStatus`], and
//! can be reset to its initial state. Node state is local to the instance;
//! a tree belongs to exactly one agent.
//!
//! - [`composite`] -- [`Sequence`] and [`Selector`]
//! - [`condition`] -- Pure predicates
//! - [`action`] -- Multi-tick actions bound to world entities
//! - [`decorator`] -- Single-child wrappers

pub mod action;
pub mod composite;
pub mod condition;
pub mod decorator;

use hearth_agents::Agent;
use hearth_types::TargetId;

use crate::context::Context;

pub use action::{Build, Eat, GatherNearest, Harvest, MoveTo, Wait};
pub use composite::{Selector, Sequence};
pub use condition::{HasItem, IsNearTarget, StatAbove};
pub use decorator::{Invert, RepeatUntilFail, StepTracker};

/// Result of ticking a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// The node finished and achieved its purpose.
    Success,
    /// The node finished without achieving its purpose.
    Failure,
    /// The node needs more ticks.
    Running,
}

/// The leaf responsible for a tree failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
    /// Node name.
    pub node: String,
    /// Entity the node was bound to.
    pub target: Option<TargetId>,
}

/// A behavior tree node.
pub trait BtNode: Send {
    /// Advance the node by one simulation step.
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus;

    /// Return to the initial state, dropping any in-flight work.
    fn reset(&mut self);

    /// Display name, e.g. `MoveTo(tree_3)`.
    fn name(&self) -> &str;

    /// Entity this node is bound to, if any.
    fn target(&self) -> Option<TargetId> {
        None
    }

    /// Whether the last tick returned [`NodeStatus::Running`].
    fn is_running(&self) -> bool;

    /// The running leaf under this node. Does not change any state.
    fn active_node(&self) -> Option<&dyn BtNode>;

    /// The leaf that caused the most recent failure of this subtree.
    /// Leaves report `None`; composites and decorators report the leaf.
    fn failure(&self) -> Option<NodeFailure> {
        None
    }
}

/// An owned, type-erased node.
pub type BoxedNode = Box<dyn BtNode>;

/// Who failed: the child's own record, or the child itself when it is a
/// leaf.
pub(crate) fn failure_of(child: &dyn BtNode) -> NodeFailure {
    child.failure().unwrap_or_else(|| NodeFailure {
        node: child.name().to_owned(),
        target: child.target(),
    })
}

//! Decorators: nodes wrapping exactly one child.

use hearth_agents::Agent;
use hearth_types::TargetId;

use super::{BoxedNode, BtNode, NodeFailure, NodeStatus, failure_of};
use crate::context::Context;

/// Swaps success and failure; passes running through.
pub struct Invert {
    name: String,
    child: BoxedNode,
    failed: bool,
}

impl Invert {
    /// Invert `child`.
    pub fn new(child: BoxedNode) -> Self {
        Self {
            name: format!("Invert({})", child.name()),
            child,
            failed: false,
        }
    }
}

impl BtNode for Invert {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        let status = match self.child.tick(agent, ctx) {
            NodeStatus::Success => NodeStatus::Failure,
            NodeStatus::Failure => NodeStatus::Success,
            NodeStatus::Running => NodeStatus::Running,
        };
        self.failed = status == NodeStatus::Failure;
        status
    }

    fn reset(&mut self) {
        self.failed = false;
        self.child.reset();
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Option<TargetId> {
        self.child.target()
    }

    fn is_running(&self) -> bool {
        self.child.is_running()
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        self.child.active_node()
    }

    fn failure(&self) -> Option<NodeFailure> {
        // The child succeeded, so the inverter itself is the culprit.
        self.failed.then(|| NodeFailure {
            node: self.name.clone(),
            target: self.child.target(),
        })
    }
}

/// Re-runs its child after every success; succeeds once the child fails.
pub struct RepeatUntilFail {
    name: String,
    child: BoxedNode,
    iterations: u32,
    running: bool,
}

impl RepeatUntilFail {
    /// Repeat `child` until it fails.
    pub fn new(child: BoxedNode) -> Self {
        Self {
            name: format!("RepeatUntilFail({})", child.name()),
            child,
            iterations: 0,
            running: false,
        }
    }

    /// Successful runs of the child since the last reset.
    pub const fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl BtNode for RepeatUntilFail {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        let status = match self.child.tick(agent, ctx) {
            NodeStatus::Success => {
                self.iterations = self.iterations.saturating_add(1);
                self.child.reset();
                NodeStatus::Running
            }
            NodeStatus::Failure => {
                self.child.reset();
                self.iterations = 0;
                NodeStatus::Success
            }
            NodeStatus::Running => NodeStatus::Running,
        };
        self.running = status == NodeStatus::Running;
        status
    }

    fn reset(&mut self) {
        self.iterations = 0;
        self.running = false;
        self.child.reset();
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        if !self.running {
            return None;
        }
        self.child
            .active_node()
            .or(Some(self as &dyn BtNode))
    }
}

/// Records which plan step is executing on the agent, then defers to the
/// wrapped step.
pub struct StepTracker {
    index: usize,
    child: BoxedNode,
    failed: Option<NodeFailure>,
}

impl StepTracker {
    /// Track step `index` of the tactical plan.
    pub fn new(index: usize, child: BoxedNode) -> Self {
        Self {
            index,
            child,
            failed: None,
        }
    }

    /// Plan step index this node tracks.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The wrapped step.
    pub fn inner(&self) -> &dyn BtNode {
        self.child.as_ref()
    }
}

impl BtNode for StepTracker {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        if let Some(plan) = agent.tactical_plan.as_mut() {
            plan.cursor = self.index;
        }
        let status = self.child.tick(agent, ctx);
        self.failed = (status == NodeStatus::Failure).then(|| failure_of(self.child.as_ref()));
        status
    }

    fn reset(&mut self) {
        self.failed = None;
        self.child.reset();
    }

    fn name(&self) -> &str {
        self.child.name()
    }

    fn target(&self) -> Option<TargetId> {
        self.child.target()
    }

    fn is_running(&self) -> bool {
        self.child.is_running()
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        self.child.active_node()
    }

    fn failure(&self) -> Option<NodeFailure> {
        self.failed.clone()
    }
}

//! Composite nodes.
//!
//! Both composites remember the index of the child they are on across
//! [`NodeStatus::Running`] results, so a child that already finished is not
//! ticked again in the same pass. Either terminal result resets the
//! composite and all of its children.

use hearth_agents::Agent;

use super::{BoxedNode, BtNode, NodeFailure, NodeStatus, failure_of};
use crate::context::Context;

/// Ticks children left to right; fails on the first failure, succeeds once
/// every child has succeeded.
pub struct Sequence {
    name: String,
    children: Vec<BoxedNode>,
    index: usize,
    running: bool,
    failed: Option<NodeFailure>,
}

impl Sequence {
    /// A named sequence over `children`.
    pub fn new(name: impl Into<String>, children: Vec<BoxedNode>) -> Self {
        Self {
            name: name.into(),
            children,
            index: 0,
            running: false,
            failed: None,
        }
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the sequence has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct children, in order.
    pub fn children(&self) -> impl Iterator<Item = &dyn BtNode> {
        self.children.iter().map(|child| &**child)
    }

    /// Index of the child currently being ticked.
    pub const fn cursor(&self) -> usize {
        self.index
    }
}

impl BtNode for Sequence {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        while let Some(child) = self.children.get_mut(self.index) {
            match child.tick(agent, ctx) {
                NodeStatus::Running => {
                    self.running = true;
                    return NodeStatus::Running;
                }
                NodeStatus::Failure => {
                    let failed = failure_of(child.as_ref());
                    self.reset();
                    self.failed = Some(failed);
                    return NodeStatus::Failure;
                }
                NodeStatus::Success => self.index = self.index.saturating_add(1),
            }
        }

        self.reset();
        NodeStatus::Success
    }

    fn reset(&mut self) {
        self.index = 0;
        self.running = false;
        self.failed = None;
        for child in &mut self.children {
            child.reset();
        }
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
        self.children
            .get(self.index)
            .and_then(|child| child.active_node())
    }

    fn failure(&self) -> Option<NodeFailure> {
        self.failed.clone()
    }
}

/// Ticks children left to right; succeeds on the first success, fails once
/// every child has failed.
pub struct Selector {
    name: String,
    children: Vec<BoxedNode>,
    index: usize,
    running: bool,
    failed: Option<NodeFailure>,
}

impl Selector {
    /// A named selector over `children`.
    pub fn new(name: impl Into<String>, children: Vec<BoxedNode>) -> Self {
        Self {
            name: name.into(),
            children,
            index: 0,
            running: false,
            failed: None,
        }
    }
}

impl BtNode for Selector {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        let mut last_failure = None;
        while let Some(child) = self.children.get_mut(self.index) {
            match child.tick(agent, ctx) {
                NodeStatus::Running => {
                    self.running = true;
                    return NodeStatus::Running;
                }
                NodeStatus::Success => {
                    self.reset();
                    return NodeStatus::Success;
                }
                NodeStatus::Failure => {
                    last_failure = Some(failure_of(child.as_ref()));
                    self.index = self.index.saturating_add(1);
                }
            }
        }

        self.reset();
        self.failed = last_failure;
        NodeStatus::Failure
    }

    fn reset(&mut self) {
        self.index = 0;
        self.running = false;
        self.failed = None;
        for child in &mut self.children {
            child.reset();
        }
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
        self.children
            .get(self.index)
            .and_then(|child| child.active_node())
    }

    fn failure(&self) -> Option<NodeFailure> {
        self.failed.clone()
    }
}

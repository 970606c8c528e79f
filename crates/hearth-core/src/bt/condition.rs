//! Condition nodes: pure predicates that answer in a single tick and never
//! change anything.

use hearth_agents::Agent;
use hearth_types::{Item, Stat, TargetId};

use super::{BtNode, NodeStatus};
use crate::context::Context;

const fn verdict(ok: bool) -> NodeStatus {
    if ok {
        NodeStatus::Success
    } else {
        NodeStatus::Failure
    }
}

/// Succeeds while the agent is within `radius` of a live target.
pub struct IsNearTarget {
    name: String,
    target: TargetId,
    radius: f64,
}

impl IsNearTarget {
    /// Check proximity to `target`.
    pub fn new(target: TargetId, radius: f64) -> Self {
        Self {
            name: format!("IsNearTarget({target})"),
            target,
            radius,
        }
    }
}

impl BtNode for IsNearTarget {
    fn tick(&mut self, agent: &mut Agent, ctx: &mut dyn Context) -> NodeStatus {
        verdict(ctx.resolve_target(self.target).is_some_and(|resolved| {
            resolved.available && agent.distance_to(resolved.position) <= self.radius
        }))
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Option<TargetId> {
        Some(self.target)
    }

    fn is_running(&self) -> bool {
        false
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        None
    }
}

/// Succeeds when the agent carries at least `amount` of `item`.
pub struct HasItem {
    name: String,
    item: Item,
    amount: u32,
}

impl HasItem {
    /// Check for `amount` of `item`.
    pub fn new(item: Item, amount: u32) -> Self {
        Self {
            name: format!("HasItem({item} x{amount})"),
            item,
            amount,
        }
    }
}

impl BtNode for HasItem {
    fn tick(&mut self, agent: &mut Agent, _ctx: &mut dyn Context) -> NodeStatus {
        verdict(agent.inventory.has(self.item, self.amount))
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        false
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        None
    }
}

/// Succeeds when `stat` is at or above `threshold`.
pub struct StatAbove {
    name: String,
    stat: Stat,
    threshold: f64,
}

impl StatAbove {
    /// Compare `stat` against `threshold`.
    pub fn new(stat: Stat, threshold: f64) -> Self {
        Self {
            name: format!("StatAbove({stat:?} >= {threshold})"),
            stat,
            threshold,
        }
    }
}

impl BtNode for StatAbove {
    fn tick(&mut self, agent: &mut Agent, _ctx: &mut dyn Context) -> NodeStatus {
        verdict(agent.vitals.get(self.stat) >= self.threshold)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        false
    }

    fn active_node(&self) -> Option<&dyn BtNode> {
        None
    }
}

//! Harvestable resource nodes and their registry.
//!
//! A node is either `Active` with `remaining > 0` or `Depleted` with
//! `remaining == 0`; the two are never out of step because `remaining` is
//! only changed through [`ResourceNode::take_one`] and
//! [`ResourceNode::respawn`]. A depleted node comes back only after its full
//! respawn delay, restored to exactly its original max yield.

use std::collections::BTreeMap;

use hearth_types::{Item, Position, ResourceId, ResourceKind};

use crate::error::WorldError;

/// Lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Harvestable.
    Active,
    /// Exhausted at `since_ms`, waiting for respawn.
    Depleted {
        /// Simulation time the last unit was taken.
        since_ms: u64,
    },
}

/// A single harvestable node.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    /// Textual id (`tree_3`).
    pub id: ResourceId,
    /// Where the node stands.
    pub position: Position,
    remaining: u32,
    max_yield: u32,
    /// Duration of one harvest action.
    pub harvest_ms: u64,
    /// Delay between depletion and respawn.
    pub respawn_ms: u64,
    state: NodeState,
}

impl ResourceNode {
    /// Create an active node. A zero yield is raised to one so a fresh node
    /// is always harvestable.
    pub fn new(
        id: ResourceId,
        position: Position,
        max_yield: u32,
        harvest_ms: u64,
        respawn_ms: u64,
    ) -> Self {
        let max_yield = max_yield.max(1);
        Self {
            id,
            position,
            remaining: max_yield,
            max_yield,
            harvest_ms,
            respawn_ms,
            state: NodeState::Active,
        }
    }

    /// Node kind.
    pub const fn kind(&self) -> ResourceKind {
        self.id.kind
    }

    /// Item one harvest yields.
    pub const fn item(&self) -> Item {
        self.id.kind.yield_item()
    }

    /// Units left.
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Units the node holds when fresh.
    pub const fn max_yield(&self) -> u32 {
        self.max_yield
    }

    /// Lifecycle state.
    pub const fn state(&self) -> NodeState {
        self.state
    }

    /// Whether a harvest may start or complete on this node.
    pub const fn is_harvestable(&self) -> bool {
        matches!(self.state, NodeState::Active) && self.remaining > 0
    }

    /// Whether the node is depleted.
    pub const fn is_depleted(&self) -> bool {
        matches!(self.state, NodeState::Depleted { .. })
    }

    /// Remove one unit. Returns the units left; the node becomes depleted
    /// when that reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ResourceDepleted`] if the node has nothing left.
    pub fn take_one(&mut self, now_ms: u64) -> Result<u32, WorldError> {
        if !self.is_harvestable() {
            return Err(WorldError::ResourceDepleted(self.id));
        }
        self.remaining = self
            .remaining
            .checked_sub(1)
            .ok_or(WorldError::ArithmeticOverflow)?;
        if self.remaining == 0 {
            self.state = NodeState::Depleted { since_ms: now_ms };
        }
        Ok(self.remaining)
    }

    /// Whether a depleted node has waited its full respawn delay.
    pub const fn respawn_due(&self, now_ms: u64) -> bool {
        match self.state {
            NodeState::Active => false,
            NodeState::Depleted { since_ms } => {
                now_ms.saturating_sub(since_ms) >= self.respawn_ms
            }
        }
    }

    /// Restore the node to its original yield.
    pub const fn respawn(&mut self) {
        self.remaining = self.max_yield;
        self.state = NodeState::Active;
    }
}

/// Authoritative store of every resource node in a world.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    nodes: BTreeMap<ResourceId, ResourceNode>,
    next_index: BTreeMap<ResourceKind, u32>,
}

impl ResourceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, assigning the next per-kind index (`tree_1`, `tree_2`, ...).
    pub fn spawn(
        &mut self,
        kind: ResourceKind,
        position: Position,
        max_yield: u32,
        harvest_ms: u64,
        respawn_ms: u64,
    ) -> ResourceId {
        let counter = self.next_index.entry(kind).or_insert(0);
        *counter = counter.saturating_add(1);
        let id = ResourceId::new(kind, *counter);
        self.nodes.insert(
            id,
            ResourceNode::new(id, position, max_yield, harvest_ms, respawn_ms),
        );
        id
    }

    /// Look up a node.
    pub fn get(&self, id: ResourceId) -> Option<&ResourceNode> {
        self.nodes.get(&id)
    }

    /// Look up a node mutably.
    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(&id)
    }

    /// Iterate every node in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the registry holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nearest harvestable node of `kind`, optionally skipping one id.
    /// Ties resolve to the lowest id.
    pub fn nearest_live(
        &self,
        kind: ResourceKind,
        from: Position,
        exclude: Option<ResourceId>,
    ) -> Option<&ResourceNode> {
        self.nodes
            .values()
            .filter(|n| n.kind() == kind && n.is_harvestable() && Some(n.id) != exclude)
            .min_by(|a, b| {
                from.distance_to(a.position)
                    .total_cmp(&from.distance_to(b.position))
            })
    }

    /// Harvestable nodes within `radius` of `from`.
    pub fn live_within(
        &self,
        from: Position,
        radius: f64,
    ) -> impl Iterator<Item = &ResourceNode> {
        self.nodes
            .values()
            .filter(move |n| n.is_harvestable() && from.distance_to(n.position) <= radius)
    }

    /// Take one unit from `id`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ResourceNotFound`] for an unknown id and
    /// [`WorldError::ResourceDepleted`] for a node with nothing left.
    pub fn harvest_one(&mut self, id: ResourceId, now_ms: u64) -> Result<u32, WorldError> {
        self.nodes
            .get_mut(&id)
            .ok_or(WorldError::ResourceNotFound(id))?
            .take_one(now_ms)
    }

    /// Respawn every node whose delay has elapsed. Returns the ids restored.
    pub fn tick_respawns(&mut self, now_ms: u64) -> Vec<ResourceId> {
        let mut restored = Vec::new();
        for node in self.nodes.values_mut() {
            if node.respawn_due(now_ms) {
                node.respawn();
                tracing::debug!(resource = %node.id, remaining = node.remaining, "Resource respawned");
                restored.push(node.id);
            }
        }
        restored
    }

    /// Remove every node and reset id counters.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.next_index.clear();
    }
}

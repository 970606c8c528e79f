//! In-flight timed actions.
//!
//! Harvests and crafts take simulation time. Starting one schedules a
//! [`PendingTask`] in the [`TaskBook`] and hands the starting node a
//! [`TaskHandle`]. The world settles due tasks once per tick and parks the
//! outcome until the node polls it.
//!
//! The handle owns a [`CancelToken`]. Dropping the handle (because the node,
//! or the whole tree, was reset or discarded) cancels the token, and a
//! cancelled task never applies its effect.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hearth_types::{AgentId, BuildingId, Equipment, Item, RecipeId, ResourceId};

/// Identifier of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, live token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every holder of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the token was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What a task does when it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Take one unit from a resource node.
    Harvest {
        /// Node being harvested.
        resource: ResourceId,
    },
    /// Produce a recipe's output. The requirements were already paid.
    Craft {
        /// Recipe being crafted.
        recipe: RecipeId,
        /// Items consumed at start, refunded on cancellation.
        paid: BTreeMap<Item, u32>,
    },
}

impl TaskKind {
    /// Short label for logs and events.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Harvest { .. } => "harvest",
            Self::Craft { .. } => "build",
        }
    }
}

/// Result of a settled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// One unit was harvested.
    Harvested {
        /// Item gained.
        item: Item,
        /// Units left on the node.
        remaining: u32,
    },
    /// A building was completed.
    Built {
        /// The new building.
        building: BuildingId,
    },
    /// Equipment was crafted.
    Crafted {
        /// The new equipment.
        equipment: Equipment,
    },
    /// The task completed without effect.
    Failed {
        /// Why.
        reason: String,
    },
}

/// Result of polling a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPoll {
    /// Still waiting for its due time.
    Pending,
    /// Finished; the outcome is handed over exactly once.
    Done(TaskOutcome),
    /// The book has no record of this task (already polled or reset).
    Unknown,
}

/// A scheduled task awaiting settlement.
#[derive(Debug, Clone)]
pub struct PendingTask {
    /// Task id.
    pub id: TaskId,
    /// Agent that started it.
    pub agent: AgentId,
    /// Effect on completion.
    pub kind: TaskKind,
    /// Simulation time it completes at.
    pub due_ms: u64,
    /// Cancellation flag shared with the handle.
    pub token: CancelToken,
}

/// Node-held handle to a scheduled task. Dropping it cancels the task.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    agent: AgentId,
    token: CancelToken,
}

impl TaskHandle {
    /// Task id.
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Agent that owns the task.
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// Whether the task was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[derive(Debug)]
struct Finished {
    outcome: TaskOutcome,
    token: CancelToken,
}

/// Every in-flight and finished-but-unpolled task in a world.
#[derive(Debug, Default)]
pub struct TaskBook {
    next_id: u64,
    pending: Vec<PendingTask>,
    finished: BTreeMap<TaskId, Finished>,
}

impl TaskBook {
    /// An empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task due at `due_ms` and return its handle.
    pub fn schedule(&mut self, agent: AgentId, kind: TaskKind, due_ms: u64) -> TaskHandle {
        self.next_id = self.next_id.saturating_add(1);
        let id = TaskId(self.next_id);
        let token = CancelToken::new();
        self.pending.push(PendingTask {
            id,
            agent,
            kind,
            due_ms,
            token: token.clone(),
        });
        TaskHandle { id, agent, token }
    }

    /// Number of tasks not yet settled.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether `agent` has any task in flight.
    pub fn has_pending_for(&self, agent: AgentId) -> bool {
        self.pending
            .iter()
            .any(|t| t.agent == agent && !t.token.is_cancelled())
    }

    /// Remove and return every task that is cancelled or due at `now_ms`,
    /// in scheduling order.
    pub fn take_settleable(&mut self, now_ms: u64) -> Vec<PendingTask> {
        let (ready, waiting): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|t| t.token.is_cancelled() || t.due_ms <= now_ms);
        self.pending = waiting;
        ready
    }

    /// Park a task's outcome until its handle polls it.
    pub fn finish(&mut self, task: &PendingTask, outcome: TaskOutcome) {
        self.finished.insert(
            task.id,
            Finished {
                outcome,
                token: task.token.clone(),
            },
        );
    }

    /// Poll a handle. A finished outcome is removed and returned once.
    pub fn poll(&mut self, handle: &TaskHandle) -> TaskPoll {
        if let Some(done) = self.finished.remove(&handle.id) {
            return TaskPoll::Done(done.outcome);
        }
        if self.pending.iter().any(|t| t.id == handle.id) {
            TaskPoll::Pending
        } else {
            TaskPoll::Unknown
        }
    }

    /// Drop parked outcomes whose handle is gone.
    pub fn purge_abandoned(&mut self) -> usize {
        let before = self.finished.len();
        self.finished.retain(|_, f| !f.token.is_cancelled());
        before.saturating_sub(self.finished.len())
    }

    /// Cancel and forget everything.
    pub fn clear(&mut self) {
        for task in &self.pending {
            task.token.cancel();
        }
        self.pending.clear();
        self.finished.clear();
    }
}

#[cfg(test)]
mod tests {
    use hearth_types::ResourceKind;

    use super::*;

    fn harvest_kind() -> TaskKind {
        TaskKind::Harvest {
            resource: ResourceId::new(ResourceKind::Tree, 1),
        }
    }

    #[test]
    fn tasks_settle_when_due() {
        let mut book = TaskBook::new();
        let handle = book.schedule(AgentId::new(), harvest_kind(), 100);
        assert!(book.take_settleable(99).is_empty());
        assert_eq!(book.poll(&handle), TaskPoll::Pending);

        let ready = book.take_settleable(100);
        assert_eq!(ready.len(), 1);
        let outcome = TaskOutcome::Failed {
            reason: "test".into(),
        };
        if let Some(task) = ready.first() {
            book.finish(task, outcome.clone());
        }
        assert_eq!(book.poll(&handle), TaskPoll::Done(outcome));
        assert_eq!(book.poll(&handle), TaskPoll::Unknown);
    }

    #[test]
    fn dropping_handle_cancels_task() {
        let mut book = TaskBook::new();
        let agent = AgentId::new();
        let handle = book.schedule(agent, harvest_kind(), 10_000);
        assert!(book.has_pending_for(agent));
        drop(handle);
        assert!(!book.has_pending_for(agent));
        let ready = book.take_settleable(0);
        assert_eq!(ready.len(), 1);
        assert!(ready.iter().all(|t| t.token.is_cancelled()));
    }

    #[test]
    fn abandoned_outcomes_are_purged() {
        let mut book = TaskBook::new();
        let handle = book.schedule(AgentId::new(), harvest_kind(), 0);
        for task in book.take_settleable(0) {
            book.finish(&task, TaskOutcome::Failed { reason: "x".into() });
        }
        drop(handle);
        assert_eq!(book.purge_abandoned(), 1);
    }
}

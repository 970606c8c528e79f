//! Error types for the hearth-agents crate.
//!
//! Inventory and crafting operations return typed errors rather than
//! panicking. Callers inside the behavior tree turn these into node
//! failures with a diagnostic; nothing here is fatal.

use std::collections::BTreeMap;

use hearth_types::{Item, RecipeId};

/// Errors that can occur during agent state operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// Attempted to remove more of an item than the agent holds.
    #[error("insufficient {item}: wanted {requested} but only have {available}")]
    InsufficientItem {
        /// The item being removed.
        item: Item,
        /// The quantity requested.
        requested: u32,
        /// The quantity held.
        available: u32,
    },

    /// A recipe could not be paid for in full.
    #[error("cannot afford {recipe}: missing {missing:?}")]
    CannotAfford {
        /// The recipe.
        recipe: RecipeId,
        /// Shortfall per item.
        missing: BTreeMap<Item, u32>,
    },

    /// The item cannot be eaten.
    #[error("{0} is not edible")]
    NotEdible(Item),

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}

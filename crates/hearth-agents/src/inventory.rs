//! Capacity-bounded item ledger.
//!
//! The sum of all counts never exceeds the capacity. Additions beyond the
//! remaining space are clipped rather than rejected, and a multi-item
//! requirement is either consumed in full or not touched at all.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hearth_types::Item;

use crate::error::AgentError;

/// Default number of items an agent can carry.
pub const DEFAULT_CAPACITY: u32 = 50;

/// Per-agent item counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    counts: BTreeMap<Item, u32>,
    capacity: u32,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Inventory {
    /// An empty inventory holding at most `capacity` items.
    pub const fn with_capacity(capacity: u32) -> Self {
        Self {
            counts: BTreeMap::new(),
            capacity,
        }
    }

    /// Maximum total item count.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Units of `item` held.
    pub fn count(&self, item: Item) -> u32 {
        self.counts.get(&item).copied().unwrap_or(0)
    }

    /// Whether at least `amount` of `item` is held.
    pub fn has(&self, item: Item, amount: u32) -> bool {
        self.count(item) >= amount
    }

    /// Sum of all counts.
    pub fn total(&self) -> u32 {
        self.counts
            .values()
            .fold(0_u32, |acc, n| acc.saturating_add(*n))
    }

    /// Space left before the capacity is reached.
    pub fn free_space(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    /// Add up to `amount` of `item`, clipped to the free space.
    /// Returns the amount actually added.
    pub fn add(&mut self, item: Item, amount: u32) -> u32 {
        let added = amount.min(self.free_space());
        if added > 0 {
            let slot = self.counts.entry(item).or_insert(0);
            *slot = slot.saturating_add(added);
        }
        added
    }

    /// Remove exactly `amount` of `item`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InsufficientItem`] without touching the ledger
    /// if fewer than `amount` are held.
    pub fn remove(&mut self, item: Item, amount: u32) -> Result<(), AgentError> {
        let available = self.count(item);
        let left = available
            .checked_sub(amount)
            .ok_or(AgentError::InsufficientItem {
                item,
                requested: amount,
                available,
            })?;
        if left == 0 {
            self.counts.remove(&item);
        } else {
            self.counts.insert(item, left);
        }
        Ok(())
    }

    /// Shortfall per item against `requirements`. Empty when affordable.
    pub fn missing(&self, requirements: &BTreeMap<Item, u32>) -> BTreeMap<Item, u32> {
        requirements
            .iter()
            .filter_map(|(item, needed)| {
                let gap = needed.saturating_sub(self.count(*item));
                (gap > 0).then_some((*item, gap))
            })
            .collect()
    }

    /// Whether every requirement is met.
    pub fn has_all(&self, requirements: &BTreeMap<Item, u32>) -> bool {
        requirements
            .iter()
            .all(|(item, needed)| self.has(*item, *needed))
    }

    /// Consume every requirement in one step, or nothing at all.
    ///
    /// # Errors
    ///
    /// Returns the first [`AgentError::InsufficientItem`] found; the ledger
    /// is left unchanged in that case.
    pub fn consume_all(&mut self, requirements: &BTreeMap<Item, u32>) -> Result<(), AgentError> {
        if let Some((item, needed)) = requirements
            .iter()
            .find(|(item, needed)| !self.has(**item, **needed))
        {
            return Err(AgentError::InsufficientItem {
                item: *item,
                requested: *needed,
                available: self.count(*item),
            });
        }
        for (item, needed) in requirements {
            self.remove(*item, *needed)?;
        }
        Ok(())
    }

    /// Put `items` back, clipped to capacity. Returns the total restored.
    pub fn refund(&mut self, items: &BTreeMap<Item, u32>) -> u32 {
        items
            .iter()
            .fold(0_u32, |acc, (item, n)| acc.saturating_add(self.add(*item, *n)))
    }

    /// Non-zero counts, for snapshots.
    pub fn non_zero(&self) -> BTreeMap<Item, u32> {
        self.counts
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(item, n)| (*item, *n))
            .collect()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

//! Crafting recipes.
//!
//! Defines the static recipe table and the readiness summary the planner
//! and the oracles see. Paying for a recipe goes through
//! [`Inventory::consume_all`], so a craft that cannot be paid for in full
//! never touches the inventory.

use std::collections::BTreeMap;

use hearth_types::{BuildingKind, Equipment, Item, Readiness, RecipeId, RecipeReadiness};

use crate::error::AgentError;
use crate::inventory::Inventory;

/// What a recipe produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeOutput {
    /// A building placed in the world.
    Building(BuildingKind),
    /// Equipment added to the crafter.
    Equipment(Equipment),
}

/// A single recipe: inputs, duration, output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// Recipe id.
    pub id: RecipeId,
    /// Items consumed when crafting starts.
    pub requirements: BTreeMap<Item, u32>,
    /// Craft duration before pacing scaling.
    pub base_craft_ms: u64,
    /// Result.
    pub output: RecipeOutput,
}

/// Look up a recipe.
pub fn recipe(id: RecipeId) -> Recipe {
    match id {
        RecipeId::Campfire => Recipe {
            id,
            requirements: BTreeMap::from([(Item::Wood, 10), (Item::Stone, 3)]),
            base_craft_ms: 10_000,
            output: RecipeOutput::Building(BuildingKind::Campfire),
        },
        RecipeId::Shelter => Recipe {
            id,
            requirements: BTreeMap::from([(Item::Wood, 20), (Item::Stone, 10)]),
            base_craft_ms: 1_000,
            output: RecipeOutput::Building(BuildingKind::Shelter),
        },
        RecipeId::Spear => Recipe {
            id,
            requirements: BTreeMap::from([(Item::Wood, 5), (Item::Stone, 2)]),
            base_craft_ms: 5_000,
            output: RecipeOutput::Equipment(Equipment::Spear),
        },
    }
}

impl Recipe {
    /// The building this recipe produces, if any.
    pub const fn building(&self) -> Option<BuildingKind> {
        match self.output {
            RecipeOutput::Building(kind) => Some(kind),
            RecipeOutput::Equipment(_) => None,
        }
    }

    /// Pay for the recipe out of `inventory`, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::CannotAfford`] with the shortfall; the inventory
    /// is unchanged in that case.
    pub fn pay(&self, inventory: &mut Inventory) -> Result<(), AgentError> {
        let missing = inventory.missing(&self.requirements);
        if !missing.is_empty() {
            return Err(AgentError::CannotAfford {
                recipe: self.id,
                missing,
            });
        }
        inventory.consume_all(&self.requirements)
    }

    /// Readiness of this recipe for an agent holding `inventory`.
    /// `already_built` marks a building that exists somewhere in the world.
    pub fn readiness(&self, inventory: &Inventory, already_built: bool) -> RecipeReadiness {
        let missing = inventory.missing(&self.requirements);
        let status = if already_built && self.building().is_some() {
            Readiness::AlreadyBuilt
        } else if missing.is_empty() {
            Readiness::Ready
        } else {
            Readiness::Missing
        };
        RecipeReadiness {
            recipe: self.id,
            status,
            cost: self.requirements.clone(),
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campfire_costs_ten_wood_three_stone() {
        let r = recipe(RecipeId::Campfire);
        assert_eq!(r.requirements.get(&Item::Wood), Some(&10));
        assert_eq!(r.requirements.get(&Item::Stone), Some(&3));
        assert_eq!(r.building(), Some(BuildingKind::Campfire));
    }

    #[test]
    fn failed_payment_leaves_inventory_untouched() {
        let mut inv = Inventory::default();
        inv.add(Item::Wood, 19);
        inv.add(Item::Stone, 10);
        let before = inv.clone();
        let err = recipe(RecipeId::Shelter).pay(&mut inv);
        assert_eq!(
            err,
            Err(AgentError::CannotAfford {
                recipe: RecipeId::Shelter,
                missing: BTreeMap::from([(Item::Wood, 1)]),
            })
        );
        assert_eq!(inv, before);
    }

    #[test]
    fn successful_payment_takes_exact_requirements() {
        let mut inv = Inventory::default();
        inv.add(Item::Wood, 7);
        inv.add(Item::Stone, 4);
        assert!(recipe(RecipeId::Spear).pay(&mut inv).is_ok());
        assert_eq!(inv.count(Item::Wood), 2);
        assert_eq!(inv.count(Item::Stone), 2);
    }

    #[test]
    fn readiness_reports_already_built_for_buildings_only() {
        let inv = Inventory::default();
        let fire = recipe(RecipeId::Campfire).readiness(&inv, true);
        assert_eq!(fire.status, Readiness::AlreadyBuilt);
        let spear = recipe(RecipeId::Spear).readiness(&inv, true);
        assert_eq!(spear.status, Readiness::Missing);
        assert_eq!(spear.missing.get(&Item::Wood), Some(&5));
    }
}

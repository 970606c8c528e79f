//! Agent bodies, inventory, crafting, and vitals for the Hearth simulation.
//!
//! # Modules
//!
//! - [`agent`] -- [`Agent`] body: position, vitals, inventory, plan records
//! - [`crafting`] -- Recipe table, atomic payment, readiness
//! - [`error`] -- [`AgentError`]
//! - [`inventory`] -- Capacity-bounded item ledger
//! - [`names`] -- Agent name pool
//! - [`vitals`] -- Per-tick stat decay, damage and regeneration

pub mod agent;
pub mod crafting;
pub mod error;
pub mod inventory;
pub mod names;
pub mod vitals;

pub use agent::{Agent, food_value};
pub use crafting::{Recipe, RecipeOutput, recipe};
pub use error::AgentError;
pub use inventory::{DEFAULT_CAPACITY, Inventory};
pub use names::pick_names;
pub use vitals::{VitalTick, VitalsConfig, apply_vitals};

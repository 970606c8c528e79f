//! Resource nodes, buildings, and world presets for the Hearth simulation.
//!
//! This crate owns the physical economy the planner reasons about: nodes
//! that deplete and respawn, buildings that radiate warmth, and the preset
//! tables that scale both.
//!
//! # Modules
//!
//! - [`building`] -- Building registry, blueprint effects, warmth lookup
//! - [`error`] -- [`WorldError`]
//! - [`presets`] -- Pacing and abundance tables
//! - [`resource`] -- Resource node lifecycle and registry
//! - [`spawn`] -- Seeded random population

pub mod building;
pub mod error;
pub mod presets;
pub mod resource;
pub mod spawn;

pub use building::{Building, BuildingEffect, BuildingRegistry, blueprint};
pub use error::WorldError;
pub use presets::{Abundance, AbundancePreset, Pacing, PacingPreset};
pub use resource::{NodeState, ResourceNode, ResourceRegistry};
pub use spawn::{populate_resources, random_position};

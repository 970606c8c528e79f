//! Error types for the `hearth-world` crate.

use hearth_types::{BuildingId, ResourceId};

/// Errors raised by registry mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// No node with this id exists.
    #[error("resource not found: {0}")]
    ResourceNotFound(ResourceId),

    /// The node is depleted and cannot be harvested until it respawns.
    #[error("resource {0} is depleted")]
    ResourceDepleted(ResourceId),

    /// No building with this id exists.
    #[error("building not found: {0}")]
    BuildingNotFound(BuildingId),

    /// A preset name did not match any known preset.
    #[error("unknown {category} preset: {name:?}")]
    UnknownPreset {
        /// Preset family (`pacing` or `abundance`).
        category: &'static str,
        /// The unrecognized name.
        name: String,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}

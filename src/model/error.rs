//! Error types for the attribute and topology model.
//!
//! Every variant is fatal to the operation that raised it. Nothing in the model
//! substitutes a default value for a missing column or silently truncates an
//! array that disagrees with its entity count.

use super::attribute::{ElementType, Level};
use thiserror::Error;

/// Errors raised by the attribute registry, topology construction and
/// frame binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An attribute with the same name (or singular name) is already registered,
    /// or a topology already carries a column with that name.
    #[error("attribute '{0}' is already defined")]
    DuplicateAttribute(String),

    /// The attribute is unknown to the registry, or absent from the topology.
    #[error("attribute '{name}' not found in {scope}")]
    NotFound {
        /// Attribute name (plural or singular) that was requested.
        name: String,
        /// Where the lookup happened (`"registry"` or `"topology"`).
        scope: &'static str,
    },

    /// An attribute array's length disagrees with the entity count at its level.
    #[error(
        "attribute '{name}' has {found} values but the topology has {expected} {level} entities"
    )]
    CardinalityMismatch {
        /// Attribute name.
        name: String,
        /// Level the attribute is declared at.
        level: Level,
        /// Entity count at that level.
        expected: usize,
        /// Length of the offending array.
        found: usize,
    },

    /// Values do not match the element type declared by the attribute spec.
    #[error("attribute '{name}' holds {expected} values, got {found}")]
    TypeMismatch {
        /// Attribute name.
        name: String,
        /// Element type declared by the spec.
        expected: ElementType,
        /// Element type that was supplied or requested.
        found: ElementType,
    },

    /// Attempt to modify an attribute whose spec is not mutable.
    #[error("attribute '{0}' is read-only")]
    ReadOnly(String),

    /// An entity index beyond the population at its level.
    #[error("{level} index {index} is out of range for {count} entities")]
    EntityOutOfRange {
        /// Level of the addressed entity.
        level: Level,
        /// Requested index.
        index: usize,
        /// Entity count at that level.
        count: usize,
    },

    /// A containment index points past the parent population.
    #[error("{level} {index} refers to parent {parent} but only {parent_count} exist")]
    ContainmentOutOfRange {
        /// Level of the child entity.
        level: Level,
        /// Child index.
        index: usize,
        /// Parent index stored for the child.
        parent: usize,
        /// Parent entity count.
        parent_count: usize,
    },

    /// A frame's per-atom arrays disagree with the bound topology.
    #[error("frame {field} has {found} entries but the topology has {expected} atoms")]
    FrameTopologyMismatch {
        /// Which per-atom array disagreed (`positions`, `velocities`, `forces`).
        field: &'static str,
        /// Atom count of the topology (or of the source's first frame).
        expected: usize,
        /// Length found on the frame.
        found: usize,
    },
}

impl Error {
    pub(crate) fn not_in_registry(name: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            scope: "registry",
        }
    }

    pub(crate) fn not_in_topology(name: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            scope: "topology",
        }
    }
}

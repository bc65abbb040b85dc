//! Error types for the Ashlar container subsystem.
//!
//! Every variant is a programmer or configuration error raised
//! synchronously at the call site; the container never retries or
//! recovers internally. Callers decide whether a failure aborts the run
//! or is scoped to one block.

use std::error::Error;
use std::fmt;

/// Errors from container operations: registry mutation, lookup, sparse
/// allocation, packing, and parent-block resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainerError {
    /// A label was absent on lookup, removal, or allocation.
    NotFound {
        /// The label that was requested.
        label: String,
        /// The operation that failed, for the diagnostic.
        operation: &'static str,
    },
    /// A variable with this label is already registered.
    DuplicateLabel {
        /// The colliding label.
        label: String,
    },
    /// The operation does not apply to this variable's kind, e.g.
    /// sparse-allocating a dense variable.
    InvalidOperation {
        /// The label of the offending variable.
        label: String,
        /// What went wrong.
        reason: String,
    },
    /// The parent mesh block handle is no longer resolvable.
    ExpiredBlock,
    /// A flux-pack request passed paired name lists of unequal length.
    MismatchedFluxNames {
        /// Length of the variable name list.
        vars: usize,
        /// Length of the flux name list.
        fluxes: usize,
    },
    /// Storage of an unallocated sparse variable was accessed. Reads
    /// never silently succeed against unallocated storage.
    Unallocated {
        /// The label of the unallocated variable.
        label: String,
    },
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { label, operation } => {
                write!(f, "variable '{label}' not found in {operation}")
            }
            Self::DuplicateLabel { label } => {
                write!(f, "variable '{label}' already exists")
            }
            Self::InvalidOperation { label, reason } => {
                write!(f, "invalid operation on '{label}': {reason}")
            }
            Self::ExpiredBlock => write!(f, "parent mesh block no longer exists"),
            Self::MismatchedFluxNames { vars, fluxes } => write!(
                f,
                "flux pack name lists must have equal length ({vars} variables vs {fluxes} fluxes)"
            ),
            Self::Unallocated { label } => {
                write!(f, "sparse variable '{label}' is not allocated")
            }
        }
    }
}

impl Error for ContainerError {}

/// Errors from [`Metadata`](crate::Metadata) construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataError {
    /// Neither `Cell` nor `Face` was given.
    MissingTopology,
    /// Both `Cell` and `Face` were given.
    ConflictingTopology,
    /// `WithFluxes` on a non-cell variable.
    FluxesRequireCell,
    /// `Sparse` on a non-cell variable.
    SparseRequiresCell,
    /// A component count of zero.
    ZeroComponents,
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTopology => {
                write!(f, "metadata must set exactly one of Cell or Face")
            }
            Self::ConflictingTopology => {
                write!(f, "metadata sets both Cell and Face")
            }
            Self::FluxesRequireCell => {
                write!(f, "WithFluxes requires cell placement")
            }
            Self::SparseRequiresCell => {
                write!(f, "Sparse requires cell placement")
            }
            Self::ZeroComponents => write!(f, "component count must be nonzero"),
        }
    }
}

impl Error for MetadataError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_label_and_operation() {
        let err = ContainerError::NotFound {
            label: "density".into(),
            operation: "Get",
        };
        let msg = err.to_string();
        assert!(msg.contains("density"));
        assert!(msg.contains("Get"));
    }

    #[test]
    fn display_reports_list_lengths() {
        let err = ContainerError::MismatchedFluxNames { vars: 3, fluxes: 2 };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains('2'));
    }
}

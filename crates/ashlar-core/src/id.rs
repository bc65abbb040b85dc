//! Variable and block identity.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Floating-point type used for all field storage.
pub type Real = f64;

/// Identifies a mesh block within the simulation.
///
/// Block ids are assigned by the mesh layer and are unique across the
/// whole mesh, including blocks owned by other ranks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BlockId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Sparse index attached to a variable base name.
///
/// A sparse variable's identity is its base name plus a sparse id; dense
/// variables carry [`INVALID_SPARSE_ID`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SparseId(pub i64);

/// Sentinel marking a dense variable (no sparse index).
pub const INVALID_SPARSE_ID: SparseId = SparseId(i64::MIN);

impl SparseId {
    /// Whether this id denotes a real sparse index rather than the
    /// dense sentinel.
    pub fn is_valid(self) -> bool {
        self != INVALID_SPARSE_ID
    }
}

impl fmt::Display for SparseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SparseId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// Composite identity of a variable: base name plus optional sparse id.
///
/// The storage label is derived deterministically by [`VarId::label`]
/// rather than by ad hoc string concatenation at call sites. Equality and
/// hashing go through the label, so a dense variable named `"foo_3"` and
/// the sparse variable `("foo", 3)` are the *same* identity; attempting
/// to register both is reported as a duplicate rather than silently
/// creating two colliding entries.
#[derive(Clone, Debug)]
pub struct VarId {
    /// Base name, without any sparse suffix.
    pub base_name: String,
    /// Sparse id, or [`INVALID_SPARSE_ID`] for dense variables.
    pub sparse_id: SparseId,
}

impl VarId {
    /// Identity of a dense variable.
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            sparse_id: INVALID_SPARSE_ID,
        }
    }

    /// Identity of a sparse variable `(base_name, id)`.
    pub fn sparse(base_name: impl Into<String>, id: i64) -> Self {
        Self {
            base_name: base_name.into(),
            sparse_id: SparseId(id),
        }
    }

    /// Whether this identity carries a sparse id.
    pub fn is_sparse(&self) -> bool {
        self.sparse_id.is_valid()
    }

    /// The storage label: `"{base}_{id}"` for sparse ids, the bare base
    /// name otherwise.
    pub fn label(&self) -> String {
        if self.sparse_id.is_valid() {
            format!("{}_{}", self.base_name, self.sparse_id)
        } else {
            self.base_name.clone()
        }
    }
}

impl PartialEq for VarId {
    fn eq(&self, other: &Self) -> bool {
        self.label() == other.label()
    }
}

impl Eq for VarId {}

impl Hash for VarId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label().hash(state);
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

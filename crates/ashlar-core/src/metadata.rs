//! Variable metadata: the attribute flag vocabulary, the [`FlagSet`]
//! bitset, and the validated [`Metadata`] descriptor.

use crate::error::MetadataError;
use std::fmt;

/// Fixed, orthogonal attribute vocabulary for variables.
///
/// Flags determine storage kind (dense vs. [`Sparse`](Self::Sparse)),
/// sharing policy across container copies
/// ([`OneCopy`](Self::OneCopy)), participation in ghost exchange
/// ([`FillGhost`](Self::FillGhost)) and flux correction
/// ([`WithFluxes`](Self::WithFluxes)), and topological placement
/// ([`Cell`](Self::Cell) or [`Face`](Self::Face)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataFlag {
    /// An evolved state variable, advanced by the integrator.
    Independent,
    /// A quantity computed from independent variables each cycle.
    Derived,
    /// Storage is shared across container copies rather than duplicated.
    OneCopy,
    /// Storage is lazily allocated; the variable may exist unallocated.
    Sparse,
    /// Ghost zones are exchanged with neighboring blocks.
    FillGhost,
    /// The variable carries face-flux arrays for conservation.
    WithFluxes,
    /// Included in restart dumps (handled by the I/O layer).
    Restart,
    /// Cell-centered placement.
    Cell,
    /// Face-centered placement.
    Face,
}

impl MetadataFlag {
    const COUNT: usize = 9;

    fn bit(self) -> u16 {
        1u16 << (self as u16)
    }

    /// All flags, in declaration order.
    pub fn all() -> [MetadataFlag; Self::COUNT] {
        use MetadataFlag::*;
        [
            Independent,
            Derived,
            OneCopy,
            Sparse,
            FillGhost,
            WithFluxes,
            Restart,
            Cell,
            Face,
        ]
    }
}

impl fmt::Display for MetadataFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Independent => "Independent",
            Self::Derived => "Derived",
            Self::OneCopy => "OneCopy",
            Self::Sparse => "Sparse",
            Self::FillGhost => "FillGhost",
            Self::WithFluxes => "WithFluxes",
            Self::Restart => "Restart",
            Self::Cell => "Cell",
            Self::Face => "Face",
        };
        write!(f, "{name}")
    }
}

/// A set of metadata flags implemented as a fixed-width bitset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FlagSet {
    bits: u16,
}

impl FlagSet {
    /// Create an empty flag set.
    pub fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Insert a flag into the set.
    pub fn insert(&mut self, flag: MetadataFlag) {
        self.bits |= flag.bit();
    }

    /// Check whether the set contains a flag.
    pub fn contains(&self, flag: MetadataFlag) -> bool {
        self.bits & flag.bit() != 0
    }

    /// Return the union of two sets.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Return the intersection of two sets.
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    /// Returns `true` if the set contains no flags.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of flags in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterate over the flags in the set, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = MetadataFlag> + '_ {
        MetadataFlag::all()
            .into_iter()
            .filter(|flag| self.contains(*flag))
    }
}

impl FromIterator<MetadataFlag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = MetadataFlag>>(iter: I) -> Self {
        let mut set = Self::empty();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

/// Validated descriptor of a variable's attributes and shape.
///
/// Construction enforces the flag invariants up front so downstream code
/// can branch on queries like [`is_sparse`](Self::is_sparse) without
/// re-validating:
///
/// - exactly one of [`MetadataFlag::Cell`] / [`MetadataFlag::Face`];
/// - [`MetadataFlag::WithFluxes`] and [`MetadataFlag::Sparse`] require
///   cell placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    flags: FlagSet,
    components: usize,
}

impl Metadata {
    /// Build a single-component descriptor from a flag list.
    pub fn new(flags: &[MetadataFlag]) -> Result<Self, MetadataError> {
        Self::with_components(flags, 1)
    }

    /// Build a descriptor with `components` values per cell (e.g. 3 for
    /// a vector field). Multi-component variables occupy contiguous
    /// adjacent slots in packs.
    pub fn with_components(
        flags: &[MetadataFlag],
        components: usize,
    ) -> Result<Self, MetadataError> {
        let flags: FlagSet = flags.iter().copied().collect();

        let cell = flags.contains(MetadataFlag::Cell);
        let face = flags.contains(MetadataFlag::Face);
        if cell == face {
            return Err(if cell {
                MetadataError::ConflictingTopology
            } else {
                MetadataError::MissingTopology
            });
        }
        if flags.contains(MetadataFlag::WithFluxes) && !cell {
            return Err(MetadataError::FluxesRequireCell);
        }
        if flags.contains(MetadataFlag::Sparse) && !cell {
            return Err(MetadataError::SparseRequiresCell);
        }
        if components == 0 {
            return Err(MetadataError::ZeroComponents);
        }

        Ok(Self { flags, components })
    }

    /// The flag set.
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Number of components per cell.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Whether a specific flag is set.
    pub fn is_set(&self, flag: MetadataFlag) -> bool {
        self.flags.contains(flag)
    }

    /// Lazily-allocated storage kind.
    pub fn is_sparse(&self) -> bool {
        self.is_set(MetadataFlag::Sparse)
    }

    /// Shared-across-copies storage policy.
    pub fn is_one_copy(&self) -> bool {
        self.is_set(MetadataFlag::OneCopy)
    }

    /// Cell-centered placement.
    pub fn is_cell(&self) -> bool {
        self.is_set(MetadataFlag::Cell)
    }

    /// Face-centered placement.
    pub fn is_face(&self) -> bool {
        self.is_set(MetadataFlag::Face)
    }

    /// Participates in ghost-zone exchange.
    pub fn fills_ghost(&self) -> bool {
        self.is_set(MetadataFlag::FillGhost)
    }

    /// Carries face-flux arrays.
    pub fn has_fluxes(&self) -> bool {
        self.is_set(MetadataFlag::WithFluxes)
    }

    /// Whether this descriptor matches an attribute predicate: true if
    /// it carries at least one of the requested flags. An empty request
    /// matches every variable.
    pub fn matches_any(&self, flags: &[MetadataFlag]) -> bool {
        flags.is_empty() || flags.iter().any(|f| self.is_set(*f))
    }
}

//! Neighbor-block topology descriptors.

use ashlar_core::BlockId;
use std::fmt;

/// One of a block's six faces: a direction (0..3) and a side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Face {
    /// Normal direction, 0-based.
    pub dir: usize,
    /// `true` for the upper side of the block, `false` for the lower.
    pub upper: bool,
}

impl Face {
    /// The lower face in direction `dir`.
    pub fn lower(dir: usize) -> Self {
        Self { dir, upper: false }
    }

    /// The upper face in direction `dir`.
    pub fn upper(dir: usize) -> Self {
        Self { dir, upper: true }
    }

    /// The face on the opposite side of the same direction. Data sent
    /// out through a face arrives at the neighbor's opposite face.
    pub fn opposite(self) -> Self {
        Self {
            dir: self.dir,
            upper: !self.upper,
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = if self.upper { "+" } else { "-" };
        write!(f, "x{}{side}", self.dir + 1)
    }
}

/// Refinement level of a neighbor relative to this block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NeighborLevel {
    /// Same refinement level.
    Same,
    /// The neighbor is one level coarser.
    Coarser,
    /// The neighbor is one level finer.
    Finer,
}

/// A neighboring block across one of this block's faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbor {
    /// The neighbor's block id.
    pub block: BlockId,
    /// The face of *this* block the neighbor sits across.
    pub face: Face,
    /// The neighbor's refinement level relative to this block.
    pub level: NeighborLevel,
}

impl Neighbor {
    /// A same-level neighbor across `face`.
    pub fn same_level(block: BlockId, face: Face) -> Self {
        Self {
            block,
            face,
            level: NeighborLevel::Same,
        }
    }
}

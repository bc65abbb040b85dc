//! Reusable container and boundary-exchange fixtures.
//!
//! Standard metadata builders plus two canned setups:
//!
//! - [`populated_container`]: one block with a representative field mix
//!   (dense, flux-carrying, sparse, face).
//! - [`linked_pair`]: two same-level blocks adjacent along x1, wired
//!   through a [`ChannelTransport`] pair for full exchange cycles.

use ashlar_comm::{ChannelTransport, Neighbor};
use ashlar_container::MeshBlockData;
use ashlar_core::Metadata;
use ashlar_core::MetadataFlag::*;
use ashlar_core::BlockId;
use ashlar_mesh::{IndexShape, MeshBlock};
use std::sync::Arc;

/// Ghost-filling dense cell metadata.
pub fn dense_cell() -> Metadata {
    Metadata::new(&[Cell, Independent, FillGhost]).unwrap()
}

/// Sparse cell metadata (unallocated on registration).
pub fn sparse_cell() -> Metadata {
    Metadata::new(&[Cell, Sparse]).unwrap()
}

/// Ghost-filling dense cell metadata with flux arrays.
pub fn flux_cell() -> Metadata {
    Metadata::new(&[Cell, Independent, FillGhost, WithFluxes]).unwrap()
}

/// One-copy face metadata.
pub fn face() -> Metadata {
    Metadata::new(&[Face, OneCopy]).unwrap()
}

/// A block with an `n` by `n` by 1 interior and two ghost layers.
pub fn test_block(n: usize) -> Arc<MeshBlock> {
    test_block_with_id(0, n)
}

/// Like [`test_block`], with an explicit block id.
pub fn test_block_with_id(id: u64, n: usize) -> Arc<MeshBlock> {
    MeshBlock::new(BlockId(id), IndexShape::new(n, n, 1, 2))
}

/// A 4x4 block with the standard field mix registered: dense `density`,
/// flux-carrying `energy`, sparse `tracer_1` and `tracer_3`, and the
/// face variable `bfield`. Sparse variables are left unallocated.
pub fn populated_container() -> (Arc<MeshBlock>, MeshBlockData) {
    let block = test_block(4);
    let mut data = MeshBlockData::new(&block);
    data.add("density", dense_cell()).unwrap();
    data.add("energy", flux_cell()).unwrap();
    data.add_sparse("tracer", 1, sparse_cell()).unwrap();
    data.add_sparse("tracer", 3, sparse_cell()).unwrap();
    data.add("bfield", face()).unwrap();
    (block, data)
}

/// Two same-level `n` by `n` blocks adjacent along x1, each with a
/// ghost-filling `density` variable, wired to each other through a
/// [`ChannelTransport`] pair. Block 0 sits on the lower side.
pub fn linked_pair(
    n: usize,
) -> ((Arc<MeshBlock>, MeshBlockData), (Arc<MeshBlock>, MeshBlockData)) {
    let block_a = test_block_with_id(0, n);
    let block_b = test_block_with_id(1, n);
    let (transport_a, transport_b) = ChannelTransport::pair(BlockId(0), BlockId(1));

    let mut data_a = MeshBlockData::new(&block_a);
    data_a.add("density", dense_cell()).unwrap();
    data_a.setup_persistent_comms(
        vec![Neighbor::same_level(BlockId(1), ashlar_comm::Face::upper(0))],
        transport_a,
    );

    let mut data_b = MeshBlockData::new(&block_b);
    data_b.add("density", dense_cell()).unwrap();
    data_b.setup_persistent_comms(
        vec![Neighbor::same_level(BlockId(0), ashlar_comm::Face::lower(0))],
        transport_b,
    );

    ((block_a, data_a), (block_b, data_b))
}

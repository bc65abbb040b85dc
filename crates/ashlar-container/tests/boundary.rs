//! Full boundary-exchange and flux-correction cycles over the
//! in-process transport.

use ashlar_comm::{ChannelTransport, CommPhase, Face, Neighbor, NeighborLevel, TaskStatus};
use ashlar_container::{MeshBlockData, Variable};
use ashlar_core::{BlockId, Real};
use ashlar_mesh::{IndexDomain, IndexShape, MeshBlock};
use ashlar_test_utils::{flux_cell, linked_pair};
use std::sync::Arc;

/// Fill a variable's interior with `f(i, j, k)`.
fn fill_interior(var: &Variable, f: impl Fn(usize, usize, usize) -> Real) {
    let shape = *var.shape();
    let mut data = var.write().unwrap();
    for k in shape.bounds_k(IndexDomain::Interior).iter() {
        for j in shape.bounds_j(IndexDomain::Interior).iter() {
            for i in shape.bounds_i(IndexDomain::Interior).iter() {
                data[shape.cell_index(i, j, k)] = f(i, j, k);
            }
        }
    }
}

#[test]
fn ghost_cycle_runs_incomplete_to_complete() {
    let ((_block_a, mut a), (_block_b, mut b)) = linked_pair(4);

    fill_interior(a.get("density").unwrap(), |i, j, _| (10 * i + j) as Real);
    fill_interior(b.get("density").unwrap(), |i, j, _| (100 * i + j) as Real);

    assert_eq!(a.start_receiving(CommPhase::All), TaskStatus::Complete);
    assert_eq!(b.start_receiving(CommPhase::All), TaskStatus::Complete);

    // Nothing sent yet.
    assert_eq!(a.receive_boundary_buffers(), TaskStatus::Incomplete);

    assert_eq!(a.send_boundary_buffers(), TaskStatus::Complete);
    assert_eq!(b.send_boundary_buffers(), TaskStatus::Complete);

    assert_eq!(a.receive_boundary_buffers(), TaskStatus::Complete);
    assert_eq!(b.receive_boundary_buffers(), TaskStatus::Complete);
    assert_eq!(a.set_boundaries(), TaskStatus::Complete);
    assert_eq!(b.set_boundaries(), TaskStatus::Complete);

    // Block a's upper-x1 ghosts now hold block b's first interior
    // columns, and vice versa. Interior spans [2, 5] with two ghosts.
    let shape = IndexShape::new(4, 4, 1, 2);
    let a_data = a.get("density").unwrap().read().unwrap();
    let b_data = b.get("density").unwrap().read().unwrap();
    for j in 2..=5 {
        assert_eq!(a_data[shape.cell_index(6, j, 0)], (100 * 2 + j) as Real);
        assert_eq!(a_data[shape.cell_index(7, j, 0)], (100 * 3 + j) as Real);
        assert_eq!(b_data[shape.cell_index(0, j, 0)], (10 * 4 + j) as Real);
        assert_eq!(b_data[shape.cell_index(1, j, 0)], (10 * 5 + j) as Real);
    }
    drop(a_data);
    drop(b_data);

    // Clearing makes the state machines reusable for the next cycle.
    assert_eq!(a.clear_boundary(CommPhase::All), TaskStatus::Complete);
    assert_eq!(b.clear_boundary(CommPhase::All), TaskStatus::Complete);

    assert_eq!(a.start_receiving(CommPhase::All), TaskStatus::Complete);
    assert_eq!(b.start_receiving(CommPhase::All), TaskStatus::Complete);
    assert_eq!(b.send_boundary_buffers(), TaskStatus::Complete);
    assert_eq!(a.receive_and_set_boundaries_with_wait(), TaskStatus::Complete);
    assert_eq!(a.clear_boundary(CommPhase::All), TaskStatus::Complete);
}

#[test]
fn receive_before_arming_fails() {
    let ((_block_a, mut a), _) = linked_pair(4);
    assert_eq!(a.receive_boundary_buffers(), TaskStatus::Fail);
}

#[test]
fn unallocated_sparse_variables_sit_out_the_exchange() {
    use ashlar_core::Metadata;
    use ashlar_core::MetadataFlag::{Cell, FillGhost, Sparse};

    let ((_block_a, mut a), (_block_b, mut b)) = linked_pair(4);
    let ghost_sparse = Metadata::new(&[Cell, Sparse, FillGhost]).unwrap();
    a.add_sparse("tracer", 1, ghost_sparse.clone()).unwrap();
    b.add_sparse("tracer", 1, ghost_sparse).unwrap();

    a.start_receiving(CommPhase::All);
    b.start_receiving(CommPhase::All);
    assert_eq!(a.send_boundary_buffers(), TaskStatus::Complete);
    assert_eq!(b.send_boundary_buffers(), TaskStatus::Complete);

    // Only density crosses; the cycle still completes.
    assert_eq!(a.receive_boundary_buffers(), TaskStatus::Complete);
    assert_eq!(b.receive_boundary_buffers(), TaskStatus::Complete);
}

#[test]
fn flux_correction_restricts_fine_onto_coarse() {
    // A coarse 4x4 block below a fine 8x8 block covering the same
    // physical face extent at half the cell size.
    let coarse_block = MeshBlock::new(BlockId(0), IndexShape::new(4, 4, 1, 2));
    let fine_block = MeshBlock::new(BlockId(1), IndexShape::new(8, 8, 1, 2));
    let (coarse_t, fine_t) = ChannelTransport::pair(BlockId(0), BlockId(1));

    let mut coarse = MeshBlockData::new(&coarse_block);
    coarse.add("energy", flux_cell()).unwrap();
    coarse.setup_persistent_comms(
        vec![Neighbor {
            block: BlockId(1),
            face: Face::upper(0),
            level: NeighborLevel::Finer,
        }],
        coarse_t,
    );

    let mut fine = MeshBlockData::new(&fine_block);
    fine.add("energy", flux_cell()).unwrap();
    fine.setup_persistent_comms(
        vec![Neighbor {
            block: BlockId(0),
            face: Face::lower(0),
            level: NeighborLevel::Coarser,
        }],
        fine_t,
    );

    // Fine fluxes on the shared face: value j along the transverse
    // interior, so restricted pairs average to half-integers.
    {
        let fine_shape = IndexShape::new(8, 8, 1, 2);
        let var = fine.get("energy").unwrap();
        let mut flux = var.flux_write(0).unwrap();
        let layer = fine_shape.bounds_i(IndexDomain::Interior).s;
        for (offset, j) in fine_shape
            .bounds_j(IndexDomain::Interior)
            .iter()
            .enumerate()
        {
            flux[fine_shape.face_index(0, layer, j, 0)] = offset as Real;
        }
    }

    assert_eq!(coarse.start_receiving(CommPhase::All), TaskStatus::Complete);
    assert_eq!(coarse.receive_flux_correction(), TaskStatus::Incomplete);

    assert_eq!(fine.send_flux_correction(), TaskStatus::Complete);
    assert_eq!(coarse.receive_flux_correction(), TaskStatus::Complete);

    // The coarse upper-x1 flux layer now holds the pair averages.
    let coarse_shape = IndexShape::new(4, 4, 1, 2);
    let var = Arc::clone(coarse.get("energy").unwrap());
    let flux = var.flux_read(0).unwrap();
    let layer = coarse_shape.bounds_i(IndexDomain::Interior).e + 1;
    let got: Vec<Real> = coarse_shape
        .bounds_j(IndexDomain::Interior)
        .iter()
        .map(|j| flux[coarse_shape.face_index(0, layer, j, 0)])
        .collect();
    assert_eq!(got, vec![0.5, 2.5, 4.5, 6.5]);
}

#[test]
fn interior_phase_excludes_derived_variables() {
    use ashlar_core::Metadata;
    use ashlar_core::MetadataFlag::{Cell, Derived, FillGhost};

    let ((_block_a, mut a), (_block_b, mut b)) = linked_pair(4);
    let derived = Metadata::new(&[Cell, Derived, FillGhost]).unwrap();
    a.add("pressure", derived.clone()).unwrap();
    b.add("pressure", derived).unwrap();

    a.start_receiving(CommPhase::Interior);
    b.start_receiving(CommPhase::Interior);

    // Only density is independent; one message each way completes the
    // Interior cycle.
    assert_eq!(a.send_boundary_buffers(), TaskStatus::Complete);
    assert_eq!(b.send_boundary_buffers(), TaskStatus::Complete);
    assert_eq!(a.receive_boundary_buffers(), TaskStatus::Complete);
    assert_eq!(b.receive_boundary_buffers(), TaskStatus::Complete);
}

//! Pack resolution, layout, and cache coherence.

use ashlar_container::{SlotRange, VarSelection};
use ashlar_core::MetadataFlag::Restart;
use ashlar_core::{ContainerError, SparseId};
use ashlar_test_utils::populated_container;
use std::sync::Arc;

#[test]
fn density_tracer_layout_is_exact() {
    let (_block, mut data) = populated_container();
    data.allocate_sparse("tracer_3").unwrap();

    let selection = VarSelection::names(["density", "tracer"]);
    let pack = data.pack_variables(&selection, &[SparseId(3)]);

    assert_eq!(pack.len(), 2);
    assert_eq!(pack.range_of("density"), Some(SlotRange { start: 0, end: 1 }));
    assert_eq!(pack.range_of("tracer_3"), Some(SlotRange { start: 1, end: 2 }));
    assert_eq!(pack.index_map().len(), 2);
}

#[test]
fn identical_requests_are_pointer_identical() {
    let (_block, mut data) = populated_container();

    let selection = VarSelection::names(["density", "energy"]);
    let a = data.pack_variables(&selection, &[]);
    let b = data.pack_variables(&selection, &[]);
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn empty_flag_match_is_an_empty_pack() {
    let (_block, mut data) = populated_container();

    let pack = data.pack_variables(&VarSelection::Flags(vec![Restart]), &[]);
    assert!(pack.is_empty());
    assert_eq!(pack.range_of("density"), None);
}

#[test]
fn empty_sparse_filter_includes_every_id() {
    let (_block, mut data) = populated_container();

    let pack = data.pack_variables(&VarSelection::names(["tracer"]), &[]);
    assert_eq!(pack.len(), 2);
    assert!(pack.range_of("tracer_1").is_some());
    assert!(pack.range_of("tracer_3").is_some());
}

#[test]
fn unallocated_members_occupy_slots_but_reject_reads() {
    let (_block, mut data) = populated_container();

    let pack = data.pack_variables(&VarSelection::names(["tracer"]), &[]);
    assert_eq!(pack.len(), 2);
    assert!(matches!(
        pack.read(0),
        Err(ContainerError::Unallocated { .. })
    ));
}

#[test]
fn allocation_between_requests_rebuilds_the_pack() {
    let (_block, mut data) = populated_container();

    let selection = VarSelection::names(["tracer"]);
    let before = data.pack_variables(&selection, &[]);
    assert!(before.read(0).is_err());

    data.allocate_sparse("tracer_1").unwrap();
    data.allocate_sparse("tracer_3").unwrap();

    let after = data.pack_variables(&selection, &[]);
    assert!(!Arc::ptr_eq(&before, &after));
    assert!(after.read(0).is_ok());
    assert!(after.read(1).is_ok());

    // Stable again once the allocation state settled.
    let again = data.pack_variables(&selection, &[]);
    assert!(Arc::ptr_eq(&after, &again));
}

#[test]
fn registry_mutation_invalidates_every_request() {
    let (_block, mut data) = populated_container();

    let before = data.pack_variables(&VarSelection::All, &[]);
    data.remove("energy").unwrap();
    let after = data.pack_variables(&VarSelection::All, &[]);

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.len(), before.len() - 1);
}

#[test]
fn flux_pack_pairs_lists_and_checks_lengths() {
    let (_block, mut data) = populated_container();

    let pack = data
        .pack_variables_and_fluxes(&["energy"], &["energy"], &[])
        .unwrap();
    assert_eq!(pack.vars().len(), 1);
    assert_eq!(pack.flux_len(), 1);
    assert_eq!(
        pack.flux_range_of("energy"),
        Some(SlotRange { start: 0, end: 1 })
    );

    assert_eq!(
        data.pack_variables_and_fluxes(&["density", "energy"], &["energy"], &[])
            .unwrap_err(),
        ContainerError::MismatchedFluxNames { vars: 2, fluxes: 1 }
    );
}

#[test]
fn flux_names_must_carry_fluxes() {
    let (_block, mut data) = populated_container();

    assert!(matches!(
        data.pack_variables_and_fluxes(&["density"], &["density"], &[]),
        Err(ContainerError::InvalidOperation { .. })
    ));
}

#[test]
fn coarse_packs_view_the_coarse_buffers() {
    let (_block, mut data) = populated_container();

    let selection = VarSelection::names(["density"]);
    let fine = data.pack_variables(&selection, &[]);
    let coarse = data.pack_variables_coarse(&selection, &[]);

    assert!(coarse.is_coarse());
    assert!(coarse.read(0).unwrap().len() < fine.read(0).unwrap().len());
    // The two requests cache independently.
    assert!(Arc::ptr_eq(&coarse, &data.pack_variables_coarse(&selection, &[])));
}

//! Container registry lifecycle against the standard fixtures.

use ashlar_container::MeshBlockData;
use ashlar_core::ContainerError;
use ashlar_test_utils::{dense_cell, populated_container, sparse_cell, test_block};
use std::sync::Arc;

#[test]
fn populated_container_has_the_standard_fields() {
    let (_block, data) = populated_container();

    assert!(data.contains_all(&["density", "energy", "tracer_1", "tracer_3", "bfield"]));
    assert_eq!(data.len(), 5);
    assert_eq!(
        data.var_labels().collect::<Vec<_>>(),
        vec!["density", "energy", "tracer_1", "tracer_3"]
    );
    assert_eq!(data.face_labels().collect::<Vec<_>>(), vec!["bfield"]);
}

#[test]
fn add_remove_add_round_trips() {
    let (_block, mut data) = populated_container();

    data.remove("density").unwrap();
    assert!(!data.contains("density"));
    assert_eq!(
        data.remove("density").unwrap_err(),
        ContainerError::NotFound {
            label: "density".into(),
            operation: "Remove",
        }
    );

    data.add("density", dense_cell()).unwrap();
    assert!(data.contains("density"));
    // Re-registration goes to the back of the registry.
    assert_eq!(data.var_labels().last(), Some("density"));
}

#[test]
fn equality_is_label_set_equality() {
    let (_block_a, a) = populated_container();
    let (_block_b, mut b) = populated_container();
    assert_eq!(a, b);

    b.remove("bfield").unwrap();
    assert_ne!(a, b);
}

#[test]
fn sparse_allocation_is_per_variable() {
    let (_block, data) = populated_container();

    data.allocate_sparse("tracer_1").unwrap();
    assert!(data.is_allocated("tracer_1"));
    assert!(!data.is_allocated("tracer_3"));
    assert!(data.is_allocated_sparse("tracer", 1));
    assert!(!data.is_allocated_sparse("tracer", 3));
}

#[test]
fn copy_respects_one_copy_and_allocation_state() {
    let (_block, mut src) = populated_container();
    src.allocate_sparse("tracer_1").unwrap();
    src.get("density").unwrap().write().unwrap()[0] = 3.0;

    let dst = MeshBlockData::copy_from(&src).unwrap();

    // Face variables are OneCopy and shared.
    assert!(Arc::ptr_eq(
        src.get_face("bfield").unwrap(),
        dst.get_face("bfield").unwrap()
    ));
    // Dense state is independent.
    assert!(!Arc::ptr_eq(
        src.get("density").unwrap(),
        dst.get("density").unwrap()
    ));
    assert_eq!(dst.get("density").unwrap().read().unwrap()[0], 3.0);
    src.get("density").unwrap().write().unwrap()[0] = 9.0;
    assert_eq!(dst.get("density").unwrap().read().unwrap()[0], 3.0);

    // Allocation state carries over.
    assert!(dst.is_allocated("tracer_1"));
    assert!(!dst.is_allocated("tracer_3"));
}

#[test]
fn sparse_slice_shares_storage() {
    let (_block, mut data) = populated_container();
    data.allocate_sparse("tracer_3").unwrap();

    let slice = data.sparse_slice(3);
    assert!(slice.contains("density"));
    assert!(slice.contains("energy"));
    assert!(slice.contains("tracer_3"));
    assert!(slice.contains("bfield"));
    assert!(!slice.contains("tracer_1"));

    // A write through the slice is visible in the parent.
    slice.get("tracer_3").unwrap().write().unwrap()[0] = 7.0;
    assert_eq!(data.get("tracer_3").unwrap().read().unwrap()[0], 7.0);
}

#[test]
fn container_outliving_its_block_errors() {
    let block = test_block(4);
    let mut data = MeshBlockData::new(&block);
    data.add("density", dense_cell()).unwrap();
    drop(block);

    assert_eq!(data.block().unwrap_err(), ContainerError::ExpiredBlock);
    assert_eq!(
        data.add_sparse("tracer", 1, sparse_cell()).unwrap_err(),
        ContainerError::ExpiredBlock
    );
    // Already-registered variables stay readable; only block-dependent
    // operations fail.
    assert!(data.get("density").unwrap().read().is_ok());
}

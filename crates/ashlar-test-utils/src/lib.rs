//! Test utilities and fixtures for Ashlar development.
//!
//! Canned [`Metadata`](ashlar_core::Metadata) builders, block
//! constructors, a pre-populated container, and a
//! [`linked_pair`](fixtures::linked_pair) of containers wired through an
//! in-process transport for boundary-exchange tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    dense_cell, face, flux_cell, linked_pair, populated_container, sparse_cell, test_block,
};

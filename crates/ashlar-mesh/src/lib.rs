//! Mesh blocks and index-space bounds for Ashlar.
//!
//! A [`MeshBlock`] is a rectangular subdomain of the adaptive grid. This
//! crate owns only the geometry the container layer consumes: per-domain
//! index bounds used to size variable storage. Refinement and
//! derefinement decisions live outside the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod domain;

pub use block::MeshBlock;
pub use domain::{IndexDomain, IndexRange, IndexShape};

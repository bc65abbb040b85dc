//! Core types for the Ashlar AMR field-data library.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! variable identity, metadata flags, and the error taxonomy used
//! throughout the Ashlar workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod metadata;

pub use error::{ContainerError, MetadataError};
pub use id::{BlockId, Real, SparseId, VarId, INVALID_SPARSE_ID};
pub use metadata::{FlagSet, Metadata, MetadataFlag};

//! Variable containers, selection, packs, and boundary exchange.
//!
//! [`MeshBlockData`] is the container for the variables that make up one
//! mesh block's state at one data stage. It owns the variable registry,
//! resolves selection requests into cached [`VariablePack`]s for kernel
//! consumption, allocates sparse storage on demand, and drives the
//! non-blocking boundary-exchange and flux-correction protocol through
//! the `ashlar-comm` transport seam.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod boundary;
mod cache;
pub mod collection;
pub mod container;
pub mod pack;
pub mod selector;
pub mod variable;

pub use collection::DataCollection;
pub use container::MeshBlockData;
pub use pack::{PackIndexMap, SlotRange, VariableFluxPack, VariablePack};
pub use selector::VarSelection;
pub use variable::{FaceVariable, Variable};

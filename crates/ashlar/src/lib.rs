//! Ashlar: mesh-block variable containers for block-structured AMR codes.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Ashlar sub-crates. For most users, adding `ashlar` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use ashlar::prelude::*;
//! use ashlar::types::MetadataFlag::{Cell, FillGhost, Independent, Sparse};
//!
//! // An 8x8 block with two ghost layers.
//! let block = MeshBlock::new(BlockId(0), IndexShape::new(8, 8, 1, 2));
//! let mut data = MeshBlockData::new(&block);
//!
//! // A dense state variable and a sparse tracer family.
//! data.add("density", Metadata::new(&[Cell, Independent, FillGhost]).unwrap())
//!     .unwrap();
//! data.add_sparse("tracer", 3, Metadata::new(&[Cell, Sparse]).unwrap())
//!     .unwrap();
//!
//! // Sparse storage appears on demand.
//! assert!(!data.is_allocated("tracer_3"));
//! data.allocate_sparse("tracer_3").unwrap();
//!
//! // Pack everything for kernel consumption; layout follows
//! // registration order.
//! let pack = data.pack_variables(&VarSelection::All, &[]);
//! assert_eq!(pack.len(), 2);
//! assert_eq!(pack.range_of("density"), Some(SlotRange { start: 0, end: 1 }));
//! assert_eq!(pack.range_of("tracer_3"), Some(SlotRange { start: 1, end: 2 }));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ashlar-core` | IDs, metadata flags, error types |
//! | [`mesh`] | `ashlar-mesh` | Blocks and index-space bounds |
//! | [`comm`] | `ashlar-comm` | Transport seam, neighbor topology, receive state |
//! | [`container`] | `ashlar-container` | Containers, packs, boundary tasks |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core identities, metadata, and error types (`ashlar-core`).
///
/// Contains [`types::VarId`], [`types::Metadata`] and its flags, and the
/// [`types::ContainerError`] taxonomy shared across the workspace.
pub use ashlar_core as types;

/// Mesh blocks and index-space bounds (`ashlar-mesh`).
///
/// [`mesh::MeshBlock`] is the unit of domain decomposition;
/// [`mesh::IndexShape`] answers every bounds and flat-index query.
pub use ashlar_mesh as mesh;

/// Boundary-exchange transport and per-cycle receive state (`ashlar-comm`).
///
/// The [`comm::Transport`] trait is the seam to the message-passing
/// system; [`comm::ChannelTransport`] is the in-process backend.
pub use ashlar_comm as comm;

/// Variable containers, selection, packs, and boundary tasks
/// (`ashlar-container`).
///
/// [`container::MeshBlockData`] is the central type: the per-block,
/// per-stage variable registry with cached packs and the boundary task
/// interface.
pub use ashlar_container as container;

/// Common imports for typical Ashlar usage.
///
/// ```rust
/// use ashlar::prelude::*;
/// ```
///
/// This imports the most frequently used types: blocks and bounds,
/// metadata, containers, selections, packs, and the communication
/// surface.
pub mod prelude {
    // Identities and metadata
    pub use ashlar_core::{BlockId, Metadata, Real, SparseId, VarId};

    // Errors
    pub use ashlar_core::{ContainerError, MetadataError};

    // Mesh
    pub use ashlar_mesh::{IndexDomain, IndexRange, IndexShape, MeshBlock};

    // Communication
    pub use ashlar_comm::{
        ChannelTransport, CommError, CommPhase, Face, Neighbor, NeighborLevel, TaskStatus,
        Transport,
    };

    // Containers and packs
    pub use ashlar_container::{
        DataCollection, MeshBlockData, PackIndexMap, SlotRange, VariableFluxPack, VariablePack,
        VarSelection,
    };
}

//! Boundary-exchange transport and per-cycle communication state.
//!
//! This crate is the seam between the container layer and the actual
//! message-passing transport. It defines the tri-state [`TaskStatus`]
//! consumed by the outer task scheduler, the [`Transport`] trait the
//! container issues sends and polls through, an in-process
//! [`ChannelTransport`] backend, and [`BoundaryData`], the per-cycle
//! receive-side state machine (arm, record, complete, clear).
//!
//! The protocol is cooperative and polling by design: sends never block,
//! receives are non-blocking polls, and an outer scheduler interleaves
//! physics work with repeated polls across many blocks until all reach
//! [`TaskStatus::Complete`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod error;
pub mod neighbor;
pub mod status;
pub mod transport;

pub use boundary::{BoundaryData, CommPhase, MessageKey};
pub use error::CommError;
pub use neighbor::{Face, Neighbor, NeighborLevel};
pub use status::TaskStatus;
pub use transport::{BoundaryMessage, ChannelTransport, MessageKind, Transport};

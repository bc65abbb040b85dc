//! The mesh block: a rectangular subdomain owning its variable containers.

use crate::domain::IndexShape;
use ashlar_core::BlockId;
use std::sync::Arc;

/// A rectangular subdomain of the adaptive grid.
///
/// Blocks are created by the mesh layer and handed out as
/// `Arc<MeshBlock>`. Containers hold only a `Weak` back-reference and
/// re-resolve it on every access, so a container outliving its block
/// fails with an explicit error instead of dereferencing stale memory.
#[derive(Debug)]
pub struct MeshBlock {
    id: BlockId,
    cellbounds: IndexShape,
}

impl MeshBlock {
    /// Create a block with the given id and cell bounds.
    pub fn new(id: BlockId, cellbounds: IndexShape) -> Arc<Self> {
        Arc::new(Self { id, cellbounds })
    }

    /// The block's mesh-wide id.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Index-space bounds of the block's cell grid.
    pub fn cellbounds(&self) -> &IndexShape {
        &self.cellbounds
    }
}

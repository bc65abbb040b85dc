//! Cell- and face-centered variables and their storage state.

use ashlar_core::{ContainerError, Metadata, Real, VarId};
use ashlar_mesh::{IndexDomain, IndexShape};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

const LOCK_POISONED: &str = "variable storage lock poisoned";

/// A named, cell-centered, multi-dimensional array scoped to one block's
/// index space.
///
/// Dense variables are allocated at construction. Sparse variables are
/// constructed unallocated and transition to allocated through
/// [`allocate`](Self::allocate); [`is_allocated`](Self::is_allocated) is
/// an O(1) query that never triggers allocation. Reads and writes
/// against unallocated storage fail with
/// [`ContainerError::Unallocated`] rather than silently succeeding.
///
/// Storage sits behind `RwLock` so that two containers sharing a
/// `OneCopy` variable through `Arc` observe each other's mutations.
/// Population follows a single-writer discipline; once a cycle's
/// population is complete, concurrent readers are fine.
#[derive(Debug)]
pub struct Variable {
    id: VarId,
    metadata: Metadata,
    shape: IndexShape,
    allocated: AtomicBool,
    data: RwLock<Vec<Real>>,
    coarse: RwLock<Vec<Real>>,
    fluxes: [RwLock<Vec<Real>>; 3],
}

impl Variable {
    /// Create a variable sized from the block's index-space bounds.
    /// Dense metadata allocates immediately; sparse metadata leaves the
    /// variable unallocated.
    pub fn new(id: VarId, metadata: Metadata, shape: IndexShape) -> Arc<Self> {
        let var = Self {
            id,
            metadata,
            shape,
            allocated: AtomicBool::new(false),
            data: RwLock::new(Vec::new()),
            coarse: RwLock::new(Vec::new()),
            fluxes: [
                RwLock::new(Vec::new()),
                RwLock::new(Vec::new()),
                RwLock::new(Vec::new()),
            ],
        };
        if !var.metadata.is_sparse() {
            var.allocate();
        }
        Arc::new(var)
    }

    /// The variable's composite identity.
    pub fn id(&self) -> &VarId {
        &self.id
    }

    /// The storage label.
    pub fn label(&self) -> String {
        self.id.label()
    }

    /// The variable's metadata descriptor.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The block index-space bounds this variable was sized from.
    pub fn shape(&self) -> &IndexShape {
        &self.shape
    }

    /// Lazily-allocated storage kind.
    pub fn is_sparse(&self) -> bool {
        self.metadata.is_sparse()
    }

    /// Whether storage is currently allocated. O(1), never allocates.
    pub fn is_allocated(&self) -> bool {
        self.allocated.load(Ordering::Acquire)
    }

    fn fine_len(&self) -> usize {
        self.metadata.components() * self.shape.ncells(IndexDomain::Entire)
    }

    fn coarse_len(&self) -> usize {
        self.metadata.components() * self.shape.coarse().ncells(IndexDomain::Entire)
    }

    fn flux_len(&self, dir: usize) -> usize {
        self.metadata.components() * self.shape.face_ncells(dir)
    }

    /// Transition storage from unallocated to allocated, provisioning
    /// the fine buffer, the coarse companion, and flux arrays when the
    /// metadata carries them. Idempotent: allocating an already
    /// allocated variable is a no-op.
    pub fn allocate(&self) {
        if self.is_allocated() {
            return;
        }
        self.data
            .write()
            .expect(LOCK_POISONED)
            .resize(self.fine_len(), 0.0);
        self.coarse
            .write()
            .expect(LOCK_POISONED)
            .resize(self.coarse_len(), 0.0);
        if self.metadata.has_fluxes() {
            for dir in 0..3 {
                self.fluxes[dir]
                    .write()
                    .expect(LOCK_POISONED)
                    .resize(self.flux_len(dir), 0.0);
            }
        }
        self.allocated.store(true, Ordering::Release);
    }

    fn check_allocated(&self) -> Result<(), ContainerError> {
        if self.is_allocated() {
            Ok(())
        } else {
            Err(ContainerError::Unallocated {
                label: self.label(),
            })
        }
    }

    /// Read access to the fine buffer.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Real>>, ContainerError> {
        self.check_allocated()?;
        Ok(self.data.read().expect(LOCK_POISONED))
    }

    /// Write access to the fine buffer.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Real>>, ContainerError> {
        self.check_allocated()?;
        Ok(self.data.write().expect(LOCK_POISONED))
    }

    /// Read access to the coarse companion buffer.
    pub fn coarse_read(&self) -> Result<RwLockReadGuard<'_, Vec<Real>>, ContainerError> {
        self.check_allocated()?;
        Ok(self.coarse.read().expect(LOCK_POISONED))
    }

    /// Write access to the coarse companion buffer.
    pub fn coarse_write(&self) -> Result<RwLockWriteGuard<'_, Vec<Real>>, ContainerError> {
        self.check_allocated()?;
        Ok(self.coarse.write().expect(LOCK_POISONED))
    }

    fn check_fluxes(&self) -> Result<(), ContainerError> {
        if !self.metadata.has_fluxes() {
            return Err(ContainerError::InvalidOperation {
                label: self.label(),
                reason: "variable carries no flux arrays".into(),
            });
        }
        self.check_allocated()
    }

    /// Read access to the flux buffer normal to `dir`.
    pub fn flux_read(
        &self,
        dir: usize,
    ) -> Result<RwLockReadGuard<'_, Vec<Real>>, ContainerError> {
        self.check_fluxes()?;
        Ok(self.fluxes[dir].read().expect(LOCK_POISONED))
    }

    /// Write access to the flux buffer normal to `dir`.
    pub fn flux_write(
        &self,
        dir: usize,
    ) -> Result<RwLockWriteGuard<'_, Vec<Real>>, ContainerError> {
        self.check_fluxes()?;
        Ok(self.fluxes[dir].write().expect(LOCK_POISONED))
    }

    /// A new variable with the same identity, metadata, and values but
    /// independent storage. Used when copying containers whose variables
    /// are not `OneCopy`.
    pub fn deep_copy(&self) -> Arc<Variable> {
        let copy = Self {
            id: self.id.clone(),
            metadata: self.metadata.clone(),
            shape: self.shape,
            allocated: AtomicBool::new(self.is_allocated()),
            data: RwLock::new(self.data.read().expect(LOCK_POISONED).clone()),
            coarse: RwLock::new(self.coarse.read().expect(LOCK_POISONED).clone()),
            fluxes: [
                RwLock::new(self.fluxes[0].read().expect(LOCK_POISONED).clone()),
                RwLock::new(self.fluxes[1].read().expect(LOCK_POISONED).clone()),
                RwLock::new(self.fluxes[2].read().expect(LOCK_POISONED).clone()),
            ],
        };
        Arc::new(copy)
    }
}

/// A face-centered variable: one buffer per direction, each with one
/// extra layer in its normal direction. Always allocated.
#[derive(Debug)]
pub struct FaceVariable {
    id: VarId,
    metadata: Metadata,
    shape: IndexShape,
    data: [RwLock<Vec<Real>>; 3],
}

impl FaceVariable {
    /// Create a face variable sized from the block's index-space bounds.
    pub fn new(id: VarId, metadata: Metadata, shape: IndexShape) -> Arc<Self> {
        let components = metadata.components();
        let buffer = |dir: usize| {
            RwLock::new(vec![0.0; components * shape.face_ncells(dir)])
        };
        Arc::new(Self {
            id,
            metadata,
            shape,
            data: [buffer(0), buffer(1), buffer(2)],
        })
    }

    /// The variable's composite identity.
    pub fn id(&self) -> &VarId {
        &self.id
    }

    /// The storage label.
    pub fn label(&self) -> String {
        self.id.label()
    }

    /// The variable's metadata descriptor.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The block index-space bounds this variable was sized from.
    pub fn shape(&self) -> &IndexShape {
        &self.shape
    }

    /// Read access to the buffer normal to `dir`.
    pub fn read(&self, dir: usize) -> RwLockReadGuard<'_, Vec<Real>> {
        self.data[dir].read().expect(LOCK_POISONED)
    }

    /// Write access to the buffer normal to `dir`.
    pub fn write(&self, dir: usize) -> RwLockWriteGuard<'_, Vec<Real>> {
        self.data[dir].write().expect(LOCK_POISONED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashlar_core::MetadataFlag::*;

    fn shape() -> IndexShape {
        IndexShape::new(4, 4, 1, 2)
    }

    fn dense() -> Metadata {
        Metadata::new(&[Cell, Independent, FillGhost]).unwrap()
    }

    fn sparse() -> Metadata {
        Metadata::new(&[Cell, Sparse]).unwrap()
    }

    #[test]
    fn dense_variable_is_allocated_at_construction() {
        let var = Variable::new(VarId::new("density"), dense(), shape());
        assert!(var.is_allocated());
        assert_eq!(var.read().unwrap().len(), 8 * 8);
    }

    #[test]
    fn sparse_variable_starts_unallocated() {
        let var = Variable::new(VarId::sparse("tracer", 3), sparse(), shape());
        assert!(!var.is_allocated());
        assert_eq!(
            var.read().unwrap_err(),
            ContainerError::Unallocated {
                label: "tracer_3".into()
            }
        );
    }

    #[test]
    fn allocate_is_idempotent() {
        let var = Variable::new(VarId::sparse("tracer", 3), sparse(), shape());
        var.allocate();
        assert!(var.is_allocated());
        var.write().unwrap()[0] = 7.0;

        // Second allocation must not wipe storage.
        var.allocate();
        assert_eq!(var.read().unwrap()[0], 7.0);
    }

    #[test]
    fn multi_component_storage_is_contiguous() {
        let meta = Metadata::with_components(&[Cell, Independent], 3).unwrap();
        let var = Variable::new(VarId::new("momentum"), meta, shape());
        assert_eq!(var.read().unwrap().len(), 3 * 64);
    }

    #[test]
    fn flux_buffers_only_with_fluxes_flag() {
        let var = Variable::new(VarId::new("density"), dense(), shape());
        assert!(matches!(
            var.flux_read(0),
            Err(ContainerError::InvalidOperation { .. })
        ));

        let meta = Metadata::new(&[Cell, Independent, WithFluxes]).unwrap();
        let var = Variable::new(VarId::new("energy"), meta, shape());
        assert_eq!(var.flux_read(0).unwrap().len(), shape().face_ncells(0));
    }

    #[test]
    fn deep_copy_is_independent() {
        let var = Variable::new(VarId::new("density"), dense(), shape());
        var.write().unwrap()[0] = 5.0;

        let copy = var.deep_copy();
        copy.write().unwrap()[0] = 9.0;

        assert_eq!(var.read().unwrap()[0], 5.0);
        assert_eq!(copy.read().unwrap()[0], 9.0);
    }

    #[test]
    fn deep_copy_preserves_unallocated_state() {
        let var = Variable::new(VarId::sparse("tracer", 1), sparse(), shape());
        let copy = var.deep_copy();
        assert!(!copy.is_allocated());
    }

    #[test]
    fn face_variable_buffers_sized_per_direction() {
        let meta = Metadata::new(&[Face, OneCopy]).unwrap();
        let var = FaceVariable::new(VarId::new("bfield"), meta, shape());
        assert_eq!(var.read(0).len(), shape().face_ncells(0));
        assert_eq!(var.read(1).len(), shape().face_ncells(1));
    }
}

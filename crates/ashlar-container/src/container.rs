//! The per-block, per-stage variable container.

use crate::boundary::BoundaryComm;
use crate::cache::{PackCache, PackKey};
use crate::pack::{VariableFluxPack, VariablePack};
use crate::selector::{resolve, ResolvedVars, VarSelection};
use crate::variable::{FaceVariable, Variable};
use ashlar_core::{ContainerError, Metadata, MetadataFlag, SparseId, VarId};
use ashlar_mesh::MeshBlock;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

/// The container for one mesh block's variables at one data stage.
///
/// Variables live in a label-keyed registry that preserves registration
/// order, so selections and pack layouts are deterministic across blocks
/// that registered the same fields in the same order. The container
/// holds only a weak back-reference to its block; operations that need
/// block geometry fail with [`ContainerError::ExpiredBlock`] once the
/// block is gone.
pub struct MeshBlockData {
    pub(crate) block: Weak<MeshBlock>,
    pub(crate) vars: IndexMap<String, Arc<Variable>>,
    pub(crate) faces: IndexMap<String, Arc<FaceVariable>>,
    pub(crate) cache: PackCache,
    pub(crate) comm: Option<BoundaryComm>,
}

impl MeshBlockData {
    /// An empty container attached to `block`.
    pub fn new(block: &Arc<MeshBlock>) -> Self {
        Self {
            block: Arc::downgrade(block),
            vars: IndexMap::new(),
            faces: IndexMap::new(),
            cache: PackCache::default(),
            comm: None,
        }
    }

    /// Resolve the parent block.
    pub fn block(&self) -> Result<Arc<MeshBlock>, ContainerError> {
        self.block.upgrade().ok_or(ContainerError::ExpiredBlock)
    }

    /// Register a dense variable under `base_name`, sized from the
    /// block's cell bounds. Cell metadata allocates immediately; face
    /// metadata creates a face-centered variable.
    pub fn add(
        &mut self,
        base_name: impl Into<String>,
        metadata: Metadata,
    ) -> Result<(), ContainerError> {
        let id = VarId::new(base_name);
        if metadata.is_sparse() {
            return Err(ContainerError::InvalidOperation {
                label: id.label(),
                reason: "sparse metadata must be registered through add_sparse".into(),
            });
        }
        self.add_impl(id, metadata)
    }

    /// Register an unallocated sparse variable `(base_name, sparse_id)`.
    pub fn add_sparse(
        &mut self,
        base_name: impl Into<String>,
        sparse_id: i64,
        metadata: Metadata,
    ) -> Result<(), ContainerError> {
        let id = VarId::sparse(base_name, sparse_id);
        if !metadata.is_sparse() {
            return Err(ContainerError::InvalidOperation {
                label: id.label(),
                reason: "add_sparse requires sparse metadata".into(),
            });
        }
        self.add_impl(id, metadata)
    }

    fn add_impl(&mut self, id: VarId, metadata: Metadata) -> Result<(), ContainerError> {
        let shape = *self.block()?.cellbounds();
        let label = id.label();
        if self.vars.contains_key(&label) || self.faces.contains_key(&label) {
            return Err(ContainerError::DuplicateLabel { label });
        }
        if metadata.is_cell() {
            self.vars.insert(label, Variable::new(id, metadata, shape));
        } else {
            self.faces
                .insert(label, FaceVariable::new(id, metadata, shape));
        }
        self.registry_changed();
        Ok(())
    }

    /// Insert an already-built cell variable, sharing its storage.
    pub fn add_var(&mut self, var: Arc<Variable>) -> Result<(), ContainerError> {
        let label = var.label();
        if self.vars.contains_key(&label) || self.faces.contains_key(&label) {
            return Err(ContainerError::DuplicateLabel { label });
        }
        self.vars.insert(label, var);
        self.registry_changed();
        Ok(())
    }

    /// Insert an already-built face variable, sharing its storage.
    pub fn add_face(&mut self, var: Arc<FaceVariable>) -> Result<(), ContainerError> {
        let label = var.label();
        if self.vars.contains_key(&label) || self.faces.contains_key(&label) {
            return Err(ContainerError::DuplicateLabel { label });
        }
        self.faces.insert(label, var);
        self.registry_changed();
        Ok(())
    }

    /// Remove the variable registered under `label`.
    pub fn remove(&mut self, label: &str) -> Result<(), ContainerError> {
        let removed = self.vars.shift_remove(label).is_some()
            || self.faces.shift_remove(label).is_some();
        if !removed {
            return Err(ContainerError::NotFound {
                label: label.into(),
                operation: "Remove",
            });
        }
        self.registry_changed();
        Ok(())
    }

    fn registry_changed(&mut self) {
        self.cache.clear();
        self.refresh_comm_vars();
    }

    /// Look up a cell variable by label.
    pub fn get(&self, label: &str) -> Result<&Arc<Variable>, ContainerError> {
        self.vars.get(label).ok_or_else(|| ContainerError::NotFound {
            label: label.into(),
            operation: "Get",
        })
    }

    /// Look up a cell variable by registry position. Positions follow
    /// registration order, so they are stable across blocks that
    /// registered the same fields in the same order.
    pub fn get_index(&self, index: usize) -> Result<&Arc<Variable>, ContainerError> {
        self.vars
            .get_index(index)
            .map(|(_, var)| var)
            .ok_or_else(|| ContainerError::NotFound {
                label: format!("index {index}"),
                operation: "GetIndex",
            })
    }

    /// The registry position of the cell variable under `label`.
    pub fn index_of(&self, label: &str) -> Result<usize, ContainerError> {
        self.vars
            .get_index_of(label)
            .ok_or_else(|| ContainerError::NotFound {
                label: label.into(),
                operation: "IndexOf",
            })
    }

    /// Look up a face variable by label.
    pub fn get_face(&self, label: &str) -> Result<&Arc<FaceVariable>, ContainerError> {
        self.faces
            .get(label)
            .ok_or_else(|| ContainerError::NotFound {
                label: label.into(),
                operation: "GetFace",
            })
    }

    /// Whether a variable (cell or face) is registered under `label`.
    pub fn contains(&self, label: &str) -> bool {
        self.vars.contains_key(label) || self.faces.contains_key(label)
    }

    /// Whether every listed label is registered.
    pub fn contains_all<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        labels.iter().all(|l| self.contains(l.as_ref()))
    }

    /// Labels of the registered cell variables, in registration order.
    pub fn var_labels(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Labels of the registered face variables, in registration order.
    pub fn face_labels(&self) -> impl Iterator<Item = &str> {
        self.faces.keys().map(String::as_str)
    }

    /// Number of registered variables, cell and face together.
    pub fn len(&self) -> usize {
        self.vars.len() + self.faces.len()
    }

    /// Whether the container holds no variables.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.faces.is_empty()
    }

    /// Whether the variable under `label` has allocated storage. Unknown
    /// labels report `false`; face variables are always allocated.
    pub fn is_allocated(&self, label: &str) -> bool {
        if let Some(var) = self.vars.get(label) {
            return var.is_allocated();
        }
        self.faces.contains_key(label)
    }

    /// Allocation query addressed by sparse identity.
    pub fn is_allocated_sparse(&self, base_name: &str, sparse_id: i64) -> bool {
        self.is_allocated(&VarId::sparse(base_name, sparse_id).label())
    }

    /// Allocate storage for the sparse variable under `label`.
    /// Idempotent; dense variables are rejected.
    pub fn allocate_sparse(&self, label: &str) -> Result<(), ContainerError> {
        let var = self.vars.get(label).ok_or_else(|| ContainerError::NotFound {
            label: label.into(),
            operation: "AllocateSparse",
        })?;
        if !var.is_sparse() {
            return Err(ContainerError::InvalidOperation {
                label: label.into(),
                reason: "variable is dense, storage is always allocated".into(),
            });
        }
        var.allocate();
        Ok(())
    }

    /// Allocate a sparse variable addressed by `(base_name, sparse_id)`.
    pub fn allocate_sparse_id(
        &self,
        base_name: &str,
        sparse_id: i64,
    ) -> Result<(), ContainerError> {
        self.allocate_sparse(&VarId::sparse(base_name, sparse_id).label())
    }

    /// A new container with the same registry as `src`: variables marked
    /// `OneCopy` share storage with the source, all others are deep
    /// copies. Face variables must be `OneCopy`.
    pub fn copy_from(src: &MeshBlockData) -> Result<Self, ContainerError> {
        let mut dst = Self {
            block: src.block.clone(),
            vars: IndexMap::new(),
            faces: IndexMap::new(),
            cache: PackCache::default(),
            comm: None,
        };
        for (label, var) in &src.vars {
            let copied = if var.metadata().is_one_copy() {
                Arc::clone(var)
            } else {
                var.deep_copy()
            };
            dst.vars.insert(label.clone(), copied);
        }
        for (label, face) in &src.faces {
            if !face.metadata().is_one_copy() {
                return Err(ContainerError::InvalidOperation {
                    label: label.clone(),
                    reason: "face variables must be OneCopy to copy a container".into(),
                });
            }
            dst.faces.insert(label.clone(), Arc::clone(face));
        }
        Ok(dst)
    }

    /// A new container holding only the named cell variables of `src`,
    /// under the same sharing rules as [`copy_from`](Self::copy_from).
    /// Names match a full label or a sparse base name; a name matching
    /// nothing fails the copy.
    pub fn copy_names<S: AsRef<str>>(
        src: &MeshBlockData,
        names: &[S],
    ) -> Result<Self, ContainerError> {
        let mut dst = Self {
            block: src.block.clone(),
            vars: IndexMap::new(),
            faces: IndexMap::new(),
            cache: PackCache::default(),
            comm: None,
        };
        for name in names {
            let name = name.as_ref();
            let mut matched = false;
            for (label, var) in &src.vars {
                if label == name || (var.id().is_sparse() && var.id().base_name == name) {
                    let copied = if var.metadata().is_one_copy() {
                        Arc::clone(var)
                    } else {
                        var.deep_copy()
                    };
                    dst.vars.insert(label.clone(), copied);
                    matched = true;
                }
            }
            if !matched {
                return Err(ContainerError::NotFound {
                    label: name.into(),
                    operation: "Copy",
                });
            }
        }
        Ok(dst)
    }

    /// A new container holding the variables of `src` that carry at
    /// least one of `flags`, under the same sharing rules as
    /// [`copy_from`](Self::copy_from). Face variables matching the
    /// predicate must be `OneCopy`. A predicate matching nothing yields
    /// an empty container, not an error.
    pub fn copy_flags(
        src: &MeshBlockData,
        flags: &[MetadataFlag],
    ) -> Result<Self, ContainerError> {
        let mut dst = Self {
            block: src.block.clone(),
            vars: IndexMap::new(),
            faces: IndexMap::new(),
            cache: PackCache::default(),
            comm: None,
        };
        for (label, var) in &src.vars {
            if !var.metadata().matches_any(flags) {
                continue;
            }
            let copied = if var.metadata().is_one_copy() {
                Arc::clone(var)
            } else {
                var.deep_copy()
            };
            dst.vars.insert(label.clone(), copied);
        }
        for (label, face) in &src.faces {
            if !face.metadata().matches_any(flags) {
                continue;
            }
            if !face.metadata().is_one_copy() {
                return Err(ContainerError::InvalidOperation {
                    label: label.clone(),
                    reason: "face variables must be OneCopy to copy a container".into(),
                });
            }
            dst.faces.insert(label.clone(), Arc::clone(face));
        }
        Ok(dst)
    }

    /// A view of this container restricted to one sparse id: every dense
    /// cell variable, the sparse variables carrying `sparse_id`, and all
    /// face variables. Storage is shared, not copied.
    pub fn sparse_slice(&self, sparse_id: i64) -> Self {
        let vars = self
            .vars
            .iter()
            .filter(|(_, v)| !v.id().is_sparse() || v.id().sparse_id == SparseId(sparse_id))
            .map(|(label, v)| (label.clone(), Arc::clone(v)))
            .collect();
        Self {
            block: self.block.clone(),
            vars,
            faces: self
                .faces
                .iter()
                .map(|(label, f)| (label.clone(), Arc::clone(f)))
                .collect(),
            cache: PackCache::default(),
            comm: None,
        }
    }

    fn resolved_key(
        resolved: &ResolvedVars,
        sparse_ids: &[SparseId],
        coarse: bool,
        flux_labels: Option<Vec<String>>,
    ) -> (PackKey, Vec<bool>) {
        let mut ids: Vec<i64> = sparse_ids.iter().map(|s| s.0).collect();
        ids.sort_unstable();
        let key = PackKey {
            labels: resolved.iter().map(|v| v.label()).collect(),
            sparse_ids: ids,
            coarse,
            flux_labels,
        };
        let snapshot = resolved.iter().map(|v| v.is_allocated()).collect();
        (key, snapshot)
    }

    /// Resolve a selection into a cached [`VariablePack`] over the fine
    /// buffers.
    ///
    /// Identical requests return the same pack until the registry or the
    /// allocation state of a member changes, at which point the pack is
    /// rebuilt transparently. An empty `sparse_ids` filter includes
    /// every sparse id.
    pub fn pack_variables(
        &mut self,
        selection: &VarSelection,
        sparse_ids: &[SparseId],
    ) -> Arc<VariablePack> {
        self.pack_impl(selection, sparse_ids, false)
    }

    /// Like [`pack_variables`](Self::pack_variables), but over the
    /// coarse companion buffers.
    pub fn pack_variables_coarse(
        &mut self,
        selection: &VarSelection,
        sparse_ids: &[SparseId],
    ) -> Arc<VariablePack> {
        self.pack_impl(selection, sparse_ids, true)
    }

    fn pack_impl(
        &mut self,
        selection: &VarSelection,
        sparse_ids: &[SparseId],
        coarse: bool,
    ) -> Arc<VariablePack> {
        let resolved = resolve(&self.vars, selection, sparse_ids);
        let (key, snapshot) = Self::resolved_key(&resolved, sparse_ids, coarse, None);
        self.cache
            .get_or_build(key, snapshot, || VariablePack::build(&resolved, coarse))
    }

    /// Resolve paired name lists into a cached [`VariableFluxPack`]:
    /// values from `var_names`, flux arrays from `flux_names`. The lists
    /// must be equally long and every flux name must resolve to
    /// flux-carrying variables.
    pub fn pack_variables_and_fluxes<S: AsRef<str>, F: AsRef<str>>(
        &mut self,
        var_names: &[S],
        flux_names: &[F],
        sparse_ids: &[SparseId],
    ) -> Result<Arc<VariableFluxPack>, ContainerError> {
        if var_names.len() != flux_names.len() {
            return Err(ContainerError::MismatchedFluxNames {
                vars: var_names.len(),
                fluxes: flux_names.len(),
            });
        }
        let var_sel = VarSelection::names(var_names.iter().map(AsRef::as_ref));
        let flux_sel = VarSelection::names(flux_names.iter().map(AsRef::as_ref));
        let resolved = resolve(&self.vars, &var_sel, sparse_ids);
        let flux_resolved = resolve(&self.vars, &flux_sel, sparse_ids);
        for var in &flux_resolved {
            if !var.metadata().has_fluxes() {
                return Err(ContainerError::InvalidOperation {
                    label: var.label(),
                    reason: "variable carries no flux arrays".into(),
                });
            }
        }

        let flux_labels: Vec<String> = flux_resolved.iter().map(|v| v.label()).collect();
        let (key, mut snapshot) =
            Self::resolved_key(&resolved, sparse_ids, false, Some(flux_labels));
        snapshot.extend(flux_resolved.iter().map(|v| v.is_allocated()));
        Ok(self.cache.get_or_build_flux(key, snapshot, || {
            VariableFluxPack::build(&resolved, &flux_resolved)
        }))
    }

    /// Resolve a flag predicate into a cached [`VariableFluxPack`]:
    /// values are the matching variables, flux arrays come from the
    /// flux-carrying members of the same selection.
    pub fn pack_variables_and_fluxes_flags(
        &mut self,
        flags: &[MetadataFlag],
        sparse_ids: &[SparseId],
    ) -> Arc<VariableFluxPack> {
        let selection = VarSelection::Flags(flags.to_vec());
        let resolved = resolve(&self.vars, &selection, sparse_ids);
        let flux_resolved: ResolvedVars = resolved
            .iter()
            .filter(|v| v.metadata().has_fluxes())
            .cloned()
            .collect();

        let flux_labels: Vec<String> = flux_resolved.iter().map(|v| v.label()).collect();
        let (key, mut snapshot) =
            Self::resolved_key(&resolved, sparse_ids, false, Some(flux_labels));
        snapshot.extend(flux_resolved.iter().map(|v| v.is_allocated()));
        self.cache.get_or_build_flux(key, snapshot, || {
            VariableFluxPack::build(&resolved, &flux_resolved)
        })
    }
}

/// Containers are equal when they hold the same set of labels. Values
/// are not compared; two stages of the same block are "equal" in the
/// sense that one can be copied onto the other.
impl PartialEq for MeshBlockData {
    fn eq(&self, other: &Self) -> bool {
        let labels = |c: &MeshBlockData| -> (BTreeSet<String>, BTreeSet<String>) {
            (
                c.vars.keys().cloned().collect(),
                c.faces.keys().cloned().collect(),
            )
        };
        labels(self) == labels(other)
    }
}

impl std::fmt::Debug for MeshBlockData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshBlockData")
            .field("block", &self.block.upgrade().map(|b| b.id()))
            .field("vars", &self.vars.keys().collect::<Vec<_>>())
            .field("faces", &self.faces.keys().collect::<Vec<_>>())
            .field("comm", &self.comm.is_some())
            .finish()
    }
}

//! Named stages of container data for one block.

use crate::container::MeshBlockData;
use ashlar_core::ContainerError;
use ashlar_mesh::MeshBlock;
use indexmap::IndexMap;
use std::sync::Arc;

/// A label-keyed set of [`MeshBlockData`] stages, e.g. `"base"`,
/// `"dUdt"`, and the intermediate stages of a multi-stage integrator.
///
/// Stages added through [`add_copy`](Self::add_copy) follow the
/// container copy rules: `OneCopy` variables are shared across every
/// stage, all others get independent storage per stage.
#[derive(Debug, Default)]
pub struct DataCollection {
    stages: IndexMap<String, MeshBlockData>,
}

impl DataCollection {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty stage attached to `block`.
    pub fn add(
        &mut self,
        label: impl Into<String>,
        block: &Arc<MeshBlock>,
    ) -> Result<&mut MeshBlockData, ContainerError> {
        let label = label.into();
        if self.stages.contains_key(&label) {
            return Err(ContainerError::DuplicateLabel { label });
        }
        Ok(self
            .stages
            .entry(label)
            .or_insert_with(|| MeshBlockData::new(block)))
    }

    /// Add a stage copied from an existing one.
    pub fn add_copy(
        &mut self,
        label: impl Into<String>,
        src_label: &str,
    ) -> Result<&mut MeshBlockData, ContainerError> {
        let label = label.into();
        if self.stages.contains_key(&label) {
            return Err(ContainerError::DuplicateLabel { label });
        }
        let src = self.get(src_label)?;
        let copy = MeshBlockData::copy_from(src)?;
        Ok(self.stages.entry(label).or_insert(copy))
    }

    /// Look up a stage by label.
    pub fn get(&self, label: &str) -> Result<&MeshBlockData, ContainerError> {
        self.stages
            .get(label)
            .ok_or_else(|| ContainerError::NotFound {
                label: label.into(),
                operation: "GetStage",
            })
    }

    /// Mutable lookup of a stage by label.
    pub fn get_mut(&mut self, label: &str) -> Result<&mut MeshBlockData, ContainerError> {
        self.stages
            .get_mut(label)
            .ok_or_else(|| ContainerError::NotFound {
                label: label.into(),
                operation: "GetStage",
            })
    }

    /// Whether a stage exists under `label`.
    pub fn contains(&self, label: &str) -> bool {
        self.stages.contains_key(label)
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the collection holds no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage labels, in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.stages.keys().map(String::as_str)
    }
}

//! Flat, slot-indexed views over a resolved set of variables.
//!
//! A pack assigns one slot per (variable, component) pair, in resolution
//! order, and records the half-open slot range each label occupies.
//! Kernels iterate slots without knowing which variables are behind
//! them; the index map answers "where did `density` land" once per pack
//! build instead of once per cell.

use crate::selector::ResolvedVars;
use crate::variable::Variable;
use ashlar_core::{ContainerError, Real};
use indexmap::IndexMap;
use std::sync::{Arc, RwLockReadGuard, RwLockWriteGuard};

/// A half-open `[start, end)` range of pack slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRange {
    /// First slot of the range.
    pub start: usize,
    /// One past the last slot of the range.
    pub end: usize,
}

impl SlotRange {
    /// Number of slots in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range covers no slots.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Label to slot-range lookup for one pack, in slot order.
pub type PackIndexMap = IndexMap<String, SlotRange>;

/// A slot-indexed view over cell variables.
///
/// Slot `s` maps to component `c` of variable `v`; the mapping is fixed
/// at build time. Unallocated sparse members occupy slots like any
/// other variable, but touching their storage through
/// [`read`](Self::read) or [`write`](Self::write) fails with
/// [`ContainerError::Unallocated`].
#[derive(Clone, Debug)]
pub struct VariablePack {
    slots: Vec<(Arc<Variable>, usize)>,
    index: PackIndexMap,
    coarse: bool,
}

impl VariablePack {
    pub(crate) fn build(vars: &ResolvedVars, coarse: bool) -> Self {
        let mut slots = Vec::new();
        let mut index = PackIndexMap::new();
        for var in vars {
            let start = slots.len();
            for component in 0..var.metadata().components() {
                slots.push((Arc::clone(var), component));
            }
            index.insert(
                var.label(),
                SlotRange {
                    start,
                    end: slots.len(),
                },
            );
        }
        Self {
            slots,
            index,
            coarse,
        }
    }

    /// Number of slots in the pack.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pack has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The variable behind a slot.
    pub fn var(&self, slot: usize) -> &Arc<Variable> {
        &self.slots[slot].0
    }

    /// The component of its variable a slot refers to.
    pub fn component(&self, slot: usize) -> usize {
        self.slots[slot].1
    }

    /// Whether this pack reads the coarse companion buffers.
    pub fn is_coarse(&self) -> bool {
        self.coarse
    }

    /// Read access to the buffer behind a slot. Coarse packs route to
    /// the coarse companion buffer.
    pub fn read(&self, slot: usize) -> Result<RwLockReadGuard<'_, Vec<Real>>, ContainerError> {
        let (var, _) = &self.slots[slot];
        if self.coarse {
            var.coarse_read()
        } else {
            var.read()
        }
    }

    /// Write access to the buffer behind a slot. Coarse packs route to
    /// the coarse companion buffer.
    pub fn write(&self, slot: usize) -> Result<RwLockWriteGuard<'_, Vec<Real>>, ContainerError> {
        let (var, _) = &self.slots[slot];
        if self.coarse {
            var.coarse_write()
        } else {
            var.write()
        }
    }

    /// The slot range a label occupies, if the label is in the pack.
    pub fn range_of(&self, label: &str) -> Option<SlotRange> {
        self.index.get(label).copied()
    }

    /// The full label to slot-range map, in slot order.
    pub fn index_map(&self) -> &PackIndexMap {
        &self.index
    }
}

/// A [`VariablePack`] paired with the flux arrays of a second, equally
/// long list of flux-carrying variables. Slot `s` of the value pack
/// corresponds to slot `s` of the flux list.
#[derive(Clone, Debug)]
pub struct VariableFluxPack {
    pack: VariablePack,
    flux_slots: Vec<(Arc<Variable>, usize)>,
    flux_index: PackIndexMap,
}

impl VariableFluxPack {
    pub(crate) fn build(vars: &ResolvedVars, flux_vars: &ResolvedVars) -> Self {
        let pack = VariablePack::build(vars, false);
        let mut flux_slots = Vec::new();
        let mut flux_index = PackIndexMap::new();
        for var in flux_vars {
            let start = flux_slots.len();
            for component in 0..var.metadata().components() {
                flux_slots.push((Arc::clone(var), component));
            }
            flux_index.insert(
                var.label(),
                SlotRange {
                    start,
                    end: flux_slots.len(),
                },
            );
        }
        Self {
            pack,
            flux_slots,
            flux_index,
        }
    }

    /// The value-side pack.
    pub fn vars(&self) -> &VariablePack {
        &self.pack
    }

    /// Number of flux slots.
    pub fn flux_len(&self) -> usize {
        self.flux_slots.len()
    }

    /// The flux-carrying variable behind a flux slot.
    pub fn flux_var(&self, slot: usize) -> &Arc<Variable> {
        &self.flux_slots[slot].0
    }

    /// Read access to the flux buffer normal to `dir` behind a flux
    /// slot.
    pub fn flux_read(
        &self,
        slot: usize,
        dir: usize,
    ) -> Result<RwLockReadGuard<'_, Vec<Real>>, ContainerError> {
        self.flux_slots[slot].0.flux_read(dir)
    }

    /// Write access to the flux buffer normal to `dir` behind a flux
    /// slot.
    pub fn flux_write(
        &self,
        slot: usize,
        dir: usize,
    ) -> Result<RwLockWriteGuard<'_, Vec<Real>>, ContainerError> {
        self.flux_slots[slot].0.flux_write(dir)
    }

    /// The flux slot range a label occupies, if present.
    pub fn flux_range_of(&self, label: &str) -> Option<SlotRange> {
        self.flux_index.get(label).copied()
    }
}

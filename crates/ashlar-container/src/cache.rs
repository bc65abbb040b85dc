//! Pack caching keyed by request shape and allocation state.
//!
//! Building a pack walks the registry and allocates slot tables, so
//! repeated identical requests within a cycle reuse the cached pack.
//! A cached entry is only valid while the allocation state of its
//! members is unchanged; sparse allocation between requests forces a
//! transparent rebuild. Registry mutation clears the cache wholesale.

use crate::pack::{VariableFluxPack, VariablePack};
use indexmap::IndexMap;
use log::trace;
use std::sync::Arc;

/// The normalized shape of a pack request.
///
/// Labels are the resolved member labels (registration order), so two
/// requests that resolve to the same variables share an entry even if
/// they were phrased differently.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PackKey {
    pub labels: Vec<String>,
    pub sparse_ids: Vec<i64>,
    pub coarse: bool,
    pub flux_labels: Option<Vec<String>>,
}

struct PackEntry {
    pack: Arc<VariablePack>,
    snapshot: Vec<bool>,
}

struct FluxPackEntry {
    pack: Arc<VariableFluxPack>,
    snapshot: Vec<bool>,
}

/// Per-container cache of built packs.
#[derive(Default)]
pub(crate) struct PackCache {
    packs: IndexMap<PackKey, PackEntry>,
    flux_packs: IndexMap<PackKey, FluxPackEntry>,
}

impl PackCache {
    /// Return the cached pack for `key` if its members' allocation
    /// snapshot still matches, otherwise build, cache, and return a
    /// fresh one.
    pub(crate) fn get_or_build(
        &mut self,
        key: PackKey,
        snapshot: Vec<bool>,
        build: impl FnOnce() -> VariablePack,
    ) -> Arc<VariablePack> {
        if let Some(entry) = self.packs.get(&key) {
            if entry.snapshot == snapshot {
                return Arc::clone(&entry.pack);
            }
            trace!("pack cache entry stale, rebuilding: {:?}", key.labels);
        }
        let pack = Arc::new(build());
        self.packs.insert(
            key,
            PackEntry {
                pack: Arc::clone(&pack),
                snapshot,
            },
        );
        pack
    }

    /// Flux-pack variant of [`get_or_build`](Self::get_or_build).
    pub(crate) fn get_or_build_flux(
        &mut self,
        key: PackKey,
        snapshot: Vec<bool>,
        build: impl FnOnce() -> VariableFluxPack,
    ) -> Arc<VariableFluxPack> {
        if let Some(entry) = self.flux_packs.get(&key) {
            if entry.snapshot == snapshot {
                return Arc::clone(&entry.pack);
            }
            trace!("flux pack cache entry stale, rebuilding: {:?}", key.labels);
        }
        let pack = Arc::new(build());
        self.flux_packs.insert(
            key,
            FluxPackEntry {
                pack: Arc::clone(&pack),
                snapshot,
            },
        );
        pack
    }

    /// Drop every cached pack. Called when the registry changes shape.
    pub(crate) fn clear(&mut self) {
        self.packs.clear();
        self.flux_packs.clear();
    }
}

impl std::fmt::Debug for PackCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackCache")
            .field("packs", &self.packs.len())
            .field("flux_packs", &self.flux_packs.len())
            .finish()
    }
}

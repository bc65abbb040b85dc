//! Selection-request resolution.
//!
//! A selection names a subset of a container's cell variables, either
//! explicitly (a name list) or by attribute predicate (a flag list).
//! Resolution walks the registry in registration order, so pack layout
//! is deterministic across identical schedules regardless of the order
//! names appear in a request.

use crate::variable::Variable;
use ashlar_core::{MetadataFlag, SparseId};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// An application-level selection request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VarSelection {
    /// Every cell variable in the container.
    All,
    /// Variables named explicitly, by full label or (for sparse
    /// variables) by base name.
    Names(Vec<String>),
    /// Variables carrying at least one of the given flags. An empty
    /// list matches everything.
    Flags(Vec<MetadataFlag>),
}

impl VarSelection {
    /// Convenience constructor from string-ish names.
    pub fn names<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::Names(names.into_iter().map(Into::into).collect())
    }
}

/// Resolved variable handles, in registration order.
pub(crate) type ResolvedVars = SmallVec<[Arc<Variable>; 8]>;

/// Resolve a selection against the registry.
///
/// A variable is included if it is dense and matches the request, or it
/// is sparse, matches the request, and its id passes `sparse_ids`. An
/// empty `sparse_ids` filter includes every sparse id.
pub(crate) fn resolve(
    vars: &IndexMap<String, Arc<Variable>>,
    selection: &VarSelection,
    sparse_ids: &[SparseId],
) -> ResolvedVars {
    vars.values()
        .filter(|v| matches_selection(v, selection))
        .filter(|v| passes_sparse_filter(v, sparse_ids))
        .cloned()
        .collect()
}

fn matches_selection(var: &Arc<Variable>, selection: &VarSelection) -> bool {
    match selection {
        VarSelection::All => true,
        VarSelection::Names(names) => {
            let label = var.label();
            names
                .iter()
                .any(|n| *n == label || (var.id().is_sparse() && *n == var.id().base_name))
        }
        VarSelection::Flags(flags) => var.metadata().matches_any(flags),
    }
}

fn passes_sparse_filter(var: &Arc<Variable>, sparse_ids: &[SparseId]) -> bool {
    !var.id().is_sparse() || sparse_ids.is_empty() || sparse_ids.contains(&var.id().sparse_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ashlar_core::MetadataFlag::*;
    use ashlar_core::{Metadata, VarId};
    use ashlar_mesh::IndexShape;

    fn registry() -> IndexMap<String, Arc<Variable>> {
        let shape = IndexShape::new(4, 1, 1, 2);
        let dense = Metadata::new(&[Cell, Independent]).unwrap();
        let derived = Metadata::new(&[Cell, Derived]).unwrap();
        let sparse = Metadata::new(&[Cell, Sparse]).unwrap();

        let mut vars = IndexMap::new();
        for var in [
            Variable::new(VarId::new("density"), dense.clone(), shape),
            Variable::new(VarId::new("pressure"), derived, shape),
            Variable::new(VarId::sparse("tracer", 1), sparse.clone(), shape),
            Variable::new(VarId::sparse("tracer", 3), sparse, shape),
        ] {
            vars.insert(var.label(), var);
        }
        vars
    }

    fn labels(resolved: &ResolvedVars) -> Vec<String> {
        resolved.iter().map(|v| v.label()).collect()
    }

    #[test]
    fn all_selects_in_registration_order() {
        let vars = registry();
        let resolved = resolve(&vars, &VarSelection::All, &[]);
        assert_eq!(
            labels(&resolved),
            vec!["density", "pressure", "tracer_1", "tracer_3"]
        );
    }

    #[test]
    fn order_is_registration_not_request() {
        let vars = registry();
        let sel = VarSelection::names(["tracer_1", "density"]);
        let resolved = resolve(&vars, &sel, &[]);
        assert_eq!(labels(&resolved), vec!["density", "tracer_1"]);
    }

    #[test]
    fn base_name_expands_to_all_sparse_ids() {
        let vars = registry();
        let sel = VarSelection::names(["tracer"]);
        let resolved = resolve(&vars, &sel, &[]);
        assert_eq!(labels(&resolved), vec!["tracer_1", "tracer_3"]);
    }

    #[test]
    fn empty_sparse_filter_means_all_ids() {
        // Fixed contract: an empty filter set includes every sparse id.
        let vars = registry();
        let resolved = resolve(&vars, &VarSelection::All, &[]);
        assert_eq!(resolved.len(), 4);
    }

    #[test]
    fn sparse_filter_restricts_sparse_only() {
        let vars = registry();
        let resolved = resolve(&vars, &VarSelection::All, &[SparseId(3)]);
        // Dense variables always pass; only tracer_3 of the sparse pair.
        assert_eq!(
            labels(&resolved),
            vec!["density", "pressure", "tracer_3"]
        );
    }

    #[test]
    fn flags_match_any_of() {
        let vars = registry();
        let resolved = resolve(&vars, &VarSelection::Flags(vec![Independent, Derived]), &[]);
        assert_eq!(labels(&resolved), vec!["density", "pressure"]);
    }

    #[test]
    fn unmatched_predicate_resolves_empty() {
        let vars = registry();
        let resolved = resolve(&vars, &VarSelection::Flags(vec![WithFluxes]), &[]);
        assert!(resolved.is_empty());
    }

    #[test]
    fn unknown_names_are_skipped() {
        let vars = registry();
        let sel = VarSelection::names(["density", "no_such_field"]);
        let resolved = resolve(&vars, &sel, &[]);
        assert_eq!(labels(&resolved), vec!["density"]);
    }
}

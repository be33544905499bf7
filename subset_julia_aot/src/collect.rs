//! Reachable-definition collection over the method-table universe.
//!
//! Walks every method table owned by the requested scope, in table order,
//! and gathers the raw material the work-list builder merges: compilable
//! method definitions, forced entry points, foreign-callable aliases, and
//! already-materialized specializations with their most relevant
//! compiled-code record. The universe is read-only throughout.

use crate::method_table::{CompiledArtifact, Method, MethodTable, Specialization, Universe};

/// What part of the universe a packaging pass covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectScope {
    /// Every reachable method table.
    WholeProgram,
    /// Only tables owned by these modules, in the given order. Used by
    /// incremental packaging, where the scope is the init-order work list.
    Modules(Vec<String>),
}

/// One already-materialized specialization discovered during traversal,
/// paired with its most relevant compiled-code record if any exists.
#[derive(Debug, Clone)]
pub struct FoundSpecialization<'a> {
    pub method: &'a Method,
    pub spec: &'a Specialization,
    pub artifact: Option<&'a CompiledArtifact>,
}

/// Everything the collector found, in deterministic traversal order.
#[derive(Debug, Default)]
pub struct Collected<'a> {
    /// Methods with a normal (non-generated) body; candidates for
    /// signature enumeration and generic compilation.
    pub methods: Vec<&'a Method>,
    /// Initializers and foreign-callable exports whose declared signature
    /// is a concrete dispatch tuple. Their direct specialization is always
    /// emitted; their existing specializations are not scanned separately.
    pub entry_points: Vec<&'a Method>,
    /// Foreign-callable exports whose alias must be re-exported.
    pub reexports: Vec<&'a Method>,
    /// Existing specializations of every non-entry-point method.
    pub specializations: Vec<FoundSpecialization<'a>>,
}

/// Traverse `scope` and gather all packaging inputs.
pub fn collect<'a>(universe: &'a dyn Universe, scope: &CollectScope) -> Collected<'a> {
    let tables: Vec<&MethodTable> = match scope {
        CollectScope::WholeProgram => universe.reachable_tables(),
        CollectScope::Modules(modules) => modules
            .iter()
            .flat_map(|m| universe.tables_in_module(m))
            .collect(),
    };

    let mut collected = Collected::default();
    for table in tables {
        for method in &table.methods {
            if (method.is_init || method.is_ccallable) && method.has_concrete_dispatch_sig() {
                // Entry points required by the hosting program: always
                // specialized and compiled, no policy test.
                collected.entry_points.push(method);
            } else {
                for spec in &method.specializations {
                    collected.specializations.push(FoundSpecialization {
                        method,
                        spec,
                        artifact: spec.best_artifact(),
                    });
                }
            }
            if method.is_ccallable {
                collected.reexports.push(method);
            }
            if method.has_source {
                collected.methods.push(method);
            }
        }
    }
    collected
}

//! Work-list assembly: the ordered compile/emit targets handed to the
//! code generator.
//!
//! Merge order (collection order within each phase, never semantic
//! priority):
//!
//! 1. Forced entry-point specializations and foreign-callable re-exports.
//! 2. Direct specializations of methods whose declared signature is
//!    already a concrete dispatch tuple.
//! 3. In full-coverage mode, every enumerated leaf candidate of the
//!    remaining methods, plus one unconditional unspecialized fallback per
//!    method so uncovered argument shapes still have a correct entry.
//! 4. Existing specializations that pass the inclusion policy.
//!
//! The builder performs no explicit deduplication; the code generator is
//! the idempotence boundary for duplicate signatures.

use serde::{Deserialize, Serialize};

use crate::collect::Collected;
use crate::enumerate::enumerate_leaf_signatures;
use crate::method_table::Method;
use crate::policy::{forces_entry_point, should_emit};
use crate::types::Signature;

/// One specialization to compile into the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileTarget {
    /// Defining module of the method.
    pub module: String,
    /// Method name.
    pub method: String,
    /// Argument signature to compile for. For an unspecialized fallback
    /// this is the declared (generic) signature.
    pub sig: Signature,
    /// True for the fully generic fallback body that covers argument
    /// shapes no leaf candidate matches.
    pub unspecialized: bool,
}

/// One entry of the work-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkItem {
    /// A specialization to compile.
    Compile(CompileTarget),
    /// An opaque foreign-callable alias to re-export under its C name.
    Reexport { module: String, method: String },
}

/// Ordered sequence of compile/emit targets for one packaging pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkList {
    pub items: Vec<WorkItem>,
}

impl WorkList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate only the compile targets, skipping re-export aliases.
    pub fn compile_targets(&self) -> impl Iterator<Item = &CompileTarget> {
        self.items.iter().filter_map(|item| match item {
            WorkItem::Compile(target) => Some(target),
            WorkItem::Reexport { .. } => None,
        })
    }
}

/// Options controlling work-list assembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorklistOptions {
    /// Compile every reachable definition, not just what the run touched:
    /// enumerate leaf candidates for generic methods and add unspecialized
    /// fallbacks.
    pub full_coverage: bool,
}

fn direct_target(method: &Method, sig: Signature, unspecialized: bool) -> WorkItem {
    WorkItem::Compile(CompileTarget {
        module: method.module.clone(),
        method: method.name.clone(),
        sig,
        unspecialized,
    })
}

/// Merge collector output into the final ordered work-list.
pub fn build_worklist(collected: &Collected<'_>, options: &WorklistOptions) -> WorkList {
    let mut items = Vec::new();

    // Phase 1: entry points the hosting program requires, plus the
    // foreign-callable aliases that point at them.
    for method in &collected.entry_points {
        debug_assert!(forces_entry_point(method));
        items.push(direct_target(method, method.signature(), false));
    }
    for method in &collected.reexports {
        items.push(WorkItem::Reexport {
            module: method.module.clone(),
            method: method.name.clone(),
        });
    }

    // Phases 2 and 3: definition-driven targets.
    for method in &collected.methods {
        if forces_entry_point(method) {
            continue; // already queued in phase 1
        }
        if method.has_concrete_dispatch_sig() {
            items.push(direct_target(method, method.signature(), false));
        } else if options.full_coverage {
            for sig in enumerate_leaf_signatures(method) {
                items.push(direct_target(method, sig, false));
            }
            // The generic fallback guarantees correctness for argument
            // shapes the leaf candidates do not cover.
            items.push(direct_target(method, method.signature(), true));
        }
    }

    // Phase 4: what the run actually compiled, filtered by policy.
    for found in &collected.specializations {
        let include = match found.artifact {
            Some(artifact) => should_emit(artifact),
            None => false,
        };
        if include {
            items.push(direct_target(found.method, found.spec.sig.clone(), false));
        }
    }

    WorkList { items }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{collect, CollectScope};
    use crate::method_table::{
        CompiledArtifact, EntryPoint, MethodTable, RuntimeSnapshot, Specialization,
    };
    use crate::types::JuliaType;

    fn native_artifact() -> CompiledArtifact {
        CompiledArtifact {
            entry: EntryPoint::Native,
            ..CompiledArtifact::new()
        }
    }

    #[test]
    fn test_forced_entry_points_come_first() {
        let mut snap = RuntimeSnapshot::new();

        let mut ft = MethodTable::new("f");
        let mut f = Method::new("A", "f", vec![JuliaType::Int64]);
        let mut spec = Specialization::new(Signature::new(vec![JuliaType::Int64]));
        spec.artifacts.push(native_artifact());
        f.specializations.push(spec);
        ft.methods.push(f);
        snap.add_table("A", ft);

        let mut it = MethodTable::new("__init__");
        let mut init = Method::new("A", "__init__", vec![]);
        init.is_init = true;
        it.methods.push(init);
        snap.add_table("A", it);

        let collected = collect(&snap, &CollectScope::WholeProgram);
        let worklist = build_worklist(&collected, &WorklistOptions::default());

        match &worklist.items[0] {
            WorkItem::Compile(target) => assert_eq!(target.method, "__init__"),
            other => panic!("expected forced entry point first, got {:?}", other),
        }
    }

    #[test]
    fn test_ccallable_emits_compile_and_reexport() {
        let mut snap = RuntimeSnapshot::new();
        let mut table = MethodTable::new("c_entry");
        let mut m = Method::new("A", "c_entry", vec![JuliaType::Int64]);
        m.is_ccallable = true;
        table.methods.push(m);
        snap.add_table("A", table);

        let collected = collect(&snap, &CollectScope::WholeProgram);
        let worklist = build_worklist(&collected, &WorklistOptions::default());

        assert_eq!(worklist.len(), 2);
        assert!(matches!(&worklist.items[0], WorkItem::Compile(t) if t.method == "c_entry"));
        assert!(matches!(&worklist.items[1], WorkItem::Reexport { method, .. } if method == "c_entry"));
    }

    #[test]
    fn test_concrete_method_gets_direct_target_without_full_coverage() {
        let mut snap = RuntimeSnapshot::new();
        let mut table = MethodTable::new("f");
        table
            .methods
            .push(Method::new("A", "f", vec![JuliaType::Int64, JuliaType::Bool]));
        snap.add_table("A", table);

        let collected = collect(&snap, &CollectScope::WholeProgram);
        let worklist = build_worklist(&collected, &WorklistOptions::default());

        assert_eq!(worklist.len(), 1);
        let target = worklist.compile_targets().next().expect("one target");
        assert!(!target.unspecialized);
        assert_eq!(target.sig, Signature::new(vec![JuliaType::Int64, JuliaType::Bool]));
    }

    #[test]
    fn test_full_coverage_adds_leaf_candidates_and_fallback() {
        let mut snap = RuntimeSnapshot::new();
        let mut table = MethodTable::new("f");
        table.methods.push(Method::new(
            "A",
            "f",
            vec![JuliaType::Union(vec![JuliaType::Int64, JuliaType::Float64])],
        ));
        snap.add_table("A", table);

        let collected = collect(&snap, &CollectScope::WholeProgram);

        let lazy = build_worklist(&collected, &WorklistOptions { full_coverage: false });
        assert!(lazy.is_empty(), "generic method, nothing ran: no targets");

        let full = build_worklist(&collected, &WorklistOptions { full_coverage: true });
        assert_eq!(full.len(), 3, "two leaf candidates plus one fallback");
        let unspec: Vec<_> = full.compile_targets().filter(|t| t.unspecialized).collect();
        assert_eq!(unspec.len(), 1);
        assert_eq!(
            unspec[0].sig,
            Signature::new(vec![JuliaType::Union(vec![
                JuliaType::Int64,
                JuliaType::Float64
            ])])
        );
    }

    #[test]
    fn test_policy_included_specializations_come_last() {
        let mut snap = RuntimeSnapshot::new();
        let mut table = MethodTable::new("f");
        let mut m = Method::new("A", "f", vec![JuliaType::Integer]);

        let mut hot = Specialization::new(Signature::new(vec![JuliaType::Int64]));
        hot.artifacts.push(native_artifact());
        m.specializations.push(hot);

        let mut cold = Specialization::new(Signature::new(vec![JuliaType::Float64]));
        cold.artifacts.push(CompiledArtifact::new());
        m.specializations.push(cold);

        table.methods.push(m);
        snap.add_table("A", table);

        let collected = collect(&snap, &CollectScope::WholeProgram);
        let worklist = build_worklist(&collected, &WorklistOptions::default());

        assert_eq!(worklist.len(), 1, "only the native-compiled record passes");
        let target = worklist.compile_targets().next().expect("one target");
        assert_eq!(target.sig, Signature::new(vec![JuliaType::Int64]));
    }

    #[test]
    fn test_worklist_is_deterministic() {
        let mut snap = RuntimeSnapshot::new();
        for name in ["f", "g", "h"] {
            let mut table = MethodTable::new(name);
            table.methods.push(Method::new(
                "A",
                name,
                vec![JuliaType::Union(vec![JuliaType::Int64, JuliaType::Bool])],
            ));
            snap.add_table("A", table);
        }
        let collected = collect(&snap, &CollectScope::WholeProgram);
        let options = WorklistOptions { full_coverage: true };
        assert_eq!(
            build_worklist(&collected, &options),
            build_worklist(&collected, &options)
        );
    }
}

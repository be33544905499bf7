//! Method tables and compiled-code metadata consumed by the selector.
//!
//! Everything here is a read-only snapshot of runtime state: the packaging
//! pass never mutates a method table, a specialization, or a compiled-code
//! record. The dispatch algorithm itself lives in the VM; this module only
//! models the shape the selector needs to traverse.

use serde::{Deserialize, Serialize};

use crate::types::{JuliaType, Signature, TypeParam};

/// Inlining-cost value meaning "never inline"; bodies carrying it are only
/// useful as standalone compiled code and are always worth persisting.
pub const INLINE_COST_NEVER: u16 = u16::MAX;

/// How a compiled-code record can be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryPoint {
    /// No entry point installed yet.
    None,
    /// The trivial constant-return stub; never worth persisting.
    ConstReturn,
    /// A real native entry point.
    Native,
}

/// Result of running type inference over one specialization body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredBody {
    /// Whether inference ran to completion on this body.
    pub fully_inferred: bool,
    /// Inlining-cost classification; [`INLINE_COST_NEVER`] marks bodies
    /// that will never be inlined at call sites.
    pub inlining_cost: u16,
}

/// Metadata about one compiled-code record of a specialization.
///
/// A specialization may carry several of these across disjoint world
/// epochs; only the most relevant one (highest `max_world`) is considered
/// for inclusion in the output image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    pub entry: EntryPoint,
    pub inferred: Option<InferredBody>,
    /// Persistence was explicitly requested (e.g. by a precompile hint).
    pub precompile_requested: bool,
    /// First world epoch in which this record is valid.
    pub min_world: u64,
    /// Last world epoch in which this record is valid.
    pub max_world: u64,
}

impl CompiledArtifact {
    /// A record with nothing compiled yet and an open-ended validity range.
    pub fn new() -> Self {
        Self {
            entry: EntryPoint::None,
            inferred: None,
            precompile_requested: false,
            min_world: 0,
            max_world: u64::MAX,
        }
    }
}

impl Default for CompiledArtifact {
    fn default() -> Self {
        Self::new()
    }
}

/// A concrete binding of a method to a fully-resolved argument signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialization {
    pub sig: Signature,
    /// Compiled-code records, unordered across world epochs.
    pub artifacts: Vec<CompiledArtifact>,
}

impl Specialization {
    pub fn new(sig: Signature) -> Self {
        Self {
            sig,
            artifacts: Vec::new(),
        }
    }

    /// The most relevant compiled-code record: the one valid furthest into
    /// the future. Ties resolve to the earliest record, keeping traversal
    /// deterministic.
    pub fn best_artifact(&self) -> Option<&CompiledArtifact> {
        self.artifacts.iter().max_by_key(|a| a.max_world)
    }
}

/// A named, generic callable definition. Immutable once defined in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    /// Name of the defining module.
    pub module: String,
    /// Declared argument types, possibly containing unions and references
    /// to `where`-clause variables.
    pub params: Vec<JuliaType>,
    /// `where`-clause variables scoped to this signature.
    pub type_params: Vec<TypeParam>,
    /// Designated module initializer (`__init__`).
    pub is_init: bool,
    /// Exported for foreign callers (`@ccallable`).
    pub is_ccallable: bool,
    /// Has a normal (non-generated) body. Generated/staged methods have no
    /// static structure to specialize.
    pub has_source: bool,
    /// Already-materialized specializations, in creation order.
    pub specializations: Vec<Specialization>,
}

impl Method {
    pub fn new(module: impl Into<String>, name: impl Into<String>, params: Vec<JuliaType>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            params,
            type_params: Vec::new(),
            is_init: false,
            is_ccallable: false,
            has_source: true,
            specializations: Vec::new(),
        }
    }

    /// The declared signature as a tuple.
    pub fn signature(&self) -> Signature {
        Signature::new(self.params.clone())
    }

    /// True when the declared signature is a concrete dispatch tuple: no
    /// `where`-clause variables and every position a concrete leaf. Such a
    /// method has exactly one useful specialization - itself.
    pub fn has_concrete_dispatch_sig(&self) -> bool {
        self.type_params.is_empty() && self.signature().is_concrete()
    }
}

/// A method table: the ordered set of methods defined under one function
/// name. Iteration order is definition order, which keeps every downstream
/// pass deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTable {
    pub name: String,
    pub methods: Vec<Method>,
}

impl MethodTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }
}

/// Traversal capability over the method-table universe.
///
/// The packaging pass receives the universe by shared reference and treats
/// it as an externally-owned snapshot. Implementations must return tables
/// in a stable order so that repeated packaging passes over identical state
/// produce byte-identical images.
pub trait Universe {
    /// Every method table reachable from the whole program.
    fn reachable_tables(&self) -> Vec<&MethodTable>;

    /// Method tables owned by one module.
    fn tables_in_module(&self, module: &str) -> Vec<&MethodTable>;

    /// Modules initialized during the run, in initialization order.
    fn init_order(&self) -> &[String];

    /// Modules whose definition scope was still open when packaging began.
    /// Signals likely-inconsistent incremental state; advisory only.
    fn open_modules(&self) -> &[String];
}

/// A concrete, deterministic [`Universe`] for embedders and tests.
///
/// Modules and tables are kept in insertion order; no hashing is involved
/// anywhere on the traversal path.
#[derive(Debug, Clone, Default)]
pub struct RuntimeSnapshot {
    modules: Vec<(String, Vec<MethodTable>)>,
    init_order: Vec<String>,
    open_modules: Vec<String>,
}

impl RuntimeSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a method table under `module`, creating the module slot on first
    /// use.
    pub fn add_table(&mut self, module: &str, table: MethodTable) {
        if let Some((_, tables)) = self.modules.iter_mut().find(|(m, _)| m == module) {
            tables.push(table);
        } else {
            self.modules.push((module.to_string(), vec![table]));
        }
    }

    /// Record that `module` ran its initializer during this run.
    pub fn mark_initialized(&mut self, module: &str) {
        self.init_order.push(module.to_string());
    }

    /// Record a module scope left open at packaging time.
    pub fn mark_open(&mut self, module: &str) {
        self.open_modules.push(module.to_string());
    }
}

impl Universe for RuntimeSnapshot {
    fn reachable_tables(&self) -> Vec<&MethodTable> {
        self.modules
            .iter()
            .flat_map(|(_, tables)| tables.iter())
            .collect()
    }

    fn tables_in_module(&self, module: &str) -> Vec<&MethodTable> {
        self.modules
            .iter()
            .filter(|(m, _)| m == module)
            .flat_map(|(_, tables)| tables.iter())
            .collect()
    }

    fn init_order(&self) -> &[String] {
        &self.init_order
    }

    fn open_modules(&self) -> &[String] {
        &self.open_modules
    }
}

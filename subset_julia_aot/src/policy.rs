//! Inclusion policy: which compiled-code records are worth persisting.
//!
//! The tests here come straight from what the runtime knows about each
//! record after a run: whether it ever got a native entry point, whether
//! inference finished and classified the body as never-inlineable, and
//! whether persistence was explicitly requested. Records that only return
//! a constant are never persisted; re-deriving them is cheaper than
//! storing them.

use crate::method_table::{CompiledArtifact, EntryPoint, Method, INLINE_COST_NEVER};

/// Decide whether one compiled-code record should be emitted into the
/// output image.
pub fn should_emit(artifact: &CompiledArtifact) -> bool {
    if artifact.entry == EntryPoint::ConstReturn {
        return false;
    }
    if let Some(body) = &artifact.inferred {
        if body.fully_inferred && body.inlining_cost == INLINE_COST_NEVER {
            return true;
        }
    }
    artifact.entry == EntryPoint::Native || artifact.precompile_requested
}

/// Methods whose direct specialization is always created and emitted,
/// regardless of [`should_emit`]: designated module initializers and
/// foreign-callable exports. The hosting program resolves these entry
/// points by name at load time; they must exist in the image.
pub fn forces_entry_point(method: &Method) -> bool {
    (method.is_init || method.is_ccallable) && method.has_concrete_dispatch_sig()
}

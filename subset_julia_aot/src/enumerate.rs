//! Leaf-signature enumeration for generic methods.
//!
//! `f(::Union{...}, ...)` and `f(...) where {T<:Union{...}}` are common
//! patterns, and expanding the unions often yields leaf signatures that can
//! be compiled ahead of time. This module performs that expansion with two
//! nested odometers:
//!
//! 1. **Union splitting**: each union-typed parameter position becomes an
//!    odometer digit whose arity is the union's component count. Cycling
//!    the digits (least significant first, carry on wrap) enumerates
//!    exactly the Cartesian product of the components.
//! 2. **Type-variable expansion**: each `where`-clause variable becomes a
//!    digit. A variable bounded above by a union cycles through that
//!    bound's components; any other variable holds a single unresolved
//!    digit. Every odometer position is an instantiation attempt; attempts
//!    that violate a bound or produce an uncallable tuple are discarded and
//!    enumeration continues.
//!
//! The result is finite and re-derived on each call; no enumeration scratch
//! state survives the call. Duplicate candidates are possible and accepted,
//! the downstream code generator is idempotent per distinct signature.

use crate::method_table::Method;
use crate::types::{JuliaType, Signature};

/// Union-typed parameter positions beyond this count skip union splitting
/// entirely and fall back to type-variable expansion alone. Keeps the
/// candidate count from exploding on heavily-unioned signatures.
pub const MAX_UNION_SPLITS: usize = 6;

/// Expand one method's declared signature into concrete leaf candidates.
///
/// Returns the declared signature alone when it is already concrete. An
/// empty result means the method cannot be leaf-specialized; the work-list
/// builder then emits only its unspecialized fallback.
pub fn enumerate_leaf_signatures(method: &Method) -> Vec<Signature> {
    let declared = method.signature();
    if method.has_concrete_dispatch_sig() {
        return vec![declared];
    }

    let mut count_unions = 0usize;
    for ty in &method.params {
        if !ty.union_components().is_empty() {
            count_unions += 1;
        } else if matches!(ty, JuliaType::Bottom) {
            // A Union{} parameter makes the method uncallable; nothing to
            // enumerate.
            return Vec::new();
        } else if !ty.has_free_typevars()
            && ((ty.is_concrete() && !ty.is_kind())
                || matches!(ty, JuliaType::Type | JuliaType::TypeOf(_)))
        {
            // No amount of union splitting will make this a leaf dispatch
            // tuple; the method is served by unspecialized compilation.
            return Vec::new();
        }
    }

    let mut out = Vec::new();
    if count_unions == 0 || count_unions >= MAX_UNION_SPLITS {
        enumerate_tvar_union(method, &method.params, &mut out);
        return out;
    }

    // Union-splitting odometer: one digit per union position, incremented
    // least-significant-first with carry. The loop visits exactly
    // Π(component counts) tuples and stops when every digit has wrapped.
    let mut idx = vec![0usize; count_unions];
    let mut wrapped = false;
    while !wrapped {
        let mut tuple = Vec::with_capacity(method.params.len());
        let mut idx_ctr = 0;
        wrapped = true;
        for ty in &method.params {
            let components = ty.union_components();
            if components.is_empty() {
                tuple.push(ty.clone());
                continue;
            }
            let mut j = idx[idx_ctr];
            tuple.push(components[j].clone());
            j += 1;
            if wrapped {
                if j == components.len() {
                    idx[idx_ctr] = 0;
                } else {
                    idx[idx_ctr] = j;
                    wrapped = false;
                }
            }
            idx_ctr += 1;
        }
        enumerate_tvar_union(method, &tuple, &mut out);
    }
    out
}

/// Expand the `where`-clause variables of `body` and collect every
/// surviving concrete candidate into `out`.
///
/// The binding environment starts at `Union{}` for every variable (always
/// an admissible binding from below) and advances like an odometer: a
/// variable whose upper bound is a union cycles through the bound's
/// components, re-entering non-concrete components as the unresolved
/// variable; any other variable holds a single unresolved digit and only
/// carries. Termination: the pass after every cyclable digit has wrapped
/// back to zero.
fn enumerate_tvar_union(method: &Method, body: &[JuliaType], out: &mut Vec<Signature>) {
    let tvars = &method.type_params;
    let body_sig = Signature::new(body.to_vec());

    if tvars.is_empty() {
        // No variables: the tuple itself is the only candidate.
        push_if_leaf(body_sig, out);
        return;
    }

    let mut idx = vec![0usize; tvars.len()];
    // T <: Union{} is always a valid option, so every digit starts there.
    let mut env = vec![JuliaType::Bottom; tvars.len()];
    loop {
        // Invalid instantiations are discarded and enumeration advances.
        if let Ok(candidate) = body_sig.substitute(tvars, &env) {
            push_if_leaf(candidate, out);
        }

        let mut advanced = false;
        for (i, tv) in tvars.iter().enumerate() {
            let components = tv
                .upper
                .as_ref()
                .map(JuliaType::union_components)
                .unwrap_or(&[]);
            if components.is_empty() {
                // Single digit value: the variable itself, unresolved.
                env[i] = JuliaType::TypeVar(tv.name.clone());
                continue; // carry
            }
            let j = idx[i];
            if j == components.len() {
                env[i] = JuliaType::Bottom;
                idx[i] = 0;
                continue; // carry into the next digit
            }
            let ty = &components[j];
            env[i] = if ty.is_concrete() {
                ty.clone()
            } else {
                // Non-concrete component: re-enter as the variable itself,
                // narrowed to this component rather than treated as a leaf.
                JuliaType::TypeVar(tv.name.clone())
            };
            idx[i] = j + 1;
            advanced = true;
            break;
        }
        if !advanced {
            return;
        }
    }
}

fn push_if_leaf(candidate: Signature, out: &mut Vec<Signature>) {
    if candidate.is_callable() && candidate.is_concrete() {
        out.push(candidate);
    }
}

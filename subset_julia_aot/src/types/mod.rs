//! Type algebra for specialization selection.
//!
//! This module defines the slice of the Julia type hierarchy that matters
//! for deciding which method specializations to compile ahead of time:
//! concrete leaf types, the abstract numeric tower, union (alternation)
//! types, type variables from `where` clauses, and the bottom type.
//!
//! The hierarchy mirrors the dispatch-relevant part of the VM's type tree:
//! ```text
//! Any
//!  ├── Number
//!  │    ├── Real
//!  │    │    ├── Integer
//!  │    │    │    ├── Signed:   Int8 .. Int128 (concrete)
//!  │    │    │    ├── Unsigned: UInt8 .. UInt128 (concrete)
//!  │    │    │    └── Bool (concrete)
//!  │    │    └── AbstractFloat: Float16, Float32, Float64 (concrete)
//!  ├── AbstractString
//!  │    └── String (concrete)
//!  └── Type
//!       └── DataType (concrete)
//! ```
//!
//! All operations here are pure and side-effect-free; the only fallible one
//! is [`Signature::substitute`], which reports an [`InstantiationError`]
//! when a candidate binding falls outside a variable's declared bounds.
//!
//! # Sub-modules
//!
//! - `comparison`: Subtype checking and concreteness predicates
//! - `display`: Display implementations for types and signatures

mod comparison;
mod display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Julia type term as seen by the specialization selector.
///
/// Signatures are tuples of these terms. The selector never needs the full
/// runtime type lattice; it needs exactly enough structure to answer
/// "is this concrete", "what are the union components", and "does this
/// binding satisfy the variable's bound".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JuliaType {
    // Concrete leaves
    // Signed integers
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    // Unsigned integers
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    // Boolean (subtype of Integer)
    Bool,
    // Floating point
    Float16,
    Float32,
    Float64,
    String,
    Char,
    Symbol,
    Nothing,
    /// User-defined struct type by name (concrete).
    Struct(std::string::String),
    /// The concrete type of type objects (`typeof(Int64)`).
    DataType,

    // Abstract nodes
    Any,
    Number,
    Real,
    Integer,
    Signed,
    Unsigned,
    AbstractFloat,
    AbstractString,
    AbstractChar,
    /// User-defined abstract type with optional parent name.
    AbstractUser(std::string::String, Option<std::string::String>),

    // Kind family (types-of-types)
    /// Abstract supertype of all type objects.
    Type,
    /// `Type{T}` singleton pattern matching the type object `T`.
    TypeOf(Box<JuliaType>),

    /// Reference to a `where`-clause variable by name. Bounds live on the
    /// declaring [`TypeParam`], not on the reference.
    TypeVar(std::string::String),

    /// A union of alternative terms. Empty unions are represented by
    /// [`JuliaType::Bottom`], never by `Union(vec![])`.
    Union(Vec<JuliaType>),

    /// The empty (uninhabited) type, `Union{}`. Subtype of everything; a
    /// signature containing it denotes an uncallable method.
    Bottom,
}

impl JuliaType {
    /// Components of a union type; empty slice for non-union terms.
    pub fn union_components(&self) -> &[JuliaType] {
        match self {
            JuliaType::Union(components) => components,
            _ => &[],
        }
    }

    /// True for the kind family: type terms whose *values* are types.
    /// Specializing on these never yields a leaf dispatch signature.
    pub fn is_kind(&self) -> bool {
        matches!(
            self,
            JuliaType::Type | JuliaType::DataType | JuliaType::TypeOf(_)
        )
    }

    /// True if the term mentions any type variable.
    pub fn has_free_typevars(&self) -> bool {
        match self {
            JuliaType::TypeVar(_) => true,
            JuliaType::Union(components) => components.iter().any(JuliaType::has_free_typevars),
            JuliaType::TypeOf(inner) => inner.has_free_typevars(),
            _ => false,
        }
    }

    /// Replace every reference to the variable `var_name` with `replacement`.
    /// Produces a new term; terms are never edited in place.
    pub fn substitute(&self, var_name: &str, replacement: &JuliaType) -> JuliaType {
        match self {
            JuliaType::TypeVar(name) if name == var_name => replacement.clone(),
            JuliaType::Union(components) => JuliaType::Union(
                components
                    .iter()
                    .map(|t| t.substitute(var_name, replacement))
                    .collect(),
            ),
            JuliaType::TypeOf(inner) => {
                JuliaType::TypeOf(Box::new(inner.substitute(var_name, replacement)))
            }
            _ => self.clone(),
        }
    }
}

/// A `where`-clause type parameter with optional bounds.
///
/// Represents declarations like `T`, `T<:Number`, or `Integer<:T<:Real`.
/// The upper bound may itself be a union, which is what drives the
/// type-variable odometer in the enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeParam {
    /// The variable name (e.g., "T", "S").
    pub name: String,
    /// Optional lower bound: `lower <: T`.
    #[serde(default)]
    pub lower: Option<JuliaType>,
    /// Optional upper bound: `T <: upper`.
    #[serde(default)]
    pub upper: Option<JuliaType>,
}

impl TypeParam {
    /// Create an unbounded type parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lower: None,
            upper: None,
        }
    }

    /// Create a type parameter with an upper bound.
    pub fn with_upper_bound(name: impl Into<String>, upper: JuliaType) -> Self {
        Self {
            name: name.into(),
            lower: None,
            upper: Some(upper),
        }
    }
}

/// Raised when instantiating a signature with a binding that violates the
/// declared bounds of its type variable. Consumed immediately by the
/// enumerator's discard-and-continue step; never escapes the candidate loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot bind {var} := {binding}: outside declared bound {bound}")]
pub struct InstantiationError {
    /// Name of the violated type variable.
    pub var: String,
    /// Rendered binding that was attempted.
    pub binding: String,
    /// Rendered bound that rejected it.
    pub bound: String,
}

/// An ordered tuple of argument type terms.
///
/// Structurally immutable: new signatures are always produced by
/// substitution, never by in-place edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    params: Vec<JuliaType>,
}

impl Signature {
    pub fn new(params: Vec<JuliaType>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &[JuliaType] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// True when every position is a concrete leaf with no free variables.
    pub fn is_concrete(&self) -> bool {
        self.params
            .iter()
            .all(|t| t.is_concrete() && !t.has_free_typevars())
    }

    /// True when the signature admits at least one concrete argument tuple:
    /// no position is the empty type and every position has a concrete
    /// subtype.
    pub fn is_callable(&self) -> bool {
        self.params.iter().all(JuliaType::has_concrete_subtype)
    }

    /// Instantiate this signature under `env`, one binding per declared
    /// variable in `params` (positional).
    ///
    /// Bindings are checked against the variable's declared bounds before
    /// substitution; a violating binding fails the whole attempt. `Bottom`
    /// is always admissible for a variable without a lower bound (anything
    /// satisfies `T <: Union{}` vacuously from below), and an unresolved
    /// variable binding (the variable itself, possibly narrowed) is passed
    /// through unchecked.
    pub fn substitute(
        &self,
        params: &[TypeParam],
        env: &[JuliaType],
    ) -> Result<Signature, InstantiationError> {
        debug_assert_eq!(params.len(), env.len());
        for (param, binding) in params.iter().zip(env) {
            if matches!(binding, JuliaType::TypeVar(_)) {
                continue;
            }
            if let Some(upper) = &param.upper {
                if !binding.is_subtype_of(upper) {
                    return Err(InstantiationError {
                        var: param.name.clone(),
                        binding: binding.to_string(),
                        bound: upper.to_string(),
                    });
                }
            }
            if let Some(lower) = &param.lower {
                if !lower.is_subtype_of(binding) {
                    return Err(InstantiationError {
                        var: param.name.clone(),
                        binding: binding.to_string(),
                        bound: lower.to_string(),
                    });
                }
            }
        }

        let mut result = self.params.clone();
        for (param, binding) in params.iter().zip(env) {
            for term in &mut result {
                *term = term.substitute(&param.name, binding);
            }
        }
        Ok(Signature::new(result))
    }
}

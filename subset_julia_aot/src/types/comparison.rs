//! Subtype checking and concreteness predicates for [`JuliaType`].

use super::JuliaType;

impl JuliaType {
    /// Check if this type is a concrete leaf of the hierarchy.
    ///
    /// Concrete types have a unique runtime representation and are not
    /// abstract or further parameterized. `Bottom` is not concrete - it
    /// cannot be instantiated. `Type{T}` patterns dispatch on a singleton
    /// type object and count as concrete.
    pub fn is_concrete(&self) -> bool {
        matches!(
            self,
            JuliaType::Int8
                | JuliaType::Int16
                | JuliaType::Int32
                | JuliaType::Int64
                | JuliaType::Int128
                | JuliaType::UInt8
                | JuliaType::UInt16
                | JuliaType::UInt32
                | JuliaType::UInt64
                | JuliaType::UInt128
                | JuliaType::Bool
                | JuliaType::Float16
                | JuliaType::Float32
                | JuliaType::Float64
                | JuliaType::String
                | JuliaType::Char
                | JuliaType::Symbol
                | JuliaType::Nothing
                | JuliaType::Struct(_)
                | JuliaType::DataType
                | JuliaType::TypeOf(_)
        )
    }

    /// Check if at least one concrete type inhabits this term.
    ///
    /// `Bottom` has none; a union has one iff any component does; every
    /// other node of the hierarchy has concrete leaves below it. An
    /// unresolved type variable is optimistically inhabited - its bound may
    /// still be narrowed to a leaf.
    pub fn has_concrete_subtype(&self) -> bool {
        match self {
            JuliaType::Bottom => false,
            JuliaType::Union(components) => {
                components.iter().any(JuliaType::has_concrete_subtype)
            }
            _ => true,
        }
    }

    /// Check if `self` is a subtype of `other` (`self <: other`).
    ///
    /// Compact compile-time hierarchy walk over the dispatch-relevant
    /// subset of the type tree. Unresolved type variables are only subtypes
    /// of `Any` and of themselves.
    pub fn is_subtype_of(&self, other: &JuliaType) -> bool {
        if self == other {
            return true;
        }
        // Bottom is a subtype of everything
        if matches!(self, JuliaType::Bottom) {
            return true;
        }
        // Union{T1, T2, ...} <: U iff every Ti <: U
        if let JuliaType::Union(self_types) = self {
            return self_types.iter().all(|t| t.is_subtype_of(other));
        }
        // T <: Union{T1, T2, ...} iff T <: Ti for some i
        if let JuliaType::Union(other_types) = other {
            return other_types.iter().any(|t| self.is_subtype_of(t));
        }
        match other {
            JuliaType::Any => true,
            JuliaType::Bottom => false,
            JuliaType::Number => matches!(
                self,
                JuliaType::Int8
                    | JuliaType::Int16
                    | JuliaType::Int32
                    | JuliaType::Int64
                    | JuliaType::Int128
                    | JuliaType::UInt8
                    | JuliaType::UInt16
                    | JuliaType::UInt32
                    | JuliaType::UInt64
                    | JuliaType::UInt128
                    | JuliaType::Bool
                    | JuliaType::Float16
                    | JuliaType::Float32
                    | JuliaType::Float64
                    | JuliaType::Real
                    | JuliaType::Integer
                    | JuliaType::Signed
                    | JuliaType::Unsigned
                    | JuliaType::AbstractFloat
            ),
            JuliaType::Real => matches!(
                self,
                JuliaType::Int8
                    | JuliaType::Int16
                    | JuliaType::Int32
                    | JuliaType::Int64
                    | JuliaType::Int128
                    | JuliaType::UInt8
                    | JuliaType::UInt16
                    | JuliaType::UInt32
                    | JuliaType::UInt64
                    | JuliaType::UInt128
                    | JuliaType::Bool
                    | JuliaType::Float16
                    | JuliaType::Float32
                    | JuliaType::Float64
                    | JuliaType::Integer
                    | JuliaType::Signed
                    | JuliaType::Unsigned
                    | JuliaType::AbstractFloat
            ),
            JuliaType::Integer => matches!(
                self,
                JuliaType::Int8
                    | JuliaType::Int16
                    | JuliaType::Int32
                    | JuliaType::Int64
                    | JuliaType::Int128
                    | JuliaType::UInt8
                    | JuliaType::UInt16
                    | JuliaType::UInt32
                    | JuliaType::UInt64
                    | JuliaType::UInt128
                    | JuliaType::Bool
                    | JuliaType::Signed
                    | JuliaType::Unsigned
            ),
            JuliaType::Signed => matches!(
                self,
                JuliaType::Int8
                    | JuliaType::Int16
                    | JuliaType::Int32
                    | JuliaType::Int64
                    | JuliaType::Int128
            ),
            JuliaType::Unsigned => matches!(
                self,
                JuliaType::UInt8
                    | JuliaType::UInt16
                    | JuliaType::UInt32
                    | JuliaType::UInt64
                    | JuliaType::UInt128
            ),
            JuliaType::AbstractFloat => matches!(
                self,
                JuliaType::Float16 | JuliaType::Float32 | JuliaType::Float64
            ),
            JuliaType::AbstractString => matches!(self, JuliaType::String),
            JuliaType::AbstractChar => matches!(self, JuliaType::Char),
            JuliaType::Type => matches!(self, JuliaType::DataType | JuliaType::TypeOf(_)),
            JuliaType::TypeOf(other_inner) => {
                if let JuliaType::TypeOf(self_inner) = self {
                    self_inner.is_subtype_of(other_inner)
                } else {
                    false
                }
            }
            JuliaType::AbstractUser(abstract_name, _) => {
                // Without a full type registry only the immediate parent
                // edge is visible.
                if let JuliaType::AbstractUser(self_name, self_parent) = self {
                    if self_name == abstract_name {
                        return true;
                    }
                    if self_parent.as_deref() == Some(abstract_name.as_str()) {
                        return true;
                    }
                }
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_tower() {
        assert!(JuliaType::Int64.is_subtype_of(&JuliaType::Signed));
        assert!(JuliaType::Int64.is_subtype_of(&JuliaType::Integer));
        assert!(JuliaType::Int64.is_subtype_of(&JuliaType::Real));
        assert!(JuliaType::Int64.is_subtype_of(&JuliaType::Number));
        assert!(JuliaType::Int64.is_subtype_of(&JuliaType::Any));
        assert!(!JuliaType::Int64.is_subtype_of(&JuliaType::Float64));
        assert!(JuliaType::Bool.is_subtype_of(&JuliaType::Integer));
        assert!(!JuliaType::Bool.is_subtype_of(&JuliaType::Signed));
    }

    #[test]
    fn test_bottom_is_subtype_of_everything() {
        assert!(JuliaType::Bottom.is_subtype_of(&JuliaType::Int64));
        assert!(JuliaType::Bottom.is_subtype_of(&JuliaType::Bottom));
        assert!(!JuliaType::Int64.is_subtype_of(&JuliaType::Bottom));
    }

    #[test]
    fn test_union_subtyping_both_directions() {
        let u = JuliaType::Union(vec![JuliaType::Int64, JuliaType::Float64]);
        assert!(JuliaType::Int64.is_subtype_of(&u));
        assert!(!JuliaType::Bool.is_subtype_of(&u));
        assert!(u.is_subtype_of(&JuliaType::Number));
        assert!(!u.is_subtype_of(&JuliaType::Integer));
    }

    #[test]
    fn test_kind_family() {
        assert!(JuliaType::DataType.is_subtype_of(&JuliaType::Type));
        assert!(JuliaType::TypeOf(Box::new(JuliaType::Int64)).is_subtype_of(&JuliaType::Type));
        assert!(JuliaType::Type.is_kind());
        assert!(JuliaType::DataType.is_kind());
        assert!(!JuliaType::Int64.is_kind());
    }

    #[test]
    fn test_concrete_predicates() {
        assert!(JuliaType::Int64.is_concrete());
        assert!(JuliaType::Struct("Point".to_string()).is_concrete());
        assert!(!JuliaType::Integer.is_concrete());
        assert!(!JuliaType::Bottom.is_concrete());
        assert!(!JuliaType::Union(vec![JuliaType::Int64, JuliaType::Bool]).is_concrete());
    }

    #[test]
    fn test_has_concrete_subtype() {
        assert!(JuliaType::Integer.has_concrete_subtype());
        assert!(!JuliaType::Bottom.has_concrete_subtype());
        assert!(JuliaType::Union(vec![JuliaType::Bottom, JuliaType::Int64]).has_concrete_subtype());
        assert!(!JuliaType::Union(vec![JuliaType::Bottom]).has_concrete_subtype());
    }

    #[test]
    fn test_abstract_user_parent_edge() {
        let animal = JuliaType::AbstractUser("Animal".to_string(), None);
        let mammal = JuliaType::AbstractUser("Mammal".to_string(), Some("Animal".to_string()));
        assert!(mammal.is_subtype_of(&animal));
        assert!(!animal.is_subtype_of(&mammal));
    }
}

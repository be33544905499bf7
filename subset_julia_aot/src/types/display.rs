//! Display name and formatting for types and signatures.

use super::{JuliaType, Signature, TypeParam};

impl JuliaType {
    /// Get the display name for this type.
    pub fn name(&self) -> std::borrow::Cow<'static, str> {
        match self {
            // Signed integers
            JuliaType::Int8 => "Int8".into(),
            JuliaType::Int16 => "Int16".into(),
            JuliaType::Int32 => "Int32".into(),
            JuliaType::Int64 => "Int64".into(),
            JuliaType::Int128 => "Int128".into(),
            // Unsigned integers
            JuliaType::UInt8 => "UInt8".into(),
            JuliaType::UInt16 => "UInt16".into(),
            JuliaType::UInt32 => "UInt32".into(),
            JuliaType::UInt64 => "UInt64".into(),
            JuliaType::UInt128 => "UInt128".into(),
            // Boolean
            JuliaType::Bool => "Bool".into(),
            // Floating point
            JuliaType::Float16 => "Float16".into(),
            JuliaType::Float32 => "Float32".into(),
            JuliaType::Float64 => "Float64".into(),
            // Other concrete types
            JuliaType::String => "String".into(),
            JuliaType::Char => "Char".into(),
            JuliaType::Symbol => "Symbol".into(),
            JuliaType::Nothing => "Nothing".into(),
            JuliaType::Struct(name) => name.clone().into(),
            JuliaType::DataType => "DataType".into(),
            // Abstract types
            JuliaType::Any => "Any".into(),
            JuliaType::Number => "Number".into(),
            JuliaType::Real => "Real".into(),
            JuliaType::Integer => "Integer".into(),
            JuliaType::Signed => "Signed".into(),
            JuliaType::Unsigned => "Unsigned".into(),
            JuliaType::AbstractFloat => "AbstractFloat".into(),
            JuliaType::AbstractString => "AbstractString".into(),
            JuliaType::AbstractChar => "AbstractChar".into(),
            JuliaType::AbstractUser(name, _) => name.clone().into(),
            // Kind family
            JuliaType::Type => "Type".into(),
            JuliaType::TypeOf(inner) => format!("Type{{{}}}", inner.name()).into(),
            // Type variable reference
            JuliaType::TypeVar(name) => name.clone().into(),
            // Bottom type
            JuliaType::Bottom => "Union{}".into(),
            // Union type
            JuliaType::Union(types) => {
                let type_names: Vec<String> = types.iter().map(|t| t.name().to_string()).collect();
                format!("Union{{{}}}", type_names.join(", ")).into()
            }
        }
    }
}

impl std::fmt::Display for JuliaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::fmt::Display for Signature {
    /// Renders in Julia's dispatch-tuple notation: `Tuple{Int64, Bool}`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.params().iter().map(|t| t.to_string()).collect();
        write!(f, "Tuple{{{}}}", names.join(", "))
    }
}

impl std::fmt::Display for TypeParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => write!(f, "{}<:{}<:{}", lower, self.name, upper),
            (None, Some(upper)) => write!(f, "{}<:{}", self.name, upper),
            (Some(lower), None) => write!(f, "{}>:{}", self.name, lower),
            (None, None) => write!(f, "{}", self.name),
        }
    }
}

//! Value representation for reconstructed variables
//!
//! This module defines the closed set of value shapes a traced variable can hold.
//! Unlike the engine's JSON output, values here are tagged so every consumer has
//! to handle each shape explicitly.
//!
//! # Value Shapes
//!
//! - [`Value::Scalar`]: a single [`Scalar`] as reported by the engine
//! - [`Value::Array`]: an array of scalars (terminator already stripped)
//! - [`Value::Pointer`]: a resolved [`PointerTarget`]
//! - [`Value::PointerArray`]: an array of resolved pointer targets
//! - [`Value::Missing`]: the engine did not serialize a value for this kind
//!
//! Pointer-typed variables start out as raw [`Value::Scalar`] / [`Value::Array`]
//! addresses and are rewritten by the resolver (see [`super::resolve`]).

use super::stack::Scope;
use serde::{Deserialize, Serialize};

/// Memory address type (64-bit)
pub type Address = u64;

/// Declared base type of a traced variable, as named by the engine.
///
/// For arrays the engine reports the element type, not `Array`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Void,
    Int,
    Short,
    Char,
    Long,
    UnsignedInt,
    UnsignedShort,
    UnsignedLong,
    FP,
    Function,
    Macro,
    Pointer,
    Array,
    Struct,
    Union,
    Enum,
    GotoLabel,
    #[serde(rename = "_Type")]
    Type,
}

impl TypeTag {
    /// Name used by the engine for this tag
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Void => "Void",
            TypeTag::Int => "Int",
            TypeTag::Short => "Short",
            TypeTag::Char => "Char",
            TypeTag::Long => "Long",
            TypeTag::UnsignedInt => "UnsignedInt",
            TypeTag::UnsignedShort => "UnsignedShort",
            TypeTag::UnsignedLong => "UnsignedLong",
            TypeTag::FP => "FP",
            TypeTag::Function => "Function",
            TypeTag::Macro => "Macro",
            TypeTag::Pointer => "Pointer",
            TypeTag::Array => "Array",
            TypeTag::Struct => "Struct",
            TypeTag::Union => "Union",
            TypeTag::Enum => "Enum",
            TypeTag::GotoLabel => "GotoLabel",
            TypeTag::Type => "_Type",
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeTag::Pointer)
    }
}

/// A single scalar as it appears in the trace.
///
/// Integers that do not fit `i64` (large unsigned addresses) decode as
/// [`Scalar::Unsigned`]. Strings only show up for engine markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Interpret this scalar as a raw address, if it is a non-negative integer
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Scalar::Int(n) => u64::try_from(*n).ok(),
            Scalar::Unsigned(n) => Some(*n),
            Scalar::Float(_) | Scalar::Text(_) => None,
        }
    }

    pub fn is_text(&self, text: &str) -> bool {
        matches!(self, Scalar::Text(s) if s == text)
    }
}

/// Symbolic target of a pointer after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerTarget {
    /// The zero address
    Null,
    /// Start of a live variable, or of one element of a live array
    Resolved {
        frame: Scope,
        variable: String,
        index: Option<usize>,
    },
    /// Anything else: mid-element, heap, or dangling addresses
    Opaque(Address),
}

/// Value held by a [`super::stack::Variable`]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Scalar(Scalar),
    Array(Vec<Scalar>),
    Pointer(PointerTarget),
    PointerArray(Vec<PointerTarget>),
    #[default]
    Missing,
}

impl Value {
    /// Number of elements if this is an array-shaped value
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Value::Array(elements) => Some(elements.len()),
            Value::PointerArray(targets) => Some(targets.len()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_from_engine_name() {
        let tag: TypeTag = serde_json::from_str("\"Pointer\"").unwrap();
        assert_eq!(tag, TypeTag::Pointer);
        let tag: TypeTag = serde_json::from_str("\"_Type\"").unwrap();
        assert_eq!(tag, TypeTag::Type);
        assert_eq!(tag.as_str(), "_Type");
        assert!(serde_json::from_str::<TypeTag>("\"Banana\"").is_err());
    }

    #[test]
    fn test_scalar_decoding() {
        let values: Vec<Scalar> =
            serde_json::from_str("[5, -3, 18446744073709551615, 1.5, \"_dummy\"]").unwrap();
        assert_eq!(values[0], Scalar::Int(5));
        assert_eq!(values[1], Scalar::Int(-3));
        assert_eq!(values[2], Scalar::Unsigned(u64::MAX));
        assert_eq!(values[3], Scalar::Float(1.5));
        assert!(values[4].is_text("_dummy"));
    }

    #[test]
    fn test_scalar_as_address() {
        assert_eq!(Scalar::Int(4096).as_address(), Some(4096));
        assert_eq!(Scalar::Int(-1).as_address(), None);
        assert_eq!(Scalar::Unsigned(u64::MAX).as_address(), Some(u64::MAX));
        assert_eq!(Scalar::Text("x".into()).as_address(), None);
    }

    #[test]
    fn test_value_shape_mismatch_is_unequal() {
        let scalar = Value::Scalar(Scalar::Int(0));
        let pointer = Value::Pointer(PointerTarget::Null);
        assert_ne!(scalar, pointer);
        assert_eq!(Value::Array(vec![]).array_len(), Some(0));
        assert_eq!(scalar.array_len(), None);
    }
}

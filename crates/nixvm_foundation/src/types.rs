//! Type tags for values and heap buffers.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type tag carried by every value and every heap slot.
///
/// `Int`, `Float`, `Double`, `Char` and `Str` are element types a heap slot
/// can hold. `Ref` is only ever reported for values that point into the heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// 64-bit signed integer.
    Int,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// A single Unicode scalar value.
    Char,
    /// Fixed-width string (heap element type only).
    Str,
    /// Reference into the heap slot table.
    Ref,
}

impl Type {
    /// All types a heap slot may hold, in declaration order.
    pub const ELEMENT_TYPES: [Type; 5] =
        [Type::Int, Type::Float, Type::Double, Type::Char, Type::Str];

    /// Returns true if a heap slot may hold elements of this type.
    #[must_use]
    pub const fn is_element(self) -> bool {
        !matches!(self, Self::Ref)
    }

    /// Returns the mnemonic used for this type in program listings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::Str => "str",
            Self::Ref => "ref",
        }
    }

    /// Parses a type from its listing mnemonic.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "char" => Some(Self::Char),
            "str" => Some(Self::Str),
            "ref" => Some(Self::Ref),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

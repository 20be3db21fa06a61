//! Tagged runtime value.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::Type;

/// Tagged runtime value.
///
/// Every datum the machine touches is one of these. Scalars are stored at
/// their native width; `Ref` holds an index into the heap slot table instead
/// of an inline payload. Consumers match on the variant before reading the
/// payload, so a value is never read under a tag it was not created with.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// A single character (Unicode scalar value).
    Char(char),
    /// Reference to a heap slot.
    Ref(HeapRef),
}

/// Typed index into the heap slot table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeapRef {
    /// Slot index.
    pub slot: u32,
    /// Element type of the buffer the slot owns.
    pub elem: Type,
}

impl HeapRef {
    /// Creates a reference to `slot` holding elements of type `elem`.
    #[must_use]
    pub const fn new(slot: u32, elem: Type) -> Self {
        Self { slot, elem }
    }

    /// Returns the slot index as a `usize`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.slot as usize
    }

    /// Returns true if this refers to a string buffer.
    #[must_use]
    pub const fn is_str(self) -> bool {
        matches!(self.elem, Type::Str)
    }
}

impl fmt::Display for HeapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ref<{}>#{}", self.elem, self.slot)
    }
}

impl Value {
    /// Returns the type tag of this value.
    #[must_use]
    pub const fn value_type(&self) -> Type {
        match self {
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Double(_) => Type::Double,
            Self::Char(_) => Type::Char,
            Self::Ref(_) => Type::Ref,
        }
    }

    /// Returns true if the payload is a heap slot index rather than a scalar.
    #[must_use]
    pub const fn is_heap_ref(&self) -> bool {
        matches!(self, Self::Ref(_))
    }

    /// Returns true if both values carry the same tag.
    ///
    /// References only match when their element types match as well.
    #[must_use]
    pub fn same_tag(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ref(a), Self::Ref(b)) => a.elem == b.elem,
            _ => self.value_type() == other.value_type(),
        }
    }

    /// Returns the truthiness of a scalar, or `None` for references.
    ///
    /// Any non-zero scalar is true.
    #[must_use]
    pub fn truthiness(&self) -> Option<bool> {
        match self {
            Self::Int(n) => Some(*n != 0),
            Self::Float(n) => Some(*n != 0.0),
            Self::Double(n) => Some(*n != 0.0),
            Self::Char(c) => Some(*c != '\0'),
            Self::Ref(_) => None,
        }
    }

    /// Returns the zero value for an inline scalar type.
    #[must_use]
    pub const fn zero(ty: Type) -> Option<Self> {
        match ty {
            Type::Int => Some(Self::Int(0)),
            Type::Float => Some(Self::Float(0.0)),
            Type::Double => Some(Self::Double(0.0)),
            Type::Char => Some(Self::Char('\0')),
            Type::Str | Type::Ref => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a 32-bit float value.
    #[must_use]
    pub const fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a 64-bit float value.
    #[must_use]
    pub const fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a character.
    #[must_use]
    pub const fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// Attempts to extract a heap reference.
    #[must_use]
    pub const fn as_heap_ref(&self) -> Option<HeapRef> {
        match self {
            Self::Ref(r) => Some(*r),
            _ => None,
        }
    }
}

// Floats compare by bit pattern so that values are structurally comparable.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "Int({n})"),
            Self::Float(n) => write!(f, "Float({n})"),
            Self::Double(n) => write!(f, "Double({n})"),
            Self::Char(c) => write!(f, "Char({c:?})"),
            Self::Ref(r) => write!(f, "Ref({r})"),
        }
    }
}

/// Renders scalars the way `print` shows them.
///
/// Floats use fixed-point notation with six decimals. References render as
/// their slot; resolving them to text needs the heap.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:.6}"),
            Self::Double(n) => write!(f, "{n:.6}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Ref(r) => write!(f, "{r}"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Float(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Double(n)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

impl From<HeapRef> for Value {
    fn from(r: HeapRef) -> Self {
        Self::Ref(r)
    }
}

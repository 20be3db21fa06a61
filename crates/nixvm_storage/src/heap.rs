//! Heap slot table.
//!
//! Every allocation gets its own slot holding one homogeneous buffer. Values
//! refer to slots through [`HeapRef`] indices. Freed slots are tombstoned and
//! never handed out again, so a stale reference is always rejected with
//! `InvalidPointer` instead of silently aliasing a newer buffer.

#![allow(clippy::cast_possible_truncation)]

use std::fmt::Write as _;

use nixvm_foundation::{Error, ErrorKind, HeapRef, Result, Type, Value};
use tracing::debug;

/// Default maximum number of slots.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Default maximum number of characters in one string element.
pub const DEFAULT_MAX_STRING_LEN: usize = 1024;

/// Default maximum number of elements in one allocation.
pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 20;

/// Homogeneous buffer owned by an occupied slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    /// Integer elements.
    Int(Vec<i64>),
    /// 32-bit float elements.
    Float(Vec<f32>),
    /// 64-bit float elements.
    Double(Vec<f64>),
    /// Character elements.
    Char(Vec<char>),
    /// Fixed-width string elements.
    Str(Vec<String>),
}

impl Buffer {
    /// Creates a buffer of `count` zeroed elements, or `None` for `Type::Ref`.
    #[must_use]
    pub fn zeroed(elem: Type, count: usize) -> Option<Self> {
        Some(match elem {
            Type::Int => Self::Int(vec![0; count]),
            Type::Float => Self::Float(vec![0.0; count]),
            Type::Double => Self::Double(vec![0.0; count]),
            Type::Char => Self::Char(vec!['\0'; count]),
            Type::Str => Self::Str(vec![String::new(); count]),
            Type::Ref => return None,
        })
    }

    /// Returns the element type.
    #[must_use]
    pub const fn elem_type(&self) -> Type {
        match self {
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Double(_) => Type::Double,
            Self::Char(_) => Type::Char,
            Self::Str(_) => Type::Str,
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Char(v) => v.len(),
            Self::Str(v) => v.len(),
        }
    }

    /// Returns true if the buffer has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Occupied(Buffer),
    Freed,
}

/// Indirection table of independently owned, type-tagged buffers.
#[derive(Debug, Clone)]
pub struct HeapTable {
    slots: Vec<Slot>,
    capacity: usize,
    max_string_len: usize,
    max_elements: usize,
    live: usize,
}

impl Default for HeapTable {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HeapTable {
    /// Creates an empty table with room for `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_elements: DEFAULT_MAX_ELEMENTS,
            live: 0,
        }
    }

    /// Sets the maximum length of a string element, in characters.
    #[must_use]
    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    /// Sets the maximum number of elements a single allocation may hold.
    #[must_use]
    pub fn with_max_elements(mut self, count: usize) -> Self {
        self.max_elements = count;
        self
    }

    /// Appends a slot of `count` zeroed elements of type `elem`.
    ///
    /// # Errors
    /// Returns `HeapOverflow` if the table is full, and `InvalidDataType` if
    /// `elem` is not an element type or `count` exceeds the element limit.
    pub fn allocate(&mut self, elem: Type, count: usize) -> Result<HeapRef> {
        if count > self.max_elements {
            return Err(Error::invalid_data_type(format!(
                "allocation of {count} elements exceeds limit of {}",
                self.max_elements
            )));
        }
        let buffer = Buffer::zeroed(elem, count).ok_or_else(|| {
            Error::invalid_data_type(format!("cannot allocate elements of type {elem}"))
        })?;
        self.insert(buffer)
    }

    /// Allocates a one-element string slot holding `text`.
    ///
    /// # Errors
    /// Returns `HeapOverflow` if the table is full, and `InvalidDataType` if
    /// the text is longer than the maximum string length.
    pub fn alloc_str(&mut self, text: &str) -> Result<HeapRef> {
        self.check_str_len(text)?;
        self.insert(Buffer::Str(vec![text.to_owned()]))
    }

    fn insert(&mut self, buffer: Buffer) -> Result<HeapRef> {
        let overflow = || {
            Error::new(ErrorKind::HeapOverflow {
                capacity: self.capacity,
            })
        };
        if self.slots.len() >= self.capacity {
            return Err(overflow());
        }
        let slot = u32::try_from(self.slots.len()).map_err(|_| overflow())?;
        let elem = buffer.elem_type();
        debug!(slot, %elem, len = buffer.len(), "heap allocate");
        self.slots.push(Slot::Occupied(buffer));
        self.live += 1;
        Ok(HeapRef::new(slot, elem))
    }

    /// Releases the buffer behind `r` and tombstones its slot.
    ///
    /// # Errors
    /// Returns `InvalidPointer` if the slot is out of range, already freed,
    /// or holds a different element type than `r` claims.
    pub fn free(&mut self, r: HeapRef) -> Result<()> {
        self.resolve(r)?;
        self.slots[r.index()] = Slot::Freed;
        self.live -= 1;
        debug!(slot = r.slot, "heap free");
        Ok(())
    }

    /// Reads a scalar element.
    ///
    /// # Errors
    /// Returns `InvalidPointer` for a bad reference or out-of-bounds index,
    /// and `InvalidDataType` for string slots (use [`HeapTable::get_str`]).
    pub fn get(&self, r: HeapRef, index: usize) -> Result<Value> {
        let buffer = self.resolve(r)?;
        check_bounds(r, index, buffer.len())?;
        Ok(match buffer {
            Buffer::Int(v) => Value::Int(v[index]),
            Buffer::Float(v) => Value::Float(v[index]),
            Buffer::Double(v) => Value::Double(v[index]),
            Buffer::Char(v) => Value::Char(v[index]),
            Buffer::Str(_) => {
                return Err(Error::invalid_data_type(
                    "string elements are not scalar values",
                ));
            }
        })
    }

    /// Writes a scalar element.
    ///
    /// # Errors
    /// Returns `InvalidPointer` for a bad reference or out-of-bounds index,
    /// and `InvalidDataType` if the value's tag differs from the element type.
    pub fn set(&mut self, r: HeapRef, index: usize, value: Value) -> Result<()> {
        let buffer = self.resolve_mut(r)?;
        check_bounds(r, index, buffer.len())?;
        match (buffer, value) {
            (Buffer::Int(v), Value::Int(n)) => v[index] = n,
            (Buffer::Float(v), Value::Float(n)) => v[index] = n,
            (Buffer::Double(v), Value::Double(n)) => v[index] = n,
            (Buffer::Char(v), Value::Char(c)) => v[index] = c,
            (buffer, value) => {
                return Err(Error::type_mismatch(
                    buffer.elem_type(),
                    value.value_type(),
                ));
            }
        }
        Ok(())
    }

    /// Reads a string element.
    ///
    /// # Errors
    /// Returns `InvalidPointer` for a bad reference or out-of-bounds index,
    /// and `InvalidDataType` if the slot does not hold strings.
    pub fn get_str(&self, r: HeapRef, index: usize) -> Result<&str> {
        let buffer = self.resolve(r)?;
        check_bounds(r, index, buffer.len())?;
        match buffer {
            Buffer::Str(v) => Ok(&v[index]),
            other => Err(Error::type_mismatch(Type::Str, other.elem_type())),
        }
    }

    /// Writes a string element.
    ///
    /// # Errors
    /// Returns `InvalidPointer` for a bad reference or out-of-bounds index,
    /// and `InvalidDataType` if the slot does not hold strings or the text
    /// is too long.
    pub fn set_str(&mut self, r: HeapRef, index: usize, text: &str) -> Result<()> {
        self.check_str_len(text)?;
        let buffer = self.resolve_mut(r)?;
        check_bounds(r, index, buffer.len())?;
        match buffer {
            Buffer::Str(v) => {
                text.clone_into(&mut v[index]);
                Ok(())
            }
            other => Err(Error::type_mismatch(Type::Str, other.elem_type())),
        }
    }

    /// Returns the text of a one-element string slot.
    ///
    /// # Errors
    /// Same as [`HeapTable::get_str`] with index 0.
    pub fn text(&self, r: HeapRef) -> Result<&str> {
        self.get_str(r, 0)
    }

    /// Renders the slot the way `print` shows it.
    ///
    /// A one-element string slot renders as its text; any other buffer
    /// renders as a bracketed list of its elements.
    ///
    /// # Errors
    /// Returns `InvalidPointer` for a bad reference.
    pub fn render(&self, r: HeapRef) -> Result<String> {
        let buffer = self.resolve(r)?;
        if let Buffer::Str(v) = buffer {
            if let [text] = v.as_slice() {
                return Ok(text.clone());
            }
        }
        let items: Vec<String> = match buffer {
            Buffer::Int(v) => v.iter().map(|n| Value::Int(*n).to_string()).collect(),
            Buffer::Float(v) => v.iter().map(|n| Value::Float(*n).to_string()).collect(),
            Buffer::Double(v) => v.iter().map(|n| Value::Double(*n).to_string()).collect(),
            Buffer::Char(v) => v.iter().map(char::to_string).collect(),
            Buffer::Str(v) => v.clone(),
        };
        let mut out = String::from("[");
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{item}");
        }
        out.push(']');
        Ok(out)
    }

    /// Returns the number of elements in the slot behind `r`.
    ///
    /// # Errors
    /// Returns `InvalidPointer` for a bad reference.
    pub fn element_count(&self, r: HeapRef) -> Result<usize> {
        self.resolve(r).map(Buffer::len)
    }

    /// Returns the buffer behind `r`.
    ///
    /// # Errors
    /// Returns `InvalidPointer` for a bad reference.
    pub fn buffer(&self, r: HeapRef) -> Result<&Buffer> {
        self.resolve(r)
    }

    /// Returns true if `r` names an occupied slot of the claimed element type.
    #[must_use]
    pub fn is_live(&self, r: HeapRef) -> bool {
        self.resolve(r).is_ok()
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Returns the number of slots ever allocated, freed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if nothing was ever allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the maximum number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Releases every slot. Only used when a program restarts.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.live = 0;
    }

    fn check_str_len(&self, text: &str) -> Result<()> {
        let len = text.chars().count();
        if len > self.max_string_len {
            return Err(Error::invalid_data_type(format!(
                "string of {len} characters exceeds maximum length {}",
                self.max_string_len
            )));
        }
        Ok(())
    }

    fn resolve(&self, r: HeapRef) -> Result<&Buffer> {
        match self.slots.get(r.index()) {
            None => Err(Error::invalid_pointer(format!(
                "slot {} out of range ({} slots)",
                r.slot,
                self.slots.len()
            ))),
            Some(Slot::Freed) => Err(Error::invalid_pointer(format!(
                "slot {} was freed",
                r.slot
            ))),
            Some(Slot::Occupied(buffer)) => {
                if buffer.elem_type() == r.elem {
                    Ok(buffer)
                } else {
                    Err(Error::invalid_pointer(format!(
                        "{r} points at a slot holding {}",
                        buffer.elem_type()
                    )))
                }
            }
        }
    }

    fn resolve_mut(&mut self, r: HeapRef) -> Result<&mut Buffer> {
        self.resolve(r)?;
        match &mut self.slots[r.index()] {
            Slot::Occupied(buffer) => Ok(buffer),
            Slot::Freed => Err(Error::invalid_pointer(format!(
                "slot {} was freed",
                r.slot
            ))),
        }
    }
}

fn check_bounds(r: HeapRef, index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::invalid_pointer(format!(
            "index {index} out of bounds for slot {} of {len} elements",
            r.slot
        )));
    }
    Ok(())
}

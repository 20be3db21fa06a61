//! Flat variable environment.
//!
//! Bindings are addressed by index; names are resolved before a program
//! reaches the machine. The environment only grows while a program runs.

use nixvm_foundation::{Error, HeapRef, Result, Type, Value};
use tracing::debug;

use crate::heap::HeapTable;

/// Default maximum number of bindings.
pub const DEFAULT_CAPACITY: usize = 512;

/// A declared variable: its current value and the type it was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Declared type. Fixed for the binding's lifetime.
    pub ty: Type,
    /// Current value.
    pub value: Value,
}

/// Append-only sequence of bindings.
#[derive(Debug, Clone)]
pub struct Environment {
    bindings: Vec<Binding>,
    capacity: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Environment {
    /// Creates an empty environment with room for `capacity` bindings.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            bindings: Vec::new(),
            capacity,
        }
    }

    /// Appends a binding typed after `value` and returns its index.
    ///
    /// # Errors
    /// Returns `InvalidStackAccess` when the environment is full.
    pub fn declare(&mut self, value: Value) -> Result<usize> {
        let index = self.bindings.len();
        if index >= self.capacity {
            return Err(Error::invalid_stack_access(index, self.capacity));
        }
        self.bindings.push(Binding {
            ty: value.value_type(),
            value,
        });
        Ok(index)
    }

    /// Returns the index of the most recently declared binding.
    ///
    /// # Errors
    /// Returns `InvalidStackAccess` when nothing has been declared.
    pub fn current(&self) -> Result<usize> {
        self.bindings
            .len()
            .checked_sub(1)
            .ok_or_else(|| Error::invalid_stack_access(0, 0))
    }

    /// Returns the value bound at `index`.
    ///
    /// # Errors
    /// Returns `InvalidStackAccess` for an out-of-range index.
    pub fn read(&self, index: usize) -> Result<Value> {
        self.binding(index).map(|b| b.value)
    }

    /// Returns the binding at `index`.
    ///
    /// # Errors
    /// Returns `InvalidStackAccess` for an out-of-range index.
    pub fn binding(&self, index: usize) -> Result<&Binding> {
        self.bindings
            .get(index)
            .ok_or_else(|| Error::invalid_stack_access(index, self.bindings.len()))
    }

    /// Overwrites the value bound at `index`.
    ///
    /// When a string binding is overwritten, its previous slot is freed if
    /// it is still live, not the slot being stored, and not held by another
    /// binding. `load` followed by `declare` shares a slot between bindings.
    ///
    /// # Errors
    /// Returns `InvalidStackAccess` for an out-of-range index and
    /// `InvalidDataType` if `value` does not have the binding's type.
    pub fn write(&mut self, index: usize, value: Value, heap: &mut HeapTable) -> Result<()> {
        let len = self.bindings.len();
        let binding = self
            .bindings
            .get_mut(index)
            .ok_or_else(|| Error::invalid_stack_access(index, len))?;

        if !binding.value.same_tag(&value) {
            return Err(Error::invalid_data_type(format!(
                "cannot assign {} to variable {index} declared as {}",
                describe(value),
                describe(binding.value)
            )));
        }

        let previous = std::mem::replace(&mut binding.value, value);
        if let (Value::Ref(old), Value::Ref(new)) = (previous, value) {
            if old.is_str() && old != new && heap.is_live(old) && !self.holds(old) {
                debug!(variable = index, slot = old.slot, "release overwritten string");
                heap.free(old)?;
            }
        }
        Ok(())
    }

    /// Returns true if any binding currently refers to `r`.
    #[must_use]
    pub fn holds(&self, r: HeapRef) -> bool {
        self.bindings
            .iter()
            .any(|b| matches!(b.value, Value::Ref(held) if held == r))
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Returns the maximum number of bindings.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every binding.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Iterates over bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }
}

fn describe(value: Value) -> String {
    match value {
        Value::Ref(r) => format!("ref<{}>", r.elem),
        other => other.value_type().to_string(),
    }
}

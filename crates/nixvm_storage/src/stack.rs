//! Bounded operand stack.
//!
//! The stack never grows past its capacity: pushing onto a full stack and
//! popping an empty one are errors rather than undefined reads.

use nixvm_foundation::{Error, ErrorKind, Result, Value};

/// Reference capacity of the operand stack.
pub const DEFAULT_CAPACITY: usize = 256;

/// Bounded last-in-first-out sequence of tagged values.
#[derive(Debug, Clone)]
pub struct OperandStack {
    values: Vec<Value>,
    capacity: usize,
}

impl Default for OperandStack {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl OperandStack {
    /// Creates an empty stack holding at most `capacity` values.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes a value.
    ///
    /// # Errors
    /// Returns `StackOverflow` if the stack is at capacity.
    pub fn push(&mut self, value: Value) -> Result<()> {
        if self.values.len() >= self.capacity {
            return Err(Error::new(ErrorKind::StackOverflow {
                capacity: self.capacity,
            }));
        }
        self.values.push(value);
        Ok(())
    }

    /// Removes and returns the top value.
    ///
    /// # Errors
    /// Returns `StackUnderflow` if the stack is empty.
    pub fn pop(&mut self) -> Result<Value> {
        self.values
            .pop()
            .ok_or_else(|| Error::new(ErrorKind::StackUnderflow))
    }

    /// Returns the `k`-th value from the top without removing it (0 = top).
    ///
    /// # Errors
    /// Returns `InvalidStackAccess` if `k >= len`.
    pub fn peek(&self, k: usize) -> Result<Value> {
        let len = self.values.len();
        if k >= len {
            return Err(Error::invalid_stack_access(k, len));
        }
        Ok(self.values[len - 1 - k])
    }

    /// Returns the number of values on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the stack holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the maximum number of values the stack can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Iterates from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

//! Machine limits.

use nixvm_storage::{environment, heap, stack};

/// Default maximum nesting of function and macro calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Limits applied to one machine instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Operand stack capacity.
    pub stack_capacity: usize,

    /// Maximum number of heap slots ever allocated.
    ///
    /// Freed slots are tombstoned, never reused, so they still count against
    /// this limit. A loop that allocates on every pass, such as one printing
    /// a `str` literal, overflows after this many passes even if it frees
    /// each slot.
    pub heap_capacity: usize,

    /// Maximum number of declared variables.
    pub env_capacity: usize,

    /// Maximum characters in one string element.
    pub max_string_len: usize,

    /// Maximum nesting of function and macro calls.
    pub max_call_depth: usize,

    /// Instruction budget; `None` runs until the program ends.
    pub max_steps: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_capacity: stack::DEFAULT_CAPACITY,
            heap_capacity: heap::DEFAULT_CAPACITY,
            env_capacity: environment::DEFAULT_CAPACITY,
            max_string_len: heap::DEFAULT_MAX_STRING_LEN,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_steps: None,
        }
    }
}

impl VmConfig {
    /// Builder method to set the operand stack capacity.
    #[must_use]
    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = capacity;
        self
    }

    /// Builder method to set the heap slot capacity.
    #[must_use]
    pub fn with_heap_capacity(mut self, capacity: usize) -> Self {
        self.heap_capacity = capacity;
        self
    }

    /// Builder method to set the variable capacity.
    #[must_use]
    pub fn with_env_capacity(mut self, capacity: usize) -> Self {
        self.env_capacity = capacity;
        self
    }

    /// Builder method to set the maximum string length.
    #[must_use]
    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    /// Builder method to set the maximum call depth.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Builder method to set the instruction budget.
    #[must_use]
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }
}

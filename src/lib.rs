//! Nixvm - Stack-based bytecode interpreter
//!
//! This crate re-exports all layers of the Nixvm system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: nixvm_runtime    - CLI, logging setup, program images
//! Layer 2: nixvm_language   - Instruction set, assembler, control flow, VM
//! Layer 1: nixvm_storage    - Operand stack, heap slot table, environment
//! Layer 0: nixvm_foundation - Core types (Value, Type, Error)
//! ```

pub use nixvm_foundation as foundation;
pub use nixvm_language as language;
pub use nixvm_runtime as runtime;
pub use nixvm_storage as storage;

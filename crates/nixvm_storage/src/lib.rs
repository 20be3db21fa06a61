//! Runtime structures for the Nixvm interpreter.
//!
//! This crate provides:
//! - [`OperandStack`] - Bounded LIFO of tagged values
//! - [`HeapTable`] - Indirection table of typed, independently owned buffers
//! - [`Environment`] - Flat, append-only variable bindings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod environment;
pub mod heap;
pub mod stack;

pub use environment::{Binding, Environment};
pub use heap::{Buffer, HeapTable};
pub use stack::OperandStack;

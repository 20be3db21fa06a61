//! Core types for the Nixvm interpreter.
//!
//! This crate provides:
//! - [`Value`] - The tagged runtime value every instruction operates on
//! - [`HeapRef`] - A typed index into the heap slot table
//! - [`Type`] - Type tags for values and heap buffers
//! - [`Error`] - Error kinds with instruction context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod types;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind, Limit, Result};
pub use types::Type;
pub use value::{HeapRef, Value};

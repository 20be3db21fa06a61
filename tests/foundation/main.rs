//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, HeapRef, Type, and Error.

mod errors;

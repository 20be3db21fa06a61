//! Integration tests for Layer 1: Storage
//!
//! Tests for the operand stack, heap slot table, and variable environment.

mod environment;
mod heap;
mod stack;

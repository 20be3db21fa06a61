//! Integration tests for Layer 2: Language
//!
//! Tests for the listing assembler, control-flow validation, and the VM.

mod assembler;
mod control;
mod vm;

//! Cross-layer integration tests for Nixvm
//!
//! Tests that verify correct interaction between multiple crates.

mod images;
mod programs;

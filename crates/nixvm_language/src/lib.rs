//! Instruction set, listing assembler, and bytecode VM for Nixvm.
//!
//! This crate provides:
//! - [`Opcode`] and [`Program`] - The instruction set and instruction sequences
//! - [`Lexer`] and [`assemble`] - Text listings to programs
//! - [`control`] - Structured control-flow scanning and validation
//! - [`Vm`] - Stack-based interpreter with a tagged heap and variable bindings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod assembler;
pub mod config;
pub mod control;
pub mod lexer;
pub mod opcode;
pub mod span;
pub mod token;
pub mod vm;


pub use assembler::{Assembler, assemble, assemble_strict};
pub use config::VmConfig;
pub use lexer::Lexer;
pub use opcode::{Opcode, Program, ServiceOp};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use vm::{NoServices, Output, ServiceCall, Services, Vm};

//! Error types for the Nixvm interpreter.
//!
//! Uses `thiserror` for error definitions. Every failure aborts the current
//! program run; the error carries its kind, a human-readable cause, and
//! optionally where in the program it happened.

use std::fmt;

use thiserror::Error;

use crate::types::Type;

/// Result type used throughout Nixvm.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Nixvm operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an invalid data type error.
    #[must_use]
    pub fn invalid_data_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDataType(message.into()))
    }

    /// Creates a type mismatch error between an expected and an actual tag.
    #[must_use]
    pub fn type_mismatch(expected: Type, actual: Type) -> Self {
        Self::invalid_data_type(format!("expected {expected}, got {actual}"))
    }

    /// Creates an invalid pointer error.
    #[must_use]
    pub fn invalid_pointer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPointer(message.into()))
    }

    /// Creates an illegal instruction error.
    #[must_use]
    pub fn illegal_instruction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IllegalInstruction(message.into()))
    }

    /// Creates an error for a jump target outside the program.
    #[must_use]
    pub fn jump_out_of_range(target: usize, len: usize) -> Self {
        Self::new(ErrorKind::InvalidJump(format!(
            "target {target} outside program of {len} instructions"
        )))
    }

    /// Creates an error for a block opener with no matching closer.
    #[must_use]
    pub fn unmatched_block(opener: &str, at: usize) -> Self {
        Self::new(ErrorKind::InvalidJump(format!(
            "no matching boundary for `{opener}` at instruction {at}"
        )))
    }

    /// Creates an invalid stack access error.
    #[must_use]
    pub fn invalid_stack_access(index: usize, len: usize) -> Self {
        Self::new(ErrorKind::InvalidStackAccess { index, len })
    }

    /// Creates a parse error at the given position.
    #[must_use]
    pub fn parse(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::ParseError {
            message: message.into(),
            line,
            column,
        })
    }

    /// Returns the stable numeric code of this error's kind.
    #[must_use]
    pub const fn code(&self) -> i32 {
        self.kind.code()
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Push onto a full operand stack, or too many nested calls.
    #[error("stack overflow (capacity {capacity})")]
    StackOverflow {
        /// The configured capacity.
        capacity: usize,
    },

    /// Pop from an empty operand stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// Out-of-range stack peek or variable index.
    #[error("invalid stack access: index {index} (length {len})")]
    InvalidStackAccess {
        /// The index that was accessed.
        index: usize,
        /// The length of the accessed sequence.
        len: usize,
    },

    /// Branch or jump target outside the program, or an unmatched block.
    #[error("invalid jump: {0}")]
    InvalidJump(String),

    /// Tag mismatch, division by zero, or operator unsupported for a tag.
    #[error("invalid data type: {0}")]
    InvalidDataType(String),

    /// Heap reference that is freed, out of range, or mistyped.
    #[error("invalid pointer: {0}")]
    InvalidPointer(String),

    /// Instruction not valid at this point in the program.
    #[error("illegal instruction: {0}")]
    IllegalInstruction(String),

    /// The heap slot table is full.
    #[error("heap overflow (capacity {capacity} slots)")]
    HeapOverflow {
        /// The configured capacity.
        capacity: usize,
    },

    /// Instruction accepted by the machine but not implemented by its services.
    #[error("not implemented in this core: {0}")]
    NotImplemented(String),

    /// A configured execution limit was exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(Limit),

    /// Malformed program listing.
    #[error("parse error at {line}:{column}: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// File system failure.
    #[error("io error: {0}")]
    IoError(String),

    /// Program image could not be encoded or decoded.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl ErrorKind {
    /// Returns a stable numeric code for this kind.
    ///
    /// Codes are never renumbered; new kinds take the next free code.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::StackOverflow { .. } => 0,
            Self::StackUnderflow => 1,
            Self::InvalidJump(_) => 2,
            Self::InvalidStackAccess { .. } => 3,
            Self::InvalidDataType(_) => 4,
            Self::IllegalInstruction(_) => 5,
            Self::ParseError { .. } => 6,
            Self::InvalidPointer(_) => 7,
            Self::HeapOverflow { .. } => 8,
            Self::NotImplemented(_) => 9,
            Self::LimitExceeded(_) => 10,
            Self::IoError(_) => 11,
            Self::SerializationError(_) => 12,
        }
    }

    /// Returns the short name of this kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StackOverflow { .. } => "StackOverflow",
            Self::StackUnderflow => "StackUnderflow",
            Self::InvalidStackAccess { .. } => "InvalidStackAccess",
            Self::InvalidJump(_) => "InvalidJump",
            Self::InvalidDataType(_) => "InvalidDataType",
            Self::InvalidPointer(_) => "InvalidPointer",
            Self::IllegalInstruction(_) => "IllegalInstruction",
            Self::HeapOverflow { .. } => "HeapOverflow",
            Self::NotImplemented(_) => "NotImplemented",
            Self::LimitExceeded(_) => "LimitExceeded",
            Self::ParseError { .. } => "ParseError",
            Self::IoError(_) => "IoError",
            Self::SerializationError(_) => "SerializationError",
        }
    }
}

/// Execution limits that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Limit {
    /// Maximum number of executed instructions.
    MaxSteps {
        /// The configured limit.
        limit: u64,
    },
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxSteps { limit } => write!(f, "max steps ({limit}) exceeded"),
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Program file the error came from.
    pub source: Option<String>,
    /// Instruction pointer at the failing instruction.
    pub ip: Option<usize>,
    /// Rendered failing instruction.
    pub instruction: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the program source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the failing instruction and its position.
    #[must_use]
    pub fn with_instruction(mut self, ip: usize, instruction: impl Into<String>) -> Self {
        self.ip = Some(ip);
        self.instruction = Some(instruction.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(source) = &self.source {
            write!(f, "in {source}")?;
            wrote = true;
        }
        if let Some(ip) = self.ip {
            if wrote {
                write!(f, " ")?;
            }
            write!(f, "at instruction {ip}")?;
            if let Some(instruction) = &self.instruction {
                write!(f, " (`{instruction}`)")?;
            }
        }
        Ok(())
    }
}

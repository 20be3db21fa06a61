//! Integration tests for Error types
//!
//! Tests error construction, display, context, and stable codes.

use nixvm_foundation::{Error, ErrorContext, ErrorKind, Limit, Type};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_type_mismatch() {
    let err = Error::type_mismatch(Type::Int, Type::Double);
    assert!(matches!(err.kind, ErrorKind::InvalidDataType(_)));
    let msg = format!("{err}");
    assert!(msg.contains("int"));
    assert!(msg.contains("double"));
}

#[test]
fn error_jump_out_of_range() {
    let err = Error::jump_out_of_range(12, 4);
    assert!(matches!(err.kind, ErrorKind::InvalidJump(_)));
    let msg = format!("{err}");
    assert!(msg.contains("12"));
}

#[test]
fn error_unmatched_block() {
    let err = Error::unmatched_block("while", 3);
    assert!(matches!(err.kind, ErrorKind::InvalidJump(_)));
    assert!(format!("{err}").contains("while"));
}

#[test]
fn error_invalid_stack_access() {
    let err = Error::invalid_stack_access(5, 2);
    assert!(matches!(
        err.kind,
        ErrorKind::InvalidStackAccess { index: 5, len: 2 }
    ));
}

#[test]
fn error_parse_position() {
    let err = Error::parse("unknown instruction `x`", 3, 7);
    let msg = format!("{err}");
    assert!(msg.contains("3:7"));
    assert!(msg.contains("unknown instruction"));
}

// =============================================================================
// Error Display
// =============================================================================

#[test]
fn error_display_kinds() {
    assert_eq!(
        Error::new(ErrorKind::StackUnderflow).to_string(),
        "stack underflow"
    );
    assert_eq!(
        Error::new(ErrorKind::StackOverflow { capacity: 8 }).to_string(),
        "stack overflow (capacity 8)"
    );
    assert_eq!(
        Error::new(ErrorKind::LimitExceeded(Limit::MaxSteps { limit: 10 })).to_string(),
        "limit exceeded: max steps (10) exceeded"
    );
}

#[test]
fn error_context_display() {
    let context = ErrorContext::new()
        .with_source("prog.nix")
        .with_instruction(4, "div");
    assert_eq!(context.to_string(), "in prog.nix at instruction 4 (`div`)");

    let err = Error::illegal_instruction("`func_ret` outside of a call").with_context(context);
    assert_eq!(err.context.as_ref().and_then(|c| c.ip), Some(4));
}

// =============================================================================
// Codes
// =============================================================================

#[test]
fn error_codes_are_stable() {
    assert_eq!(Error::new(ErrorKind::StackOverflow { capacity: 1 }).code(), 0);
    assert_eq!(Error::new(ErrorKind::StackUnderflow).code(), 1);
    assert_eq!(Error::jump_out_of_range(1, 0).code(), 2);
    assert_eq!(Error::invalid_stack_access(0, 0).code(), 3);
    assert_eq!(Error::invalid_data_type("x").code(), 4);
    assert_eq!(Error::illegal_instruction("x").code(), 5);
    assert_eq!(Error::parse("x", 1, 1).code(), 6);
    assert_eq!(Error::invalid_pointer("x").code(), 7);
}

#[test]
fn error_kind_names() {
    assert_eq!(
        ErrorKind::NotImplemented("sql_query".into()).name(),
        "NotImplemented"
    );
    assert_eq!(ErrorKind::HeapOverflow { capacity: 2 }.name(), "HeapOverflow");
}

//! Integration tests for structured control-flow resolution

use nixvm_foundation::ErrorKind;
use nixvm_language::Opcode::{
    Else, Elif, EndIf, EndWhile, If, Int, Println, RunWhile, Then, While,
};
use nixvm_language::{Program, control};

#[test]
fn branch_boundaries_skip_nested_blocks() {
    let ops = vec![
        Int(0),
        If,
        Int(1),
        If,
        Else,
        EndIf,
        Elif,
        Int(1),
        Then,
        Else,
        EndIf,
    ];
    assert_eq!(control::find_branch_boundary(&ops, 1).unwrap(), 6);
    assert_eq!(control::find_branch_boundary(&ops, 8).unwrap(), 9);
    assert_eq!(control::find_endif(&ops, 9).unwrap(), 10);
    assert_eq!(control::find_endif(&ops, 6).unwrap(), 10);
}

#[test]
fn loop_boundaries_match_nesting() {
    let ops = vec![
        While, Int(1), RunWhile, While, Int(1), RunWhile, EndWhile, EndWhile,
    ];
    assert_eq!(control::find_end_while(&ops, 2).unwrap(), 7);
    assert_eq!(control::find_end_while(&ops, 5).unwrap(), 6);
    assert_eq!(control::find_while(&ops, 7).unwrap(), 0);
    assert_eq!(control::find_while(&ops, 6).unwrap(), 3);
}

#[test]
fn unmatched_blocks_are_invalid_jumps() {
    let err = control::find_end_while(&[While, Int(1), RunWhile], 2).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidJump(_)));
    let err = control::find_branch_boundary(&[Int(0), If, Println], 1).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidJump(_)));
}

#[test]
fn validate_balanced_programs() {
    let ok = Program::from(vec![Int(1), If, Int(2), Println, EndIf]);
    assert!(control::validate(&ok).is_ok());

    let crossed = Program::from(vec![While, Int(1), RunWhile, If, EndWhile, EndIf]);
    assert!(control::validate(&crossed).is_err());

    let stray = Program::from(vec![Else]);
    assert!(control::validate(&stray).is_err());
}

//! Integration tests for OperandStack

use nixvm_foundation::{ErrorKind, Value};
use nixvm_storage::OperandStack;
use proptest::prelude::*;

#[test]
fn lifo_order() {
    let mut stack = OperandStack::new(4);
    stack.push(Value::Int(1)).unwrap();
    stack.push(Value::Char('b')).unwrap();
    assert_eq!(stack.pop().unwrap(), Value::Char('b'));
    assert_eq!(stack.pop().unwrap(), Value::Int(1));
    assert!(stack.is_empty());
}

#[test]
fn overflow_and_underflow() {
    let mut stack = OperandStack::new(1);
    stack.push(Value::Int(1)).unwrap();
    let err = stack.push(Value::Int(2)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StackOverflow { capacity: 1 }));
    assert_eq!(stack.len(), 1);

    stack.pop().unwrap();
    let err = stack.pop().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StackUnderflow));
}

#[test]
fn peek_from_top() {
    let mut stack = OperandStack::new(8);
    for n in 0..3 {
        stack.push(Value::Int(n)).unwrap();
    }
    assert_eq!(stack.peek(0).unwrap(), Value::Int(2));
    assert_eq!(stack.peek(2).unwrap(), Value::Int(0));
    let err = stack.peek(3).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidStackAccess { index: 3, len: 3 }));
}

proptest! {
    #[test]
    fn push_then_pop_restores_stack(values in prop::collection::vec(any::<i64>(), 0..32), v: i64) {
        let mut stack = OperandStack::new(64);
        for n in &values {
            stack.push(Value::Int(*n)).unwrap();
        }
        let before: Vec<Value> = stack.iter().copied().collect();
        stack.push(Value::Int(v)).unwrap();
        prop_assert_eq!(stack.pop().unwrap(), Value::Int(v));
        let after: Vec<Value> = stack.iter().copied().collect();
        prop_assert_eq!(before, after);
    }
}

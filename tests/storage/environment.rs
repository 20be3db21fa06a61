//! Integration tests for Environment

use nixvm_foundation::{ErrorKind, Type, Value};
use nixvm_storage::{Environment, HeapTable};

#[test]
fn declare_read_write() {
    let mut heap = HeapTable::default();
    let mut env = Environment::default();
    let x = env.declare(Value::Int(1)).unwrap();
    let y = env.declare(Value::Double(0.5)).unwrap();
    assert_eq!((x, y), (0, 1));
    assert_eq!(env.current().unwrap(), 1);

    env.write(x, Value::Int(9), &mut heap).unwrap();
    assert_eq!(env.read(x).unwrap(), Value::Int(9));
    assert_eq!(env.binding(y).unwrap().ty, Type::Double);
}

#[test]
fn writes_keep_the_declared_tag() {
    let mut heap = HeapTable::default();
    let mut env = Environment::default();
    env.declare(Value::Int(1)).unwrap();
    let err = env.write(0, Value::Char('x'), &mut heap).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDataType(_)));
    assert_eq!(env.read(0).unwrap(), Value::Int(1));
}

#[test]
fn overwritten_strings_are_released() {
    let mut heap = HeapTable::default();
    let mut env = Environment::default();
    let old = heap.alloc_str("old").unwrap();
    let new = heap.alloc_str("new").unwrap();
    env.declare(Value::Ref(old)).unwrap();
    env.write(0, Value::Ref(new), &mut heap).unwrap();
    assert!(!heap.is_live(old));
    assert!(heap.is_live(new));
}

#[test]
fn bad_indices() {
    let mut heap = HeapTable::default();
    let mut env = Environment::new(1);
    assert!(matches!(
        env.current().unwrap_err().kind,
        ErrorKind::InvalidStackAccess { .. }
    ));
    env.declare(Value::Int(0)).unwrap();
    assert!(env.declare(Value::Int(0)).is_err());
    assert!(matches!(
        env.read(4).unwrap_err().kind,
        ErrorKind::InvalidStackAccess { index: 4, len: 1 }
    ));
    assert!(env.write(4, Value::Int(0), &mut heap).is_err());
}

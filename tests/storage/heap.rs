//! Integration tests for HeapTable

use nixvm_foundation::{ErrorKind, Type, Value};
use nixvm_storage::{Buffer, HeapTable};

#[test]
fn int_buffer_set_get_free() {
    let mut heap = HeapTable::default();
    let r = heap.allocate(Type::Int, 4).unwrap();
    for i in 0..4 {
        assert_eq!(heap.get(r, i).unwrap(), Value::Int(0));
    }
    for (i, n) in (0..4).zip(10i64..) {
        heap.set(r, i, Value::Int(n)).unwrap();
    }
    for (i, n) in (0..4).zip(10i64..) {
        assert_eq!(heap.get(r, i).unwrap(), Value::Int(n));
    }

    heap.free(r).unwrap();
    assert!(matches!(heap.get(r, 0).unwrap_err().kind, ErrorKind::InvalidPointer(_)));
    assert!(matches!(
        heap.set(r, 0, Value::Int(1)).unwrap_err().kind,
        ErrorKind::InvalidPointer(_)
    ));
    assert!(matches!(heap.free(r).unwrap_err().kind, ErrorKind::InvalidPointer(_)));
}

#[test]
fn out_of_bounds_index() {
    let mut heap = HeapTable::default();
    let r = heap.allocate(Type::Double, 2).unwrap();
    assert!(matches!(heap.get(r, 2).unwrap_err().kind, ErrorKind::InvalidPointer(_)));
}

#[test]
fn element_tags_are_enforced() {
    let mut heap = HeapTable::default();
    let r = heap.allocate(Type::Char, 1).unwrap();
    let err = heap.set(r, 0, Value::Int(65)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDataType(_)));
    heap.set(r, 0, Value::Char('A')).unwrap();
    assert_eq!(heap.render(r).unwrap(), "[A]");
}

#[test]
fn string_slots() {
    let mut heap = HeapTable::default();
    let r = heap.alloc_str("hello").unwrap();
    assert_eq!(heap.text(r).unwrap(), "hello");
    assert_eq!(heap.render(r).unwrap(), "hello");
    heap.set_str(r, 0, "bye").unwrap();
    assert_eq!(heap.text(r).unwrap(), "bye");
    assert!(matches!(heap.buffer(r).unwrap(), Buffer::Str(_)));
}

#[test]
fn string_length_limit() {
    let mut heap = HeapTable::default().with_max_string_len(4);
    assert!(heap.alloc_str("four").is_ok());
    let err = heap.alloc_str("fives").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDataType(_)));
}

#[test]
fn capacity_and_tombstones() {
    let mut heap = HeapTable::new(2);
    let a = heap.allocate(Type::Int, 1).unwrap();
    heap.allocate(Type::Int, 1).unwrap();
    heap.free(a).unwrap();
    assert_eq!(heap.live_count(), 1);
    assert_eq!(heap.len(), 2);
    let err = heap.allocate(Type::Int, 1).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::HeapOverflow { capacity: 2 }));
}

#[test]
fn refs_cannot_be_allocated() {
    let mut heap = HeapTable::default();
    let err = heap.allocate(Type::Ref, 1).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDataType(_)));
}

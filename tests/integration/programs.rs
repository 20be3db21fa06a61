//! Whole programs exercising several layers at once.

use nixvm::foundation::{ErrorKind, Value};
use nixvm::language::{Vm, VmConfig, assemble_strict};

fn run(source: &str, config: VmConfig) -> (Vm, nixvm::foundation::Result<()>) {
    let program = assemble_strict(source).unwrap();
    let mut vm = Vm::capturing(config);
    let result = vm.run(&program);
    (vm, result)
}

#[test]
fn fizzbuzz() {
    let source = "
  int 1
  declare
  while
    load 0
    int 16
    lt
  run_while
    load 0
    int 15
    mod
    int 0
    eq
    if
      str \"FizzBuzz\"
      println
    elif
      load 0
      int 3
      mod
      int 0
      eq
    then
      str \"Fizz\"
      println
    elif
      load 0
      int 5
      mod
      int 0
      eq
    then
      str \"Buzz\"
      println
    else
      load 0
      println
    endif
    load 0
    int 1
    plus
    reassign 0
  end_while
";
    let (vm, result) = run(source, VmConfig::default());
    result.unwrap();
    let lines: Vec<&str> = vm.output().lines().collect();
    assert_eq!(lines.len(), 15);
    assert_eq!(lines[2], "Fizz");
    assert_eq!(lines[4], "Buzz");
    assert_eq!(lines[14], "FizzBuzz");
    assert_eq!(lines[6], "7");
}

#[test]
fn recursion_is_bounded_by_call_depth() {
    let source = "
  jump main
forever:
  func_def
    func_call forever
  func_ret
main:
  func_call forever
";
    let (_, result) = run(source, VmConfig::default().with_max_call_depth(32));
    let err = result.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::StackOverflow { capacity: 32 }));
    let context = err.context.unwrap();
    assert_eq!(context.instruction.as_deref(), Some("func_call 1"));
}

#[test]
fn operand_stack_capacity_is_configurable() {
    let source = "
  while
    int 1
  run_while
    int 0
  end_while
";
    let (vm, result) = run(source, VmConfig::default().with_stack_capacity(8));
    assert!(matches!(result.unwrap_err().kind, ErrorKind::StackOverflow { capacity: 8 }));
    assert_eq!(vm.stack().len(), 8);
}

#[test]
fn mixed_tags_do_not_coerce() {
    let (_, result) = run("int 1\ndouble 2.0\nplus\n", VmConfig::default());
    assert!(matches!(result.unwrap_err().kind, ErrorKind::InvalidDataType(_)));
}

#[test]
fn machines_are_independent() {
    let program = assemble_strict("int 5\ndeclare\nload 0\nprintln\n").unwrap();
    let mut a = Vm::capturing(VmConfig::default());
    let mut b = Vm::capturing(VmConfig::default());
    a.run(&program).unwrap();
    b.run(&program).unwrap();
    assert_eq!(a.env().len(), 1);
    assert_eq!(b.env().read(0).unwrap(), Value::Int(5));

    a.reset();
    assert!(a.env().is_empty());
    assert_eq!(a.output(), "");
    assert_eq!(b.output(), "5\n");
}

//! Integration tests for the VM
//!
//! Runs assembled listings and checks printed output and errors.

use nixvm_foundation::{ErrorKind, Limit, Result, Value};
use nixvm_language::{
    Opcode, Program, ServiceCall, ServiceOp, Services, Vm, VmConfig, assemble_strict,
};

fn run_listing(source: &str) -> (Vm, Result<()>) {
    let program = assemble_strict(source).unwrap();
    let mut vm = Vm::capturing(VmConfig::default());
    let result = vm.run(&program);
    (vm, result)
}

fn output_of(source: &str) -> String {
    let (vm, result) = run_listing(source);
    result.unwrap();
    vm.output().to_string()
}

// =============================================================================
// Conditionals
// =============================================================================

const BRANCH: &str = "
  int {cond}
  if
    str \"A\"
    println
  else
    str \"B\"
    println
  endif
";

#[test]
fn if_else_takes_exactly_one_arm() {
    assert_eq!(output_of(&BRANCH.replace("{cond}", "0")), "B\n");
    assert_eq!(output_of(&BRANCH.replace("{cond}", "5")), "A\n");
}

#[test]
fn elif_runs_only_its_arm() {
    let source = "
  int 0
  if
    int 1
    println
  elif
    int 1
  then
    int 2
    println
  else
    int 3
    println
  endif
  int 4
  println
";
    assert_eq!(output_of(source), "2\n4\n");
}

#[test]
fn nested_conditionals() {
    let source = "
  int 1
  if
    int 0
    if
      char 'x'
      println
    else
      char 'y'
      println
    endif
  else
    char 'z'
    println
  endif
";
    assert_eq!(output_of(source), "y\n");
}

// =============================================================================
// Loops
// =============================================================================

#[test]
fn counting_loop_terminates() {
    let source = "
  int 0
  declare
  while
    load 0
    int 3
    lt
  run_while
    load 0
    println
    load 0
    int 1
    plus
    reassign 0
  end_while
";
    let (vm, result) = run_listing(source);
    result.unwrap();
    assert_eq!(vm.output(), "0\n1\n2\n");
    assert!(vm.stack().is_empty());
}

#[test]
fn factorial_loop() {
    let source = "
  int 1
  declare        ; acc
  int 5
  declare        ; n
  while
    load 1
    int 0
    gt
  run_while
    load 0
    load 1
    mul
    reassign 0
    load 1
    int 1
    minus
    reassign 1
  end_while
  load 0
  println
";
    assert_eq!(output_of(source), "120\n");
}

#[test]
fn infinite_loop_hits_step_limit() {
    let program = assemble_strict("while\nint 1\nrun_while\nend_while\n").unwrap();
    let mut vm = Vm::capturing(VmConfig::default().with_max_steps(1_000));
    let err = vm.run(&program).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(Limit::MaxSteps { limit: 1_000 })
    ));
    assert_eq!(vm.steps(), 1_000);
}

// =============================================================================
// Heap and Strings
// =============================================================================

#[test]
fn heap_buffers() {
    let source = "
  int 3
  alloc int
  declare
  load 0
  int 1
  int 42
  ptr_set
  load 0
  println
  load 0
  int 1
  ptr_get
  println
  load 0
  free
";
    let (vm, result) = run_listing(source);
    result.unwrap();
    assert_eq!(vm.output(), "[0, 42, 0]\n42\n");
    assert_eq!(vm.heap().live_count(), 0);
}

#[test]
fn use_after_free_is_invalid_pointer() {
    let (_, result) = run_listing("int 1\nalloc int\nprev 0\nfree\nint 0\nptr_get\n");
    assert!(matches!(result.unwrap_err().kind, ErrorKind::InvalidPointer(_)));
}

#[test]
fn concat_strings() {
    let source = "
  str \"foo\"
  str \"bar\"
  concat
  println
";
    assert_eq!(output_of(source), "foobar\n");
}

#[test]
fn string_variables_release_old_text() {
    let source = "
  str \"first\"
  declare
  str \"second\"
  assign
  load 0
  println
";
    let (vm, result) = run_listing(source);
    result.unwrap();
    assert_eq!(vm.output(), "second\n");
    assert_eq!(vm.heap().live_count(), 1);
}

// =============================================================================
// Calls
// =============================================================================

#[test]
fn function_call_and_return() {
    let source = "
  jump main
square:
  func_def
    prev 0
    mul
  func_ret
main:
  int 9
  func_call square
  println
";
    assert_eq!(output_of(source), "81\n");
}

#[test]
fn macro_expansion() {
    let source = "
  jump main
bang:
  macro_def
    char '!'
    print
  end_macro
main:
  macro_call bang
  macro_call bang
";
    assert_eq!(output_of(source), "!!");
}

#[test]
fn return_outside_call_is_illegal() {
    let program = Program::from(vec![Opcode::FuncRet]);
    let mut vm = Vm::capturing(VmConfig::default());
    let err = vm.run(&program).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IllegalInstruction(_)));
}

// =============================================================================
// Services
// =============================================================================

struct Counter {
    calls: usize,
}

impl Services for Counter {
    fn invoke(&mut self, op: ServiceOp, call: ServiceCall<'_>) -> Result<()> {
        assert_eq!(op, ServiceOp::StatMean);
        self.calls += 1;
        let n = i64::try_from(call.stack.len()).unwrap();
        call.stack.push(Value::Int(n))
    }
}

#[test]
fn services_default_to_not_implemented() {
    let (vm, result) = run_listing("int 1\nprintln\ntable_create\nint 2\nprintln\n");
    let err = result.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotImplemented(ref name) if name == "table_create"));
    assert_eq!(vm.output(), "1\n");
}

#[test]
fn custom_services_see_the_stack() {
    let program = assemble_strict("int 7\nint 8\nstat_mean\nprintln\n").unwrap();
    let mut vm = Vm::capturing(VmConfig::default());
    let mut counter = Counter { calls: 0 };
    vm.run_with_services(&program, &mut counter).unwrap();
    assert_eq!(counter.calls, 1);
    assert_eq!(vm.output(), "2\n");
}

//! Stack-based dispatch loop.
//!
//! A [`Vm`] owns every piece of machine state: operand stack, heap slot
//! table, variable environment, call stack and output sink. Independent runs
//! use independent machines.
//!
//! Each step fetches the instruction at the instruction pointer, executes it
//! and advances by one unless the instruction transferred control. Control
//! transfers out of conditionals and loops are resolved lexically by
//! [`crate::control`]. The run ends when the instruction pointer passes the
//! last instruction, on `halt`, or on the first error.
//!
//! # Services
//!
//! Service instructions are delegated to a [`Services`] implementation. With
//! [`Vm::run`] every service instruction fails with `NotImplemented`; use
//! [`Vm::run_with_services`] to supply one.

#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::too_many_lines)]

mod arith;
mod services;

pub use services::{NoServices, ServiceCall, Services};

use std::io::{self, Write};

use nixvm_foundation::{Error, ErrorContext, ErrorKind, HeapRef, Limit, Result, Value};
use nixvm_storage::{Environment, HeapTable, OperandStack};
use tracing::{debug, trace};

use crate::config::VmConfig;
use crate::control;
use crate::opcode::{Opcode, Program};

/// Where `print` output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Write to standard output, flushing after every print.
    Stdout,
    /// Collect into a string.
    Captured(String),
}

/// What the dispatch loop does after an instruction.
enum Flow {
    Next,
    Goto(usize),
    Halt,
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    return_to: usize,
    is_macro: bool,
}

/// Stack-based virtual machine.
pub struct Vm {
    config: VmConfig,
    stack: OperandStack,
    heap: HeapTable,
    env: Environment,
    calls: Vec<Frame>,
    ip: usize,
    steps: u64,
    output: Output,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

impl Vm {
    /// Creates a machine printing to standard output.
    #[must_use]
    pub fn new(config: VmConfig) -> Self {
        Self::with_output(config, Output::Stdout)
    }

    /// Creates a machine that collects its output; see [`Vm::output`].
    #[must_use]
    pub fn capturing(config: VmConfig) -> Self {
        Self::with_output(config, Output::Captured(String::new()))
    }

    fn with_output(config: VmConfig, output: Output) -> Self {
        Self {
            stack: OperandStack::new(config.stack_capacity),
            heap: HeapTable::new(config.heap_capacity)
                .with_max_string_len(config.max_string_len),
            env: Environment::new(config.env_capacity),
            calls: Vec::new(),
            ip: 0,
            steps: 0,
            output,
            config,
        }
    }

    /// Resets all machine state. Captured output is discarded.
    pub fn reset(&mut self) {
        self.clear_state();
        if let Output::Captured(text) = &mut self.output {
            text.clear();
        }
    }

    fn clear_state(&mut self) {
        self.stack.clear();
        self.heap.clear();
        self.env.clear();
        self.calls.clear();
        self.ip = 0;
        self.steps = 0;
    }

    /// Returns the captured output, or an empty string when printing to stdout.
    #[must_use]
    pub fn output(&self) -> &str {
        match &self.output {
            Output::Captured(text) => text,
            Output::Stdout => "",
        }
    }

    /// Takes and clears the captured output.
    pub fn take_output(&mut self) -> String {
        match &mut self.output {
            Output::Captured(text) => std::mem::take(text),
            Output::Stdout => String::new(),
        }
    }

    /// Returns the operand stack.
    #[must_use]
    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    /// Returns the heap slot table.
    #[must_use]
    pub fn heap(&self) -> &HeapTable {
        &self.heap
    }

    /// Returns the variable environment.
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Returns the instruction pointer.
    #[must_use]
    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Returns the number of instructions executed by the last run.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Runs a program with no services.
    ///
    /// # Errors
    /// Returns the first runtime error, with the failing instruction as
    /// context. Output printed before the error stays printed.
    pub fn run(&mut self, program: &Program) -> Result<()> {
        self.run_with_services(program, &mut NoServices)
    }

    /// Runs a program, delegating service instructions to `services`.
    ///
    /// Every run starts from an empty stack, heap and environment. State
    /// left by the previous run stays inspectable until the next one starts;
    /// captured output accumulates across runs.
    ///
    /// # Errors
    /// Returns the first runtime error, with the failing instruction as
    /// context.
    pub fn run_with_services<S: Services>(
        &mut self,
        program: &Program,
        services: &mut S,
    ) -> Result<()> {
        let ops = program.ops.as_slice();
        self.clear_state();
        debug!(instructions = ops.len(), "run");

        while let Some(op) = ops.get(self.ip) {
            if let Some(limit) = self.config.max_steps {
                if self.steps >= limit {
                    return Err(self.fail(
                        Error::new(ErrorKind::LimitExceeded(Limit::MaxSteps { limit })),
                        op,
                    ));
                }
            }
            self.steps += 1;
            trace!(ip = self.ip, op = %op, depth = self.stack.len(), "step");

            match self.step(ops, op, services) {
                Ok(Flow::Next) => self.ip += 1,
                Ok(Flow::Goto(target)) => self.ip = target,
                Ok(Flow::Halt) => {
                    debug!(ip = self.ip, "halt");
                    break;
                }
                Err(err) => return Err(self.fail(err, op)),
            }
        }

        debug!(steps = self.steps, "run finished");
        Ok(())
    }

    fn fail(&self, err: Error, op: &Opcode) -> Error {
        err.with_context(ErrorContext::new().with_instruction(self.ip, op.to_string()))
    }

    fn step<S: Services>(&mut self, ops: &[Opcode], op: &Opcode, services: &mut S) -> Result<Flow> {
        let ip = self.ip;
        match op {
            // Literals
            Opcode::Int(n) => self.stack.push(Value::Int(*n))?,
            Opcode::Float(x) => self.stack.push(Value::Float(*x))?,
            Opcode::Double(x) => self.stack.push(Value::Double(*x))?,
            Opcode::Char(c) => self.stack.push(Value::Char(*c))?,
            Opcode::Str(text) => {
                let r = self.heap.alloc_str(text)?;
                self.push_or_release(r)?;
            }

            // Stack
            Opcode::Pop => {
                self.stack.pop()?;
            }
            Opcode::Prev(k) => {
                let value = self.stack.peek(*k)?;
                self.stack.push(value)?;
            }

            // Arithmetic
            Opcode::Plus => self.binary_op(arith::plus)?,
            Opcode::Minus => self.binary_op(arith::minus)?,
            Opcode::Mul => self.binary_op(arith::mul)?,
            Opcode::Div => self.binary_op(arith::div)?,
            Opcode::Mod => self.binary_op(arith::rem)?,

            // Comparison and logic
            Opcode::Eq => self.binary_op(|a, b| arith::compare("eq", a, b, |o| o.is_eq()))?,
            Opcode::Neq => self.binary_op(arith::not_equal)?,
            Opcode::Gt => self.binary_op(|a, b| arith::compare("gt", a, b, |o| o.is_gt()))?,
            Opcode::Lt => self.binary_op(|a, b| arith::compare("lt", a, b, |o| o.is_lt()))?,
            Opcode::Geq => self.binary_op(|a, b| arith::compare("geq", a, b, |o| o.is_ge()))?,
            Opcode::Leq => self.binary_op(|a, b| arith::compare("leq", a, b, |o| o.is_le()))?,
            Opcode::And => self.binary_op(|a, b| arith::logical("and", a, b, |x, y| x && y))?,
            Opcode::Or => self.binary_op(|a, b| arith::logical("or", a, b, |x, y| x || y))?,

            // Conditionals
            Opcode::If | Opcode::Then => {
                let cond = self.stack.pop()?;
                if !arith::truthy(cond)? {
                    let boundary = control::find_branch_boundary(ops, ip)?;
                    debug!(ip, to = boundary + 1, "branch not taken");
                    return Ok(Flow::Goto(boundary + 1));
                }
            }
            Opcode::Elif | Opcode::Else => {
                let endif = control::find_endif(ops, ip)?;
                return Ok(Flow::Goto(endif + 1));
            }
            Opcode::EndIf | Opcode::While => {}

            // Loops
            Opcode::RunWhile => {
                let cond = self.stack.pop()?;
                if !arith::truthy(cond)? {
                    let end = control::find_end_while(ops, ip)?;
                    debug!(ip, to = end + 1, "loop exit");
                    return Ok(Flow::Goto(end + 1));
                }
            }
            Opcode::EndWhile => {
                let header = control::find_while(ops, ip)?;
                return Ok(Flow::Goto(header + 1));
            }

            // Output
            Opcode::Print => {
                let value = self.stack.pop()?;
                let text = self.render(value)?;
                self.write_output(&text)?;
            }
            Opcode::Println => {
                let value = self.stack.pop()?;
                let mut text = self.render(value)?;
                text.push('\n');
                self.write_output(&text)?;
            }

            // Jumps
            Opcode::Jump(target) => {
                if *target >= ops.len() {
                    return Err(Error::jump_out_of_range(*target, ops.len()));
                }
                return Ok(Flow::Goto(*target));
            }
            Opcode::Halt => return Ok(Flow::Halt),

            // Variables
            Opcode::Declare => {
                let value = self.stack.pop()?;
                self.env.declare(value)?;
            }
            Opcode::Assign => {
                let value = self.stack.pop()?;
                let index = self.env.current()?;
                self.env.write(index, value, &mut self.heap)?;
            }
            Opcode::Load(index) => {
                let value = self.env.read(*index)?;
                self.stack.push(value)?;
            }
            Opcode::Reassign(index) => {
                let value = self.stack.pop()?;
                self.env.write(*index, value, &mut self.heap)?;
            }

            // Heap
            Opcode::Alloc(elem) => {
                let count = self.stack.pop()?;
                let count = element_count(count)?;
                let r = self.heap.allocate(*elem, count)?;
                self.push_or_release(r)?;
            }
            Opcode::Free => {
                let r = heap_ref(self.stack.pop()?, "free")?;
                self.heap.free(r)?;
            }
            Opcode::PtrGet => {
                let index = self.stack.pop()?;
                let r = heap_ref(self.stack.pop()?, "ptr_get")?;
                let index = element_index(index)?;
                if r.is_str() {
                    let text = self.heap.get_str(r, index)?.to_owned();
                    let copy = self.heap.alloc_str(&text)?;
                    self.push_or_release(copy)?;
                } else {
                    let value = self.heap.get(r, index)?;
                    self.stack.push(value)?;
                }
            }
            Opcode::PtrSet => {
                let value = self.stack.pop()?;
                let index = self.stack.pop()?;
                let r = heap_ref(self.stack.pop()?, "ptr_set")?;
                let index = element_index(index)?;
                if r.is_str() {
                    let source = string_ref(value, "ptr_set")?;
                    let text = self.heap.text(source)?.to_owned();
                    self.heap.set_str(r, index, &text)?;
                } else {
                    self.heap.set(r, index, value)?;
                }
            }

            // Strings
            Opcode::Concat => {
                let b = string_ref(self.stack.pop()?, "concat")?;
                let a = string_ref(self.stack.pop()?, "concat")?;
                let text = format!("{}{}", self.heap.text(a)?, self.heap.text(b)?);
                let r = self.heap.alloc_str(&text)?;
                self.push_or_release(r)?;
            }

            // Calls
            Opcode::FuncDef => {
                let end = control::find_block_end(ops, ip, &Opcode::FuncDef, &Opcode::FuncRet)?;
                return Ok(Flow::Goto(end + 1));
            }
            Opcode::MacroDef => {
                let end = control::find_block_end(ops, ip, &Opcode::MacroDef, &Opcode::EndMacro)?;
                return Ok(Flow::Goto(end + 1));
            }
            Opcode::FuncCall(target) => {
                control::check_call(ops, *target, &Opcode::FuncDef)?;
                return self.call(*target, false);
            }
            Opcode::MacroCall(target) => {
                control::check_call(ops, *target, &Opcode::MacroDef)?;
                return self.call(*target, true);
            }
            Opcode::FuncRet => return self.ret(false),
            Opcode::EndMacro => return self.ret(true),

            // Services
            Opcode::Service(service) => {
                debug!(ip, service = %service, "service call");
                services.invoke(
                    *service,
                    ServiceCall {
                        ip,
                        stack: &mut self.stack,
                        heap: &mut self.heap,
                    },
                )?;
            }
        }
        Ok(Flow::Next)
    }

    fn binary_op<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(Value, Value) -> Result<Value>,
    {
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        let result = op(a, b)?;
        self.stack.push(result)
    }

    /// Pushes a fresh reference, releasing its slot if the stack is full.
    fn push_or_release(&mut self, r: HeapRef) -> Result<()> {
        self.stack.push(Value::Ref(r)).inspect_err(|_| {
            let _ = self.heap.free(r);
        })
    }

    fn call(&mut self, target: usize, is_macro: bool) -> Result<Flow> {
        if self.calls.len() >= self.config.max_call_depth {
            return Err(Error::new(ErrorKind::StackOverflow {
                capacity: self.config.max_call_depth,
            }));
        }
        self.calls.push(Frame {
            return_to: self.ip + 1,
            is_macro,
        });
        debug!(ip = self.ip, target, depth = self.calls.len(), "call");
        Ok(Flow::Goto(target + 1))
    }

    fn ret(&mut self, is_macro: bool) -> Result<Flow> {
        let kind = if is_macro { "end_macro" } else { "func_ret" };
        match self.calls.last() {
            Some(frame) if frame.is_macro == is_macro => {
                let return_to = frame.return_to;
                self.calls.pop();
                debug!(ip = self.ip, to = return_to, "return");
                Ok(Flow::Goto(return_to))
            }
            Some(_) => Err(Error::illegal_instruction(format!(
                "`{kind}` does not match the active call"
            ))),
            None => Err(Error::illegal_instruction(format!(
                "`{kind}` outside of a call"
            ))),
        }
    }

    fn render(&self, value: Value) -> Result<String> {
        match value {
            Value::Ref(r) => self.heap.render(r),
            scalar => Ok(scalar.to_string()),
        }
    }

    fn write_output(&mut self, text: &str) -> Result<()> {
        match &mut self.output {
            Output::Captured(buf) => buf.push_str(text),
            Output::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(text.as_bytes())
                    .and_then(|()| out.flush())
                    .map_err(|e| Error::new(ErrorKind::IoError(e.to_string())))?;
            }
        }
        Ok(())
    }
}

fn heap_ref(value: Value, name: &str) -> Result<HeapRef> {
    value.as_heap_ref().ok_or_else(|| {
        Error::invalid_data_type(format!(
            "`{name}` expects a heap reference, got {}",
            value.value_type()
        ))
    })
}

fn string_ref(value: Value, name: &str) -> Result<HeapRef> {
    match value {
        Value::Ref(r) if r.is_str() => Ok(r),
        other => Err(Error::invalid_data_type(format!(
            "`{name}` expects a string, got {}",
            describe(other)
        ))),
    }
}

fn describe(value: Value) -> String {
    match value {
        Value::Ref(r) => format!("ref<{}>", r.elem),
        other => other.value_type().to_string(),
    }
}

fn element_count(value: Value) -> Result<usize> {
    match value {
        Value::Int(n) => usize::try_from(n)
            .map_err(|_| Error::invalid_data_type(format!("cannot allocate {n} elements"))),
        other => Err(Error::invalid_data_type(format!(
            "element count must be int, got {}",
            describe(other)
        ))),
    }
}

fn element_index(value: Value) -> Result<usize> {
    match value {
        Value::Int(n) => usize::try_from(n)
            .map_err(|_| Error::invalid_pointer(format!("negative element index {n}"))),
        other => Err(Error::invalid_data_type(format!(
            "element index must be int, got {}",
            describe(other)
        ))),
    }
}

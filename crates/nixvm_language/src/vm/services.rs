//! Capability interface for service instructions.
//!
//! The machine accepts every [`ServiceOp`] but gives none of them meaning.
//! Executing one hands the operand stack and heap to a [`Services`]
//! implementation. The default, [`NoServices`], rejects every request with
//! `NotImplemented`, which aborts the run like any other error.

use nixvm_foundation::{Error, ErrorKind, Result};
use nixvm_storage::{HeapTable, OperandStack};

use crate::opcode::ServiceOp;

/// Machine state a service may read and modify.
pub struct ServiceCall<'a> {
    /// Instruction pointer of the service instruction.
    pub ip: usize,
    /// The operand stack.
    pub stack: &'a mut OperandStack,
    /// The heap slot table.
    pub heap: &'a mut HeapTable,
}

/// Provides the semantics of service instructions.
///
/// Implement this trait to give a machine table, statistics, network or
/// other capabilities. Arguments and results travel on the operand stack.
pub trait Services {
    /// Executes `op`.
    ///
    /// # Errors
    /// Any error aborts the program run.
    fn invoke(&mut self, op: ServiceOp, call: ServiceCall<'_>) -> Result<()>;
}

/// Service provider that implements nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoServices;

impl Services for NoServices {
    fn invoke(&mut self, op: ServiceOp, _call: ServiceCall<'_>) -> Result<()> {
        Err(Error::new(ErrorKind::NotImplemented(op.mnemonic().to_string())))
    }
}

impl<S: Services + ?Sized> Services for &mut S {
    fn invoke(&mut self, op: ServiceOp, call: ServiceCall<'_>) -> Result<()> {
        (**self).invoke(op, call)
    }
}

//! Structured control-flow resolution.
//!
//! Conditionals and loops carry no jump targets. When the dispatch loop needs
//! to leave a block it asks this module for the matching boundary, found by
//! scanning the instruction stream with a nesting counter. Matching is purely
//! lexical: only the opcodes matter, never runtime values.
//!
//! ```text
//! <cond> if  A...  elif <cond2> then  B...  else  C...  endif
//! while <cond...> run_while  body...  end_while
//! ```

use nixvm_foundation::{Error, ErrorKind, Result};
use tracing::trace;

use crate::opcode::{Opcode, Program};

/// Finds the sibling boundary of the conditional branch starting at `from`.
///
/// Scans forward from `from + 1`. A nested `if` opens a level. At depth zero
/// the first `else`, `elif` or `endif` is the boundary; deeper `endif`s close
/// a level and deeper `else`/`elif`s are ignored.
///
/// # Errors
/// Returns `InvalidJump` if the conditional is never closed.
pub fn find_branch_boundary(ops: &[Opcode], from: usize) -> Result<usize> {
    let mut depth = 0usize;
    for (i, op) in ops.iter().enumerate().skip(from + 1) {
        match op {
            Opcode::If => depth += 1,
            Opcode::Else | Opcode::Elif if depth == 0 => return found(from, i),
            Opcode::EndIf if depth == 0 => return found(from, i),
            Opcode::EndIf => depth -= 1,
            _ => {}
        }
    }
    Err(Error::unmatched_block(mnemonic_at(ops, from), from))
}

/// Finds the `endif` closing the conditional that contains `from`.
///
/// Used when a taken branch runs into its `else` or `elif`.
///
/// # Errors
/// Returns `InvalidJump` if the conditional is never closed.
pub fn find_endif(ops: &[Opcode], from: usize) -> Result<usize> {
    let mut depth = 0usize;
    for (i, op) in ops.iter().enumerate().skip(from + 1) {
        match op {
            Opcode::If => depth += 1,
            Opcode::EndIf if depth == 0 => return found(from, i),
            Opcode::EndIf => depth -= 1,
            _ => {}
        }
    }
    Err(Error::unmatched_block(mnemonic_at(ops, from), from))
}

/// Finds the `end_while` closing the loop that contains `from`.
///
/// # Errors
/// Returns `InvalidJump` if the loop is never closed.
pub fn find_end_while(ops: &[Opcode], from: usize) -> Result<usize> {
    let mut depth = 0usize;
    for (i, op) in ops.iter().enumerate().skip(from + 1) {
        match op {
            Opcode::While => depth += 1,
            Opcode::EndWhile if depth == 0 => return found(from, i),
            Opcode::EndWhile => depth -= 1,
            _ => {}
        }
    }
    Err(Error::unmatched_block(mnemonic_at(ops, from), from))
}

/// Finds the `while` opening the loop closed by the `end_while` at `from`.
///
/// # Errors
/// Returns `InvalidJump` if there is no matching header.
pub fn find_while(ops: &[Opcode], from: usize) -> Result<usize> {
    let mut depth = 0usize;
    for i in (0..from.min(ops.len())).rev() {
        match ops[i] {
            Opcode::EndWhile => depth += 1,
            Opcode::While if depth == 0 => return found(from, i),
            Opcode::While => depth -= 1,
            _ => {}
        }
    }
    Err(Error::unmatched_block(mnemonic_at(ops, from), from))
}

/// Finds the instruction closing a definition block opened at `from`.
///
/// `open` and `close` name the bracket pair, e.g. `FuncDef`/`FuncRet`.
///
/// # Errors
/// Returns `InvalidJump` if the block is never closed.
pub fn find_block_end(ops: &[Opcode], from: usize, open: &Opcode, close: &Opcode) -> Result<usize> {
    let mut depth = 0usize;
    for (i, op) in ops.iter().enumerate().skip(from + 1) {
        if op == open {
            depth += 1;
        } else if op == close {
            if depth == 0 {
                return found(from, i);
            }
            depth -= 1;
        }
    }
    Err(Error::unmatched_block(open.mnemonic(), from))
}

#[allow(clippy::unnecessary_wraps)]
fn found(from: usize, at: usize) -> Result<usize> {
    trace!(from, to = at, "block boundary");
    Ok(at)
}

fn mnemonic_at(ops: &[Opcode], at: usize) -> &'static str {
    ops.get(at).map_or("?", Opcode::mnemonic)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Block {
    If,
    While,
    Func,
    Macro,
}

impl Block {
    const fn opener(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::While => "while",
            Self::Func => "func_def",
            Self::Macro => "macro_def",
        }
    }
}

/// Checks that every block is balanced and every target is valid.
///
/// Execution does not need this; the resolver finds boundaries on demand.
/// Running it first turns a malformed program into an error before any
/// instruction has had an effect.
///
/// # Errors
/// Returns `InvalidJump` for an unbalanced block, a stray block instruction,
/// a jump outside the program, or a call that does not name a definition.
pub fn validate(program: &Program) -> Result<()> {
    let ops = &program.ops;
    let mut open: Vec<(Block, usize)> = Vec::new();

    for (i, op) in ops.iter().enumerate() {
        let expect_top = |open: &[(Block, usize)], block: Block| -> Result<()> {
            match open.last() {
                Some((top, _)) if *top == block => Ok(()),
                _ => Err(Error::unmatched_block(op.mnemonic(), i)),
            }
        };

        match op {
            Opcode::If => open.push((Block::If, i)),
            Opcode::While => open.push((Block::While, i)),
            Opcode::FuncDef => open.push((Block::Func, i)),
            Opcode::MacroDef => open.push((Block::Macro, i)),
            Opcode::Elif | Opcode::Then | Opcode::Else => expect_top(&open, Block::If)?,
            Opcode::RunWhile => expect_top(&open, Block::While)?,
            Opcode::EndIf => {
                expect_top(&open, Block::If)?;
                open.pop();
            }
            Opcode::EndWhile => {
                expect_top(&open, Block::While)?;
                open.pop();
            }
            Opcode::FuncRet => {
                expect_top(&open, Block::Func)?;
                open.pop();
            }
            Opcode::EndMacro => {
                expect_top(&open, Block::Macro)?;
                open.pop();
            }
            Opcode::Jump(target) if *target >= ops.len() => {
                return Err(Error::jump_out_of_range(*target, ops.len()));
            }
            Opcode::FuncCall(target) => check_call(ops, *target, &Opcode::FuncDef)?,
            Opcode::MacroCall(target) => check_call(ops, *target, &Opcode::MacroDef)?,
            _ => {}
        }
    }

    match open.pop() {
        Some((block, at)) => Err(Error::unmatched_block(block.opener(), at)),
        None => Ok(()),
    }
}

/// Checks that `target` names a definition opened by `def`.
///
/// # Errors
/// Returns `InvalidJump` otherwise.
pub fn check_call(ops: &[Opcode], target: usize, def: &Opcode) -> Result<()> {
    match ops.get(target) {
        Some(op) if op == def => Ok(()),
        Some(op) => Err(Error::new(ErrorKind::InvalidJump(format!(
            "call target {target} is `{op}`, expected `{}`",
            def.mnemonic()
        )))),
        None => Err(Error::jump_out_of_range(target, ops.len())),
    }
}

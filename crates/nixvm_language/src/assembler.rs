//! Assembler for program listings.
//!
//! A listing holds one instruction per line: a mnemonic followed by at most
//! one operand. `;` starts a comment. A line of the form `name:` defines a
//! label naming the next instruction; `jump`, `func_call` and `macro_call`
//! accept a label wherever they accept an instruction index.
//!
//! ```text
//! int 0
//! declare
//! top:
//! while
//!   load 0
//!   int 3
//!   lt
//! run_while
//!   load 0
//!   println
//!   load 0
//!   int 1
//!   plus
//!   reassign 0
//! end_while
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use nixvm_foundation::{Error, Result, Type};

use crate::control;
use crate::lexer::Lexer;
use crate::opcode::{Opcode, Program};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Assembles a listing into a program.
///
/// # Errors
/// Returns `ParseError` with the line and column of the first problem.
pub fn assemble(source: &str) -> Result<Program> {
    Assembler::new(source).assemble()
}

/// Assembles a listing and checks that its blocks and targets are valid.
///
/// # Errors
/// Returns `ParseError` for malformed text and `InvalidJump` for unbalanced
/// blocks or bad targets.
pub fn assemble_strict(source: &str) -> Result<Program> {
    let program = assemble(source)?;
    control::validate(&program)?;
    Ok(program)
}

/// An instruction whose target is a label not yet resolved.
struct Fixup {
    at: usize,
    label: String,
    span: Span,
}

/// Assembler state for one listing.
pub struct Assembler {
    tokens: Vec<Token>,
    pos: usize,
    program: Program,
    labels: HashMap<String, usize>,
    fixups: Vec<Fixup>,
}

impl Assembler {
    /// Creates an assembler for the given listing.
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            tokens: Lexer::tokenize_all(source),
            pos: 0,
            program: Program::new(),
            labels: HashMap::new(),
            fixups: Vec::new(),
        }
    }

    /// Assembles the whole listing.
    ///
    /// # Errors
    /// Returns `ParseError` with the line and column of the first problem.
    pub fn assemble(mut self) -> Result<Program> {
        loop {
            let token = self.next();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Newline | TokenKind::Comment(_) => {}
                TokenKind::Label(name) => {
                    if self.labels.contains_key(&name) {
                        return Err(error_at(token.span, format!("duplicate label `{name}`")));
                    }
                    self.labels.insert(name, self.program.len());
                }
                TokenKind::Word(mnemonic) => {
                    let op = self.instruction(&mnemonic, token.span)?;
                    self.program.emit(op);
                    self.end_of_line()?;
                }
                TokenKind::Error(msg) => return Err(error_at(token.span, msg)),
                other => {
                    return Err(error_at(
                        token.span,
                        format!("expected an instruction, found {}", other.name()),
                    ));
                }
            }
        }
        self.resolve_labels()?;
        Ok(self.program)
    }

    fn next(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, Span::default()));
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn end_of_line(&mut self) -> Result<()> {
        let token = self.next();
        match token.kind {
            kind if kind.ends_line() => Ok(()),
            TokenKind::Error(msg) => Err(error_at(token.span, msg)),
            other => Err(error_at(
                token.span,
                format!("unexpected {} after instruction", other.name()),
            )),
        }
    }

    fn instruction(&mut self, mnemonic: &str, span: Span) -> Result<Opcode> {
        Ok(match mnemonic {
            "int" => Opcode::Int(self.number(mnemonic)?),
            "float" => Opcode::Float(self.float(mnemonic)?),
            "double" => Opcode::Double(self.float(mnemonic)?),
            "char" => {
                let token = self.operand(mnemonic)?;
                match token.kind {
                    TokenKind::Char(c) => Opcode::Char(c),
                    other => return Err(expected("a character literal", mnemonic, &other, token.span)),
                }
            }
            "str" => {
                let token = self.operand(mnemonic)?;
                match token.kind {
                    TokenKind::Str(text) => Opcode::Str(text),
                    other => return Err(expected("a string literal", mnemonic, &other, token.span)),
                }
            }
            "prev" => Opcode::Prev(self.number(mnemonic)?),
            "load" => Opcode::Load(self.number(mnemonic)?),
            "reassign" => Opcode::Reassign(self.number(mnemonic)?),
            "jump" => Opcode::Jump(self.target(mnemonic)?),
            "func_call" => Opcode::FuncCall(self.target(mnemonic)?),
            "macro_call" => Opcode::MacroCall(self.target(mnemonic)?),
            "alloc" => {
                let token = self.operand(mnemonic)?;
                let ty = match &token.kind {
                    TokenKind::Word(name) => Type::from_name(name),
                    _ => None,
                };
                match ty {
                    Some(ty) if ty.is_element() => Opcode::Alloc(ty),
                    Some(ty) => {
                        return Err(error_at(token.span, format!("cannot allocate {ty} elements")));
                    }
                    None => {
                        return Err(expected("an element type", mnemonic, &token.kind, token.span));
                    }
                }
            }
            other => Opcode::nullary(other)
                .ok_or_else(|| error_at(span, format!("unknown instruction `{other}`")))?,
        })
    }

    /// Reads the operand token of `mnemonic`.
    fn operand(&mut self, mnemonic: &str) -> Result<Token> {
        let token = self.next();
        match &token.kind {
            kind if kind.ends_line() => Err(error_at(
                token.span,
                format!("`{mnemonic}` needs an operand"),
            )),
            TokenKind::Error(msg) => Err(error_at(token.span, msg.clone())),
            _ => Ok(token),
        }
    }

    fn number<T: FromStr>(&mut self, mnemonic: &str) -> Result<T> {
        let token = self.operand(mnemonic)?;
        match &token.kind {
            TokenKind::Number(text) => text.parse().map_err(|_| {
                error_at(token.span, format!("`{text}` is out of range for `{mnemonic}`"))
            }),
            other => Err(expected("a number", mnemonic, other, token.span)),
        }
    }

    /// Parses a float operand; `inf`, `-inf` and `NaN` are accepted.
    fn float<T: FromStr>(&mut self, mnemonic: &str) -> Result<T> {
        let token = self.operand(mnemonic)?;
        match &token.kind {
            TokenKind::Number(text) | TokenKind::Word(text) => text.parse().map_err(|_| {
                error_at(token.span, format!("`{text}` is not a valid `{mnemonic}`"))
            }),
            other => Err(expected("a number", mnemonic, other, token.span)),
        }
    }

    /// Parses an instruction index or a label to resolve later.
    fn target(&mut self, mnemonic: &str) -> Result<usize> {
        let token = self.operand(mnemonic)?;
        match token.kind {
            TokenKind::Number(text) => text.parse().map_err(|_| {
                error_at(token.span, format!("`{text}` is not an instruction index"))
            }),
            TokenKind::Word(label) => {
                self.fixups.push(Fixup {
                    at: self.program.len(),
                    label,
                    span: token.span,
                });
                Ok(0)
            }
            other => Err(expected("an instruction index or label", mnemonic, &other, token.span)),
        }
    }

    fn resolve_labels(&mut self) -> Result<()> {
        for fixup in &self.fixups {
            let target = *self
                .labels
                .get(&fixup.label)
                .ok_or_else(|| error_at(fixup.span, format!("undefined label `{}`", fixup.label)))?;
            if let Some(
                Opcode::Jump(slot) | Opcode::FuncCall(slot) | Opcode::MacroCall(slot),
            ) = self.program.ops.get_mut(fixup.at)
            {
                *slot = target;
            }
        }
        Ok(())
    }
}

fn error_at(span: Span, message: impl Into<String>) -> Error {
    Error::parse(message, span.line, span.column)
}

fn expected(what: &str, mnemonic: &str, found: &TokenKind, span: Span) -> Error {
    error_at(
        span,
        format!("`{mnemonic}` expects {what}, found {}", found.name()),
    )
}

//! Token types for program listings.

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token types for program listings.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Mnemonic, type name, or label reference like `println` or `loop_top`
    Word(String),
    /// Label definition like `loop_top:`
    Label(String),
    /// Numeric literal text like `42`, `-3` or `2.5e3`
    Number(String),
    /// Character literal like `'a'` or `'\n'`
    Char(char),
    /// String literal like `"hello"`
    Str(String),
    /// End of a line
    Newline,
    /// Comment text (after `;`)
    Comment(String),
    /// End of input
    Eof,
    /// Lexer error
    Error(String),
}

impl TokenKind {
    /// Returns true if this token ends an instruction.
    #[must_use]
    pub const fn ends_line(&self) -> bool {
        matches!(self, Self::Newline | Self::Comment(_) | Self::Eof)
    }

    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Word(_) => "word",
            Self::Label(_) => "label",
            Self::Number(_) => "number",
            Self::Char(_) => "character",
            Self::Str(_) => "string",
            Self::Newline => "end of line",
            Self::Comment(_) => "comment",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }
}

//! Lexer for program listings.
//!
//! Listings are line oriented, so newlines are tokens; all other whitespace
//! separates tokens and is otherwise ignored.

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer for program listings.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_blanks();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some('\n') => {
                self.advance();
                TokenKind::Newline
            }
            Some(';') => self.scan_comment(),
            Some('"') => self.scan_string(),
            Some('\'') => self.scan_char(),
            Some(c) if c.is_ascii_digit() => self.scan_number(),
            Some('-' | '+') => match self.peek_char_n(1) {
                Some(c) if c.is_ascii_digit() => self.scan_number(),
                Some(c) if is_word_start(c) => self.scan_word(),
                _ => {
                    self.advance();
                    TokenKind::Error("expected a number after sign".into())
                }
            },
            Some(c) if is_word_start(c) => self.scan_word(),
            Some(c) => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c:?}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source, ending with `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Skips whitespace other than newlines.
    fn skip_blanks(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() && c != '\n' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn scan_comment(&mut self) -> TokenKind {
        self.advance(); // consume ';'
        let start = self.position;
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
        TokenKind::Comment(self.source[start..self.position].to_string())
    }

    /// Reads one escape sequence after a backslash.
    fn scan_escape(&mut self) -> Result<char, String> {
        self.advance(); // consume '\'
        let c = match self.peek_char() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('\'') => '\'',
            Some('"') => '"',
            Some(c) => return Err(format!("invalid escape sequence: \\{c}")),
            None => return Err("unexpected end of input in escape".into()),
        };
        self.advance();
        Ok(c)
    }

    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // consume opening '"'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    return TokenKind::Str(text);
                }
                Some('\\') => match self.scan_escape() {
                    Ok(c) => text.push(c),
                    Err(msg) => return TokenKind::Error(msg),
                },
                Some('\n') | None => {
                    return TokenKind::Error("unterminated string literal".into());
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }
    }

    fn scan_char(&mut self) -> TokenKind {
        self.advance(); // consume opening '\''
        let c = match self.peek_char() {
            Some('\\') => match self.scan_escape() {
                Ok(c) => c,
                Err(msg) => return TokenKind::Error(msg),
            },
            Some('\'') => {
                self.advance();
                return TokenKind::Error("empty character literal".into());
            }
            Some('\n') | None => {
                return TokenKind::Error("unterminated character literal".into());
            }
            Some(c) => {
                self.advance();
                c
            }
        };
        if self.peek_char() == Some('\'') {
            self.advance();
            TokenKind::Char(c)
        } else {
            TokenKind::Error("character literal must hold exactly one character".into())
        }
    }

    /// Scans a number: sign, digits, optional fraction and exponent.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        if matches!(self.peek_char(), Some('-' | '+')) {
            self.advance();
        }
        self.skip_digits();
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            self.advance();
            self.skip_digits();
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_char_n(1), Some('-' | '+'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char_n(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.advance();
                }
                self.skip_digits();
            }
        }
        match self.peek_char() {
            Some(c) if is_word_char(c) => {
                while self.peek_char().is_some_and(is_word_char) {
                    self.advance();
                }
                TokenKind::Error(format!(
                    "malformed number: {}",
                    &self.source[start..self.position]
                ))
            }
            _ => TokenKind::Number(self.source[start..self.position].to_string()),
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn scan_word(&mut self) -> TokenKind {
        let start = self.position;
        if matches!(self.peek_char(), Some('-' | '+')) {
            self.advance();
        }
        while self.peek_char().is_some_and(is_word_char) {
            self.advance();
        }
        let name = self.source[start..self.position].to_string();
        if self.peek_char() == Some(':') {
            self.advance();
            TokenKind::Label(name)
        } else {
            TokenKind::Word(name)
        }
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

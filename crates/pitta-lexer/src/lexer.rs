//! Core Pitta lexer: converts source text to a token stream.
//!
//! - `#` line comments are skipped
//! - strings are double-quoted, may span lines and have no escapes
//! - integers accept `0x` and `0b` prefixes; floats need digits on both sides of `.`
//! - errors are collected (up to [`MAX_ERRORS`]) and scanning continues

use pitta_types::{CompileErrors, ErrorCode, PittaError, SourceFile, Span, MAX_ERRORS};

use crate::token::{Token, TokenKind};

/// The Pitta lexer.
pub struct Lexer<'src> {
    source: &'src [u8],
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Byte offset where the current token started.
    start: usize,
    start_line: u32,
    start_col: u32,
    line: u32,
    col: u32,
    errors: CompileErrors,
}

/// Result of lexing: tokens plus any errors collected.
pub struct LexResult {
    /// The token stream; always ends with [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            start: 0,
            start_line: 1,
            start_col: 1,
            line: 1,
            col: 1,
            errors: CompileErrors::empty(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        while self.errors.total_errors < MAX_ERRORS {
            self.skip_trivia();
            self.start = self.pos;
            self.start_line = self.line;
            self.start_col = self.col;
            if self.at_end() {
                break;
            }
            if let Some(token) = self.scan_token() {
                tokens.push(token);
            }
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            "",
            Span::point(self.line, self.col),
        ));

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Consume the next byte if it equals `expected`.
    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn lexeme(&self) -> &'src str {
        std::str::from_utf8(&self.source[self.start..self.pos]).unwrap_or("")
    }

    fn current_span(&self) -> Span {
        Span::new(
            self.start_line,
            self.start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn make(&self, kind: TokenKind) -> Option<Token> {
        Some(Token::new(kind, self.lexeme(), self.current_span()))
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = PittaError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b'#' => {
                    while self.peek().is_some_and(|c| c != b'\n') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token. Returns `None` when the input produced only an error.
    fn scan_token(&mut self) -> Option<Token> {
        let ch = self.advance()?;

        match ch {
            b'(' => self.make(TokenKind::LParen),
            b')' => self.make(TokenKind::RParen),
            b'{' => self.make(TokenKind::LBrace),
            b'}' => self.make(TokenKind::RBrace),
            b',' => self.make(TokenKind::Comma),
            b'.' => self.make(TokenKind::Dot),
            b';' => self.make(TokenKind::Semicolon),
            b'-' => self.make(TokenKind::Minus),
            b'*' => self.make(TokenKind::Star),
            b'/' => self.make(TokenKind::Slash),
            b'%' => self.make(TokenKind::Percent),
            b'&' => self.make(TokenKind::Amp),
            b'|' => self.make(TokenKind::Pipe),
            b'^' => self.make(TokenKind::Caret),
            b'~' => self.make(TokenKind::Tilde),

            b'+' => {
                let kind = if self.eat(b'+') {
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                };
                self.make(kind)
            }
            b'!' => {
                let kind = if self.eat(b'=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                };
                self.make(kind)
            }
            b'=' => {
                let kind = if self.eat(b'=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                };
                self.make(kind)
            }
            b'<' => {
                let kind = if self.eat(b'=') {
                    TokenKind::LessEq
                } else if self.eat(b'<') {
                    TokenKind::LessLess
                } else {
                    TokenKind::Less
                };
                self.make(kind)
            }
            b'>' => {
                let kind = if self.eat(b'=') {
                    TokenKind::GreaterEq
                } else if self.eat(b'>') {
                    TokenKind::GreaterGreater
                } else {
                    TokenKind::Greater
                };
                self.make(kind)
            }

            b'"' => self.scan_string(),
            b'0'..=b'9' => self.scan_number(ch),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),

            _ => {
                // Skip the rest of a multi-byte character so the error is reported once.
                while self.peek().is_some_and(|c| c & 0xC0 == 0x80) {
                    self.advance();
                }
                let text = self.lexeme().to_string();
                self.emit_error(
                    ErrorCode::UNEXPECTED_CHARACTER,
                    format!("Unexpected character '{text}'."),
                );
                None
            }
        }
    }

    fn scan_string(&mut self) -> Option<Token> {
        while self.peek().is_some_and(|c| c != b'"') {
            self.advance();
        }
        if self.at_end() {
            self.emit_error(ErrorCode::UNTERMINATED_STRING, "Unterminated string.");
            return None;
        }
        self.advance(); // closing quote

        let text = self.lexeme();
        let value = text[1..text.len() - 1].to_string();
        self.make(TokenKind::StringLit(value))
    }

    fn scan_number(&mut self, first: u8) -> Option<Token> {
        if first == b'0' && matches!(self.peek(), Some(b'x' | b'b')) {
            return self.scan_radix_number();
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // '.'
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            return match self.lexeme().parse::<f32>() {
                Ok(value) => self.make(TokenKind::FloatLit(value)),
                Err(_) => {
                    self.emit_error(ErrorCode::INVALID_NUMBER, "Invalid float literal.");
                    None
                }
            };
        }

        match self.lexeme().parse::<i32>() {
            Ok(value) => self.make(TokenKind::IntLit(value)),
            Err(_) => {
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("Integer literal '{}' does not fit in 32 bits.", self.lexeme()),
                );
                None
            }
        }
    }

    /// `0x...` or `0b...`. The full 32-bit pattern is accepted and
    /// reinterpreted as a signed integer.
    fn scan_radix_number(&mut self) -> Option<Token> {
        let (radix, name) = match self.advance() {
            Some(b'x') => (16, "hexadecimal"),
            _ => (2, "binary"),
        };
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| (c as char).is_digit(radix)) {
            self.advance();
        }
        if self.pos == digits_start {
            self.emit_error(
                ErrorCode::INVALID_NUMBER,
                format!("'{}' must be followed by a valid {name} digit.", self.lexeme()),
            );
            return None;
        }
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.emit_error(
                ErrorCode::INVALID_NUMBER,
                "Numeric bases cannot be given as a floating point.",
            );
            return None;
        }

        let digits = &self.lexeme()[2..];
        match u32::from_str_radix(digits, radix) {
            Ok(bits) => self.make(TokenKind::IntLit(bits as i32)),
            Err(_) => {
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("Integer literal '{}' does not fit in 32 bits.", self.lexeme()),
                );
                None
            }
        }
    }

    fn scan_identifier(&mut self) -> Option<Token> {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.advance();
        }
        let text = self.lexeme();
        let kind =
            TokenKind::from_keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()));
        self.make(kind)
    }
}

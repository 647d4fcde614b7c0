//! Core parser infrastructure: token cursor, error reporting, helpers.

use pitta_lexer::token::{Token, TokenKind};
use pitta_lexer::Lexer;
use pitta_types::ast::{Expr, ExprId, ExprKind, Ident, Program};
use pitta_types::{CompileErrors, ErrorCode, PittaError, SourceFile, Span, MAX_ERRORS};

/// Upper bound on parameters per function and arguments per call.
pub const MAX_ARGUMENTS: usize = 255;

/// Upper bound on syntactic nesting (statements and expressions).
pub const MAX_NESTING: u32 = 64;

/// The Pitta parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Errors are collected; after each one the parser resynchronizes at the
/// next statement boundary.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source_file: &'src SourceFile,
    errors: CompileErrors,
    next_id: u32,
    /// Current syntactic nesting depth.
    pub(crate) depth: u32,
}

/// Result of parsing. The program holds every statement that parsed cleanly.
pub struct ParseResult {
    pub program: Program,
    pub errors: CompileErrors,
    /// First id not used by `program`.
    pub next_id: ExprId,
}

/// Lex and parse `source_file`, folding lexer errors into the result.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    parse_source_from(source_file, ExprId(0))
}

/// Like [`parse_source`], numbering expressions from `first_id`.
///
/// Programs fed to the same interpreter must not share expression ids.
pub fn parse_source_from(source_file: &SourceFile, first_id: ExprId) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    let mut result = Parser::new(lexed.tokens, source_file)
        .starting_at(first_id)
        .parse();
    let mut errors = lexed.errors;
    errors.extend(result.errors);
    result.errors = errors;
    result
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: CompileErrors::empty(),
            next_id: 0,
            depth: 0,
        }
    }

    /// Number expressions from `first_id` instead of zero.
    pub fn starting_at(mut self, first_id: ExprId) -> Self {
        self.next_id = first_id.0;
        self
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    ///
    /// Past the end this keeps returning the final token, which the lexer
    /// guarantees is `Eof`.
    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.previous().map_or(Span::point(1, 1), |t| t.span)
    }

    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind, reporting `message` if it is missing.
    pub(crate) fn expect(&mut self, expected: &TokenKind, message: &str) -> Option<Token> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
            None
        }
    }

    pub(crate) fn expect_identifier(&mut self, message: &str) -> Option<Ident> {
        match self.peek_kind() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                None
            }
        }
    }

    // ── Node Construction ─────────────────────────────────────────────────────

    /// Build an expression node with a fresh id.
    pub(crate) fn expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        let id = ExprId(self.next_id);
        self.next_id += 1;
        Expr::new(id, kind, span)
    }

    /// Enter one level of nesting; reports and returns `false` past the limit.
    pub(crate) fn enter_nesting(&mut self) -> bool {
        if self.depth >= MAX_NESTING {
            self.error_at_current(
                ErrorCode::NESTING_TOO_DEEP,
                format!("Nesting is limited to {MAX_NESTING} levels."),
            );
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn exit_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let token = self.peek().clone();
        self.error_at_token(&token, code, message);
    }

    /// Report an error located at `token`, naming its lexeme.
    pub(crate) fn error_at_token(
        &mut self,
        token: &Token,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        let source_line = self
            .source_file
            .line(token.span.start_line)
            .unwrap_or("")
            .to_string();
        let error = PittaError::new(
            &self.source_file.name,
            code,
            message,
            token.span,
            source_line,
        );
        let error = if token.kind == TokenKind::Eof {
            error.at_end()
        } else {
            error.at_lexeme(&token.lexeme)
        };
        self.errors.push_error(error);
    }

    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= MAX_ERRORS
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until just after a `;` or just before a statement keyword.
    /// Always consumes the offending token so recovery makes progress.
    pub(crate) fn synchronize(&mut self) {
        self.advance();
        while !self.at_end() {
            if self.previous().is_some_and(|t| t.kind == TokenKind::Semicolon) {
                return;
            }
            if self.peek_kind().starts_statement() {
                return;
            }
            self.advance();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a `Program` AST.
    pub fn parse(mut self) -> ParseResult {
        let start = self.current_span();
        let mut stmts = Vec::new();
        while !self.at_end() && !self.too_many_errors() {
            if let Some(stmt) = self.parse_declaration() {
                stmts.push(stmt);
            }
        }
        let span = start.merge(self.previous_span());
        ParseResult {
            program: Program { stmts, span },
            errors: self.errors,
            next_id: ExprId(self.next_id),
        }
    }
}

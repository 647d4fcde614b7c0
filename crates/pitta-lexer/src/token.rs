//! Token types for the Pitta lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the language and
//! [`Token`], which pairs a kind with its source text and [`Span`].

use pitta_types::Span;
use std::fmt;

/// All reserved words. None of them may be used as a name.
pub const ALL_KEYWORDS: &[&str] = &[
    "and", "class", "do", "else", "false", "func", "for", "if", "null", "or", "print",
    "return", "super", "this", "true", "undefined", "var", "while",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source text, used in ` at 'lexeme'` diagnostics.
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Keywords ──
    And,
    Class,
    /// Reserved; no statement uses it yet.
    Do,
    Else,
    False,
    Func,
    For,
    If,
    Null,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Undefined,
    Var,
    While,

    // ── Literals ──
    /// `42`, `0x2A`, `0b101010`
    IntLit(i32),
    /// `1.5`
    FloatLit(f32),
    /// `"text"`; may span lines, no escapes.
    StringLit(String),
    Identifier(String),

    // ── Operators ──
    /// `+`
    Plus,
    /// `++`, string concatenation
    PlusPlus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `!=`
    BangEq,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `<<`
    LessLess,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `>>`
    GreaterGreater,

    // ── Punctuation ──
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,

    Eof,
}

impl TokenKind {
    /// Look up a keyword by its source text.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "and" => TokenKind::And,
            "class" => TokenKind::Class,
            "do" => TokenKind::Do,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "func" => TokenKind::Func,
            "for" => TokenKind::For,
            "if" => TokenKind::If,
            "null" => TokenKind::Null,
            "or" => TokenKind::Or,
            "print" => TokenKind::Print,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "this" => TokenKind::This,
            "true" => TokenKind::True,
            "undefined" => TokenKind::Undefined,
            "var" => TokenKind::Var,
            "while" => TokenKind::While,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::And
                | TokenKind::Class
                | TokenKind::Do
                | TokenKind::Else
                | TokenKind::False
                | TokenKind::Func
                | TokenKind::For
                | TokenKind::If
                | TokenKind::Null
                | TokenKind::Or
                | TokenKind::Print
                | TokenKind::Return
                | TokenKind::Super
                | TokenKind::This
                | TokenKind::True
                | TokenKind::Undefined
                | TokenKind::Var
                | TokenKind::While
        )
    }

    /// Keywords that begin a statement; the parser resynchronizes on these.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::Func
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::And => "and",
            TokenKind::Class => "class",
            TokenKind::Do => "do",
            TokenKind::Else => "else",
            TokenKind::False => "false",
            TokenKind::Func => "func",
            TokenKind::For => "for",
            TokenKind::If => "if",
            TokenKind::Null => "null",
            TokenKind::Or => "or",
            TokenKind::Print => "print",
            TokenKind::Return => "return",
            TokenKind::Super => "super",
            TokenKind::This => "this",
            TokenKind::True => "true",
            TokenKind::Undefined => "undefined",
            TokenKind::Var => "var",
            TokenKind::While => "while",
            TokenKind::IntLit(n) => return write!(f, "{n}"),
            TokenKind::FloatLit(n) => return write!(f, "{n}"),
            TokenKind::StringLit(s) => return write!(f, "\"{s}\""),
            TokenKind::Identifier(name) => return write!(f, "{name}"),
            TokenKind::Plus => "+",
            TokenKind::PlusPlus => "++",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Bang => "!",
            TokenKind::BangEq => "!=",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::Less => "<",
            TokenKind::LessEq => "<=",
            TokenKind::LessLess => "<<",
            TokenKind::Greater => ">",
            TokenKind::GreaterEq => ">=",
            TokenKind::GreaterGreater => ">>",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Semicolon => ";",
            TokenKind::Eof => "end of file",
        };
        f.write_str(s)
    }
}

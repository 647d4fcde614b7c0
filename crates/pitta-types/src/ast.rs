//! AST node types for the Pitta language.
//!
//! The tree is a closed set of tagged variants; every consumer matches on it
//! exhaustively. Every node carries a [`Span`] for error reporting, and every
//! expression carries an [`ExprId`] that keys the resolver's side table.
//! Function declarations are reference-counted so runtime closures can share
//! them with the tree that produced them.

use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete program: a sequence of declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// Unique identity of an expression node within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExprId(pub u32);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var name = expr;` or `var name;`
    Var(VarDecl),
    /// `{ stmts... }`
    Block(Block),
    /// `if (cond) stmt [else stmt]`
    If(IfStmt),
    /// `while (cond) stmt`; `for` loops are lowered to this.
    While(WhileStmt),
    /// `func name(params) { body }`
    Function(Rc<FunctionDecl>),
    /// `class Name [< Super] { methods }`
    Class(ClassDecl),
    /// `print expr;`
    Print(PrintStmt),
    /// `return [expr];`
    Return(ReturnStmt),
    /// A bare expression; its value is discarded.
    Expr(ExprStmt),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Var(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Function(s) => s.span,
            Stmt::Class(s) => s.span,
            Stmt::Print(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Expr(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Ident,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// A named function or method.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl FunctionDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Ident,
    /// Always an `ExprKind::Variable` when present.
    pub superclass: Option<Expr>,
    pub methods: Vec<Rc<FunctionDecl>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Uses `Box` for recursive variants.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind, span: Span) -> Self {
        Self { id, kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `42`, `1.5`, `"text"`, `true`, `null`, `undefined`
    Literal(Literal),
    /// `name`
    Variable(Ident),
    /// `name = value`
    Assign { name: Ident, value: Box<Expr> },
    /// `a + b`, `a ++ b`, `a << b`, ...
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `a and b`, `a or b`: short-circuiting
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    /// `-x`, `!x`, `~x`
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// `callee(args...)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `object.name`
    Get { object: Box<Expr>, name: Ident },
    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Ident,
        value: Box<Expr>,
    },
    /// `this`
    This,
    /// `super.method`
    Super { method: Ident },
    /// `(expr)`
    Grouping(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Float(f32),
    String(String),
    Bool(bool),
    Null,
    Undefined,
}

// ── Operators ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Equality
    Eq,
    NotEq,
    // Comparison
    Less,
    Greater,
    LessEq,
    GreaterEq,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Integer bit operations
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    /// `++`, string concatenation. Never overloaded with `+`.
    Concat,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Less => "<",
            BinOp::Greater => ">",
            BinOp::LessEq => "<=",
            BinOp::GreaterEq => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Concat => "++",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `~x`
    BitNot,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

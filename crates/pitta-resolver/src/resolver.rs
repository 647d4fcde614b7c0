//! Resolver: walks a parsed AST, records local binding distances and
//! validates scope rules.
//!
//! Error codes emitted:
//! - E300: name already declared in this scope
//! - E301: local read inside its own initializer
//! - E302: `return` outside a function
//! - E303: `return` with a value inside `init`
//! - E304: `this` outside a class
//! - E305: `super` outside a class
//! - E306: `super` in a class without a superclass
//! - E307: class inheriting from itself

use std::collections::HashMap;

use pitta_types::ast::*;
use pitta_types::{CompileErrors, ErrorCode, PittaError, SourceFile, Span};

use crate::scope::ScopeStack;

/// Resolver side table: expression id → environment distance.
pub type Locals = HashMap<ExprId, usize>;

/// Output of a resolver pass.
#[derive(Debug, Default)]
pub struct Resolution {
    pub locals: Locals,
    pub errors: CompileErrors,
}

/// Resolve `program`, returning the side table and any scope-rule errors.
#[tracing::instrument(level = "debug", skip_all, fields(file = %source.name))]
pub fn resolve(program: &Program, source: &SourceFile) -> Resolution {
    let mut errors = CompileErrors::empty();
    let locals = Resolver::new(&mut errors, source).resolve(program);
    tracing::debug!(
        locals = locals.len(),
        errors = errors.total_errors,
        "resolution finished"
    );
    Resolution { locals, errors }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

// ══════════════════════════════════════════════════════════════════════════════
// Resolver
// ══════════════════════════════════════════════════════════════════════════════

pub struct Resolver<'a> {
    scopes: ScopeStack,
    locals: Locals,
    errors: &'a mut CompileErrors,
    source: &'a SourceFile,
    function: FunctionKind,
    class: ClassKind,
}

impl<'a> Resolver<'a> {
    pub fn new(errors: &'a mut CompileErrors, source: &'a SourceFile) -> Self {
        Self {
            scopes: ScopeStack::new(),
            locals: Locals::new(),
            errors,
            source,
            function: FunctionKind::None,
            class: ClassKind::None,
        }
    }

    /// Resolve a complete program, consuming the resolver.
    pub fn resolve(mut self, program: &Program) -> Locals {
        self.resolve_stmts(&program.stmts);
        self.locals
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn resolve_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => {
                self.scopes.push_scope();
                self.resolve_stmts(&block.stmts);
                self.scopes.pop_scope();
            }
            Stmt::Var(decl) => {
                self.declare(&decl.name);
                if let Some(init) = &decl.initializer {
                    self.resolve_expr(init);
                }
                self.scopes.define(&decl.name.name);
            }
            Stmt::Function(decl) => {
                // Defined before the body so the function can recurse.
                self.declare(&decl.name);
                self.scopes.define(&decl.name.name);
                self.resolve_function(decl, FunctionKind::Function);
            }
            Stmt::Class(decl) => self.resolve_class(decl),
            Stmt::Expr(s) => self.resolve_expr(&s.expr),
            Stmt::Print(s) => self.resolve_expr(&s.expr),
            Stmt::If(s) => {
                self.resolve_expr(&s.condition);
                self.resolve_stmt(&s.then_branch);
                if let Some(else_branch) = &s.else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(s) => {
                self.resolve_expr(&s.condition);
                self.resolve_stmt(&s.body);
            }
            Stmt::Return(s) => {
                if self.function == FunctionKind::None {
                    self.error(
                        ErrorCode::RETURN_OUTSIDE_FUNCTION,
                        "Can't return from top-level code.",
                        s.span,
                        "return",
                    );
                }
                if let Some(value) = &s.value {
                    if self.function == FunctionKind::Initializer {
                        self.error(
                            ErrorCode::RETURN_VALUE_IN_INITIALIZER,
                            "Can't return a value from an initializer.",
                            s.span,
                            "return",
                        );
                    }
                    self.resolve_expr(value);
                }
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionKind) {
        let enclosing = std::mem::replace(&mut self.function, kind);
        self.scopes.push_scope();
        for param in &decl.params {
            self.declare(param);
            self.scopes.define(&param.name);
        }
        // Parameters and body share one scope, matching one environment per call.
        self.resolve_stmts(&decl.body);
        self.scopes.pop_scope();
        self.function = enclosing;
    }

    fn resolve_class(&mut self, decl: &ClassDecl) {
        let enclosing = std::mem::replace(&mut self.class, ClassKind::Class);
        self.declare(&decl.name);
        self.scopes.define(&decl.name.name);

        if let Some(superclass) = &decl.superclass {
            if let ExprKind::Variable(name) = &superclass.kind {
                if name.name == decl.name.name {
                    self.error(
                        ErrorCode::SELF_INHERITANCE,
                        "A class can't inherit from itself.",
                        name.span,
                        &name.name,
                    );
                }
            }
            self.class = ClassKind::Subclass;
            self.resolve_expr(superclass);
            self.scopes.push_scope();
            self.scopes.define("super");
        }

        self.scopes.push_scope();
        self.scopes.define("this");
        for method in &decl.methods {
            let kind = if method.name.name == "init" {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            };
            self.resolve_function(method, kind);
        }
        self.scopes.pop_scope();

        if decl.superclass.is_some() {
            self.scopes.pop_scope();
        }
        self.class = enclosing;
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn resolve_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Variable(name) => {
                if self.scopes.is_uninitialized(&name.name) {
                    self.error(
                        ErrorCode::SELF_REFERENTIAL_INITIALIZER,
                        "Can't read local variable in its own initializer.",
                        name.span,
                        &name.name,
                    );
                }
                self.resolve_local(expr.id, &name.name);
            }
            ExprKind::Assign { name, value } => {
                self.resolve_expr(value);
                self.resolve_local(expr.id, &name.name);
            }
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            ExprKind::Unary { operand, .. } => self.resolve_expr(operand),
            ExprKind::Call { callee, args } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            ExprKind::Get { object, .. } => self.resolve_expr(object),
            ExprKind::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            ExprKind::Grouping(inner) => self.resolve_expr(inner),
            ExprKind::This => {
                if self.class == ClassKind::None {
                    self.error(
                        ErrorCode::THIS_OUTSIDE_CLASS,
                        "Can't use 'this' outside of a class.",
                        expr.span,
                        "this",
                    );
                    return;
                }
                self.resolve_local(expr.id, "this");
            }
            ExprKind::Super { .. } => {
                match self.class {
                    ClassKind::None => self.error(
                        ErrorCode::SUPER_OUTSIDE_CLASS,
                        "Can't use 'super' outside of a class.",
                        expr.span,
                        "super",
                    ),
                    ClassKind::Class => self.error(
                        ErrorCode::SUPER_WITHOUT_SUPERCLASS,
                        "Can't use 'super' in a class with no superclass.",
                        expr.span,
                        "super",
                    ),
                    ClassKind::Subclass => {}
                }
                self.resolve_local(expr.id, "super");
            }
        }
    }

    /// Record the distance to the innermost scope declaring `name`.
    /// Unrecorded references are resolved as globals at runtime.
    fn resolve_local(&mut self, id: ExprId, name: &str) {
        if let Some(distance) = self.scopes.distance(name) {
            self.locals.insert(id, distance);
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Helpers
    // ══════════════════════════════════════════════════════════════════════

    fn declare(&mut self, name: &Ident) {
        if !self.scopes.declare(&name.name) {
            self.error(
                ErrorCode::DUPLICATE_DECLARATION,
                "Already a variable with this name in this scope.",
                name.span,
                &name.name,
            );
        }
    }

    fn error(&mut self, code: ErrorCode, message: &str, span: Span, lexeme: &str) {
        let source_line = self.source.line(span.start_line).unwrap_or("");
        let err = PittaError::new(&self.source.name, code, message, span, source_line)
            .at_lexeme(lexeme);
        tracing::debug!(%code, line = span.line(), "{message}");
        self.errors.push_error(err);
    }
}

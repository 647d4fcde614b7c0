//! Declaration parsing: `var`, `func` and `class`.

use std::rc::Rc;

use pitta_lexer::token::TokenKind;
use pitta_types::ast::*;
use pitta_types::ErrorCode;

use crate::parser::{Parser, MAX_ARGUMENTS};

impl<'src> Parser<'src> {
    /// Parse one declaration, resynchronizing on failure.
    pub(crate) fn parse_declaration(&mut self) -> Option<Stmt> {
        let stmt = match self.peek_kind() {
            TokenKind::Class => self.parse_class_decl(),
            TokenKind::Func => {
                self.advance();
                self.parse_function("function").map(Stmt::Function)
            }
            TokenKind::Var => self.parse_var_decl(),
            _ => self.parse_statement(),
        };
        if stmt.is_none() {
            self.synchronize();
        }
        stmt
    }

    /// `var name [= expr];`
    pub(crate) fn parse_var_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `var`
        let name = self.expect_identifier("Expect variable name.")?;
        let initializer = if self.eat(&TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(
            &TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Some(Stmt::Var(VarDecl {
            name,
            initializer,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `name(params) { body }`, after `func` or inside a class body.
    /// `kind` names the construct in error messages.
    pub(crate) fn parse_function(&mut self, kind: &str) -> Option<Rc<FunctionDecl>> {
        let name = self.expect_identifier(&format!("Expect {kind} name."))?;
        self.expect(
            &TokenKind::LParen,
            &format!("Expect '(' after {kind} name."),
        )?;

        let mut params = Vec::new();
        if !self.check_exact(&TokenKind::RParen) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    self.error_at_current(
                        ErrorCode::TOO_MANY_PARAMETERS,
                        format!("Can't have more than {MAX_ARGUMENTS} parameters."),
                    );
                }
                params.push(self.expect_identifier("Expect parameter name.")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "Expect ')' after parameters.")?;

        if !self.check_exact(&TokenKind::LBrace) {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("Expect '{{' before {kind} body."),
            );
            return None;
        }
        let body = self.parse_block()?;
        Some(Rc::new(FunctionDecl {
            span: name.span.merge(body.span),
            name,
            params,
            body: body.stmts,
        }))
    }

    /// `class Name [< Super] { methods }`
    fn parse_class_decl(&mut self) -> Option<Stmt> {
        let start = self.advance().span; // eat `class`
        let name = self.expect_identifier("Expect class name.")?;

        let superclass = if self.eat(&TokenKind::Less) {
            let ident = self.expect_identifier("Expect superclass name.")?;
            let span = ident.span;
            Some(self.expr(ExprKind::Variable(ident), span))
        } else {
            None
        };

        self.expect(&TokenKind::LBrace, "Expect '{' before class body.")?;
        let mut methods = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            methods.push(self.parse_function("method")?);
        }
        self.expect(&TokenKind::RBrace, "Expect '}' after class body.")?;

        Some(Stmt::Class(ClassDecl {
            name,
            superclass,
            methods,
            span: start.merge(self.previous_span()),
        }))
    }
}

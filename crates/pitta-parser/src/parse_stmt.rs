//! Statement parsing.

use pitta_lexer::token::TokenKind;
use pitta_types::ast::*;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// Parse a single non-declaration statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        if !self.enter_nesting() {
            return None;
        }
        let stmt = match self.peek_kind() {
            TokenKind::Print => self.parse_print_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::LBrace => self.parse_block().map(Stmt::Block),
            _ => self.parse_expr_stmt(),
        };
        self.exit_nesting();
        stmt
    }

    /// Parse a block: `{ declarations... }`
    ///
    /// Declarations that fail to parse are skipped; the block keeps going.
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current_span();
        self.expect(&TokenKind::LBrace, "Expect '{' before block.")?;
        let mut stmts = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) && !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            if let Some(stmt) = self.parse_declaration() {
                stmts.push(stmt);
            }
        }
        self.expect(&TokenKind::RBrace, "Expect '}' after block.")?;
        Some(Block {
            stmts,
            span: start.merge(self.previous_span()),
        })
    }

    /// `print expr;`
    fn parse_print_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let expr = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon, "Expect ';' after value.")?;
        Some(Stmt::Print(PrintStmt {
            expr,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `return [expr];`
    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        let value = if self.check_exact(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon, "Expect ';' after return value.")?;
        Some(Stmt::Return(ReturnStmt {
            value,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `if (cond) stmt [else stmt]`
    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        self.expect(&TokenKind::LParen, "Expect '(' after 'if'.")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "Expect ')' after if condition.")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Some(Stmt::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `while (cond) stmt`
    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        self.expect(&TokenKind::LParen, "Expect '(' after 'while'.")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "Expect ')' after condition.")?;
        let body = Box::new(self.parse_statement()?);
        Some(Stmt::While(WhileStmt {
            condition,
            body,
            span: start.merge(self.previous_span()),
        }))
    }

    /// `for (init; cond; incr) stmt`, lowered to
    /// `{ init; while (cond) { stmt; incr; } }`.
    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance().span;
        self.expect(&TokenKind::LParen, "Expect '(' after 'for'.")?;

        let initializer = match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
                None
            }
            TokenKind::Var => Some(self.parse_var_decl()?),
            _ => Some(self.parse_expr_stmt()?),
        };

        let condition = if self.check_exact(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check_exact(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen, "Expect ')' after for clauses.")?;

        let mut body = self.parse_statement()?;
        let span = start.merge(self.previous_span());

        if let Some(increment) = increment {
            let incr_span = increment.span;
            body = Stmt::Block(Block {
                stmts: vec![
                    body,
                    Stmt::Expr(ExprStmt {
                        expr: increment,
                        span: incr_span,
                    }),
                ],
                span,
            });
        }

        let condition = match condition {
            Some(condition) => condition,
            None => self.expr(ExprKind::Literal(Literal::Bool(true)), span),
        };
        let mut lowered = Stmt::While(WhileStmt {
            condition,
            body: Box::new(body),
            span,
        });

        if let Some(initializer) = initializer {
            lowered = Stmt::Block(Block {
                stmts: vec![initializer, lowered],
                span,
            });
        }
        Some(lowered)
    }

    /// `expr;`
    fn parse_expr_stmt(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression()?;
        self.expect(&TokenKind::Semicolon, "Expect ';' after expression.")?;
        Some(Stmt::Expr(ExprStmt {
            span: expr.span.merge(self.previous_span()),
            expr,
        }))
    }
}

//! Expression parsing with full operator precedence.
//!
//! Precedence (lowest → highest):
//! 1. `=` (assignment, right-associative)
//! 2. `or`
//! 3. `and`
//! 4. `==`, `!=`
//! 5. `<`, `<=`, `>`, `>=`
//! 6. `+`, `-`, `%`, `&`, `|`, `^`, `++`, `<<`, `>>`
//! 7. `*`, `/`
//! 8. unary `!`, `-`, `~`
//! 9. `()` (call), `.` (property)

use pitta_lexer::token::TokenKind;
use pitta_types::ast::*;
use pitta_types::ErrorCode;

use crate::parser::{Parser, MAX_ARGUMENTS};

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        if !self.enter_nesting() {
            return None;
        }
        let result = self.parse_assignment();
        self.exit_nesting();
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `assignment = ( call "." )? IDENT "=" assignment | or`
    fn parse_assignment(&mut self) -> Option<Expr> {
        let target = self.parse_or()?;

        if !self.check_exact(&TokenKind::Eq) {
            return Some(target);
        }
        let equals = self.advance();
        let value = self.parse_assignment()?;
        let span = target.span.merge(value.span);

        match target.kind {
            ExprKind::Variable(name) => Some(self.expr(
                ExprKind::Assign {
                    name,
                    value: Box::new(value),
                },
                span,
            )),
            ExprKind::Get { object, name } => Some(self.expr(
                ExprKind::Set {
                    object,
                    name,
                    value: Box::new(value),
                },
                span,
            )),
            _ => {
                // Reported without resynchronizing: the expression is still well formed.
                self.error_at_token(
                    &equals,
                    ErrorCode::INVALID_ASSIGNMENT_TARGET,
                    "Invalid assignment target.",
                );
                Some(target)
            }
        }
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = self.logical(left, LogicalOp::Or, right);
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_equality()?;
            left = self.logical(left, LogicalOp::And, right);
        }
        Some(left)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = self.binary(left, op, right);
        }
        Some(left)
    }

    fn parse_comparison(&mut self) -> Option<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Greater => BinOp::Greater,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                TokenKind::Less => BinOp::Less,
                TokenKind::LessEq => BinOp::LessEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = self.binary(left, op, right);
        }
        Some(left)
    }

    /// Additive, bitwise, shift and concatenation operators share one level.
    fn parse_term(&mut self) -> Option<Expr> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Plus => BinOp::Add,
                TokenKind::Percent => BinOp::Mod,
                TokenKind::Amp => BinOp::BitAnd,
                TokenKind::Pipe => BinOp::BitOr,
                TokenKind::Caret => BinOp::BitXor,
                TokenKind::PlusPlus => BinOp::Concat,
                TokenKind::LessLess => BinOp::Shl,
                TokenKind::GreaterGreater => BinOp::Shr,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            left = self.binary(left, op, right);
        }
        Some(left)
    }

    fn parse_factor(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Slash => BinOp::Div,
                TokenKind::Star => BinOp::Mul,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(left, op, right);
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Tilde => UnaryOp::BitNot,
            _ => return self.parse_call(),
        };
        let start = self.advance().span;
        if !self.enter_nesting() {
            return None;
        }
        let operand = self.parse_unary();
        self.exit_nesting();
        let operand = operand?;
        let span = start.merge(operand.span);
        Some(self.expr(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `call = primary ( "(" arguments? ")" | "." IDENT )*`
    fn parse_call(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::LParen) {
                expr = self.finish_call(expr)?;
            } else if self.eat(&TokenKind::Dot) {
                let name = self.expect_identifier("Expect property name after '.'.")?;
                let span = expr.span.merge(name.span);
                expr = self.expr(
                    ExprKind::Get {
                        object: Box::new(expr),
                        name,
                    },
                    span,
                );
            } else {
                break;
            }
        }
        Some(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Option<Expr> {
        let mut args = Vec::new();
        if !self.check_exact(&TokenKind::RParen) {
            loop {
                if args.len() >= MAX_ARGUMENTS {
                    self.error_at_current(
                        ErrorCode::TOO_MANY_ARGUMENTS,
                        format!("Can't have more than {MAX_ARGUMENTS} arguments."),
                    );
                }
                args.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let paren = self.expect(&TokenKind::RParen, "Expect ')' after arguments.")?;
        let span = callee.span.merge(paren.span);
        Some(self.expr(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Option<Expr> {
        let token = self.peek().clone();
        let span = token.span;
        let kind = match token.kind {
            TokenKind::IntLit(n) => ExprKind::Literal(Literal::Int(n)),
            TokenKind::FloatLit(n) => ExprKind::Literal(Literal::Float(n)),
            TokenKind::StringLit(s) => ExprKind::Literal(Literal::String(s)),
            TokenKind::True => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::False => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::Null => ExprKind::Literal(Literal::Null),
            TokenKind::Undefined => ExprKind::Literal(Literal::Undefined),
            TokenKind::This => ExprKind::This,
            TokenKind::Identifier(name) => ExprKind::Variable(Ident::new(name, span)),
            TokenKind::Super => {
                self.advance();
                self.expect(&TokenKind::Dot, "Expect '.' after 'super'.")?;
                let method = self.expect_identifier("Expect superclass method name.")?;
                let span = span.merge(method.span);
                return Some(self.expr(ExprKind::Super { method }, span));
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                let close = self.expect(&TokenKind::RParen, "Expect ')' after expression.")?;
                let span = span.merge(close.span);
                return Some(self.expr(ExprKind::Grouping(Box::new(inner)), span));
            }
            _ => {
                self.error_at_current(ErrorCode::EXPECTED_EXPRESSION, "Expect expression.");
                return None;
            }
        };
        self.advance();
        Some(self.expr(kind, span))
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn binary(&mut self, left: Expr, op: BinOp, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        self.expr(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    fn logical(&mut self, left: Expr, op: LogicalOp, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        self.expr(
            ExprKind::Logical {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }
}

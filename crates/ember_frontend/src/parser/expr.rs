use super::{ParseResult, Parser};
use crate::ast::*;
use crate::peek::Peek;
use crate::token::{Keyword, Token, TokenKind};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Lowest,

    Range,

    LogicalOr,
    LogicalAnd,

    Equality,
    Comparison,

    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,

    Shift,

    Term,
    Factor,

    Unary,
}

/// A binary-shaped operator: either a real `BinOp` or a range bound.
#[derive(Clone, Copy)]
enum InfixOp {
    Bin(BinOp),
    Range { inclusive: bool },
}

fn infix_prec(op: InfixOp) -> Prec {
    match op {
        InfixOp::Range { .. } => Prec::Range,

        InfixOp::Bin(op) => match op {
            BinOp::Or => Prec::LogicalOr,
            BinOp::And => Prec::LogicalAnd,

            BinOp::Eq | BinOp::NotEq => Prec::Equality,
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => Prec::Comparison,

            BinOp::BitOr => Prec::BitwiseOr,
            BinOp::BitXor => Prec::BitwiseXor,
            BinOp::BitAnd => Prec::BitwiseAnd,

            BinOp::Shl | BinOp::Shr => Prec::Shift,

            BinOp::Add | BinOp::Sub => Prec::Term,
            BinOp::Mul | BinOp::Div | BinOp::Mod => Prec::Factor,
        },
    }
}

impl Parser {
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_prec(Prec::Lowest)
    }

    fn parse_prec(&mut self, prec: Prec) -> ParseResult<Expr> {
        let mut expr = self.parse_lhs()?;

        while let Some(op) = self.peek_infix_op(prec) {
            self.tokens.next();

            let rhs = self.parse_prec(infix_prec(op))?;
            let span = expr.span.union(rhs.span);

            expr = match op {
                InfixOp::Bin(op) => Expr::new(
                    ExprKind::BinOp {
                        op,
                        lhs: Box::new(expr),
                        rhs: Box::new(rhs),
                    },
                    span,
                ),
                InfixOp::Range { inclusive } => Expr::new(
                    ExprKind::Range {
                        start: Box::new(expr),
                        end: Box::new(rhs),
                        inclusive,
                    },
                    span,
                ),
            };
        }

        Ok(expr)
    }

    fn parse_lhs(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_primary()?;
        self.parse_postfix(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        match self.tokens.peek() {
            Some(Token {
                kind: TokenKind::Integer(n),
                span,
            }) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::Integer(n), span))
            }

            Some(Token {
                kind: TokenKind::BinInteger { value, width },
                span,
            }) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::BinInteger { value, width }, span))
            }

            Some(Token {
                kind: TokenKind::String(s),
                span,
            }) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::String(s), span))
            }

            Some(Token {
                kind: TokenKind::Bool(b),
                span,
            }) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::Bool(b), span))
            }

            Some(Token {
                kind: TokenKind::Identifier(name),
                span,
            }) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::Var(name), span))
            }

            Some(t) if t.kind == TokenKind::Keyword(Keyword::SelfValue) => {
                self.tokens.next();
                Ok(Expr::new(ExprKind::Var("self".to_owned()), t.span))
            }

            Some(t) if t.kind == TokenKind::Sub => {
                self.tokens.next();

                let expr = self.parse_prec(Prec::Unary)?;
                let span = t.span.union(expr.span);
                Ok(Expr::new(
                    ExprKind::UnOp {
                        op: UnOp::Negate,
                        expr: Box::new(expr),
                    },
                    span,
                ))
            }

            Some(t) if t.kind == TokenKind::Bang => {
                self.tokens.next();

                let expr = self.parse_prec(Prec::Unary)?;
                let span = t.span.union(expr.span);
                Ok(Expr::new(
                    ExprKind::UnOp {
                        op: UnOp::Not,
                        expr: Box::new(expr),
                    },
                    span,
                ))
            }

            Some(t) if t.kind == TokenKind::BitAnd => {
                self.tokens.next();

                let expr = self.parse_prec(Prec::Unary)?;
                let span = t.span.union(expr.span);
                Ok(Expr::new(ExprKind::Ref(Box::new(expr)), span))
            }

            Some(t) if t.kind == TokenKind::LParen => {
                self.tokens.next();

                let expr = self.parse_or_recover(Self::parse_expr, |parser, span| {
                    parser.seek(|kind| *kind == TokenKind::RParen);
                    Expr::new(ExprKind::ParseError, span)
                });

                self.expect(TokenKind::RParen)?;

                Ok(expr)
            }

            other => Err(self.error_expected("an expression", other)),
        }
    }

    // calls, index chains and field access bind tighter than any operator
    fn parse_postfix(&mut self, mut expr: Expr) -> ParseResult<Expr> {
        loop {
            match self.tokens.peek() {
                Some(t) if t.kind == TokenKind::LParen => {
                    self.tokens.next();

                    let args = self.parse_args()?;
                    let close = self.expect(TokenKind::RParen)?;

                    let span = expr.span.union(close.span);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }

                Some(t) if t.kind == TokenKind::LBracket => {
                    self.tokens.next();

                    let index = self.parse_expr()?;
                    let close = self.expect(TokenKind::RBracket)?;

                    let span = expr.span.union(close.span);
                    expr = Expr::new(
                        ExprKind::Index {
                            target: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }

                Some(t) if t.kind == TokenKind::Dot => {
                    self.tokens.next();

                    let field = self.parse_ident()?;
                    let span = expr.span.union(field.span);
                    expr = Expr::new(
                        ExprKind::FieldAccess {
                            target: Box::new(expr),
                            field,
                        },
                        span,
                    );
                }

                _ => return Ok(expr),
            }
        }
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = vec![];

        while !self.at_kind(TokenKind::RParen) {
            args.push(self.parse_expr()?);
            if !self.eat_kind(TokenKind::Comma) {
                break;
            }
        }

        Ok(args)
    }

    fn peek_infix_op(&self, prec: Prec) -> Option<InfixOp> {
        let op = match self.tokens.peek().map(|t| t.kind)? {
            TokenKind::Range => InfixOp::Range { inclusive: false },
            TokenKind::RangeInclusive => InfixOp::Range { inclusive: true },

            TokenKind::Or => InfixOp::Bin(BinOp::Or),
            TokenKind::And => InfixOp::Bin(BinOp::And),

            TokenKind::Eq => InfixOp::Bin(BinOp::Eq),
            TokenKind::NotEq => InfixOp::Bin(BinOp::NotEq),
            TokenKind::Lt => InfixOp::Bin(BinOp::Lt),
            TokenKind::Gt => InfixOp::Bin(BinOp::Gt),
            TokenKind::LtEq => InfixOp::Bin(BinOp::LtEq),
            TokenKind::GtEq => InfixOp::Bin(BinOp::GtEq),

            TokenKind::BitOr => InfixOp::Bin(BinOp::BitOr),
            TokenKind::BitXor => InfixOp::Bin(BinOp::BitXor),
            TokenKind::BitAnd => InfixOp::Bin(BinOp::BitAnd),

            TokenKind::Shl => InfixOp::Bin(BinOp::Shl),
            TokenKind::Shr => InfixOp::Bin(BinOp::Shr),

            TokenKind::Add => InfixOp::Bin(BinOp::Add),
            TokenKind::Sub => InfixOp::Bin(BinOp::Sub),
            TokenKind::Mul => InfixOp::Bin(BinOp::Mul),
            TokenKind::Div => InfixOp::Bin(BinOp::Div),
            TokenKind::Mod => InfixOp::Bin(BinOp::Mod),

            _ => return None,
        };

        (infix_prec(op) > prec).then_some(op)
    }
}

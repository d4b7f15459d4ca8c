#[cfg(test)]
mod tests;

mod expr;

use ember_session::diagnostics::prelude::*;

use crate::ast::*;
use crate::lexer::TokenIter;
use crate::peek::Peek;
use crate::token::{Keyword, Token, TokenKind};

#[derive(Debug, serde::Serialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

#[derive(Debug, PartialEq, Eq, serde::Serialize, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("expected {0}")]
    Expected(String),

    #[error("parameter `{0}` without a default follows a defaulted parameter")]
    DefaultAfterRequired(String),

    #[error("invalid assignment target")]
    InvalidAssignTarget,

    #[error("`for` needs a range bound such as `0..10`")]
    ExpectedRange,
}

impl IntoDiagnostic<SourceId> for ParseError {
    fn into_diagnostic(self, source_id: &SourceId) -> Diagnostic {
        Diagnostic::error(Category::Syntax, self.kind.to_string())
            .with_snippet(Snippet::primary("", *source_id, self.span))
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    tokens: TokenIter,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: TokenIter) -> Self {
        Self {
            tokens,
            errors: vec![],
        }
    }

    pub fn parse(mut self) -> (SourceFile, Vec<ParseError>) {
        let file = self.parse_source_file();
        (file, self.errors)
    }

    fn parse_source_file(&mut self) -> SourceFile {
        let mut uses = vec![];
        let mut items = vec![];

        while let Some(token) = self.tokens.peek() {
            match token.kind {
                TokenKind::Keyword(Keyword::Use) => {
                    self.tokens.next();
                    if let Some(use_decl) = self.parse_use_decl(token.span) {
                        uses.push(use_decl);
                    }
                }

                TokenKind::Keyword(Keyword::Macro) => {
                    self.tokens.next();
                    items.push(self.parse_or_recover(
                        |parser| parser.parse_macro_const().map(Item::MacroConst),
                        |parser, _| {
                            parser.seek_item_start();
                            Item::ParseError
                        },
                    ));
                }

                TokenKind::Keyword(Keyword::Fn) => {
                    self.tokens.next();
                    items.push(self.parse_or_recover(
                        |parser| parser.parse_func(false).map(Item::Func),
                        |parser, _| {
                            parser.seek_item_start();
                            Item::ParseError
                        },
                    ));
                }

                TokenKind::Keyword(Keyword::Struct) => {
                    self.tokens.next();
                    items.push(self.parse_or_recover(
                        |parser| parser.parse_struct().map(Item::Struct),
                        |parser, _| {
                            parser.seek_item_start();
                            Item::ParseError
                        },
                    ));
                }

                TokenKind::Keyword(Keyword::Enum) => {
                    self.tokens.next();
                    items.push(self.parse_or_recover(
                        |parser| parser.parse_enum().map(Item::Enum),
                        |parser, _| {
                            parser.seek_item_start();
                            Item::ParseError
                        },
                    ));
                }

                TokenKind::Keyword(Keyword::Impl) => {
                    self.tokens.next();
                    items.push(self.parse_or_recover(
                        |parser| parser.parse_impl().map(Item::Impl),
                        |parser, _| {
                            parser.seek_item_start();
                            Item::ParseError
                        },
                    ));
                }

                _ => {
                    self.tokens.next();
                    self.report(self.error_expected("a declaration", Some(token)));
                    self.seek_item_start();
                }
            }
        }

        SourceFile { uses, items }
    }

    fn parse_use_decl(&mut self, kw_span: Span) -> Option<UseDecl> {
        match self.tokens.peek() {
            Some(Token {
                kind: TokenKind::String(path),
                span,
            }) => {
                self.tokens.next();
                Some(UseDecl {
                    path,
                    span: kw_span.union(span),
                })
            }
            other => {
                self.report(self.error_expected("an import path string", other));
                None
            }
        }
    }

    fn parse_macro_const(&mut self) -> ParseResult<MacroConstDecl> {
        let name = self.parse_ident()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_literal()?;
        Ok(MacroConstDecl { name, value })
    }

    fn parse_literal(&mut self) -> ParseResult<Literal> {
        let kind = match self.tokens.peek() {
            Some(Token {
                kind: TokenKind::Integer(n),
                ..
            }) => LiteralKind::Integer(n),
            Some(Token {
                kind: TokenKind::BinInteger { value, width },
                ..
            }) => LiteralKind::BinInteger { value, width },
            Some(Token {
                kind: TokenKind::String(s),
                ..
            }) => LiteralKind::String(s),
            Some(Token {
                kind: TokenKind::Bool(b),
                ..
            }) => LiteralKind::Bool(b),
            other => return Err(self.error_expected("a literal value", other)),
        };

        let span = self.tokens.peek_span();
        self.tokens.next();
        Ok(Literal { kind, span })
    }

    fn parse_func(&mut self, allow_self: bool) -> ParseResult<FuncDecl> {
        let name = self.parse_ident()?;

        self.expect(TokenKind::LParen)?;

        let mut has_self = false;
        if allow_self {
            if let Some(t) = self.tokens.peek() {
                if t.kind == TokenKind::Keyword(Keyword::SelfValue) {
                    self.tokens.next();
                    has_self = true;
                    if !self.eat_kind(TokenKind::Comma) && !self.at_kind(TokenKind::RParen) {
                        self.expect(TokenKind::RParen)?;
                    }
                }
            }
        }

        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;

        let (ret_ty, ret_ty_span) = if self.eat_kind(TokenKind::Arrow) {
            let (ty, span) = self.parse_type()?;
            (ty, Some(span))
        } else {
            (Type::Unit, None)
        };

        let body = self.parse_block()?;

        Ok(FuncDecl {
            name,
            has_self,
            params,
            ret_ty,
            ret_ty_span,
            body,
        })
    }

    // defaults are only allowed on a trailing suffix of the parameter list
    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = vec![];
        let mut seen_default = false;

        while !self.at_kind(TokenKind::RParen) {
            let name = self.parse_ident()?;
            self.expect(TokenKind::Colon)?;
            let (ty, ty_span) = self.parse_type()?;

            let default = if self.eat_kind(TokenKind::Assign) {
                Some(self.parse_expr()?)
            } else {
                None
            };

            match &default {
                Some(_) => seen_default = true,
                None if seen_default => {
                    self.report(ParseError {
                        kind: ParseErrorKind::DefaultAfterRequired(name.name.clone()),
                        span: name.span,
                    });
                }
                None => {}
            }

            params.push(Param {
                name,
                ty,
                ty_span,
                default,
            });

            if !self.eat_kind(TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    fn parse_struct(&mut self) -> ParseResult<StructDecl> {
        let name = self.parse_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut fields = vec![];
        while !self.at_kind(TokenKind::RBrace) {
            let name = self.parse_ident()?;
            self.expect(TokenKind::Colon)?;
            let (ty, ty_span) = self.parse_type()?;
            fields.push(Field { name, ty, ty_span });

            if !self.eat_kind(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(StructDecl { name, fields })
    }

    fn parse_enum(&mut self) -> ParseResult<EnumDecl> {
        let name = self.parse_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut variants = vec![];
        while !self.at_kind(TokenKind::RBrace) {
            variants.push(self.parse_ident()?);
            if !self.eat_kind(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(EnumDecl { name, variants })
    }

    fn parse_impl(&mut self) -> ParseResult<ImplBlock> {
        let target = self.parse_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut funcs = vec![];
        while !self.at_kind(TokenKind::RBrace) {
            match self.tokens.next() {
                Some(t) if t.kind == TokenKind::Keyword(Keyword::Fn) => {
                    funcs.push(self.parse_func(true)?);
                }
                other => return Err(self.error_expected("a method", other)),
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(ImplBlock { target, funcs })
    }

    fn parse_type(&mut self) -> ParseResult<(Type, Span)> {
        match self.tokens.peek() {
            Some(t) if t.kind == TokenKind::BitAnd => {
                self.tokens.next();
                let (inner, inner_span) = self.parse_type()?;
                Ok((Type::Ref(Box::new(inner)), t.span.union(inner_span)))
            }

            Some(Token {
                kind: TokenKind::Identifier(name),
                span,
            }) => {
                self.tokens.next();

                let ty = match name.as_str() {
                    "u8" => Type::U8,
                    "u16" => Type::U16,
                    "u32" => Type::U32,
                    "u64" => Type::U64,
                    "i8" => Type::I8,
                    "i16" => Type::I16,
                    "i32" => Type::I32,
                    "i64" => Type::I64,
                    "bool" => Type::Bool,
                    "str" => Type::Str,
                    _ => Type::Named(name),
                };

                Ok((ty, span))
            }

            other => Err(self.error_expected("a type", other)),
        }
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        let open = self.expect(TokenKind::LBrace)?;

        let mut stmts = vec![];
        while self
            .tokens
            .peek()
            .is_some_and(|t| t.kind != TokenKind::RBrace)
        {
            stmts.push(self.parse_statement_or_recover());
        }

        let close = self.expect(TokenKind::RBrace)?;

        Ok(Block {
            stmts,
            span: open.span.union(close.span),
        })
    }

    fn parse_statement_or_recover(&mut self) -> Stmt {
        self.parse_or_recover(Self::parse_statement, |parser, _| {
            parser.seek_statement_start();
            Stmt::ParseError
        })
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let Some(token) = self.tokens.peek() else {
            return Err(self.error_expected("a statement", None));
        };

        match token.kind {
            TokenKind::Keyword(Keyword::Let) => {
                self.tokens.next();

                let name = self.parse_ident()?;

                let (ty, ty_span) = if self.eat_kind(TokenKind::Colon) {
                    let (ty, span) = self.parse_type()?;
                    (Some(ty), Some(span))
                } else {
                    (None, None)
                };

                self.expect(TokenKind::Assign)?;
                let value = self.parse_expr()?;

                Ok(Stmt::Let {
                    name,
                    ty,
                    ty_span,
                    value,
                })
            }

            TokenKind::Keyword(Keyword::If) => self.parse_if(),

            TokenKind::Keyword(Keyword::While) => {
                self.tokens.next();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt::While { cond, body })
            }

            TokenKind::Keyword(Keyword::Loop) => {
                self.tokens.next();
                let body = self.parse_block()?;
                Ok(Stmt::Loop { body })
            }

            TokenKind::Keyword(Keyword::For) => {
                self.tokens.next();

                let var = self.parse_ident()?;
                self.expect(TokenKind::Keyword(Keyword::In))?;

                let bound = self.parse_expr()?;
                let ExprKind::Range {
                    start,
                    end,
                    inclusive,
                } = bound.kind
                else {
                    return Err(ParseError {
                        kind: ParseErrorKind::ExpectedRange,
                        span: bound.span,
                    });
                };

                let body = self.parse_block()?;

                Ok(Stmt::ForRange {
                    var,
                    start: *start,
                    end: *end,
                    inclusive,
                    body,
                })
            }

            TokenKind::Keyword(Keyword::Return) => {
                self.tokens.next();

                let value = if self.at_expr_start() {
                    Some(self.parse_expr()?)
                } else {
                    None
                };

                let span = match &value {
                    Some(expr) => token.span.union(expr.span),
                    None => token.span,
                };

                Ok(Stmt::Return { value, span })
            }

            TokenKind::Keyword(Keyword::Break) => {
                self.tokens.next();
                Ok(Stmt::Break(token.span))
            }

            TokenKind::Keyword(Keyword::Continue) => {
                self.tokens.next();
                Ok(Stmt::Continue(token.span))
            }

            TokenKind::Keyword(Keyword::Assert) => {
                self.tokens.next();

                let first = self.parse_expr()?;
                let kind = if self.eat_kind(TokenKind::Assign) {
                    let second = self.parse_expr()?;
                    AssertKind::Equal(first, second)
                } else {
                    AssertKind::Truthy(first)
                };

                let span = token.span.union(self.tokens.prev_span());
                Ok(Stmt::Assert { kind, span })
            }

            TokenKind::Question => {
                self.tokens.next();
                let payload = self.parse_expr()?;
                let span = token.span.union(payload.span);
                Ok(Stmt::Panic { payload, span })
            }

            TokenKind::At => {
                self.tokens.next();

                match self.tokens.peek() {
                    Some(Token {
                        kind: TokenKind::Integer(number),
                        span,
                    }) => {
                        self.tokens.next();
                        Ok(Stmt::Interrupt {
                            number,
                            span: token.span.union(span),
                        })
                    }
                    other => Err(self.error_expected("an interrupt number", other)),
                }
            }

            _ => {
                let expr = self.parse_expr()?;

                if self.eat_kind(TokenKind::Assign) {
                    let value = self.parse_expr()?;
                    return self.make_assignment(expr, value);
                }

                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        // the `if` keyword
        self.tokens.next();

        let cond = self.parse_expr()?;
        let then_block = self.parse_block()?;

        let else_block = if self.eat_kind(TokenKind::Keyword(Keyword::Else)) {
            if self.at_kind(TokenKind::Keyword(Keyword::If)) {
                // nest the chained `if` as the sole statement of the else
                let start = self.tokens.peek_span();
                let nested = self.parse_if()?;
                let span = Span::new(start.start, self.tokens.prev_span().end);
                Some(Block {
                    stmts: vec![nested],
                    span,
                })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
        })
    }

    fn make_assignment(&mut self, target: Expr, value: Expr) -> ParseResult<Stmt> {
        match target.kind {
            ExprKind::Var(name) => Ok(Stmt::Assign {
                target: Ident {
                    name,
                    span: target.span,
                },
                value,
            }),

            ExprKind::Index {
                target: indexed,
                index,
            } => match indexed.kind {
                ExprKind::Var(name) => Ok(Stmt::IndexAssign {
                    target: Ident {
                        name,
                        span: indexed.span,
                    },
                    index: *index,
                    value,
                }),
                _ => Err(ParseError {
                    kind: ParseErrorKind::InvalidAssignTarget,
                    span: indexed.span,
                }),
            },

            _ => Err(ParseError {
                kind: ParseErrorKind::InvalidAssignTarget,
                span: target.span,
            }),
        }
    }

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        match self.tokens.peek() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                span,
            }) => {
                self.tokens.next();
                Ok(Ident { name, span })
            }
            other => Err(self.error_expected("an identifier", other)),
        }
    }

    fn at_expr_start(&self) -> bool {
        matches!(
            self.tokens.peek().map(|t| t.kind),
            Some(
                TokenKind::Integer(_)
                    | TokenKind::BinInteger { .. }
                    | TokenKind::String(_)
                    | TokenKind::Bool(_)
                    | TokenKind::Identifier(_)
                    | TokenKind::Keyword(Keyword::SelfValue)
                    | TokenKind::Sub
                    | TokenKind::Bang
                    | TokenKind::BitAnd
                    | TokenKind::LParen
            )
        )
    }

    fn parse_or_recover<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
        recover: impl FnOnce(&mut Self, Span) -> T,
    ) -> T {
        let span_start = self.tokens.peek_span();

        match parse(self) {
            Ok(node) => node,
            Err(err) => {
                self.report(err);
                let span = Span::new(
                    span_start.start,
                    self.tokens.prev_span().end.max(span_start.start),
                );
                recover(self, span)
            }
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        match self.tokens.peek() {
            Some(t) if t.kind == kind => {
                self.tokens.next();
                Ok(t)
            }

            other => Err(self.error_expected_kind(kind, other)),
        }
    }

    fn eat_kind(&mut self, kind: TokenKind) -> bool {
        match self.tokens.peek() {
            Some(t) if t.kind == kind => {
                self.tokens.next();
                true
            }
            _ => false,
        }
    }

    fn at_kind(&self, kind: TokenKind) -> bool {
        self.tokens.peek().is_some_and(|t| t.kind == kind)
    }

    fn seek_statement_start(&mut self) {
        self.seek(|kind| {
            matches!(
                kind,
                TokenKind::Keyword(
                    Keyword::Let
                        | Keyword::If
                        | Keyword::While
                        | Keyword::Loop
                        | Keyword::For
                        | Keyword::Return
                        | Keyword::Break
                        | Keyword::Continue
                        | Keyword::Assert
                ) | TokenKind::Question
                    | TokenKind::At
            )
        });
    }

    fn seek_item_start(&mut self) {
        self.seek(|kind| {
            matches!(
                kind,
                TokenKind::Keyword(
                    Keyword::Use
                        | Keyword::Macro
                        | Keyword::Fn
                        | Keyword::Struct
                        | Keyword::Enum
                        | Keyword::Impl
                )
            )
        });
    }

    /// Skips forward to the next token matching `stop`, without crossing the
    /// closing bracket of the enclosing scope.
    fn seek(&mut self, stop: impl Fn(&TokenKind) -> bool) -> bool {
        let mut brace_depth = 0usize;

        let mut paren_depth = 0usize;
        let mut paren_depth_stack = vec![];

        loop {
            match self.tokens.peek() {
                Some(token) if stop(&token.kind) => {
                    return true;
                }

                Some(token) if token.kind == TokenKind::LBrace => {
                    self.tokens.next();

                    brace_depth += 1;

                    paren_depth_stack.push(paren_depth);
                    paren_depth = 0;
                }

                Some(token) if token.kind == TokenKind::RBrace => {
                    if brace_depth == 0 {
                        return false;
                    }

                    self.tokens.next();
                    brace_depth -= 1;
                    paren_depth = paren_depth_stack.pop().unwrap_or(0);
                }

                Some(token)
                    if matches!(token.kind, TokenKind::LParen | TokenKind::LBracket) =>
                {
                    self.tokens.next();
                    paren_depth += 1;
                }

                Some(token)
                    if matches!(token.kind, TokenKind::RParen | TokenKind::RBracket) =>
                {
                    if paren_depth == 0 {
                        return false;
                    }

                    self.tokens.next();
                    paren_depth -= 1;
                }

                Some(_) => {
                    self.tokens.next();
                }

                None => {
                    return false;
                }
            }
        }
    }

    fn report(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn error_expected_kind(&self, kind: TokenKind, found: Option<Token>) -> ParseError {
        self.error_expected(kind.token_name(), found)
    }

    fn error_expected(&self, expected: impl Into<String>, found: Option<Token>) -> ParseError {
        let expected = expected.into();

        match found {
            Some(token) => ParseError {
                kind: ParseErrorKind::Expected(format!(
                    "{expected}, found {}",
                    token.kind.token_name()
                )),
                span: token.span,
            },
            None => ParseError {
                kind: ParseErrorKind::Expected(expected),
                span: self.tokens.eof_span(),
            },
        }
    }
}


use std::str::Chars;

use ember_session::diagnostics::prelude::*;

use crate::peek::Peek;
use crate::token::*;

#[derive(Debug, serde::Serialize)]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub span: Span,
}

#[derive(Debug, PartialEq, Eq, serde::Serialize, thiserror::Error)]
pub enum LexerErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("integer literal too large for 64 bits")]
    IntegerOverflow,

    #[error("binary literal without digits")]
    EmptyBinaryLiteral,

    #[error("digit {0:?} is invalid in a binary literal")]
    InvalidBinaryDigit(char),

    #[error("binary literal has {width} digits, the widest integer has 64")]
    BinaryLiteralTooWide { width: u32 },

    #[error("unterminated string")]
    UnterminatedString,
}

impl IntoDiagnostic<SourceId> for LexerError {
    fn into_diagnostic(self, source_id: &SourceId) -> Diagnostic {
        Diagnostic::error(Category::Lexical, self.kind.to_string())
            .with_snippet(Snippet::primary("", *source_id, self.span))
    }
}

pub type LexerResult<T> = Result<T, LexerErrorKind>;

pub struct Lexer<'src> {
    errors: Vec<LexerError>,

    all: &'src str,
    chars: Chars<'src>,

    token_start: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            errors: vec![],

            all: source,
            chars: source.chars(),

            token_start: 0,
        }
    }

    pub fn lex(mut self) -> (TokenIter, Vec<LexerError>) {
        let mut tokens = vec![];
        while let Some(token) = self.lex_token() {
            tokens.push(token);
        }

        let iter = TokenIter {
            tokens: tokens.into_iter(),
            prev_span: Span::empty(0),
            eof_span: Span::empty(self.all.len()),
        };

        (iter, self.errors)
    }

    fn lex_token(&mut self) -> Option<Token> {
        loop {
            macro_rules! try_lex {
                ($e:expr) => {{
                    match $e {
                        Ok(token) => token,
                        Err(err) => {
                            self.report_error(err);
                            continue;
                        }
                    }
                }};
            }

            self.token_start = self.byte_pos();

            let kind = match self.chars.next()? {
                // comment
                '/' if self.chars.eat('/') => {
                    while !matches!(self.chars.next(), Some('\n') | None) {}
                    continue;
                }

                ch if ch.is_ascii_whitespace() => continue,

                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,

                ':' => TokenKind::Colon,
                ',' => TokenKind::Comma,

                '.' if self.chars.eat('.') => {
                    if self.chars.eat('=') {
                        TokenKind::RangeInclusive
                    } else {
                        TokenKind::Range
                    }
                }
                '.' => TokenKind::Dot,

                '@' => TokenKind::At,
                '?' => TokenKind::Question,

                '-' if self.chars.eat('>') => TokenKind::Arrow,

                '+' => TokenKind::Add,
                '-' => TokenKind::Sub,
                '*' => TokenKind::Mul,
                '/' => TokenKind::Div,
                '%' => TokenKind::Mod,

                '=' if self.chars.eat('=') => TokenKind::Eq,
                '=' => TokenKind::Assign,
                '!' if self.chars.eat('=') => TokenKind::NotEq,
                '!' => TokenKind::Bang,

                '<' if self.chars.eat('=') => TokenKind::LtEq,
                '<' if self.chars.eat('<') => TokenKind::Shl,
                '<' => TokenKind::Lt,
                '>' if self.chars.eat('=') => TokenKind::GtEq,
                '>' if self.chars.eat('>') => TokenKind::Shr,
                '>' => TokenKind::Gt,

                '&' if self.chars.eat('&') => TokenKind::And,
                '&' => TokenKind::BitAnd,
                '|' if self.chars.eat('|') => TokenKind::Or,
                '|' => TokenKind::BitOr,
                '^' => TokenKind::BitXor,

                '"' => try_lex!(self.lex_string()),

                '0' if self.chars.eat('b') => try_lex!(self.lex_bin_integer()),
                ch @ '0'..='9' => try_lex!(self.lex_integer(ch as u64 - '0' as u64)),

                ch if is_ident_start(ch) => self.lex_alpha(),

                ch => {
                    self.report_error(LexerErrorKind::UnexpectedChar(ch));
                    continue;
                }
            };

            let token = Token {
                kind,
                span: Span::new(self.token_start, self.byte_pos()),
            };

            return Some(token);
        }
    }

    fn lex_integer(&mut self, start: u64) -> LexerResult<TokenKind> {
        let mut n = Some(start);

        while let Some(ch @ '0'..='9') = self.chars.peek() {
            self.chars.next();

            let digit = ch as u64 - '0' as u64;
            n = n.and_then(|n| n.checked_mul(10));
            n = n.and_then(|n| n.checked_add(digit));
        }

        n.map(TokenKind::Integer)
            .ok_or(LexerErrorKind::IntegerOverflow)
    }

    /// The written digit count is part of the token, so `0b0001` is a 4-bit
    /// literal even though its value fits in one.
    fn lex_bin_integer(&mut self) -> LexerResult<TokenKind> {
        let mut value: u64 = 0;
        let mut width: u32 = 0;

        while let Some(ch @ '0'..='9') = self.chars.peek() {
            self.chars.next();

            let digit = match ch {
                '0' => 0,
                '1' => 1,
                ch => return Err(LexerErrorKind::InvalidBinaryDigit(ch)),
            };

            width += 1;
            if width <= 64 {
                value = (value << 1) | digit;
            }
        }

        match width {
            0 => Err(LexerErrorKind::EmptyBinaryLiteral),
            1..=64 => Ok(TokenKind::BinInteger { value, width }),
            _ => Err(LexerErrorKind::BinaryLiteralTooWide { width }),
        }
    }

    // string bytes pass through verbatim, there are no escapes
    fn lex_string(&mut self) -> LexerResult<TokenKind> {
        let content_start = self.byte_pos();

        loop {
            match self.chars.next() {
                Some('"') => {
                    let s = &self.all[content_start..self.byte_pos() - 1];
                    return Ok(TokenKind::String(s.to_owned()));
                }
                Some(_) => {}
                None => return Err(LexerErrorKind::UnterminatedString),
            }
        }
    }

    fn lex_alpha(&mut self) -> TokenKind {
        while matches!(self.chars.peek(), Some(ch) if is_ident(ch)) {
            self.chars.next();
        }

        let s = &self.all[self.token_start..self.byte_pos()];

        match s {
            "fn" => TokenKind::Keyword(Keyword::Fn),
            "let" => TokenKind::Keyword(Keyword::Let),
            "if" => TokenKind::Keyword(Keyword::If),
            "else" => TokenKind::Keyword(Keyword::Else),
            "while" => TokenKind::Keyword(Keyword::While),
            "loop" => TokenKind::Keyword(Keyword::Loop),
            "for" => TokenKind::Keyword(Keyword::For),
            "in" => TokenKind::Keyword(Keyword::In),
            "return" => TokenKind::Keyword(Keyword::Return),
            "break" => TokenKind::Keyword(Keyword::Break),
            "continue" => TokenKind::Keyword(Keyword::Continue),
            "struct" => TokenKind::Keyword(Keyword::Struct),
            "enum" => TokenKind::Keyword(Keyword::Enum),
            "impl" => TokenKind::Keyword(Keyword::Impl),
            "self" => TokenKind::Keyword(Keyword::SelfValue),
            "use" => TokenKind::Keyword(Keyword::Use),
            "macro" => TokenKind::Keyword(Keyword::Macro),
            "assert" => TokenKind::Keyword(Keyword::Assert),
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => TokenKind::Identifier(s.to_owned()),
        }
    }

    fn byte_pos(&self) -> usize {
        self.all.len() - self.chars.as_str().len()
    }

    fn report_error(&mut self, kind: LexerErrorKind) {
        let span = Span::new(self.token_start, self.byte_pos());
        self.errors.push(LexerError { kind, span });
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

pub struct TokenIter {
    tokens: std::vec::IntoIter<Token>,
    prev_span: Span,
    eof_span: Span,
}

impl TokenIter {
    pub fn prev_span(&self) -> Span {
        self.prev_span
    }

    pub fn peek_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or(self.eof_span)
    }

    pub fn eof_span(&self) -> Span {
        self.eof_span
    }
}

impl Iterator for TokenIter {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.tokens.next()?;
        self.prev_span = token.span;
        Some(token)
    }
}

impl Peek for TokenIter {
    fn peek(&self) -> Option<Self::Item> {
        self.tokens.as_slice().first().cloned()
    }
}

use ember_diagnostic::span::Span;

use crate::{Node, NodeCopy};

#[derive(Node!)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Node!)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier(String),
    Integer(u64),
    /// A binary literal keeps the number of digits it was written with,
    /// leading zeros included.
    BinInteger {
        value: u64,
        width: u32,
    },
    String(String),
    Bool(bool),

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,

    Dot,
    Colon,
    Comma,
    Arrow,

    Range,
    RangeInclusive,

    At,
    Question,
    Bang,

    Add,
    Sub,
    Mul,
    Div,
    Mod,

    Assign,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    And,
    Or,

    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(NodeCopy!)]
pub enum Keyword {
    Fn,
    Let,
    If,
    Else,
    While,
    Loop,
    For,
    In,
    Return,
    Break,
    Continue,
    Struct,
    Enum,
    Impl,
    SelfValue,
    Use,
    Macro,
    Assert,
}

impl TokenKind {
    pub fn token_name(&self) -> &'static str {
        match self {
            TokenKind::Keyword(kw) => match kw {
                Keyword::Fn => "keyword `fn`",
                Keyword::Let => "keyword `let`",
                Keyword::If => "keyword `if`",
                Keyword::Else => "keyword `else`",
                Keyword::While => "keyword `while`",
                Keyword::Loop => "keyword `loop`",
                Keyword::For => "keyword `for`",
                Keyword::In => "keyword `in`",
                Keyword::Return => "keyword `return`",
                Keyword::Break => "keyword `break`",
                Keyword::Continue => "keyword `continue`",
                Keyword::Struct => "keyword `struct`",
                Keyword::Enum => "keyword `enum`",
                Keyword::Impl => "keyword `impl`",
                Keyword::SelfValue => "keyword `self`",
                Keyword::Use => "keyword `use`",
                Keyword::Macro => "keyword `macro`",
                Keyword::Assert => "keyword `assert`",
            },
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Integer(_) => "integer",
            TokenKind::BinInteger { .. } => "binary integer",
            TokenKind::String(_) => "string",
            TokenKind::Bool(_) => "boolean",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Dot => "`.`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Arrow => "`->`",
            TokenKind::Range => "`..`",
            TokenKind::RangeInclusive => "`..=`",
            TokenKind::At => "`@`",
            TokenKind::Question => "`?`",
            TokenKind::Bang => "`!`",
            TokenKind::Add => "`+`",
            TokenKind::Sub => "`-`",
            TokenKind::Mul => "`*`",
            TokenKind::Div => "`/`",
            TokenKind::Mod => "`%`",
            TokenKind::Assign => "`=`",
            TokenKind::Eq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::LtEq => "`<=`",
            TokenKind::GtEq => "`>=`",
            TokenKind::And => "`&&`",
            TokenKind::Or => "`||`",
            TokenKind::BitAnd => "`&`",
            TokenKind::BitOr => "`|`",
            TokenKind::BitXor => "`^`",
            TokenKind::Shl => "`<<`",
            TokenKind::Shr => "`>>`",
        }
    }
}

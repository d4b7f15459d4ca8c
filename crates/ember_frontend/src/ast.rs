use std::fmt;

use ember_diagnostic::span::Span;
use ember_session::sourcemap::SourceId;

use crate::{Node, NodeCopy};

#[derive(Node!)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// One parsed file, before imports are resolved.
#[derive(Node!)]
pub struct SourceFile {
    pub uses: Vec<UseDecl>,
    pub items: Vec<Item>,
}

#[derive(Node!)]
pub struct UseDecl {
    pub path: String,
    pub span: Span,
}

/// Every file's declarations merged into one flat namespace, imports first,
/// the entry file's own declarations last.
#[derive(Node!)]
pub struct CompilationUnit {
    pub items: Vec<UnitItem>,
}

#[derive(Node!)]
pub struct UnitItem {
    pub source_id: SourceId,
    pub item: Item,
}

#[derive(Node!)]
pub enum Item {
    MacroConst(MacroConstDecl),
    Func(FuncDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Impl(ImplBlock),

    ParseError,
}

#[derive(Node!)]
pub struct MacroConstDecl {
    pub name: Ident,
    pub value: Literal,
}

#[derive(Node!)]
pub struct Literal {
    pub kind: LiteralKind,
    pub span: Span,
}

#[derive(Node!)]
pub enum LiteralKind {
    Integer(u64),
    BinInteger { value: u64, width: u32 },
    String(String),
    Bool(bool),
}

#[derive(Node!)]
pub struct FuncDecl {
    pub name: Ident,
    /// Present for methods declared as `fn name(self, ...)`. The receiver is
    /// not part of `params`.
    pub has_self: bool,
    pub params: Vec<Param>,
    pub ret_ty: Type,
    pub ret_ty_span: Option<Span>,
    pub body: Block,
}

#[derive(Node!)]
pub struct Param {
    pub name: Ident,
    pub ty: Type,
    pub ty_span: Span,
    pub default: Option<Expr>,
}

#[derive(Node!)]
pub struct StructDecl {
    pub name: Ident,
    pub fields: Vec<Field>,
}

#[derive(Node!)]
pub struct Field {
    pub name: Ident,
    pub ty: Type,
    pub ty_span: Span,
}

#[derive(Node!)]
pub struct EnumDecl {
    pub name: Ident,
    pub variants: Vec<Ident>,
}

#[derive(Node!)]
pub struct ImplBlock {
    pub target: Ident,
    pub funcs: Vec<FuncDecl>,
}

#[derive(Node!)]
pub enum Type {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Bool,
    Str,
    Unit,
    Ref(Box<Type>),
    Named(String),
}

impl Type {
    pub fn is_integer(&self) -> bool {
        self.integer_bits().is_some()
    }

    pub fn integer_bits(&self) -> Option<u32> {
        match self {
            Type::U8 | Type::I8 => Some(8),
            Type::U16 | Type::I16 => Some(16),
            Type::U32 | Type::I32 => Some(32),
            Type::U64 | Type::I64 => Some(64),
            _ => None,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Type::I8 | Type::I16 | Type::I32 | Type::I64)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::U8 => f.write_str("u8"),
            Type::U16 => f.write_str("u16"),
            Type::U32 => f.write_str("u32"),
            Type::U64 => f.write_str("u64"),
            Type::I8 => f.write_str("i8"),
            Type::I16 => f.write_str("i16"),
            Type::I32 => f.write_str("i32"),
            Type::I64 => f.write_str("i64"),
            Type::Bool => f.write_str("bool"),
            Type::Str => f.write_str("str"),
            Type::Unit => f.write_str("unit"),
            Type::Ref(inner) => write!(f, "&{inner}"),
            Type::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Node!)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Node!)]
pub enum Stmt {
    Let {
        name: Ident,
        ty: Option<Type>,
        ty_span: Option<Span>,
        value: Expr,
    },
    Assign {
        target: Ident,
        value: Expr,
    },
    /// `x[i] = e`: a single-bit read-modify-write on an integer variable.
    IndexAssign {
        target: Ident,
        index: Expr,
        value: Expr,
    },
    If {
        cond: Expr,
        then_block: Block,
        /// `else if` chains are nested: the else block holds a single `If`.
        else_block: Option<Block>,
    },
    While {
        cond: Expr,
        body: Block,
    },
    Loop {
        body: Block,
    },
    ForRange {
        var: Ident,
        start: Expr,
        end: Expr,
        inclusive: bool,
        body: Block,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Assert {
        kind: AssertKind,
        span: Span,
    },
    Panic {
        payload: Expr,
        span: Span,
    },
    Interrupt {
        number: u64,
        span: Span,
    },
    Break(Span),
    Continue(Span),
    Expr(Expr),

    ParseError,
}

#[derive(Node!)]
pub enum AssertKind {
    /// `assert e`
    Truthy(Expr),
    /// `assert a = b`
    Equal(Expr, Expr),
}

#[derive(Node!)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Filled in by semantic lowering where the type is known.
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }
}

#[derive(Node!)]
pub enum ExprKind {
    Integer(u64),
    BinInteger {
        value: u64,
        width: u32,
    },
    String(String),
    Bool(bool),

    Var(String),

    UnOp {
        op: UnOp,
        expr: Box<Expr>,
    },
    BinOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Only valid as a `for` loop bound; anywhere else it is rejected during
    /// lowering.
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        inclusive: bool,
    },

    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    FieldAccess {
        target: Box<Expr>,
        field: Ident,
    },
    /// Produced by lowering from `EnumName.Variant`; never parsed directly.
    EnumVariant {
        enum_name: String,
        variant: String,
    },
    Ref(Box<Expr>),

    ParseError,
}

#[derive(NodeCopy!)]
pub enum UnOp {
    Negate,
    Not,
}

#[derive(NodeCopy!)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,

    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    And,
    Or,
}

impl BinOp {
    /// Comparisons and logical operators produce booleans; everything else
    /// keeps its operand type.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            BinOp::Eq
                | BinOp::NotEq
                | BinOp::Lt
                | BinOp::Gt
                | BinOp::LtEq
                | BinOp::GtEq
                | BinOp::And
                | BinOp::Or
        )
    }
}

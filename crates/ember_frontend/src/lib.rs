#[macro_use]
extern crate macro_rules_attribute;

mod lexer;
mod parser;
mod peek;
mod resolve;

pub mod ast;
pub mod token;

pub use lexer::{LexerError, LexerErrorKind, LexerResult, TokenIter};
pub use parser::{ParseError, ParseErrorKind};
pub use resolve::{
    normalize_path, FsResolver, MapResolver, ResolveError, SourceResolver, UnitError,
};

use ast::{CompilationUnit, SourceFile};
use ember_session::sourcemap::SourceMap;
use lexer::Lexer;
use parser::Parser;

derive_alias! {
    #[derive(Node!)] = #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)];
    #[derive(NodeCopy!)] = #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)];
}

pub fn lex(source: &str) -> (TokenIter, Vec<LexerError>) {
    Lexer::new(source).lex()
}

pub fn parse(tokens: TokenIter) -> (SourceFile, Vec<ParseError>) {
    Parser::new(tokens).parse()
}

/// Loads the entry file and, depth-first, everything it imports, merging all
/// declarations into one flat unit. Each canonical path is loaded at most
/// once.
pub fn resolve_imports<R: SourceResolver>(
    sources: &mut SourceMap,
    resolver: &R,
    entry: &str,
) -> (CompilationUnit, Vec<UnitError>) {
    resolve::Resolver::new(sources, resolver).run(entry)
}

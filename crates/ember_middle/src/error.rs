use ember_frontend::ast::Type;
use ember_session::diagnostics::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum SemanticError {
    #[error("`{name}` is already defined")]
    DuplicateDefinition {
        name: String,
        first: SourceSpan,
        second: SourceSpan,
    },

    #[error("duplicate macro constant `{name}`")]
    DuplicateConst {
        name: String,
        first: SourceSpan,
        second: SourceSpan,
    },

    #[error("unknown name `{name}`")]
    UnknownName { name: String, at: SourceSpan },

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String, at: SourceSpan },

    #[error("this expression cannot be called")]
    NotCallable { at: SourceSpan },

    #[error("`{callee}` expects {expected} argument(s), found {found}")]
    ArityMismatch {
        callee: String,
        expected: String,
        found: usize,
        at: SourceSpan,
    },

    #[error("expected type {expected}, found type {found}")]
    TypeMismatch {
        expected: Type,
        found: Type,
        at: SourceSpan,
        expected_due_to: Option<SourceSpan>,
    },

    #[error("literal `{value}` does not fit in type {ty}")]
    LiteralOutOfRange {
        value: String,
        ty: Type,
        at: SourceSpan,
    },

    #[error("bit-index assignment needs an integer variable, `{name}` has type {ty}")]
    BitIndexTarget {
        name: String,
        ty: Type,
        at: SourceSpan,
    },

    #[error("type {ty} cannot be indexed")]
    NotIndexable { ty: Type, at: SourceSpan },

    #[error("default for parameter `{name}` must be a literal or macro constant")]
    NonConstDefault { name: String, at: SourceSpan },

    #[error("type `{ty}` has no field `{field}`")]
    UnknownField {
        ty: String,
        field: String,
        at: SourceSpan,
    },

    #[error("enum `{ty}` has no variant `{variant}`")]
    UnknownVariant {
        ty: String,
        variant: String,
        at: SourceSpan,
    },

    #[error("type `{ty}` has no method `{method}`")]
    UnknownMethod {
        ty: String,
        method: String,
        at: SourceSpan,
    },

    #[error("range expressions are only valid as `for` bounds")]
    RangeOutsideFor { at: SourceSpan },

    #[error("interrupt number {number} is out of range, the hardware has 256 vectors")]
    InterruptOutOfRange { number: u64, at: SourceSpan },

    #[error("`{keyword}` outside of a loop")]
    OutsideLoop {
        keyword: &'static str,
        at: SourceSpan,
    },

    #[error("missing return in function `{name}` returning {ty}")]
    MissingReturn {
        name: String,
        ty: Type,
        at: SourceSpan,
    },
}

impl IntoDiagnostic<()> for SemanticError {
    fn into_diagnostic(self, _cx: &()) -> Diagnostic {
        let message = self.to_string();

        match self {
            SemanticError::DuplicateDefinition { first, second, .. }
            | SemanticError::DuplicateConst { first, second, .. } => {
                Diagnostic::error(Category::Semantic, message)
                    .with_snippet(Snippet::primary(
                        "defined again here",
                        second.source_id,
                        second.span,
                    ))
                    .with_snippet(Snippet::secondary(
                        "first defined here",
                        first.source_id,
                        first.span,
                    ))
            }

            SemanticError::TypeMismatch {
                at,
                expected_due_to,
                ..
            } => {
                let diagnostic = Diagnostic::error(Category::Semantic, message).with_snippet(
                    Snippet::primary("unexpected type", at.source_id, at.span),
                );

                match expected_due_to {
                    Some(expected) => diagnostic.with_snippet(Snippet::secondary(
                        "expected because of this",
                        expected.source_id,
                        expected.span,
                    )),
                    None => diagnostic,
                }
            }

            SemanticError::UnknownName { at, .. }
            | SemanticError::UnknownFunction { at, .. }
            | SemanticError::NotCallable { at }
            | SemanticError::ArityMismatch { at, .. }
            | SemanticError::LiteralOutOfRange { at, .. }
            | SemanticError::BitIndexTarget { at, .. }
            | SemanticError::NotIndexable { at, .. }
            | SemanticError::NonConstDefault { at, .. }
            | SemanticError::UnknownField { at, .. }
            | SemanticError::UnknownVariant { at, .. }
            | SemanticError::UnknownMethod { at, .. }
            | SemanticError::RangeOutsideFor { at }
            | SemanticError::InterruptOutOfRange { at, .. }
            | SemanticError::OutsideLoop { at, .. }
            | SemanticError::MissingReturn { at, .. } => {
                Diagnostic::error(Category::Semantic, message)
                    .with_snippet(Snippet::primary("", at.source_id, at.span))
            }
        }
    }
}

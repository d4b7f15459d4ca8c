mod render;
pub mod sources;
pub mod span;

use derive_where::derive_where;
pub use termcolor;
use termcolor::{Color, ColorSpec};

use self::sources::Sources;
use self::span::Span;

/// Which compiler pass produced a diagnostic. This is the `kind` field of the
/// diagnostics channel, not a severity.
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Lexical,
    Syntax,
    Resolution,
    Semantic,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Lexical => "lexical",
            Category::Syntax => "syntax",
            Category::Resolution => "resolution",
            Category::Semantic => "semantic",
        }
    }
}

#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive_where(Debug, Clone; S::SourceId)]
pub struct Diagnostic<S: Sources> {
    pub severity: Severity,
    pub category: Category,

    pub message: String,
    pub snippets: Vec<Snippet<S>>,
}

impl<S: Sources> Diagnostic<S> {
    pub fn new(severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            snippets: vec![],
        }
    }

    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    pub fn with_snippet(mut self, snippet: Snippet<S>) -> Self {
        self.snippets.push(snippet);
        self
    }

    pub fn with_snippets(mut self, snippets: impl IntoIterator<Item = Snippet<S>>) -> Self {
        self.snippets.extend(snippets);
        self
    }

    /// The snippet the diagnostic points at, if it has one.
    pub fn primary_snippet(&self) -> Option<&Snippet<S>> {
        self.snippets
            .iter()
            .find(|s| s.kind == SnippetKind::Primary)
            .or_else(|| self.snippets.first())
    }
}

#[derive_where(Debug, Clone; S::SourceId)]
pub struct Snippet<S: Sources> {
    pub label: String,
    pub kind: SnippetKind,

    pub source_id: S::SourceId,
    pub span: Span,
}

impl<S: Sources> Snippet<S> {
    pub fn new(
        kind: SnippetKind,
        label: impl Into<String>,
        source_id: S::SourceId,
        span: Span,
    ) -> Self {
        Self {
            label: label.into(),
            kind,
            source_id,
            span,
        }
    }

    pub fn primary(label: impl Into<String>, source_id: S::SourceId, span: Span) -> Self {
        Self::new(SnippetKind::Primary, label, source_id, span)
    }

    pub fn secondary(label: impl Into<String>, source_id: S::SourceId, span: Span) -> Self {
        Self::new(SnippetKind::Secondary, label, source_id, span)
    }
}

#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnippetKind {
    Primary,
    Secondary,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub error_color: ColorSpec,
    pub warning_color: ColorSpec,
    pub emphasis: ColorSpec,
    pub subtle: ColorSpec,

    pub gutter: &'static str,
    pub underline: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        let mut error_color = ColorSpec::new();
        error_color.set_fg(Some(Color::Red));
        error_color.set_bold(true);

        let mut warning_color = ColorSpec::new();
        warning_color.set_fg(Some(Color::Yellow));
        warning_color.set_bold(true);

        let mut emphasis = ColorSpec::new();
        emphasis.set_bold(true);

        let mut subtle = ColorSpec::new();
        subtle.set_fg(Some(Color::Blue));

        Self {
            error_color,
            warning_color,
            emphasis,
            subtle,

            gutter: "|",
            underline: "^",
        }
    }
}

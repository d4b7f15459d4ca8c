use ember_diagnostic::sources::Source as _;
use ember_diagnostic::termcolor::{ColorChoice, StandardStream};
use ember_diagnostic::{Category, Config};

use crate::sourcemap::SourceMap;

pub mod prelude {
    pub use ember_diagnostic::span::Span;
    pub use ember_diagnostic::{Category, Severity, SnippetKind};

    pub use super::{Diagnostic, DiagnosticRecord, IntoDiagnostic, Snippet};
    pub use crate::sourcemap::{SourceId, SourceSpan};
}

pub type Diagnostic = ember_diagnostic::Diagnostic<SourceMap>;
pub type Snippet = ember_diagnostic::Snippet<SourceMap>;

/// One entry of the ordered diagnostics channel handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DiagnosticRecord {
    pub kind: Category,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl DiagnosticRecord {
    pub(crate) fn from_diagnostic(diagnostic: &Diagnostic, sources: &SourceMap) -> Self {
        let mut file = None;
        let mut line = None;
        let mut column = None;

        if let Some(snippet) = diagnostic.primary_snippet() {
            if let Some(source) = sources.get(snippet.source_id) {
                file = Some(source.name_str().to_owned());
                if let Some((l, c)) = source.line_col(snippet.span.start) {
                    line = Some(l);
                    column = Some(c);
                }
            }
        }

        Self {
            kind: diagnostic.category,
            message: diagnostic.message.clone(),
            file,
            line,
            column,
        }
    }
}

pub trait DiagnosticEmitter {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, sources: &SourceMap);
}

impl DiagnosticEmitter for Vec<Diagnostic> {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, _sources: &SourceMap) {
        self.push(diagnostic);
    }
}

/// Discards diagnostics. The session still records them in its channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentEmitter;

impl DiagnosticEmitter for SilentEmitter {
    fn emit_diagnostic(&mut self, _diagnostic: Diagnostic, _sources: &SourceMap) {}
}

#[derive(Debug)]
pub struct PrettyDiagnosticEmitter {
    pub stream: StandardStream,
    pub config: Config,
}

impl Default for PrettyDiagnosticEmitter {
    fn default() -> Self {
        Self {
            stream: StandardStream::stderr(ColorChoice::Auto),
            config: Config::default(),
        }
    }
}

impl DiagnosticEmitter for PrettyDiagnosticEmitter {
    fn emit_diagnostic(&mut self, diagnostic: Diagnostic, sources: &SourceMap) {
        diagnostic
            .write_to_stream(sources, &self.config, &mut self.stream)
            .expect("failed to emit diagnostic");
    }
}

pub trait IntoDiagnostic<Context: ?Sized> {
    fn into_diagnostic(self, cx: &Context) -> Diagnostic;
}

impl IntoDiagnostic<()> for Diagnostic {
    fn into_diagnostic(self, _cx: &()) -> Diagnostic {
        self
    }
}

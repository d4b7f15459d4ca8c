pub mod diagnostics;
pub mod options;
pub mod sourcemap;

use diagnostics::{Diagnostic, DiagnosticEmitter, DiagnosticRecord, IntoDiagnostic};
use ember_diagnostic::Severity;
use options::CompileOptions;
use sourcemap::SourceMap;

/// Marker returned when at least one error-severity diagnostic was reported.
#[derive(Debug, Clone, Copy)]
pub struct ErrorsEmitted;

/// State shared by every pass of one compilation: the sources read so far,
/// the compile options, and the diagnostics reported by earlier passes.
pub struct Session<D: DiagnosticEmitter> {
    pub options: CompileOptions,
    pub sources: SourceMap,
    pub diagnostics: D,

    records: Vec<DiagnosticRecord>,
    error_count: usize,
}

impl<D: DiagnosticEmitter> Session<D> {
    pub fn new(options: CompileOptions, diagnostics: D) -> Self {
        Self {
            options,
            sources: SourceMap::default(),
            diagnostics,

            records: vec![],
            error_count: 0,
        }
    }

    pub fn report<Context>(
        &mut self,
        diagnostic: impl IntoDiagnostic<Context>,
        cx: &Context,
    ) -> Result<(), ErrorsEmitted> {
        let diagnostic = diagnostic.into_diagnostic(cx);
        let severity = diagnostic.severity;

        self.emit(diagnostic);

        if severity < Severity::Error {
            Ok(())
        } else {
            Err(ErrorsEmitted)
        }
    }

    pub fn report_all<Context, I>(
        &mut self,
        diagnostics: I,
        cx: &Context,
    ) -> Result<(), ErrorsEmitted>
    where
        I: IntoIterator,
        I::Item: IntoDiagnostic<Context>,
    {
        let mut had_error = false;

        for diagnostic in diagnostics {
            let diagnostic = diagnostic.into_diagnostic(cx);
            had_error |= diagnostic.severity >= Severity::Error;
            self.emit(diagnostic);
        }

        if !had_error {
            Ok(())
        } else {
            Err(ErrorsEmitted)
        }
    }

    fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity >= Severity::Error {
            self.error_count += 1;
        }

        self.records
            .push(DiagnosticRecord::from_diagnostic(&diagnostic, &self.sources));
        self.diagnostics.emit_diagnostic(diagnostic, &self.sources);
    }

    pub fn had_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Every diagnostic reported so far, in report order. Available whether
    /// or not the compilation succeeded.
    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DiagnosticRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use ember_diagnostic::span::Span;
    use ember_diagnostic::Category;

    use crate::diagnostics::prelude::*;
    use crate::options::CompileOptions;
    use crate::sourcemap::Source;
    use crate::Session;

    #[test]
    fn records_follow_report_order() {
        let mut session = Session::new(CompileOptions::default(), Vec::new());
        let id = session.sources.insert(Source::new("a.em", "let\nlet"));

        let first: Diagnostic = Diagnostic::error(Category::Lexical, "first")
            .with_snippet(Snippet::primary("", id, Span::new(4, 7)));
        let second: Diagnostic = Diagnostic::error(Category::Syntax, "second");

        let _ = session.report(first, &());
        let _ = session.report(second, &());

        let records = session.records();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].kind, Category::Lexical);
        assert_eq!(records[0].file.as_deref(), Some("a.em"));
        assert_eq!(records[0].line, Some(2));
        assert_eq!(records[0].column, Some(1));

        assert_eq!(records[1].kind, Category::Syntax);
        assert_eq!(records[1].file, None);

        assert!(session.had_errors());
        assert_eq!(session.error_count(), 2);
    }
}
